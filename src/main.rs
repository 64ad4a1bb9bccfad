mod app;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use soft_renderer::pipeline::CullMode;
use soft_renderer::sampler::ShadowFilter;
use soft_renderer::shading::ShaderProgram;
use soft_renderer::shadow::ShadowSettings;

#[derive(Clone, Copy, ValueEnum)]
enum Shading {
    Flat,
    Gouraud,
    Phong,
    Unlit,
    Wireframe,
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    Point,
    Pcf,
    Poisson,
    PoissonPcf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Cull {
    None,
    Back,
    Front,
}

#[derive(Parser)]
#[command(name = "soft-renderer")]
#[command(about = "Render a mesh with the CPU rasterizer and write a PNG", long_about = None)]
#[command(version)]
struct Cli {
    /// Output image width in pixels
    #[arg(long, default_value = "800")]
    width: usize,

    /// Output image height in pixels
    #[arg(long, default_value = "600")]
    height: usize,

    /// Wavefront OBJ mesh, a cube is rendered when omitted
    #[arg(short, long)]
    mesh: Option<PathBuf>,

    /// Texture image applied to the mesh
    #[arg(short, long)]
    texture: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Also write the depth buffer as a greyscale PNG
    #[arg(long)]
    depth_output: Option<PathBuf>,

    /// Also write the object-id buffer as a false-colour PNG
    #[arg(long)]
    ids_output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "phong")]
    shading: Shading,

    #[arg(long, value_enum, default_value = "pcf")]
    shadow_filter: Filter,

    /// PCF kernel size in texels
    #[arg(long, default_value = "3")]
    shadow_kernel: usize,

    /// Shadow map size in texels
    #[arg(long, default_value = "1024")]
    shadow_resolution: usize,

    #[arg(long, value_enum, default_value = "back")]
    cull: Cull,

    /// Enable linear distance fog
    #[arg(long)]
    fog: bool,

    /// Draw object bounding boxes
    #[arg(long)]
    bounds: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the info default.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let cli = Cli::parse();

    let shading = match cli.shading {
        Shading::Flat => ShaderProgram::Flat,
        Shading::Gouraud => ShaderProgram::Gouraud,
        Shading::Phong => ShaderProgram::Phong,
        Shading::Unlit => ShaderProgram::Unlit,
        Shading::Wireframe => ShaderProgram::Wireframe,
    };
    let filter = match cli.shadow_filter {
        Filter::Point => ShadowFilter::Point,
        Filter::Pcf => ShadowFilter::Pcf(cli.shadow_kernel),
        Filter::Poisson => ShadowFilter::Poisson,
        Filter::PoissonPcf => ShadowFilter::PoissonPcf(cli.shadow_kernel),
    };
    let cull = match cli.cull {
        Cull::None => CullMode::None,
        Cull::Back => CullMode::Back,
        Cull::Front => CullMode::Front,
    };

    let params = app::Params {
        width: cli.width,
        height: cli.height,
        mesh: cli.mesh,
        texture: cli.texture,
        output: cli.output,
        depth_output: cli.depth_output,
        ids_output: cli.ids_output,
        shading,
        shadows: ShadowSettings { resolution: cli.shadow_resolution, filter, ..Default::default() },
        cull,
        fog: cli.fog,
        show_bounds: cli.bounds,
    };

    app::run(params)?;

    return Ok(());
}
