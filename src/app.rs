use std::path::PathBuf;
use std::rc::Rc;
use std::time;

use log::info;
use na::{vector, Matrix4, Vector3};
use nalgebra as na;

use soft_renderer::mesh::Mesh;
use soft_renderer::pipeline::CullMode;
use soft_renderer::sampler::TextureCache;
use soft_renderer::scene::{Camera, Projection, Renderer, Scene, SceneObject};
use soft_renderer::shading::{Fog, FogMode, Light, Material, ShaderProgram};
use soft_renderer::shadow::ShadowSettings;
use soft_renderer::RenderError;

/// Everything one invocation renders.
pub struct Params {
    pub width: usize,
    pub height: usize,
    pub mesh: Option<PathBuf>, // Built-in cube when absent.
    pub texture: Option<PathBuf>,
    pub output: PathBuf,
    pub depth_output: Option<PathBuf>,
    pub ids_output: Option<PathBuf>,
    pub shading: ShaderProgram,
    pub shadows: ShadowSettings,
    pub cull: CullMode,
    pub fog: bool,
    pub show_bounds: bool,
}

/// Scales and centres a mesh so it fits a sphere of radius 1 at the origin.
fn normalize_transform(mesh: &Mesh) -> Matrix4<f32> {
    let bounds = mesh.compute_bounds();
    let scale = 1.0 / bounds.radius().max(1e-6);
    return Matrix4::new_scaling(scale) * Matrix4::new_translation(&-bounds.center());
}

/// Demo scene: the model (or a cube) standing on a floor, a key light that casts shadows and
/// a dim fill light.
fn build_scene(params: &Params, cache: &mut TextureCache) -> Result<Scene, RenderError> {
    let camera = Camera {
        eye: vector![2.0, 1.5, 3.0],
        target: vector![0.0, -0.2, 0.0],
        up: Vector3::y(),
        projection: Projection::Perspective { fov_y: 45f32.to_radians(), near: 0.1, far: 50.0 },
    };
    let mut scene = Scene::new(camera);
    scene.settings.cull = params.cull;
    scene.settings.show_bounds = params.show_bounds;
    scene.settings.background = soft_renderer::framebuffer::Color::new(30, 30, 40);
    if params.fog {
        scene.settings.fog = Fog { mode: FogMode::Linear { start: 3.0, end: 8.0 }, color: vector![0.12, 0.12, 0.16] };
    }
    scene.set_shadow_settings(params.shadows);

    let mesh = match &params.mesh {
        Some(path) => Mesh::load_obj(path)?,
        None => Mesh::cube(1.2),
    };
    let mut model = SceneObject::new("model", Rc::new(mesh));
    model.transform = normalize_transform(&model.mesh);
    model.program = params.shading;
    model.material = Material { color: vector![0.9, 0.6, 0.3], ambient: 0.15, shininess: 24.0 };
    if let Some(path) = &params.texture {
        model.texture = Some(cache.load(path)?);
        model.material.color = vector![1.0, 1.0, 1.0];
    }
    scene.add_object(model);

    let mut floor = SceneObject::new("floor", Rc::new(Mesh::quad(3.0, 3.0)));
    floor.transform = Matrix4::new_translation(&vector![0.0, -1.0, 0.0])
        * Matrix4::from_axis_angle(&Vector3::x_axis(), -std::f32::consts::FRAC_PI_2);
    floor.program = if params.shading == ShaderProgram::Wireframe { ShaderProgram::Wireframe } else { ShaderProgram::Phong };
    floor.material = Material { color: vector![0.7, 0.7, 0.75], ambient: 0.2, shininess: 8.0 };
    scene.add_object(floor);

    scene.add_light(Light::spot(
        vector![2.5, 4.0, 2.0],
        vector![-2.5, -5.0, -2.0],
        20f32.to_radians(),
        35f32.to_radians(),
        vector![0.9, 0.9, 0.85],
    ));
    scene.add_light(Light::directional(vector![1.0, -0.3, -1.0], vector![0.15, 0.15, 0.2]).with_shadow(false));
    return Ok(scene);
}

/// Renders the demo scene once and writes the requested images.
pub fn run(params: Params) -> Result<(), RenderError> {
    let mut cache = TextureCache::new();
    let mut scene = build_scene(&params, &mut cache)?;
    let mut renderer = Renderer::new(params.width, params.height);

    let time_begin = time::Instant::now();
    let stats = renderer.render(&mut scene);
    info!(
        "rendered {}x{} in {:.1} ms: {} triangles, {} culled, {} clipped, {} pixels shaded",
        params.width,
        params.height,
        time_begin.elapsed().as_secs_f32() * 1000.0,
        stats.triangles_drawn,
        stats.triangles_culled,
        stats.triangles_clipped,
        stats.pixels_shaded
    );

    renderer.color().to_image().save(&params.output)?;
    info!("wrote {}", params.output.display());
    if let Some(path) = &params.depth_output {
        renderer.depth().visualize().save(path)?;
        info!("wrote depth to {}", path.display());
    }
    if let Some(path) = &params.ids_output {
        renderer.ids().visualize().save(path)?;
        info!("wrote object ids to {}", path.display());
    }
    return Ok(());
}
