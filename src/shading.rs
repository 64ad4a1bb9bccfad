//! Shading programs, the per-draw uniform block and the Phong-style lighting model.

mod lighting;
mod programs;
mod uniforms;

pub use lighting::{apply_fog, do_lighting, spot_attenuation};
pub use programs::ShaderProgram;
pub use uniforms::{Fog, FogMode, Light, LightKind, LightUniform, Material, Uniforms, MAX_LIGHTS};
