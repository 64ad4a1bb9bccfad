//! CPU-only rasterization pipeline: clip-space triangle setup, perspective-correct attribute
//! interpolation, scanline rasterization, pluggable shading programs and shadow maps.

pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod mesh;
pub mod pipeline;
pub mod sampler;
pub mod scene;
pub mod shading;
pub mod shadow;

pub use error::RenderError;
