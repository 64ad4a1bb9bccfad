//! Texture and shadow-map samplers.

mod shadow;
mod texture;

pub use shadow::{CubeShadowMap, LightShadow, ShadowFilter, ShadowMap, POISSON_DISK, POISSON_SPREAD};
pub use texture::{MipLevel, Texture, TextureCache, TextureFilter};
