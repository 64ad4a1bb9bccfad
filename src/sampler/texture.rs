use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use image::RgbImage;
use log::{debug, info};
use na::{Vector2, Vector3};
use nalgebra as na;

use crate::error::RenderError;

/// How a shader reads its bound texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Bilinear,
    Mipmapped,
}

/// One level of the mip chain, texels as [0, 1] floats.
#[derive(Debug, Clone)]
pub struct MipLevel {
    pub width: usize,
    pub height: usize,
    texels: Vec<Vector3<f32>>,
}

impl MipLevel {
    /// Texel fetch with wraparound by `abs(coord) mod dimension`.
    /// Negative coordinates mirror instead of tiling.
    #[inline]
    fn texel(&self, x: i64, y: i64) -> Vector3<f32> {
        let x = (x.unsigned_abs() % self.width as u64) as usize;
        let y = (y.unsigned_abs() % self.height as u64) as usize;
        return self.texels[y * self.width + x];
    }

    /// Half-size box-filtered copy. Odd edges clamp.
    fn downsample(&self) -> MipLevel {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut texels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let x0 = (2 * x).min(self.width - 1);
                let x1 = (2 * x + 1).min(self.width - 1);
                let y0 = (2 * y).min(self.height - 1);
                let y1 = (2 * y + 1).min(self.height - 1);
                let sum = self.texels[y0 * self.width + x0]
                    + self.texels[y0 * self.width + x1]
                    + self.texels[y1 * self.width + x0]
                    + self.texels[y1 * self.width + x1];
                texels.push(sum * 0.25);
            }
        }
        return MipLevel { width, height, texels };
    }
}

/// Read-only image with its full mip chain down to 1x1.
#[derive(Debug, Clone)]
pub struct Texture {
    levels: Vec<MipLevel>,
}

impl Texture {
    pub fn from_image(image: &RgbImage) -> Texture {
        assert!(image.width() > 0 && image.height() > 0, "texture must not be empty");
        let texels = image
            .pixels()
            .map(|p| Vector3::new(p.0[0] as f32, p.0[1] as f32, p.0[2] as f32) / 255.0)
            .collect();
        let base = MipLevel { width: image.width() as usize, height: image.height() as usize, texels };
        let mut levels = vec![base];
        loop {
            let last = &levels[levels.len() - 1];
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        return Texture { levels };
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Texture, RenderError> {
        let image = image::open(path.as_ref())?.to_rgb8();
        info!("Loaded texture {} ({}x{})", path.as_ref().display(), image.width(), image.height());
        return Ok(Texture::from_image(&image));
    }

    pub fn width(&self) -> usize {
        return self.levels[0].width;
    }

    pub fn height(&self) -> usize {
        return self.levels[0].height;
    }

    pub fn mip_count(&self) -> usize {
        return self.levels.len();
    }

    pub fn level(&self, level: usize) -> &MipLevel {
        return &self.levels[level];
    }

    /// Nearest texel at level 0. Scaled coordinates truncate towards zero before the
    /// `abs(coord) mod dimension` wrap, so `-1.2` and `1.2` both fetch texel 1.
    pub fn sample(&self, uv: Vector2<f32>) -> Vector3<f32> {
        let level = &self.levels[0];
        let x = (uv.x * level.width as f32) as i64;
        let y = (uv.y * level.height as f32) as i64;
        return level.texel(x, y);
    }

    pub fn sample_bilinear(&self, uv: Vector2<f32>) -> Vector3<f32> {
        return Self::bilinear(&self.levels[0], uv);
    }

    fn bilinear(level: &MipLevel, uv: Vector2<f32>) -> Vector3<f32> {
        // Texel centers sit at half-integer coordinates.
        let fx = uv.x * level.width as f32 - 0.5;
        let fy = uv.y * level.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = level.texel(x0, y0) * (1.0 - tx) + level.texel(x0 + 1, y0) * tx;
        let bottom = level.texel(x0, y0 + 1) * (1.0 - tx) + level.texel(x0 + 1, y0 + 1) * tx;
        return top * (1.0 - ty) + bottom * ty;
    }

    /// Mip level for a screen-space footprint, `ddx`/`ddy` being uv derivatives per pixel.
    pub fn mip_level(&self, ddx: Vector2<f32>, ddy: Vector2<f32>) -> usize {
        let scale = Vector2::new(self.width() as f32, self.height() as f32);
        let dx = ddx.component_mul(&scale).norm_squared();
        let dy = ddy.component_mul(&scale).norm_squared();
        let lod = (dx + dy).log2() / 2.0;
        if !(lod > 0.0) {
            // Also catches NaN from a zero footprint.
            return 0;
        }
        return (lod.round() as usize).min(self.levels.len() - 1);
    }

    pub fn sample_bilinear_mipmapped(&self, uv: Vector2<f32>, ddx: Vector2<f32>, ddy: Vector2<f32>) -> Vector3<f32> {
        let level = self.mip_level(ddx, ddy);
        return Self::bilinear(&self.levels[level], uv);
    }

    pub fn sample_filtered(&self, filter: TextureFilter, uv: Vector2<f32>, ddx: Vector2<f32>, ddy: Vector2<f32>) -> Vector3<f32> {
        return match filter {
            TextureFilter::Nearest => self.sample(uv),
            TextureFilter::Bilinear => self.sample_bilinear(uv),
            TextureFilter::Mipmapped => self.sample_bilinear_mipmapped(uv, ddx, ddy),
        };
    }
}

/// Load-or-reuse texture cache keyed by file name.
///
/// The cache holds only weak references: a texture is freed when its last `Rc` handle is
/// dropped, and a later request for the same file loads it again.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<PathBuf, Weak<Texture>>,
}

thread_local! {
    static SHARED_CACHE: RefCell<TextureCache> = RefCell::new(TextureCache::default());
}

impl TextureCache {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<Rc<Texture>, RenderError> {
        let key = path.as_ref().to_path_buf();
        if let Some(texture) = self.entries.get(&key).and_then(Weak::upgrade) {
            debug!("Texture cache hit for {}", key.display());
            return Ok(texture);
        }
        let texture = Rc::new(Texture::load(&key)?);
        self.entries.insert(key, Rc::downgrade(&texture));
        return Ok(texture);
    }

    /// Number of entries whose texture is still alive.
    pub fn live_count(&self) -> usize {
        return self.entries.values().filter(|w| w.strong_count() > 0).count();
    }

    /// Drops entries whose texture has been released.
    pub fn purge(&mut self) {
        self.entries.retain(|_, w| w.strong_count() > 0);
    }

    /// Loads through the process-wide cache of the calling thread.
    pub fn load_shared<P: AsRef<Path>>(path: P) -> Result<Rc<Texture>, RenderError> {
        return SHARED_CACHE.with(|cache| cache.borrow_mut().load(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checker(size: u32) -> RgbImage {
        return RgbImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
    }

    #[test]
    fn mip_chain_reaches_one_texel() {
        let texture = Texture::from_image(&checker(8));
        assert_eq!(texture.mip_count(), 4);
        let last = texture.level(3);
        assert_eq!((last.width, last.height), (1, 1));
        // A checkerboard averages to mid grey.
        assert!((texture.sample_bilinear_mipmapped(Vector2::new(0.5, 0.5), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)).x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn nearest_sample_wraps_and_mirrors() {
        let image = RgbImage::from_fn(4, 1, |x, _| Rgb([(x * 60) as u8, 0, 0]));
        let texture = Texture::from_image(&image);
        let red = |u: f32| (texture.sample(Vector2::new(u, 0.0)).x * 255.0).round() as u32;
        assert_eq!(red(0.0), 0);
        assert_eq!(red(0.5), 120);
        assert_eq!(red(1.25), 60);
        // -0.3 * 4 = -1.2 truncates to -1, abs gives texel 1.
        assert_eq!(red(-0.3), 60);
        assert_eq!(red(-0.1), 0);
    }

    #[test]
    fn bilinear_blends_neighbours() {
        let image = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let texture = Texture::from_image(&image);
        // Halfway between the two texel centers.
        let value = texture.sample_bilinear(Vector2::new(0.5, 0.25));
        assert!((value.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn mip_level_follows_footprint() {
        let texture = Texture::from_image(&checker(16));
        let one_texel = Vector2::new(1.0 / 16.0, 0.0);
        assert_eq!(texture.mip_level(Vector2::zeros(), Vector2::zeros()), 0);
        assert_eq!(texture.mip_level(one_texel * 4.0, Vector2::zeros()), 2);
        assert_eq!(texture.mip_level(one_texel * 1000.0, one_texel * 1000.0), texture.mip_count() - 1);
    }

    #[test]
    fn cache_reuses_until_last_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        checker(4).save(&path).unwrap();

        let mut cache = TextureCache::new();
        let a = cache.load(&path).unwrap();
        let b = cache.load(&path).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.live_count(), 1);
        drop(a);
        drop(b);
        assert_eq!(cache.live_count(), 0);
        cache.purge();
        assert!(cache.entries.is_empty());
        let c = cache.load(&path).unwrap();
        assert_eq!(c.width(), 4);
    }

    #[test]
    fn missing_texture_is_an_error() {
        let mut cache = TextureCache::new();
        assert!(cache.load("/definitely/not/here.png").is_err());
    }
}
