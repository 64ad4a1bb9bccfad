//! Typed 2D buffers: packed colour, depth and object-ID.

use image::{Rgb, RgbImage};
use na::{vector, Vector3};
use nalgebra as na;

/// Struct, representing raw rgb8 pixel data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        return Color { r, g, b };
    }

    /// Converts a [0, 1] float colour, clamping each channel.
    pub fn from_vector(v: Vector3<f32>) -> Color {
        fn channel(c: f32) -> u8 {
            return (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        return Color {
            r: channel(v.x),
            g: channel(v.y),
            b: channel(v.z),
        };
    }

    pub fn to_vector(self) -> Vector3<f32> {
        return vector![self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0];
    }

    /// Get convex combination of two colors: t * c_1 + (1 - t) * c_2.
    pub fn blend(color_1: Color, color_2: Color, t: f32) -> Color {
        return Color::from_vector(color_1.to_vector() * t + color_2.to_vector() * (1.0 - t));
    }
}

/// Row-major 2D buffer over a pixel type.
///
/// The logical size can be smaller than the storage: `allocate` only reallocates when a
/// dimension grows beyond the current capacity, so shrinking a viewport never frees memory.
#[derive(Debug, Clone)]
pub struct Buffer2D<T: Copy> {
    width: usize,
    height: usize,
    stride: usize,     // Row length of the storage.
    capacity_rows: usize,
    data: Vec<T>,
    fill: T,           // Value for newly allocated cells.
}

pub type ColorBuffer = Buffer2D<Color>;
pub type DepthBuffer = Buffer2D<f32>;
pub type IdBuffer = Buffer2D<u32>;

impl<T: Copy> Buffer2D<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        return Self {
            width,
            height,
            stride: width,
            capacity_rows: height,
            data: vec![fill; width * height],
            fill,
        };
    }

    pub fn width(&self) -> usize {
        return self.width;
    }

    pub fn height(&self) -> usize {
        return self.height;
    }

    /// Storage dimensions, at least the logical size.
    pub fn capacity(&self) -> (usize, usize) {
        return (self.stride, self.capacity_rows);
    }

    /// Sets the logical size, growing storage only if a dimension exceeds the capacity.
    /// Returns true if the storage was reallocated. Contents are unspecified afterwards.
    pub fn allocate(&mut self, width: usize, height: usize) -> bool {
        self.width = width;
        self.height = height;
        if width <= self.stride && height <= self.capacity_rows {
            return false;
        }
        self.stride = self.stride.max(width);
        self.capacity_rows = self.capacity_rows.max(height);
        self.data = vec![self.fill; self.stride * self.capacity_rows];
        return true;
    }

    /// Fills every cell of the storage.
    pub fn clear(&mut self, value: T) {
        self.data.fill(value);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height, "buffer access ({}, {}) outside {}x{}", x, y, self.width, self.height);
        return y * self.stride + x;
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        return self.data[self.index(x, y)];
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let index = self.index(x, y);
        self.data[index] = value;
    }

    /// One logical row.
    pub fn row(&self, y: usize) -> &[T] {
        let start = self.index(0, y);
        return &self.data[start..start + self.width];
    }
}

impl DepthBuffer {
    pub fn new_depth(width: usize, height: usize) -> Self {
        return Buffer2D::new(width, height, f32::INFINITY);
    }

    /// Writes `depth` and returns true only if it is strictly closer than the stored value.
    /// Ties keep the existing value, so the first writer at equal depth wins.
    #[inline]
    pub fn z_test(&mut self, x: usize, y: usize, depth: f32) -> bool {
        let index = self.index(x, y);
        if depth < self.data[index] {
            self.data[index] = depth;
            return true;
        }
        return false;
    }

    /// Get image, representing depth values.
    /// Finite depths are normalized to [32, 255] (closer is brighter), empty cells are black.
    pub fn visualize(&self) -> RgbImage {
        let mut z_min = f32::MAX;
        let mut z_max = f32::MIN;
        for y in 0..self.height {
            for &z in self.row(y).iter().filter(|z| z.is_finite()) {
                z_min = z_min.min(z);
                z_max = z_max.max(z);
            }
        }
        let scale = if z_max > z_min { z_max - z_min } else { 1.0 };

        let mut image = RgbImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for (x, &z) in self.row(y).iter().enumerate() {
                let gray = if z.is_finite() { (255.0 - 223.0 * (z - z_min) / scale) as u8 } else { 0 };
                image.put_pixel(x as u32, y as u32, Rgb([gray, gray, gray]));
            }
        }
        return image;
    }
}

impl ColorBuffer {
    pub fn new_color(width: usize, height: usize) -> Self {
        return Buffer2D::new(width, height, Color::BLACK);
    }

    pub fn to_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for (x, c) in self.row(y).iter().enumerate() {
                image.put_pixel(x as u32, y as u32, Rgb([c.r, c.g, c.b]));
            }
        }
        return image;
    }
}

impl IdBuffer {
    pub fn new_ids(width: usize, height: usize) -> Self {
        return Buffer2D::new(width, height, 0);
    }

    /// False-colour view of the IDs, 0 stays black.
    pub fn visualize(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for (x, &id) in self.row(y).iter().enumerate() {
                let rgb = if id == 0 {
                    [0, 0, 0]
                } else {
                    // Knuth multiplicative hash spreads neighbouring ids apart.
                    let h = id.wrapping_mul(2654435761);
                    [(h >> 24) as u8 | 0x40, (h >> 16) as u8 | 0x40, (h >> 8) as u8 | 0x40]
                };
                image.put_pixel(x as u32, y as u32, Rgb(rgb));
            }
        }
        return image;
    }
}
