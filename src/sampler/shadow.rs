use na::{Matrix4, Vector3};
use nalgebra as na;

use crate::framebuffer::DepthBuffer;

/// Poisson-disk tap offsets in texels before scaling by `POISSON_SPREAD`.
pub const POISSON_DISK: [(f32, f32); 4] = [
    (-0.94201624, -0.39906216),
    (0.94558609, -0.76890725),
    (-0.094184101, -0.92938870),
    (0.34495938, 0.29387760),
];

/// Scale of the Poisson-disk offsets, in texels.
pub const POISSON_SPREAD: f32 = 1.5;

/// Filtering applied when sampling a shadow map. Kernel sizes are in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowFilter {
    Point,
    Pcf(usize),
    Poisson,
    PoissonPcf(usize),
}

impl Default for ShadowFilter {
    fn default() -> Self {
        return ShadowFilter::Pcf(3);
    }
}

/// Depth-only render from a light plus the world-to-texture matrix used to look it up.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    pub depth: DepthBuffer,
    pub matrix: Matrix4<f32>, // World position -> (texel u, texel v, depth) before the w divide.
    pub bias: f32,
}

impl ShadowMap {
    /// `matrix` must map world space to texture space, where x/y in [0, 1] cover the map.
    pub fn new(size: usize, matrix: Matrix4<f32>, bias: f32) -> Self {
        return Self { depth: DepthBuffer::new_depth(size, size), matrix, bias };
    }

    pub fn size(&self) -> usize {
        return self.depth.width();
    }

    /// Texel-space coordinates and biased test depth of a world position, or None if the
    /// position is behind the light.
    pub fn project(&self, world: Vector3<f32>) -> Option<Vector3<f32>> {
        let p = self.matrix * world.push(1.0);
        if p.w <= 0.0 {
            return None;
        }
        let size = self.size() as f32;
        return Some(Vector3::new(p.x / p.w * size, p.y / p.w * size, p.z / p.w - self.bias));
    }

    /// Binary depth comparison against one texel. Outside the map counts as lit.
    pub fn sample(&self, coord: Vector3<f32>) -> f32 {
        let x = coord.x.floor();
        let y = coord.y.floor();
        let size = self.size() as f32;
        if x < 0.0 || y < 0.0 || x >= size || y >= size {
            return 1.0;
        }
        return self.compare(x as usize, y as usize, coord.z);
    }

    #[inline]
    fn compare(&self, x: usize, y: usize, depth: f32) -> f32 {
        return if self.depth.get(x, y) >= depth { 1.0 } else { 0.0 };
    }

    /// Percentage-closer filtering over a `kernel` x `kernel` window, clamped to the map.
    pub fn sample_pcf(&self, coord: Vector3<f32>, kernel: usize) -> f32 {
        let kernel = kernel.max(1) as i64;
        let cx = coord.x.floor() as i64;
        let cy = coord.y.floor() as i64;
        let size = self.size() as i64;
        if cx < 0 || cy < 0 || cx >= size || cy >= size {
            return 1.0;
        }
        let x0 = (cx - kernel / 2).max(0);
        let y0 = (cy - kernel / 2).max(0);
        let x1 = (cx - kernel / 2 + kernel - 1).min(size - 1);
        let y1 = (cy - kernel / 2 + kernel - 1).min(size - 1);

        let mut lit = 0.0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                lit += self.compare(x as usize, y as usize, coord.z);
            }
        }
        let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f32;
        return lit / count;
    }

    fn poisson_taps(coord: Vector3<f32>) -> impl Iterator<Item = Vector3<f32>> {
        return POISSON_DISK
            .into_iter()
            .map(move |(dx, dy)| Vector3::new(coord.x + dx * POISSON_SPREAD, coord.y + dy * POISSON_SPREAD, coord.z));
    }

    /// Average of the fixed Poisson-disk taps around the sample.
    pub fn sample_poisson(&self, coord: Vector3<f32>) -> f32 {
        let sum: f32 = Self::poisson_taps(coord).map(|tap| self.sample(tap)).sum();
        return sum / POISSON_DISK.len() as f32;
    }

    /// Poisson-disk taps, each PCF filtered.
    pub fn sample_poisson_pcf(&self, coord: Vector3<f32>, kernel: usize) -> f32 {
        let sum: f32 = Self::poisson_taps(coord).map(|tap| self.sample_pcf(tap, kernel)).sum();
        return sum / POISSON_DISK.len() as f32;
    }

    pub fn sample_filtered(&self, coord: Vector3<f32>, filter: ShadowFilter) -> f32 {
        return match filter {
            ShadowFilter::Point => self.sample(coord),
            ShadowFilter::Pcf(kernel) => self.sample_pcf(coord, kernel),
            ShadowFilter::Poisson => self.sample_poisson(coord),
            ShadowFilter::PoissonPcf(kernel) => self.sample_poisson_pcf(coord, kernel),
        };
    }

    /// Lit fraction of a world position.
    pub fn shadow_factor(&self, world: Vector3<f32>, filter: ShadowFilter) -> f32 {
        return match self.project(world) {
            Some(coord) => self.sample_filtered(coord, filter),
            None => 1.0,
        };
    }
}

/// Six shadow maps around a point light, ordered +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone)]
pub struct CubeShadowMap {
    pub origin: Vector3<f32>,
    pub faces: Vec<ShadowMap>,
}

impl CubeShadowMap {
    pub fn new(origin: Vector3<f32>, faces: Vec<ShadowMap>) -> Self {
        assert_eq!(faces.len(), 6, "cube shadow map needs 6 faces");
        return Self { origin, faces };
    }

    /// Face whose axis dominates `direction` (light to surface).
    pub fn select_face(direction: Vector3<f32>) -> usize {
        let a = direction.abs();
        if a.x >= a.y && a.x >= a.z {
            return if direction.x >= 0.0 { 0 } else { 1 };
        }
        if a.y >= a.z {
            return if direction.y >= 0.0 { 2 } else { 3 };
        }
        return if direction.z >= 0.0 { 4 } else { 5 };
    }

    pub fn face_for(&self, world: Vector3<f32>) -> &ShadowMap {
        return &self.faces[Self::select_face(world - self.origin)];
    }

    pub fn sample(&self, world: Vector3<f32>) -> f32 {
        return self.shadow_factor(world, ShadowFilter::Point);
    }

    pub fn sample_pcf(&self, world: Vector3<f32>, kernel: usize) -> f32 {
        return self.shadow_factor(world, ShadowFilter::Pcf(kernel));
    }

    pub fn sample_poisson(&self, world: Vector3<f32>) -> f32 {
        return self.shadow_factor(world, ShadowFilter::Poisson);
    }

    pub fn sample_poisson_pcf(&self, world: Vector3<f32>, kernel: usize) -> f32 {
        return self.shadow_factor(world, ShadowFilter::PoissonPcf(kernel));
    }

    pub fn shadow_factor(&self, world: Vector3<f32>, filter: ShadowFilter) -> f32 {
        return self.face_for(world).shadow_factor(world, filter);
    }
}

/// Shadow data generated for one light.
#[derive(Debug, Clone)]
pub enum LightShadow {
    Planar(ShadowMap),
    Cube(CubeShadowMap),
}

impl LightShadow {
    pub fn shadow_factor(&self, world: Vector3<f32>, filter: ShadowFilter) -> f32 {
        return match self {
            LightShadow::Planar(map) => map.shadow_factor(world, filter),
            LightShadow::Cube(cube) => cube.shadow_factor(world, filter),
        };
    }

    pub fn maps(&self) -> &[ShadowMap] {
        return match self {
            LightShadow::Planar(map) => std::slice::from_ref(map),
            LightShadow::Cube(cube) => &cube.faces,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x8 map whose left half holds an occluder at depth 0.2, right half is empty.
    fn half_occluded_map() -> ShadowMap {
        let mut map = ShadowMap::new(8, Matrix4::identity(), 0.0);
        for y in 0..8 {
            for x in 0..4 {
                map.depth.set(x, y, 0.2);
            }
        }
        return map;
    }

    #[test]
    fn point_sample_compares_stored_depth() {
        let map = half_occluded_map();
        assert_eq!(map.sample(Vector3::new(1.5, 1.5, 0.5)), 0.0);
        assert_eq!(map.sample(Vector3::new(1.5, 1.5, 0.1)), 1.0);
        assert_eq!(map.sample(Vector3::new(6.5, 1.5, 0.5)), 1.0);
        // Equal depth is lit.
        assert_eq!(map.sample(Vector3::new(1.5, 1.5, 0.2)), 1.0);
        assert_eq!(map.sample(Vector3::new(-1.0, 1.5, 0.5)), 1.0);
    }

    #[test]
    fn pcf_of_one_texel_equals_point_sample() {
        let map = half_occluded_map();
        for x in 0..8 {
            for &z in &[0.1, 0.2, 0.9] {
                let coord = Vector3::new(x as f32 + 0.3, 4.7, z);
                assert_eq!(map.sample_pcf(coord, 1), map.sample(coord));
            }
        }
    }

    #[test]
    fn pcf_averages_the_window() {
        let map = half_occluded_map();
        // Window x 3..=5: one shadowed column of three.
        let value = map.sample_pcf(Vector3::new(4.5, 4.5, 0.5), 3);
        assert!((value - 2.0 / 3.0).abs() < 1e-6);
        // Clamped at the corner: window 0..=1 x 0..=1, all shadowed.
        assert_eq!(map.sample_pcf(Vector3::new(0.5, 0.5, 0.5), 3), 0.0);
        let wide = map.sample_pcf(Vector3::new(4.0, 4.0, 0.5), 5);
        assert!((0.0..=1.0).contains(&wide));
    }

    #[test]
    fn poisson_samples_stay_in_unit_range() {
        let map = half_occluded_map();
        let edge = map.sample_poisson(Vector3::new(4.0, 4.0, 0.5));
        assert!(edge > 0.0 && edge < 1.0);
        assert_eq!(map.sample_poisson(Vector3::new(1.5, 4.0, 0.5)), 0.0);
        let filtered = map.sample_poisson_pcf(Vector3::new(4.0, 4.0, 0.5), 3);
        assert!((0.0..=1.0).contains(&filtered));
    }

    #[test]
    fn select_face_picks_dominant_axis() {
        assert_eq!(CubeShadowMap::select_face(Vector3::new(2.0, 1.0, -1.0)), 0);
        assert_eq!(CubeShadowMap::select_face(Vector3::new(-2.0, 1.0, -1.0)), 1);
        assert_eq!(CubeShadowMap::select_face(Vector3::new(0.1, 3.0, -1.0)), 2);
        assert_eq!(CubeShadowMap::select_face(Vector3::new(0.1, -3.0, -1.0)), 3);
        assert_eq!(CubeShadowMap::select_face(Vector3::new(0.1, 0.0, 5.0)), 4);
        assert_eq!(CubeShadowMap::select_face(Vector3::new(0.1, 0.0, -5.0)), 5);
    }
}
