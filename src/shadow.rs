//! Shadow map generation: light-space cameras fitted to the casters' bounding sphere,
//! depth-only renders per light (six for point lights) and the lazily rebuilt map set.

use log::debug;
use na::{matrix, vector, Matrix4, Vector3};
use nalgebra as na;

use crate::geometry::{look_at, orthographic, perspective, BoundingBox};
use crate::mesh::Mesh;
use crate::pipeline::{CullMode, Rasterizer, RenderTarget};
use crate::sampler::{CubeShadowMap, LightShadow, ShadowFilter, ShadowMap};
use crate::shading::{Light, LightKind, ShaderProgram, Uniforms, MAX_LIGHTS};

/// Clip space to shadow texture space: x, y from [-1, 1] to [0, 1] with v pointing down,
/// depth unchanged.
pub const TEXTURE_BIAS: Matrix4<f32> = matrix![0.5, 0.0,  0.0, 0.5;
                                              0.0, -0.5, 0.0, 0.5;
                                              0.0, 0.0,  1.0, 0.0;
                                              0.0, 0.0,  0.0, 1.0];

/// Field of view of each cube face, slightly wider than 90° so filter taps near a face
/// border still land inside the map.
pub const CUBE_FACE_FOV: f32 = (90.0 + 2.0) * std::f32::consts::PI / 180.0;

/// Widest spot frustum used when the light sits inside the scene.
const MAX_SPOT_FOV: f32 = 170.0 * std::f32::consts::PI / 180.0;

/// Cube face view axes in +X, -X, +Y, -Y, +Z, -Z order.
const CUBE_AXES: [Vector3<f32>; 6] = [
    vector![1.0, 0.0, 0.0],
    vector![-1.0, 0.0, 0.0],
    vector![0.0, 1.0, 0.0],
    vector![0.0, -1.0, 0.0],
    vector![0.0, 0.0, 1.0],
    vector![0.0, 0.0, -1.0],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub resolution: usize, // Texels per side of every map.
    pub bias: f32,         // Subtracted from the tested depth.
    pub filter: ShadowFilter,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        return Self { resolution: 512, bias: 0.005, filter: ShadowFilter::default() };
    }
}

/// Up vector for a light camera: world Y unless the view direction is within 45° of it.
pub fn choose_up(direction: Vector3<f32>) -> Vector3<f32> {
    if direction.normalize().dot(&Vector3::y()).abs() > std::f32::consts::FRAC_1_SQRT_2 {
        return Vector3::x();
    }
    return Vector3::y();
}

/// `(view, projection)` pairs of the depth renders needed for `light`, fitted to the sphere
/// `(center, radius)` enclosing every shadow caster. One pair, or six for point lights.
pub fn light_frusta(light: &Light, center: Vector3<f32>, radius: f32) -> Vec<(Matrix4<f32>, Matrix4<f32>)> {
    let radius = radius.max(1e-3);
    if light.kind == LightKind::Directional {
        let direction = light.direction.normalize();
        let eye = center - direction * 2.0 * radius;
        let view = look_at(eye, center, choose_up(direction));
        let projection = orthographic(-radius, radius, -radius, radius, radius, 3.0 * radius);
        return vec![(view, projection)];
    }

    let to_center = center - light.position;
    let distance = to_center.norm();
    let outside = distance > radius;
    let far = distance + radius;
    let near = if outside { (distance - radius).max(radius / 20.0) } else { radius / 20.0 };

    if let LightKind::Spot { outer, .. } = light.kind {
        let (direction, fov) = if outside {
            (to_center / distance, 2.0 * (radius / distance).asin())
        } else {
            (light.direction.normalize(), (2.0 * outer).min(MAX_SPOT_FOV))
        };
        let view = look_at(light.position, light.position + direction, choose_up(direction));
        return vec![(view, perspective(fov, 1.0, near, far))];
    }

    let projection = perspective(CUBE_FACE_FOV, 1.0, near, far);
    return CUBE_AXES
        .iter()
        .map(|&axis| (look_at(light.position, light.position + axis, choose_up(axis)), projection))
        .collect();
}

/// Shadow maps of every shadow-casting light. Marked invalid whenever something they depend
/// on changes and rebuilt on the next `ensure`.
pub struct ShadowMapSet {
    settings: ShadowSettings,
    maps: Vec<Option<LightShadow>>,
    valid: bool,
    rasterizer: Rasterizer,
}

impl Default for ShadowMapSet {
    fn default() -> Self {
        return Self::new(ShadowSettings::default());
    }
}

impl ShadowMapSet {
    pub fn new(settings: ShadowSettings) -> Self {
        return Self { settings, maps: Vec::new(), valid: false, rasterizer: Rasterizer::new() };
    }

    pub fn settings(&self) -> ShadowSettings {
        return self.settings;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        return self.valid;
    }

    pub fn set_settings(&mut self, settings: ShadowSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.invalidate();
        }
    }

    /// Rebuilds the maps if they were invalidated. Returns true when a rebuild happened.
    pub fn ensure(&mut self, lights: &[Light], casters: &[(&Mesh, Matrix4<f32>)]) -> bool {
        if self.valid {
            return false;
        }
        self.rebuild(lights, casters);
        return true;
    }

    /// Renders the depth maps of every enabled shadow-casting light from scratch.
    pub fn rebuild(&mut self, lights: &[Light], casters: &[(&Mesh, Matrix4<f32>)]) {
        assert!(lights.len() <= MAX_LIGHTS, "{} lights, at most {} supported", lights.len(), MAX_LIGHTS);
        self.maps.clear();
        self.valid = true;

        let mut bounds = BoundingBox::empty();
        for (mesh, model) in casters {
            bounds = bounds.union(&mesh.compute_bounds().transform(model));
        }
        if bounds.is_empty() {
            debug!("shadow rebuild: no casters");
            return;
        }
        let (center, radius) = (bounds.center(), bounds.radius());

        for light in lights {
            if !light.enabled || !light.casts_shadow {
                self.maps.push(None);
                continue;
            }
            let mut faces: Vec<ShadowMap> = light_frusta(light, center, radius)
                .into_iter()
                .map(|(view, projection)| self.render_depth(view, projection, casters))
                .collect();
            let shadow = match faces.len() {
                1 => LightShadow::Planar(faces.remove(0)),
                _ => LightShadow::Cube(CubeShadowMap::new(light.position, faces)),
            };
            self.maps.push(Some(shadow));
        }
        debug!(
            "shadow rebuild: {} maps at {}x{} for {} casters",
            self.maps.iter().flatten().map(|s| s.maps().len()).sum::<usize>(),
            self.settings.resolution,
            self.settings.resolution,
            casters.len()
        );
    }

    /// Depth-only render of every caster from one light camera.
    fn render_depth(&mut self, view: Matrix4<f32>, projection: Matrix4<f32>, casters: &[(&Mesh, Matrix4<f32>)]) -> ShadowMap {
        let mut map = ShadowMap::new(self.settings.resolution, TEXTURE_BIAS * projection * view, self.settings.bias);
        let program = ShaderProgram::Unlit;
        let mut target = RenderTarget::depth_only(&mut map.depth);
        for (mesh, model) in casters {
            let mut uniforms = Uniforms::new(*model, view, projection);
            uniforms.cull = CullMode::None;
            self.rasterizer.draw_mesh(&mut target, &program, &uniforms, mesh);
        }
        self.rasterizer.take_stats();
        return map;
    }

    /// Shadow data of light `light`, if it casts one.
    pub fn sampler(&self, light: usize) -> Option<&LightShadow> {
        return self.maps.get(light).and_then(|m| m.as_ref());
    }

    /// Lit fraction of `world` as seen from light `light`; 1 without a map.
    pub fn shadow_factor(&self, light: usize, world: Vector3<f32>) -> f32 {
        return match self.sampler(light) {
            Some(shadow) => shadow.shadow_factor(world, self.settings.filter),
            None => 1.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::transform_point;

    #[test]
    fn up_vector_avoids_parallel_directions() {
        assert_eq!(choose_up(vector![0.0, -1.0, 0.0]), Vector3::x());
        assert_eq!(choose_up(vector![1.0, -0.5, 0.0]), Vector3::y());
    }

    #[test]
    fn directional_frustum_contains_the_sphere() {
        let light = Light::directional(vector![0.0, -1.0, 0.0], vector![1.0, 1.0, 1.0]);
        let frusta = light_frusta(&light, vector![1.0, 0.0, 0.0], 2.0);
        assert_eq!(frusta.len(), 1);
        let (view, projection) = frusta[0];
        let clip = projection * view;
        for p in [vector![3.0, 0.0, 0.0], vector![1.0, 2.0, 0.0], vector![1.0, -2.0, 0.0], vector![1.0, 0.0, -2.0]] {
            let ndc = transform_point(&clip, p);
            assert!(ndc.abs().max() <= 1.0 + 1e-5, "{:?} outside", ndc);
        }
    }

    #[test]
    fn point_light_gets_six_faces() {
        let light = Light::point(vector![0.0, 5.0, 0.0], vector![1.0, 1.0, 1.0]);
        let frusta = light_frusta(&light, Vector3::zeros(), 1.0);
        assert_eq!(frusta.len(), 6);
        // The -Y face sees the scene centre in the middle of its map.
        let (view, projection) = frusta[3];
        let ndc = transform_point(&(projection * view), Vector3::zeros());
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn outside_spot_looks_at_the_sphere() {
        let light = Light::spot(vector![0.0, 0.0, 10.0], vector![0.0, 0.0, -1.0], 0.1, 0.2, vector![1.0, 1.0, 1.0]);
        let (view, projection) = light_frusta(&light, vector![0.0, 0.0, 0.0], 2.0)[0];
        let clip = projection * view;
        let near = transform_point(&clip, vector![0.0, 0.0, 2.0]);
        let far = transform_point(&clip, vector![0.0, 0.0, -2.0]);
        assert!((near.z + 1.0).abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn settings_change_invalidates() {
        let mut set = ShadowMapSet::default();
        set.ensure(&[], &[]);
        assert!(set.is_valid());
        set.set_settings(set.settings());
        assert!(set.is_valid());
        set.set_settings(ShadowSettings { resolution: 64, ..Default::default() });
        assert!(!set.is_valid());
    }

    #[test]
    fn floor_under_a_cube_is_shadowed() {
        let cube = Mesh::cube(1.0);
        let floor = Mesh::quad(4.0, 4.0);
        let floor_model = Matrix4::new_translation(&vector![0.0, -1.0, 0.0])
            * Matrix4::from_axis_angle(&Vector3::x_axis(), -std::f32::consts::FRAC_PI_2);
        let light = Light::directional(vector![0.0, -1.0, 0.0], vector![1.0, 1.0, 1.0]);
        let mut set = ShadowMapSet::new(ShadowSettings { resolution: 128, bias: 0.01, filter: ShadowFilter::Point });
        assert!(set.ensure(&[light], &[(&cube, Matrix4::identity()), (&floor, floor_model)]));
        assert!(!set.ensure(&[light], &[]));
        assert_eq!(set.shadow_factor(0, vector![0.0, -1.0, 0.0]), 0.0);
        assert_eq!(set.shadow_factor(0, vector![3.0, -1.0, 3.0]), 1.0);
        assert_eq!(set.shadow_factor(0, vector![0.0, 0.5, 0.0]), 1.0);
        assert_eq!(set.shadow_factor(1, vector![0.0, -1.0, 0.0]), 1.0);
    }
}
