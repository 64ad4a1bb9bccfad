use na::{vector, Matrix4, Vector3};
use nalgebra as na;

use crate::geometry::{invert, transform_point, transform_vector};
use crate::pipeline::CullMode;
use crate::sampler::{Texture, TextureFilter};
use crate::shadow::ShadowMapSet;

/// Lights a scene can hold, and the number of shadow map slots.
pub const MAX_LIGHTS: usize = 8;

/// Surface parameters of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vector3<f32>, // Diffuse colour, also the unlit fill colour.
    pub ambient: f32,        // kA.
    pub shininess: f32,      // Specular exponent.
}

impl Default for Material {
    fn default() -> Self {
        return Self { color: vector![0.8, 0.8, 0.8], ambient: 0.1, shininess: 32.0 };
    }
}

impl Material {
    pub fn new(color: Vector3<f32>) -> Self {
        return Self { color, ..Default::default() };
    }
}

/// Light source type. Spot cone angles are half-angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    Spot { inner: f32, outer: f32 },
}

/// Light in world space. `direction` is the direction the light travels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub enabled: bool,
    pub casts_shadow: bool,
}

impl Light {
    pub fn directional(direction: Vector3<f32>, color: Vector3<f32>) -> Self {
        return Self {
            kind: LightKind::Directional,
            position: Vector3::zeros(),
            direction: direction.normalize(),
            diffuse: color,
            specular: color,
            enabled: true,
            casts_shadow: true,
        };
    }

    pub fn point(position: Vector3<f32>, color: Vector3<f32>) -> Self {
        return Self {
            kind: LightKind::Point,
            position,
            direction: vector![0.0, -1.0, 0.0],
            ..Self::directional(vector![0.0, -1.0, 0.0], color)
        };
    }

    pub fn spot(position: Vector3<f32>, direction: Vector3<f32>, inner: f32, outer: f32, color: Vector3<f32>) -> Self {
        assert!(inner <= outer, "spot inner angle {} wider than outer angle {}", inner, outer);
        return Self {
            kind: LightKind::Spot { inner, outer },
            position,
            ..Self::directional(direction, color)
        };
    }

    pub fn with_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        return self;
    }
}

/// A light prepared for one draw call: camera-space position/direction and cone cosines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightUniform {
    pub index: usize, // Slot in the scene's light list, used for the shadow map lookup.
    pub kind: LightKind,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub cos_inner: f32,
    pub cos_outer: f32,
    pub casts_shadow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FogMode {
    #[default]
    None,
    Linear { start: f32, end: f32 },
    Exp { density: f32 },
    Exp2 { density: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub mode: FogMode,
    pub color: Vector3<f32>,
}

impl Default for Fog {
    fn default() -> Self {
        return Self { mode: FogMode::None, color: vector![0.5, 0.5, 0.5] };
    }
}

/// Constants of one draw call. Built once per object per frame and only read while
/// rasterizing.
pub struct Uniforms<'a> {
    pub view: Matrix4<f32>,
    pub model_view: Matrix4<f32>,
    pub model_view_projection: Matrix4<f32>,
    pub normal_matrix: Matrix4<f32>, // Inverse transpose of `model_view`.
    pub camera_to_world: Matrix4<f32>,
    pub lights: Vec<LightUniform>,
    pub material: Material,
    pub fog: Fog,
    pub texture: Option<&'a Texture>,
    pub texture_filter: TextureFilter,
    pub shadows: Option<&'a ShadowMapSet>,
    pub cull: CullMode,
    pub backface_lighting: bool,
    pub perspective_correct: bool,
    pub object_id: u32, // Written to the id buffer, 0 means no object.
    pub wire_color: Vector3<f32>,
}

impl<'a> Uniforms<'a> {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        let model_view = view * model;
        return Self {
            view,
            model_view,
            model_view_projection: projection * model_view,
            normal_matrix: invert(&model_view).transpose(),
            camera_to_world: invert(&view),
            lights: Vec::new(),
            material: Material::default(),
            fog: Fog::default(),
            texture: None,
            texture_filter: TextureFilter::default(),
            shadows: None,
            cull: CullMode::None,
            backface_lighting: false,
            perspective_correct: true,
            object_id: 0,
            wire_color: vector![1.0, 1.0, 1.0],
        };
    }

    /// Moves the enabled lights into camera space. Light indices are kept so shadow maps can be
    /// found again.
    pub fn set_lights(&mut self, lights: &[Light]) {
        assert!(lights.len() <= MAX_LIGHTS, "{} lights, at most {} supported", lights.len(), MAX_LIGHTS);
        self.lights.clear();
        for (index, light) in lights.iter().enumerate().filter(|(_, l)| l.enabled) {
            let (cos_inner, cos_outer) = match light.kind {
                LightKind::Spot { inner, outer } => (inner.cos(), outer.cos()),
                _ => (-1.0, -1.0),
            };
            self.lights.push(LightUniform {
                index,
                kind: light.kind,
                position: transform_point(&self.view, light.position),
                direction: transform_vector(&self.view, light.direction).normalize(),
                diffuse: light.diffuse,
                specular: light.specular,
                cos_inner,
                cos_outer,
                casts_shadow: light.casts_shadow,
            });
        }
    }
}
