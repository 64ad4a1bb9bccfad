use na::Vector3;
use nalgebra as na;

use super::uniforms::{Fog, FogMode, LightKind, LightUniform, Uniforms};
use crate::geometry::{reflect, transform_point};

/// Linear falloff between the outer and inner cone cosines, 1 for non-spot lights.
pub fn spot_attenuation(light: &LightUniform, to_light: Vector3<f32>) -> f32 {
    if !matches!(light.kind, LightKind::Spot { .. }) {
        return 1.0;
    }
    let cos_angle = (-to_light).dot(&light.direction);
    if cos_angle < light.cos_outer {
        return 0.0;
    }
    if cos_angle >= light.cos_inner || light.cos_inner <= light.cos_outer {
        return 1.0;
    }
    return (cos_angle - light.cos_outer) / (light.cos_inner - light.cos_outer);
}

/// Ambient, diffuse and specular terms of every bound light at a camera-space point,
/// clamped to [0, 1] per channel.
pub fn do_lighting(
    uniforms: &Uniforms,
    object_color: Vector3<f32>,
    position: Vector3<f32>,
    normal: Vector3<f32>,
    back_facing: bool,
) -> Vector3<f32> {
    let mut color = object_color * uniforms.material.ambient;
    if back_facing && !uniforms.backface_lighting {
        return clamp_color(color);
    }
    let normal = if back_facing { -normal } else { normal }.normalize();
    let to_eye = (-position).normalize();
    let mut world = None;

    for light in &uniforms.lights {
        let to_light = match light.kind {
            LightKind::Directional => -light.direction,
            _ => (light.position - position).normalize(),
        };
        let spot = spot_attenuation(light, to_light);
        if spot <= 0.0 {
            continue;
        }
        let n_dot_l = normal.dot(&to_light);
        if n_dot_l <= 0.0 {
            continue;
        }

        let mut shadow = 1.0;
        if light.casts_shadow {
            if let Some(shadows) = uniforms.shadows {
                let world = *world.get_or_insert_with(|| transform_point(&uniforms.camera_to_world, position));
                shadow = shadows.shadow_factor(light.index, world);
            }
        }
        color += object_color.component_mul(&light.diffuse) * n_dot_l * spot * shadow;

        let reflected = reflect(-to_light, normal);
        let r_dot_v = reflected.dot(&to_eye).max(0.0);
        color += light.specular * r_dot_v.powf(uniforms.material.shininess) * spot;
    }
    return clamp_color(color);
}

/// Blends towards the fog colour by camera distance `depth`.
pub fn apply_fog(fog: &Fog, color: Vector3<f32>, depth: f32) -> Vector3<f32> {
    let visibility = match fog.mode {
        FogMode::None => return color,
        FogMode::Linear { start, end } => ((end - depth) / (end - start)).clamp(0.0, 1.0),
        FogMode::Exp { density } => (-density * depth).exp(),
        FogMode::Exp2 { density } => (-(density * depth).powi(2)).exp(),
    };
    return color * visibility + fog.color * (1.0 - visibility);
}

fn clamp_color(color: Vector3<f32>) -> Vector3<f32> {
    return color.map(|c| c.clamp(0.0, 1.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::Light;
    use na::{vector, Matrix4};

    fn uniforms_with(light: Light) -> Uniforms<'static> {
        let mut uniforms = Uniforms::new(Matrix4::identity(), Matrix4::identity(), Matrix4::identity());
        uniforms.material.ambient = 0.1;
        uniforms.material.shininess = 8.0;
        uniforms.set_lights(&[light]);
        return uniforms;
    }

    #[test]
    fn head_on_light_gives_full_diffuse() {
        let mut light = Light::directional(vector![0.0, 0.0, -1.0], vector![1.0, 1.0, 1.0]);
        light.specular = Vector3::zeros();
        let uniforms = uniforms_with(light);
        let color = do_lighting(&uniforms, vector![0.5, 0.25, 0.0], vector![0.0, 0.0, -3.0], vector![0.0, 0.0, 1.0], false);
        assert!((color - vector![0.55, 0.275, 0.0]).norm() < 1e-5);
    }

    #[test]
    fn back_face_without_backface_lighting_is_ambient_only() {
        let uniforms = uniforms_with(Light::directional(vector![0.0, 0.0, 1.0], vector![1.0, 1.0, 1.0]));
        let color = do_lighting(&uniforms, vector![1.0, 1.0, 1.0], vector![0.0, 0.0, -3.0], vector![0.0, 0.0, 1.0], true);
        assert!((color - vector![0.1, 0.1, 0.1]).norm() < 1e-6);
    }

    #[test]
    fn no_specular_on_the_unlit_side() {
        let light = Light::directional(vector![0.0, 0.0, 1.0], vector![1.0, 1.0, 1.0]);
        let uniforms = uniforms_with(light);
        let color = do_lighting(&uniforms, Vector3::zeros(), vector![0.0, 0.0, -3.0], vector![0.0, 0.0, 1.0], false);
        assert_eq!(color, Vector3::zeros());
    }

    #[test]
    fn spot_cone_falls_off_linearly() {
        let light = Light::spot(Vector3::zeros(), vector![0.0, 0.0, -1.0], 0.1, 0.3, vector![1.0, 1.0, 1.0]);
        let uniforms = uniforms_with(light);
        let l = &uniforms.lights[0];
        assert_eq!(spot_attenuation(l, vector![0.0, 0.0, 1.0]), 1.0);
        let outside = vector![0.5f32.sin(), 0.0, 0.5f32.cos()];
        assert_eq!(spot_attenuation(l, outside), 0.0);
        let between = vector![0.2f32.sin(), 0.0, 0.2f32.cos()];
        let t = spot_attenuation(l, between);
        assert!(t > 0.0 && t < 1.0);
    }

    #[test]
    fn fog_modes_blend_towards_fog_color() {
        let mut fog = Fog { mode: FogMode::Linear { start: 10.0, end: 20.0 }, color: vector![1.0, 1.0, 1.0] };
        let black = Vector3::zeros();
        assert_eq!(apply_fog(&fog, black, 5.0), black);
        assert!((apply_fog(&fog, black, 15.0) - vector![0.5, 0.5, 0.5]).norm() < 1e-6);
        assert_eq!(apply_fog(&fog, black, 30.0), vector![1.0, 1.0, 1.0]);
        fog.mode = FogMode::Exp { density: 0.1 };
        let exp = apply_fog(&fog, black, 10.0).x;
        fog.mode = FogMode::Exp2 { density: 0.1 };
        let exp2 = apply_fog(&fog, black, 10.0).x;
        assert!((exp - (1.0 - (-1.0f32).exp())).abs() < 1e-6);
        assert!((exp2 - exp).abs() < 1e-6);
        fog.mode = FogMode::None;
        assert_eq!(apply_fog(&fog, black, 100.0), black);
    }
}
