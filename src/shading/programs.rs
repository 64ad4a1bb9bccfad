use na::{Vector2, Vector3};
use nalgebra as na;

use super::lighting::{apply_fog, do_lighting};
use super::uniforms::Uniforms;
use crate::framebuffer::Color;
use crate::geometry::{to_hom_point, transform_point, transform_vector};
use crate::mesh::{Face, MeshVertex};
use crate::pipeline::{AttributeLayout, Fragment, TransformedVertex};

/// The closed set of vertex/pixel shader pairs.
///
/// Attribute slots per program (flat first, then smooth, then no-perspective):
/// - `Flat`: front colour, back colour | camera position, uv
/// - `Gouraud`: camera position, uv | front colour, back colour
/// - `Phong`: camera position, camera normal, uv
/// - `Unlit`: fill colour | uv
/// - `Wireframe`: line colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderProgram {
    Flat,
    Gouraud,
    #[default]
    Phong,
    Unlit,
    Wireframe,
}

const FLAT_LAYOUT: AttributeLayout = AttributeLayout::new(2, 2, 0);
const GOURAUD_LAYOUT: AttributeLayout = AttributeLayout::new(0, 2, 2);
const PHONG_LAYOUT: AttributeLayout = AttributeLayout::new(0, 3, 0);
const UNLIT_LAYOUT: AttributeLayout = AttributeLayout::new(1, 1, 0);
const WIREFRAME_LAYOUT: AttributeLayout = AttributeLayout::new(1, 0, 0);

impl ShaderProgram {
    pub fn layout(&self) -> AttributeLayout {
        return match self {
            ShaderProgram::Flat => FLAT_LAYOUT,
            ShaderProgram::Gouraud => GOURAUD_LAYOUT,
            ShaderProgram::Phong => PHONG_LAYOUT,
            ShaderProgram::Unlit => UNLIT_LAYOUT,
            ShaderProgram::Wireframe => WIREFRAME_LAYOUT,
        };
    }

    /// Wireframe draws polygon outlines instead of filled triangles.
    pub fn is_wireframe(&self) -> bool {
        return *self == ShaderProgram::Wireframe;
    }

    pub fn shade_vertex(&self, uniforms: &Uniforms, vertex: &MeshVertex, face: &Face) -> TransformedVertex {
        let mut out = TransformedVertex::new(uniforms.model_view_projection * to_hom_point(vertex.position));
        let a = &mut out.attributes;
        match self {
            ShaderProgram::Flat => {
                // Lit once per face; both sides so the pixel stage only has to pick.
                let center = transform_point(&uniforms.model_view, face.center);
                let normal = camera_normal(uniforms, face.normal);
                let color = uniforms.material.color;
                a[0] = do_lighting(uniforms, color, center, normal, false);
                a[1] = do_lighting(uniforms, color, center, normal, true);
                a[2] = transform_point(&uniforms.model_view, vertex.position);
                a[3] = vertex.tex_coord;
            }
            ShaderProgram::Gouraud => {
                let position = transform_point(&uniforms.model_view, vertex.position);
                let normal = camera_normal(uniforms, vertex.normal);
                let color = uniforms.material.color;
                a[0] = position;
                a[1] = vertex.tex_coord;
                a[2] = do_lighting(uniforms, color, position, normal, false);
                a[3] = do_lighting(uniforms, color, position, normal, true);
            }
            ShaderProgram::Phong => {
                a[0] = transform_point(&uniforms.model_view, vertex.position);
                a[1] = camera_normal(uniforms, vertex.normal);
                a[2] = vertex.tex_coord;
            }
            ShaderProgram::Unlit => {
                a[0] = uniforms.material.color;
                a[1] = vertex.tex_coord;
            }
            ShaderProgram::Wireframe => {
                a[0] = uniforms.wire_color;
            }
        }
        return out;
    }

    pub fn shade_pixel(&self, uniforms: &Uniforms, fragment: &Fragment) -> Color {
        let a = &fragment.attributes;
        let color = match self {
            ShaderProgram::Flat => {
                let lit = if fragment.back_facing { a[1] } else { a[0] };
                let color = lit.component_mul(&texel(uniforms, fragment, 3));
                apply_fog(&uniforms.fog, color, -a[2].z)
            }
            ShaderProgram::Gouraud => {
                let lit = if fragment.back_facing { a[3] } else { a[2] };
                let color = lit.component_mul(&texel(uniforms, fragment, 1));
                apply_fog(&uniforms.fog, color, -a[0].z)
            }
            ShaderProgram::Phong => {
                let base = uniforms.material.color.component_mul(&texel(uniforms, fragment, 2));
                let color = do_lighting(uniforms, base, a[0], a[1], fragment.back_facing);
                apply_fog(&uniforms.fog, color, -a[0].z)
            }
            ShaderProgram::Unlit => a[0].component_mul(&texel(uniforms, fragment, 1)),
            ShaderProgram::Wireframe => a[0],
        };
        return Color::from_vector(color);
    }
}

fn camera_normal(uniforms: &Uniforms, normal: Vector3<f32>) -> Vector3<f32> {
    return transform_vector(&uniforms.normal_matrix, normal).normalize();
}

/// Texture colour at the fragment's uv slot, white when no texture is bound.
/// Texture v runs bottom to top, image rows top to bottom.
fn texel(uniforms: &Uniforms, fragment: &Fragment, slot: usize) -> Vector3<f32> {
    let texture = match uniforms.texture {
        Some(texture) => texture,
        None => return Vector3::repeat(1.0),
    };
    let uv = fragment.attribute(slot);
    let (ddx, ddy) = fragment.derivatives(slot);
    return texture.sample_filtered(
        uniforms.texture_filter,
        Vector2::new(uv.x, 1.0 - uv.y),
        Vector2::new(ddx.x, -ddx.y),
        Vector2::new(ddy.x, -ddy.y),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{vector, Matrix4};

    #[test]
    fn layouts_fit_the_slot_storage() {
        for program in [
            ShaderProgram::Flat,
            ShaderProgram::Gouraud,
            ShaderProgram::Phong,
            ShaderProgram::Unlit,
            ShaderProgram::Wireframe,
        ] {
            program.layout().validate();
        }
        assert!(ShaderProgram::Wireframe.is_wireframe());
        assert!(!ShaderProgram::Unlit.is_wireframe());
    }

    #[test]
    fn unlit_vertex_carries_fill_color_and_clip_position() {
        let mut uniforms = Uniforms::new(Matrix4::new_translation(&vector![0.0, 0.0, -2.0]), Matrix4::identity(), Matrix4::identity());
        uniforms.material.color = vector![0.2, 0.4, 0.6];
        let vertex = MeshVertex {
            position: vector![1.0, 2.0, 3.0],
            normal: vector![0.0, 0.0, 1.0],
            tex_coord: vector![0.5, 0.5, 0.0],
            face: 0,
        };
        let face = Face { center: Vector3::zeros(), normal: vector![0.0, 0.0, 1.0] };
        let out = ShaderProgram::Unlit.shade_vertex(&uniforms, &vertex, &face);
        assert_eq!(out.position, vector![1.0, 2.0, 1.0, 1.0]);
        assert_eq!(out.attributes[0], vector![0.2, 0.4, 0.6]);
        assert_eq!(out.attributes[1], vector![0.5, 0.5, 0.0]);
    }
}
