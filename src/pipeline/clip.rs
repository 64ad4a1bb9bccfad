use na::Vector4;
use nalgebra as na;

use super::attributes::{AttributeLayout, TransformedVertex};

/// Side planes of the view frustum as (a, b, c, d). `dot(position, plane) > 0` is inside.
pub const CLIP_PLANES: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 1.0],  // x > -w
    [-1.0, 0.0, 0.0, 1.0], // x < w
    [0.0, 1.0, 0.0, 1.0],  // y > -w
    [0.0, -1.0, 0.0, 1.0], // y < w
];

/// A triangle clipped by 4 planes gains at most one vertex per plane.
pub const MAX_CLIPPED_VERTICES: usize = 3 + CLIP_PLANES.len();

#[inline]
pub fn plane_distance(position: &Vector4<f32>, plane: &[f32; 4]) -> f32 {
    return position.x * plane[0] + position.y * plane[1] + position.z * plane[2] + position.w * plane[3];
}

/// True when `position` is on the inner side of (or on) every side plane.
pub fn inside_side_planes(position: &Vector4<f32>) -> bool {
    return CLIP_PLANES.iter().all(|plane| plane_distance(position, plane) >= 0.0);
}

fn all_outside_one_plane(positions: &[Vector4<f32>]) -> bool {
    return CLIP_PLANES
        .iter()
        .any(|plane| positions.iter().all(|p| plane_distance(p, plane) < 0.0));
}

/// Cheap pre-filter: true when the whole triangle lies beyond a single side plane and can be
/// dropped without exact clipping.
pub fn fast_clip_triangle(vertices: &[TransformedVertex; 3]) -> bool {
    return all_outside_one_plane(&[vertices[0].position, vertices[1].position, vertices[2].position]);
}

pub fn fast_clip_line(a: &TransformedVertex, b: &TransformedVertex) -> bool {
    return all_outside_one_plane(&[a.position, b.position]);
}

/// One Sutherland-Hodgman step. Appends the clipped polygon to `output`.
pub fn clip_polygon_against_plane(
    input: &[TransformedVertex],
    plane: &[f32; 4],
    layout: &AttributeLayout,
    output: &mut Vec<TransformedVertex>,
) {
    for (i, current) in input.iter().enumerate() {
        let next = &input[(i + 1) % input.len()];
        let d_current = plane_distance(&current.position, plane);
        let d_next = plane_distance(&next.position, plane);
        let current_inside = d_current > 0.0;
        if current_inside {
            output.push(*current);
        }
        if current_inside != (d_next > 0.0) {
            let t = d_current / (d_current - d_next);
            output.push(current.lerp(next, t, layout));
        }
    }
}

/// Clips a polygon against all side planes. The result (possibly empty) is left in `output`,
/// `scratch` is working storage.
pub fn clip_polygon(
    input: &[TransformedVertex],
    layout: &AttributeLayout,
    output: &mut Vec<TransformedVertex>,
    scratch: &mut Vec<TransformedVertex>,
) {
    output.clear();
    output.extend_from_slice(input);
    for plane in &CLIP_PLANES {
        scratch.clear();
        clip_polygon_against_plane(output, plane, layout, scratch);
        std::mem::swap(output, scratch);
        if output.len() < 3 {
            output.clear();
            return;
        }
    }
}

/// Parametric clip of a segment against the side planes.
pub fn clip_line(
    a: &TransformedVertex,
    b: &TransformedVertex,
    layout: &AttributeLayout,
) -> Option<(TransformedVertex, TransformedVertex)> {
    let mut t0: f32 = 0.0;
    let mut t1: f32 = 1.0;
    for plane in &CLIP_PLANES {
        let d0 = plane_distance(&a.position, plane);
        let d1 = plane_distance(&b.position, plane);
        if d0 <= 0.0 && d1 <= 0.0 {
            return None;
        }
        if d0 <= 0.0 {
            t0 = t0.max(d0 / (d0 - d1));
        } else if d1 <= 0.0 {
            t1 = t1.min(d0 / (d0 - d1));
        }
        if t0 > t1 {
            return None;
        }
    }
    return Some((a.lerp(b, t0, layout), a.lerp(b, t1, layout)));
}
