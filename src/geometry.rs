//! Vector/matrix helpers on top of nalgebra and the axis-aligned bounding box.

mod bbox;

pub use bbox::{BoundingBox, BOX_EDGES};

use na::{matrix, vector, Matrix4, Vector3, Vector4};
use nalgebra as na;

/// Pivot magnitude below which a column is treated as having no usable pivot.
const PIVOT_EPSILON: f64 = 1e-10;

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Transformation of a vector to homogenous coordinates.
pub fn to_hom_vector(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 0.0];
}

/// Transformation of a point from homogenous coordinates.
pub fn from_hom_point(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x / v.w, v.y / v.w, v.z / v.w];
}

/// Applies a full 4x4 transform to a point, including the perspective divide.
pub fn transform_point(m: &Matrix4<f32>, p: Vector3<f32>) -> Vector3<f32> {
    return from_hom_point(m * to_hom_point(p));
}

/// Applies the linear part of a transform to a direction (w = 0, no divide).
pub fn transform_vector(m: &Matrix4<f32>, v: Vector3<f32>) -> Vector3<f32> {
    return (m * to_hom_vector(v)).xyz();
}

/// Inverse of a 4x4 matrix by Gauss-Jordan elimination with row pivoting.
///
/// Elimination runs in f64. A singular matrix is a caller bug, so this panics instead of
/// returning an error.
pub fn invert(m: &Matrix4<f32>) -> Matrix4<f32> {
    let mut a = [[0.0f64; 4]; 4];
    let mut inv = [[0.0f64; 4]; 4];
    for r in 0..4 {
        for c in 0..4 {
            a[r][c] = m[(r, c)] as f64;
        }
        inv[r][r] = 1.0;
    }

    for col in 0..4 {
        // Swap in the first row at or below the diagonal with a non-zero pivot.
        if a[col][col].abs() < PIVOT_EPSILON {
            let pivot_row = (col + 1..4).find(|&r| a[r][col].abs() >= PIVOT_EPSILON);
            let pivot_row = match pivot_row {
                Some(r) => r,
                None => panic!("invert: singular matrix, no pivot in column {}", col),
            };
            a.swap(col, pivot_row);
            inv.swap(col, pivot_row);
        }

        let pivot = a[col][col];
        for c in 0..4 {
            a[col][c] /= pivot;
            inv[col][c] /= pivot;
        }

        for r in 0..4 {
            if r == col {
                continue;
            }
            let factor = a[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..4 {
                a[r][c] -= factor * a[col][c];
                inv[r][c] -= factor * inv[col][c];
            }
        }
    }

    return Matrix4::from_fn(|r, c| inv[r][c] as f32);
}

/// World-to-camera matrix for a camera at `eye` looking at `target`.
/// Camera looks down its own -Z axis.
pub fn look_at(eye: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    // New coordinate system x, y, z around the camera position.
    let new_z = (eye - target).normalize();
    let new_y = (up - new_z.dot(&up) * new_z).normalize();
    let new_x = new_y.cross(&new_z).normalize();
    let rotation = matrix![new_x.x, new_x.y, new_x.z, 0.0;
                          new_y.x, new_y.y, new_y.z, 0.0;
                          new_z.x, new_z.y, new_z.z, 0.0;
                          0.0,     0.0,     0.0,     1.0];
    let translation = matrix![1.0, 0.0, 0.0, -eye.x;
                             0.0, 1.0, 0.0, -eye.y;
                             0.0, 0.0, 1.0, -eye.z;
                             0.0, 0.0, 0.0, 1.0];
    return rotation * translation;
}

/// Perspective projection, `fov_y` in radians. Clip w equals the distance along the view axis.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let f = 1.0 / (fov_y / 2.0).tan();
    let a = (far + near) / (near - far);
    let b = 2.0 * far * near / (near - far);
    return matrix![f / aspect, 0.0, 0.0,  0.0;
                   0.0,        f,   0.0,  0.0;
                   0.0,        0.0, a,    b;
                   0.0,        0.0, -1.0, 0.0];
}

/// Orthographic projection of the box [left, right] x [bottom, top] x [-near, -far].
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
    let sx = 2.0 / (right - left);
    let sy = 2.0 / (top - bottom);
    let sz = -2.0 / (far - near);
    return matrix![sx,  0.0, 0.0, -(right + left) / (right - left);
                   0.0, sy,  0.0, -(top + bottom) / (top - bottom);
                   0.0, 0.0, sz,  -(far + near) / (far - near);
                   0.0, 0.0, 0.0, 1.0];
}

/// Mirror reflection of `incident` (pointing towards the surface) about `normal`.
pub fn reflect(incident: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
    return incident - 2.0 * normal.dot(&incident) * normal;
}
