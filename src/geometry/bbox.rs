use na::{vector, Matrix4, Vector3};
use nalgebra as na;

use super::transform_point;

/// Axis-aligned bounding box. `point1` is the minimum corner, `point2` the maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub point1: Vector3<f32>,
    pub point2: Vector3<f32>,
}

/// Corner index pairs forming the 12 box edges, matching the order of `corners()`.
pub const BOX_EDGES: [[usize; 2]; 12] = [
    [0, 1], [1, 3], [3, 2], [2, 0], // z = min
    [4, 5], [5, 7], [7, 6], [6, 4], // z = max
    [0, 4], [1, 5], [2, 6], [3, 7],
];

impl BoundingBox {
    pub fn new(point1: Vector3<f32>, point2: Vector3<f32>) -> Self {
        return Self { point1, point2 };
    }

    /// Inverted box that any `extend` call will replace.
    pub fn empty() -> Self {
        return Self {
            point1: Vector3::repeat(f32::INFINITY),
            point2: Vector3::repeat(f32::NEG_INFINITY),
        };
    }

    pub fn from_points<I: IntoIterator<Item = Vector3<f32>>>(points: I) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.extend(p);
        }
        return bbox;
    }

    pub fn is_empty(&self) -> bool {
        return self.point1.x > self.point2.x || self.point1.y > self.point2.y || self.point1.z > self.point2.z;
    }

    pub fn extend(&mut self, p: Vector3<f32>) {
        self.point1 = self.point1.inf(&p);
        self.point2 = self.point2.sup(&p);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        return BoundingBox {
            point1: self.point1.inf(&other.point1),
            point2: self.point2.sup(&other.point2),
        };
    }

    pub fn center(&self) -> Vector3<f32> {
        return (self.point1 + self.point2) * 0.5;
    }

    pub fn extent(&self) -> Vector3<f32> {
        return self.point2 - self.point1;
    }

    /// Radius of the sphere through all corners.
    pub fn radius(&self) -> f32 {
        return self.extent().norm() * 0.5;
    }

    /// The 8 corners, bit 0 selects x, bit 1 selects y, bit 2 selects z.
    pub fn corners(&self) -> [Vector3<f32>; 8] {
        let (a, b) = (self.point1, self.point2);
        let mut corners = [a; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = vector![
                if i & 1 == 0 { a.x } else { b.x },
                if i & 2 == 0 { a.y } else { b.y },
                if i & 4 == 0 { a.z } else { b.z }
            ];
        }
        return corners;
    }

    /// Box around this box after a general (possibly projective) transform.
    ///
    /// Every corner goes through the matrix and the perspective divide, so rotations and
    /// projections keep the result tight instead of mapping only the two extreme corners.
    pub fn transform(&self, m: &Matrix4<f32>) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        return BoundingBox::from_points(self.corners().iter().map(|&c| transform_point(m, c)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::Rotation3;

    fn assert_vec_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).norm() < 1e-5, "{} != {}", a, b);
    }

    #[test]
    fn identity_transform_keeps_box() {
        let bbox = BoundingBox::new(vector![-1.0, 0.0, 2.0], vector![3.0, 1.5, 4.0]);
        let transformed = bbox.transform(&Matrix4::identity());
        assert_vec_close(transformed.point1, bbox.point1);
        assert_vec_close(transformed.point2, bbox.point2);
    }

    #[test]
    fn quarter_turn_about_z_swaps_extents() {
        let bbox = BoundingBox::new(vector![0.0, 0.0, 0.0], vector![4.0, 1.0, 2.0]);
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2).to_homogeneous();
        let extent = bbox.transform(&rotation).extent();
        assert!((extent.x - 1.0).abs() < 1e-5);
        assert!((extent.y - 4.0).abs() < 1e-5);
        assert!((extent.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn from_points_is_tight() {
        let bbox = BoundingBox::from_points(vec![vector![1.0, -2.0, 0.0], vector![-1.0, 2.0, 5.0]]);
        assert_vec_close(bbox.point1, vector![-1.0, -2.0, 0.0]);
        assert_vec_close(bbox.point2, vector![1.0, 2.0, 5.0]);
        assert_vec_close(bbox.center(), vector![0.0, 0.0, 2.5]);
    }

    #[test]
    fn empty_box_reports_empty() {
        assert!(BoundingBox::empty().is_empty());
        let mut bbox = BoundingBox::empty();
        bbox.extend(Vector3::zeros());
        assert!(!bbox.is_empty());
        assert_eq!(bbox.radius(), 0.0);
    }
}
