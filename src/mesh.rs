//! Polygon meshes stored as per-corner vertices plus a flat `count, idx...` index buffer.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};
use na::{vector, Vector3};
use nalgebra as na;
use obj::raw::object::Polygon as ObjPolygon;

use crate::error::RenderError;
use crate::geometry::BoundingBox;

/// Mesh vertex. Every polygon corner gets its own vertex so `face` can point back at the
/// owning polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coord: Vector3<f32>,
    pub face: usize,
}

/// Cached per-polygon data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub center: Vector3<f32>,
    pub normal: Vector3<f32>,
}

/// Input corner for `Mesh::add_polygon`.
#[derive(Debug, Clone, Copy)]
pub struct Corner {
    pub position: Vector3<f32>,
    pub normal: Option<Vector3<f32>>,
    pub tex_coord: Vector3<f32>,
}

impl Corner {
    pub fn new(position: Vector3<f32>, tex_coord: Vector3<f32>) -> Self {
        return Self { position, normal: None, tex_coord };
    }
}

/// One polygon yielded by the `Polygons` cursor.
#[derive(Debug, Clone, Copy)]
pub struct Polygon<'a> {
    pub face: usize,
    pub indices: &'a [usize],
}

/// Bounds-checked cursor over a flat `count, idx0, idx1, ...` index buffer.
#[derive(Debug, Clone)]
pub struct Polygons<'a> {
    indices: &'a [usize],
    offset: usize,
    face: usize,
}

impl<'a> Iterator for Polygons<'a> {
    type Item = Polygon<'a>;

    fn next(&mut self) -> Option<Polygon<'a>> {
        if self.offset >= self.indices.len() {
            return None;
        }
        let count = self.indices[self.offset];
        let start = self.offset + 1;
        // Slicing panics on a truncated buffer, which is a construction bug.
        let polygon = Polygon { face: self.face, indices: &self.indices[start..start + count] };
        self.offset = start + count;
        self.face += 1;
        return Some(polygon);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<Face>,
    indices: Vec<usize>,
    bounds: Option<BoundingBox>,
}

/// Newell's method: robust normal for (possibly non-planar) polygons, CCW is front.
fn polygon_normal(points: &[Vector3<f32>]) -> Vector3<f32> {
    let mut normal = Vector3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    return normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z);
}

impl Mesh {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Appends a polygon with at least 3 corners. Corners without a normal use the face normal.
    pub fn add_polygon(&mut self, corners: &[Corner]) -> usize {
        assert!(corners.len() >= 3, "polygon needs at least 3 corners, got {}", corners.len());
        let positions: Vec<Vector3<f32>> = corners.iter().map(|c| c.position).collect();
        let center = positions.iter().sum::<Vector3<f32>>() / corners.len() as f32;
        let normal = polygon_normal(&positions);
        let face = self.faces.len();
        self.faces.push(Face { center, normal });

        self.indices.push(corners.len());
        for corner in corners {
            self.indices.push(self.vertices.len());
            self.vertices.push(MeshVertex {
                position: corner.position,
                normal: corner.normal.unwrap_or(normal),
                tex_coord: corner.tex_coord,
                face,
            });
        }
        self.bounds = None;
        return face;
    }

    pub fn polygons(&self) -> Polygons<'_> {
        return Polygons { indices: &self.indices, offset: 0, face: 0 };
    }

    pub fn polygon_count(&self) -> usize {
        return self.faces.len();
    }

    /// Raw index buffer in `count, idx...` form.
    pub fn index_buffer(&self) -> &[usize] {
        return &self.indices;
    }

    pub fn face_of(&self, vertex: &MeshVertex) -> &Face {
        return &self.faces[vertex.face];
    }

    /// Debug toggle: flips every vertex and face normal.
    pub fn invert_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
        for face in &mut self.faces {
            face.normal = -face.normal;
        }
    }

    pub fn bounds(&mut self) -> BoundingBox {
        if let Some(bounds) = self.bounds {
            return bounds;
        }
        let bounds = self.compute_bounds();
        self.bounds = Some(bounds);
        return bounds;
    }

    pub fn compute_bounds(&self) -> BoundingBox {
        return BoundingBox::from_points(self.vertices.iter().map(|v| v.position));
    }

    /// Axis-aligned quad in the z = 0 plane facing +Z, spanning [-half, half].
    pub fn quad(half_width: f32, half_height: f32) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_polygon(&[
            Corner::new(vector![-half_width, -half_height, 0.0], vector![0.0, 0.0, 0.0]),
            Corner::new(vector![half_width, -half_height, 0.0], vector![1.0, 0.0, 0.0]),
            Corner::new(vector![half_width, half_height, 0.0], vector![1.0, 1.0, 0.0]),
            Corner::new(vector![-half_width, half_height, 0.0], vector![0.0, 1.0, 0.0]),
        ]);
        return mesh;
    }

    /// Axis-aligned cube centered on the origin with outward-facing quads.
    pub fn cube(size: f32) -> Mesh {
        let h = size / 2.0;
        // Each face: normal axis and two tangent axes chosen so (u x v) = normal.
        let sides: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
            (Vector3::x(), -Vector3::z(), Vector3::y()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::x(), -Vector3::z()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
        ];
        let mut mesh = Mesh::new();
        for (n, u, v) in sides {
            let c = n * h;
            mesh.add_polygon(&[
                Corner::new(c - u * h - v * h, vector![0.0, 0.0, 0.0]),
                Corner::new(c + u * h - v * h, vector![1.0, 0.0, 0.0]),
                Corner::new(c + u * h + v * h, vector![1.0, 1.0, 0.0]),
                Corner::new(c - u * h + v * h, vector![0.0, 1.0, 0.0]),
            ]);
        }
        return mesh;
    }

    /// Builds a mesh from Wavefront OBJ text. Faces with fewer than 3 corners are skipped.
    pub fn from_obj<R: BufRead>(reader: R) -> Result<Mesh, RenderError> {
        let raw = obj::raw::parse_obj(reader)?;
        let position = |i: usize| {
            let p = raw.positions[i];
            return vector![p.0, p.1, p.2];
        };
        let tex_coord = |i: usize| {
            let t = raw.tex_coords[i];
            return vector![t.0, t.1, t.2];
        };
        let normal = |i: usize| {
            let n = raw.normals[i];
            return vector![n.0, n.1, n.2];
        };

        let mut mesh = Mesh::new();
        let mut skipped = 0;
        for polygon in &raw.polygons {
            let corners: Vec<Corner> = match polygon {
                ObjPolygon::P(ids) => ids
                    .iter()
                    .map(|&p| Corner { position: position(p), normal: None, tex_coord: Vector3::zeros() })
                    .collect(),
                ObjPolygon::PT(ids) => ids
                    .iter()
                    .map(|&(p, t)| Corner { position: position(p), normal: None, tex_coord: tex_coord(t) })
                    .collect(),
                ObjPolygon::PN(ids) => ids
                    .iter()
                    .map(|&(p, n)| Corner { position: position(p), normal: Some(normal(n)), tex_coord: Vector3::zeros() })
                    .collect(),
                ObjPolygon::PTN(ids) => ids
                    .iter()
                    .map(|&(p, t, n)| Corner { position: position(p), normal: Some(normal(n)), tex_coord: tex_coord(t) })
                    .collect(),
            };
            if corners.len() < 3 {
                skipped += 1;
                continue;
            }
            mesh.add_polygon(&corners);
        }
        if skipped > 0 {
            warn!("Skipped {} OBJ faces with fewer than 3 corners", skipped);
        }
        return Ok(mesh);
    }

    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, RenderError> {
        let path = path.as_ref();
        let mesh = Mesh::from_obj(BufReader::new(File::open(path)?))?;
        if mesh.polygon_count() == 0 {
            return Err(RenderError::EmptyMesh { path: path.to_path_buf() });
        }
        info!("Loaded {}: {} polygons, {} vertices", path.display(), mesh.polygon_count(), mesh.vertices.len());
        return Ok(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_variable_arity_polygons() {
        let mut mesh = Mesh::quad(1.0, 1.0);
        mesh.add_polygon(&[
            Corner::new(vector![0.0, 0.0, 1.0], Vector3::zeros()),
            Corner::new(vector![1.0, 0.0, 1.0], Vector3::zeros()),
            Corner::new(vector![0.0, 1.0, 1.0], Vector3::zeros()),
        ]);
        assert_eq!(mesh.index_buffer(), &[4, 0, 1, 2, 3, 3, 4, 5, 6]);
        let polygons: Vec<_> = mesh.polygons().collect();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].indices, &[0, 1, 2, 3]);
        assert_eq!(polygons[1].face, 1);
        assert_eq!(polygons[1].indices, &[4, 5, 6]);
        assert_eq!(mesh.vertices[5].face, 1);
    }

    #[test]
    fn quad_face_data_is_cached() {
        let mesh = Mesh::quad(2.0, 1.0);
        let face = mesh.faces[0];
        assert!((face.normal - Vector3::z()).norm() < 1e-6);
        assert!(face.center.norm() < 1e-6);
        assert_eq!(mesh.vertices[0].normal, face.normal);
    }

    #[test]
    fn cube_normals_point_outwards() {
        let mesh = Mesh::cube(2.0);
        assert_eq!(mesh.polygon_count(), 6);
        for face in &mesh.faces {
            assert!((face.center.normalize() - face.normal).norm() < 1e-5);
        }
    }

    #[test]
    fn invert_normals_flips_everything() {
        let mut mesh = Mesh::quad(1.0, 1.0);
        mesh.invert_normals();
        assert!((mesh.faces[0].normal + Vector3::z()).norm() < 1e-6);
        assert!(mesh.vertices.iter().all(|v| (v.normal + Vector3::z()).norm() < 1e-6));
    }

    #[test]
    fn obj_polygons_keep_their_arity() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
                    vn 0 0 1\nf 1/1/1 2/2/1 3/3/1 4/4/1\nf 1 2 3\n";
        let mut mesh = Mesh::from_obj(text.as_bytes()).unwrap();
        assert_eq!(mesh.polygon_count(), 2);
        assert_eq!(mesh.vertices.len(), 7);
        assert!((mesh.vertices[2].tex_coord - vector![1.0, 1.0, 0.0]).norm() < 1e-6);
        let bounds = mesh.bounds();
        assert!((bounds.point2 - vector![1.0, 1.0, 0.0]).norm() < 1e-6);
    }

    #[test]
    fn load_obj_rejects_empty_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.obj");
        std::fs::write(&path, "v 0 0 0\n").unwrap();
        assert!(matches!(Mesh::load_obj(&path), Err(RenderError::EmptyMesh { .. })));
    }
}
