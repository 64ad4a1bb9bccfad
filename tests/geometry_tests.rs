//! Bounding boxes, matrix helpers and asset loading end to end.

use std::fs;
use std::rc::Rc;

use image::{Rgb, RgbImage};
use na::{vector, Matrix4, Vector3};
use nalgebra as na;

use soft_renderer::framebuffer::Color;
use soft_renderer::geometry::{invert, transform_point, BoundingBox};
use soft_renderer::mesh::Mesh;
use soft_renderer::sampler::{TextureCache, TextureFilter};
use soft_renderer::scene::{Renderer, Scene, SceneObject};
use soft_renderer::shading::ShaderProgram;
use soft_renderer::RenderError;

fn assert_vec_close(a: Vector3<f32>, b: Vector3<f32>) {
    assert!((a - b).norm() < 1e-5, "{:?} != {:?}", a, b);
}

#[test]
fn identity_keeps_the_box() {
    let bounds = BoundingBox::new(vector![-1.0, 2.0, -3.0], vector![4.0, 5.0, 6.0]);
    let moved = bounds.transform(&Matrix4::identity());
    assert_eq!(moved.point1, bounds.point1);
    assert_eq!(moved.point2, bounds.point2);
}

#[test]
fn quarter_turn_about_z_swaps_extents() {
    let bounds = BoundingBox::new(vector![0.0, 0.0, 0.0], vector![4.0, 1.0, 2.0]);
    let rotation = Matrix4::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2);
    let rotated = bounds.transform(&rotation);
    assert_vec_close(rotated.extent(), vector![1.0, 4.0, 2.0]);
    assert_vec_close(rotated.point1, vector![-1.0, 0.0, 0.0]);
}

#[test]
fn rotated_box_stays_tight_under_projection() {
    let bounds = BoundingBox::new(vector![-1.0, -1.0, -1.0], vector![1.0, 1.0, 1.0]);
    let m = Matrix4::new_translation(&vector![0.0, 0.0, -5.0])
        * Matrix4::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_4);
    let projected = bounds.transform(&m);
    for corner in bounds.corners() {
        let p = transform_point(&m, corner);
        for i in 0..3 {
            assert!(p[i] >= projected.point1[i] - 1e-5 && p[i] <= projected.point2[i] + 1e-5);
        }
    }
    assert!((projected.extent().x - 2.0 * 2f32.sqrt()).abs() < 1e-4);
}

#[test]
fn inverse_undoes_a_camera_transform() {
    let m = Matrix4::new_translation(&vector![1.0, -2.0, 3.0])
        * Matrix4::from_axis_angle(&Vector3::x_axis(), 0.7)
        * Matrix4::new_nonuniform_scaling(&vector![2.0, 0.5, 1.0]);
    let product = invert(&m) * m;
    assert!((product - Matrix4::identity()).norm() < 1e-5);
}

const TRIANGLE_OBJ: &str = "\
v -1 -1 0
v 1 -1 0
v 0 1 0
vt 0 0
vt 1 0
vt 0.5 1
f 1/1 2/2 3/3
";

#[test]
fn loaded_assets_render_textured() {
    let dir = tempfile::tempdir().unwrap();
    let obj_path = dir.path().join("triangle.obj");
    fs::write(&obj_path, TRIANGLE_OBJ).unwrap();
    let texture_path = dir.path().join("blue.png");
    RgbImage::from_pixel(4, 4, Rgb([0, 0, 255])).save(&texture_path).unwrap();

    let mesh = Mesh::load_obj(&obj_path).unwrap();
    assert_eq!(mesh.polygon_count(), 1);

    let mut cache = TextureCache::new();
    let texture = cache.load(&texture_path).unwrap();
    assert!(Rc::ptr_eq(&texture, &cache.load(&texture_path).unwrap()));

    let mut scene = Scene::default();
    scene.settings.texture_filter = TextureFilter::Mipmapped;
    let mut object = SceneObject::new("triangle", Rc::new(mesh));
    object.program = ShaderProgram::Unlit;
    object.material.color = vector![1.0, 1.0, 1.0];
    object.texture = Some(texture);
    scene.add_object(object);

    let mut renderer = Renderer::new(32, 32);
    renderer.render(&mut scene);
    assert_eq!(renderer.color().get(16, 18), Color::new(0, 0, 255));
    assert_eq!(renderer.pick(16, 18), Some(0));
}

#[test]
fn missing_files_surface_as_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(Mesh::load_obj(dir.path().join("none.obj")), Err(RenderError::Io(_))));
    let mut cache = TextureCache::new();
    assert!(matches!(cache.load(dir.path().join("none.png")), Err(RenderError::Image(_))));
}
