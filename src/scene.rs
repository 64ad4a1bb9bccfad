//! Thin driver above the pipeline: objects, lights and camera, and a renderer owning the
//! frame buffers.

use std::rc::Rc;

use log::debug;
use na::{vector, Matrix4, Vector3};
use nalgebra as na;

use crate::framebuffer::{Color, ColorBuffer, DepthBuffer, IdBuffer};
use crate::geometry::{look_at, orthographic, perspective, BoundingBox, BOX_EDGES};
use crate::mesh::Mesh;
use crate::pipeline::{CullMode, RasterStats, Rasterizer, RenderTarget, Viewport};
use crate::sampler::{Texture, TextureFilter};
use crate::shading::{Fog, Light, Material, ShaderProgram, Uniforms, MAX_LIGHTS};
use crate::shadow::{ShadowMapSet, ShadowSettings};

/// A mesh placed in the world with its surface settings.
#[derive(Clone)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Rc<Mesh>,
    pub transform: Matrix4<f32>, // Object to world.
    pub material: Material,
    pub texture: Option<Rc<Texture>>,
    pub program: ShaderProgram,
    pub visible: bool,
    pub casts_shadow: bool,
}

impl SceneObject {
    pub fn new(name: &str, mesh: Rc<Mesh>) -> Self {
        return Self {
            name: name.to_string(),
            mesh,
            transform: Matrix4::identity(),
            material: Material::default(),
            texture: None,
            program: ShaderProgram::default(),
            visible: true,
            casts_shadow: true,
        };
    }

    pub fn world_bounds(&self) -> BoundingBox {
        return self.mesh.compute_bounds().transform(&self.transform);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov_y: f32, near: f32, far: f32 },
    /// Half of the visible height in world units.
    Orthographic { half_height: f32, near: f32, far: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        return Self {
            eye: vector![0.0, 0.0, 5.0],
            target: Vector3::zeros(),
            up: Vector3::y(),
            projection: Projection::Perspective { fov_y: std::f32::consts::FRAC_PI_3, near: 0.1, far: 100.0 },
        };
    }
}

impl Camera {
    pub fn view(&self) -> Matrix4<f32> {
        return look_at(self.eye, self.target, self.up);
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        return match self.projection {
            Projection::Perspective { fov_y, near, far } => perspective(fov_y, aspect, near, far),
            Projection::Orthographic { half_height, near, far } => {
                let half_width = half_height * aspect;
                orthographic(-half_width, half_width, -half_height, half_height, near, far)
            }
        };
    }
}

/// Frame-wide render modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub cull: CullMode,
    pub backface_lighting: bool,
    pub perspective_correct: bool,
    pub fog: Fog,
    pub background: Color,
    pub texture_filter: TextureFilter,
    pub show_bounds: bool, // Overlay each object's world bounding box.
    pub wire_color: Vector3<f32>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        return Self {
            cull: CullMode::Back,
            backface_lighting: false,
            perspective_correct: true,
            fog: Fog::default(),
            background: Color::BLACK,
            texture_filter: TextureFilter::default(),
            show_bounds: false,
            wire_color: vector![1.0, 1.0, 0.0],
        };
    }
}

/// Objects, lights and camera. Every mutation that can change shadows marks the shadow maps
/// invalid; they are rebuilt lazily on the next render.
pub struct Scene {
    pub camera: Camera,
    pub settings: RenderSettings,
    objects: Vec<SceneObject>,
    lights: Vec<Light>,
    shadows: ShadowMapSet,
}

impl Default for Scene {
    fn default() -> Self {
        return Self::new(Camera::default());
    }
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        return Self {
            camera,
            settings: RenderSettings::default(),
            objects: Vec::new(),
            lights: Vec::new(),
            shadows: ShadowMapSet::default(),
        };
    }

    pub fn objects(&self) -> &[SceneObject] {
        return &self.objects;
    }

    pub fn object(&self, index: usize) -> &SceneObject {
        return &self.objects[index];
    }

    pub fn lights(&self) -> &[Light] {
        return &self.lights;
    }

    pub fn shadows(&self) -> &ShadowMapSet {
        return &self.shadows;
    }

    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.shadows.invalidate();
        return self.objects.len() - 1;
    }

    pub fn set_transform(&mut self, index: usize, transform: Matrix4<f32>) {
        self.objects[index].transform = transform;
        self.shadows.invalidate();
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) {
        self.objects[index].visible = visible;
        self.shadows.invalidate();
    }

    /// Mutable access to any object field. Shadow maps are invalidated since the caller may
    /// move, hide or swap the mesh of the object.
    pub fn object_mut(&mut self, index: usize) -> &mut SceneObject {
        self.shadows.invalidate();
        return &mut self.objects[index];
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        assert!(self.lights.len() < MAX_LIGHTS, "at most {} lights supported", MAX_LIGHTS);
        self.lights.push(light);
        self.shadows.invalidate();
        return self.lights.len() - 1;
    }

    pub fn set_light(&mut self, index: usize, light: Light) {
        if self.lights[index] != light {
            self.lights[index] = light;
            self.shadows.invalidate();
        }
    }

    pub fn remove_light(&mut self, index: usize) -> Light {
        self.shadows.invalidate();
        return self.lights.remove(index);
    }

    pub fn set_shadow_settings(&mut self, settings: ShadowSettings) {
        self.shadows.set_settings(settings);
    }

    /// Union of the world bounds of all visible objects.
    pub fn world_bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for object in self.objects.iter().filter(|o| o.visible) {
            bounds = bounds.union(&object.world_bounds());
        }
        return bounds;
    }

    /// Centre and radius of the sphere around `world_bounds`.
    pub fn bounding_sphere(&self) -> (Vector3<f32>, f32) {
        let bounds = self.world_bounds();
        if bounds.is_empty() {
            return (Vector3::zeros(), 0.0);
        }
        return (bounds.center(), bounds.radius());
    }

    /// Rebuilds the shadow maps if anything invalidated them.
    pub fn ensure_shadows(&mut self) -> bool {
        let casters: Vec<(&Mesh, Matrix4<f32>)> = self
            .objects
            .iter()
            .filter(|o| o.visible && o.casts_shadow)
            .map(|o| (o.mesh.as_ref(), o.transform))
            .collect();
        return self.shadows.ensure(&self.lights, &casters);
    }
}

/// Owns the frame buffers and the rasterizer scratch state.
pub struct Renderer {
    rasterizer: Rasterizer,
    color: ColorBuffer,
    depth: DepthBuffer,
    ids: IdBuffer,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        return Self {
            rasterizer: Rasterizer::new(),
            color: ColorBuffer::new_color(width, height),
            depth: DepthBuffer::new_depth(width, height),
            ids: IdBuffer::new_ids(width, height),
            viewport: Viewport::full(width, height),
        };
    }

    /// Changes the logical frame size. Storage only grows.
    pub fn resize(&mut self, width: usize, height: usize) {
        let grown = self.color.allocate(width, height);
        self.depth.allocate(width, height);
        self.ids.allocate(width, height);
        self.viewport = Viewport::full(width, height);
        debug!("resize to {}x{} (reallocated: {})", width, height, grown);
    }

    pub fn viewport(&self) -> Viewport {
        return self.viewport;
    }

    pub fn color(&self) -> &ColorBuffer {
        return &self.color;
    }

    pub fn depth(&self) -> &DepthBuffer {
        return &self.depth;
    }

    pub fn ids(&self) -> &IdBuffer {
        return &self.ids;
    }

    /// Renders one frame of `scene` into the owned buffers.
    pub fn render(&mut self, scene: &mut Scene) -> RasterStats {
        self.color.clear(scene.settings.background);
        self.depth.clear(f32::INFINITY);
        self.ids.clear(0);
        if scene.ensure_shadows() {
            debug!("shadow maps rebuilt");
        }

        let scene = &*scene;
        let settings = &scene.settings;
        let view = scene.camera.view();
        let aspect = self.viewport.width as f32 / self.viewport.height.max(1) as f32;
        let projection = scene.camera.projection_matrix(aspect);
        let shadows = scene.lights.iter().any(|l| l.enabled && l.casts_shadow).then_some(&scene.shadows);

        for (index, object) in scene.objects.iter().enumerate().filter(|(_, o)| o.visible) {
            let mut uniforms = Uniforms::new(object.transform, view, projection);
            uniforms.set_lights(&scene.lights);
            uniforms.material = object.material;
            uniforms.fog = settings.fog;
            uniforms.texture = object.texture.as_deref();
            uniforms.texture_filter = settings.texture_filter;
            uniforms.shadows = shadows;
            uniforms.cull = settings.cull;
            uniforms.backface_lighting = settings.backface_lighting;
            uniforms.perspective_correct = settings.perspective_correct;
            uniforms.object_id = index as u32 + 1;
            uniforms.wire_color = settings.wire_color;

            let mut target = RenderTarget::new(&mut self.color, &mut self.depth, self.viewport).with_ids(&mut self.ids);
            self.rasterizer.draw_mesh(&mut target, &object.program, &uniforms, &object.mesh);
            if settings.show_bounds {
                let corners = object.mesh.compute_bounds().corners();
                self.rasterizer.draw_line_list(&mut target, &uniforms, &corners, &BOX_EDGES, settings.wire_color);
            }
        }

        let stats = self.rasterizer.take_stats();
        debug!(
            "frame: {} triangles drawn, {} culled, {} pixels shaded",
            stats.triangles_drawn, stats.triangles_culled, stats.pixels_shaded
        );
        return stats;
    }

    /// Index of the object visible at pixel (x, y), if any.
    pub fn pick(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        return match self.ids.get(x, y) {
            0 => None,
            id => Some(id as usize - 1),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_scene() -> Scene {
        let mut scene = Scene::default();
        let mut cube = SceneObject::new("cube", Rc::new(Mesh::cube(2.0)));
        cube.program = ShaderProgram::Unlit;
        cube.material = Material::new(vector![1.0, 0.0, 0.0]);
        scene.add_object(cube);
        return scene;
    }

    #[test]
    fn render_covers_center_and_picks_object() {
        let mut scene = cube_scene();
        let mut renderer = Renderer::new(64, 64);
        let stats = renderer.render(&mut scene);
        assert!(stats.triangles_drawn > 0);
        assert_eq!(renderer.color().get(32, 32), Color::new(255, 0, 0));
        assert_eq!(renderer.color().get(0, 0), Color::BLACK);
        assert_eq!(renderer.pick(32, 32), Some(0));
        assert_eq!(renderer.pick(0, 0), None);
        assert_eq!(renderer.pick(100, 0), None);
    }

    #[test]
    fn mutations_invalidate_shadows() {
        let mut scene = cube_scene();
        scene.add_light(Light::directional(vector![0.0, -1.0, 0.0], vector![1.0, 1.0, 1.0]));
        assert!(scene.ensure_shadows());
        assert!(!scene.ensure_shadows());
        scene.set_transform(0, Matrix4::new_translation(&vector![1.0, 0.0, 0.0]));
        assert!(!scene.shadows().is_valid());
        assert!(scene.ensure_shadows());
        let light = scene.lights()[0];
        scene.set_light(0, light);
        assert!(scene.shadows().is_valid());
        scene.remove_light(0);
        assert!(!scene.shadows().is_valid());
    }

    #[test]
    fn direct_object_edits_rebuild_shadows() {
        let mut scene = cube_scene();
        scene.add_light(Light::directional(vector![0.0, -1.0, 0.0], vector![1.0, 1.0, 1.0]));
        assert!(scene.ensure_shadows());
        scene.object_mut(0).transform = Matrix4::new_translation(&vector![5.0, 0.0, 0.0]);
        assert!(!scene.shadows().is_valid());
        assert!(scene.ensure_shadows());
        scene.object_mut(0).casts_shadow = false;
        assert!(scene.ensure_shadows());
    }

    #[test]
    fn resize_grows_storage_only() {
        let mut renderer = Renderer::new(32, 32);
        renderer.resize(16, 8);
        assert_eq!(renderer.viewport(), Viewport::full(16, 8));
        assert_eq!(renderer.color().capacity(), (32, 32));
        renderer.resize(40, 8);
        assert_eq!(renderer.depth().capacity(), (40, 32));
    }

    #[test]
    fn bounding_sphere_wraps_visible_objects() {
        let scene = cube_scene();
        let (center, radius) = scene.bounding_sphere();
        assert!(center.norm() < 1e-6);
        assert!((radius - 3.0f32.sqrt()).abs() < 1e-5);
    }
}
