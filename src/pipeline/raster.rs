use log::debug;
use na::{Vector3, Vector4};
use nalgebra as na;

use super::attributes::{AttributeKind, AttributeLayout, Attributes, TransformedVertex, MAX_ATTRIBUTES, MAX_VALUES};
use super::clip::{clip_line, clip_polygon, fast_clip_line, fast_clip_triangle, inside_side_planes, MAX_CLIPPED_VERTICES};
use crate::framebuffer::{ColorBuffer, DepthBuffer, IdBuffer};
use crate::geometry::to_hom_point;
use crate::mesh::Mesh;
use crate::shading::{ShaderProgram, Uniforms};

/// Depth offset applied to lines so wireframe overlays win against coplanar faces.
pub const LINE_DEPTH_BIAS: f32 = -0.05;

/// Triangles with |2 * area| below this (in square pixels) are skipped.
pub const DEGENERATE_AREA: f32 = 1e-6;

/// Which faces are discarded before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
}

/// Pixel rectangle inside the render target buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        return Self { x, y, width, height };
    }

    pub fn full(width: usize, height: usize) -> Self {
        return Self { x: 0, y: 0, width, height };
    }
}

/// Buffers bound for one draw call. Without a colour buffer the draw is depth-only and the
/// pixel shader never runs.
pub struct RenderTarget<'a> {
    pub color: Option<&'a mut ColorBuffer>,
    pub depth: &'a mut DepthBuffer,
    pub ids: Option<&'a mut IdBuffer>,
    pub viewport: Viewport,
}

impl<'a> RenderTarget<'a> {
    pub fn new(color: &'a mut ColorBuffer, depth: &'a mut DepthBuffer, viewport: Viewport) -> Self {
        return Self { color: Some(color), depth, ids: None, viewport };
    }

    /// Depth-only target covering the whole depth buffer.
    pub fn depth_only(depth: &'a mut DepthBuffer) -> Self {
        let viewport = Viewport::full(depth.width(), depth.height());
        return Self { color: None, depth, ids: None, viewport };
    }

    pub fn with_ids(mut self, ids: &'a mut IdBuffer) -> Self {
        self.ids = Some(ids);
        return self;
    }

    fn check_viewport(&self) {
        let v = self.viewport;
        let fits = |w: usize, h: usize| v.x + v.width <= w && v.y + v.height <= h;
        assert!(fits(self.depth.width(), self.depth.height()), "viewport {:?} exceeds depth buffer", v);
        if let Some(color) = self.color.as_deref() {
            assert!(fits(color.width(), color.height()), "viewport {:?} exceeds color buffer", v);
        }
        if let Some(ids) = self.ids.as_deref() {
            assert!(fits(ids.width(), ids.height()), "viewport {:?} exceeds id buffer", v);
        }
    }
}

/// Signed polygon area term `sum((x_i - x_i+1) * (y_i + y_i+1))` in device space.
/// Positive means back facing with the Y-down device convention.
pub fn signed_area(points: &[(f32, f32)]) -> f32 {
    return shoelace(points.len(), |i| points[i]);
}

fn shoelace(count: usize, point: impl Fn(usize) -> (f32, f32)) -> f32 {
    let mut sum = 0.0;
    for i in 0..count {
        let (x0, y0) = point(i);
        let (x1, y1) = point((i + 1) % count);
        sum += (x0 - x1) * (y0 + y1);
    }
    return sum;
}

pub fn is_back_facing(points: &[(f32, f32)]) -> bool {
    return signed_area(points) > 0.0;
}

/// Counters for one frame, reported through `log::debug!`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    pub triangles_drawn: usize,
    pub triangles_culled: usize,
    pub triangles_rejected: usize,
    pub triangles_clipped: usize,
    pub triangles_degenerate: usize,
    pub lines_drawn: usize,
    pub pixels_shaded: usize,
}

/// Vertex after the perspective divide and viewport mapping.
/// `values` holds depth, 1/w and the interpolated slots (pre-multiplied by 1/w when smooth).
#[derive(Debug, Clone, Copy)]
struct DeviceVertex {
    x: f32,
    y: f32,
    values: [f32; MAX_VALUES],
}

/// Per-pixel input to a pixel shader.
pub struct Fragment<'a> {
    pub x: usize,
    pub y: usize,
    pub depth: f32,
    pub back_facing: bool,
    pub attributes: Attributes,
    slopes: Option<Slopes<'a>>,
}

/// Screen-space gradients of the interpolated values at a pixel.
struct Slopes<'a> {
    values: &'a [f32; MAX_VALUES],
    ddx: &'a [f32; MAX_VALUES],
    ddy: &'a [f32; MAX_VALUES],
    layout: AttributeLayout,
    perspective: bool,
}

impl<'a> Slopes<'a> {
    fn attribute_at(&self, slot: usize, offset_x: f32, offset_y: f32) -> Vector3<f32> {
        let k = self.layout.value_offset(slot);
        let value = |i: usize| self.values[i] + self.ddx[i] * offset_x + self.ddy[i] * offset_y;
        let a = Vector3::new(value(k), value(k + 1), value(k + 2));
        if self.perspective && self.layout.kind(slot) == AttributeKind::Smooth {
            return a / value(1);
        }
        return a;
    }
}

impl<'a> Fragment<'a> {
    #[inline]
    pub fn attribute(&self, slot: usize) -> Vector3<f32> {
        return self.attributes[slot];
    }

    /// Change of an attribute per pixel step in x and in y. Zero for flat slots and lines.
    pub fn derivatives(&self, slot: usize) -> (Vector3<f32>, Vector3<f32>) {
        let slopes = match &self.slopes {
            Some(slopes) if slopes.layout.kind(slot) != AttributeKind::Flat => slopes,
            _ => return (Vector3::zeros(), Vector3::zeros()),
        };
        let here = slopes.attribute_at(slot, 0.0, 0.0);
        return (slopes.attribute_at(slot, 1.0, 0.0) - here, slopes.attribute_at(slot, 0.0, 1.0) - here);
    }
}

/// Per-triangle constants shared by every span.
struct TriangleSetup<'t> {
    flat: &'t Attributes,
    origin: &'t DeviceVertex,
    ddx: [f32; MAX_VALUES],
    ddy: [f32; MAX_VALUES],
    count: usize,
    back_facing: bool,
}

/// One rasterized line pixel and its parameter along the segment.
struct LinePixel {
    x: usize,
    y: usize,
    t: f32,
    depth: f32,
}

/// Draw-call constants shared by every primitive of one mesh.
struct DrawState<'s, 'u> {
    program: &'s ShaderProgram,
    uniforms: &'s Uniforms<'u>,
    layout: AttributeLayout,
}

/// Scanline rasterizer. Owns only scratch storage and statistics; targets and shading state
/// are passed per draw call.
#[derive(Default)]
pub struct Rasterizer {
    transformed: Vec<TransformedVertex>,
    clipped: Vec<TransformedVertex>,
    clip_scratch: Vec<TransformedVertex>,
    device: Vec<DeviceVertex>,
    stats: RasterStats,
}

impl Rasterizer {
    pub fn new() -> Self {
        return Self {
            clipped: Vec::with_capacity(MAX_CLIPPED_VERTICES),
            clip_scratch: Vec::with_capacity(MAX_CLIPPED_VERTICES),
            device: Vec::with_capacity(MAX_CLIPPED_VERTICES),
            ..Default::default()
        };
    }

    pub fn stats(&self) -> RasterStats {
        return self.stats;
    }

    /// Returns the counters gathered since the last call and resets them.
    pub fn take_stats(&mut self) -> RasterStats {
        let stats = self.stats;
        debug!("raster stats: {:?}", stats);
        self.stats = RasterStats::default();
        return stats;
    }

    /// Vertex shader outputs of the last `upload_vertices` call.
    pub fn transformed(&self) -> &[TransformedVertex] {
        return &self.transformed;
    }

    /// Runs the vertex shader over every mesh vertex.
    pub fn upload_vertices(&mut self, program: &ShaderProgram, uniforms: &Uniforms, mesh: &Mesh) {
        self.transformed.clear();
        self.transformed.reserve(mesh.vertices.len());
        for vertex in &mesh.vertices {
            self.transformed.push(program.shade_vertex(uniforms, vertex, mesh.face_of(vertex)));
        }
    }

    /// Full draw call: vertex shading, clipping, rasterization and pixel shading of every
    /// polygon in index-buffer order. Wireframe programs draw polygon outlines instead.
    pub fn draw_mesh(&mut self, target: &mut RenderTarget, program: &ShaderProgram, uniforms: &Uniforms, mesh: &Mesh) {
        let layout = program.layout();
        layout.validate();
        target.check_viewport();
        self.upload_vertices(program, uniforms, mesh);

        let transformed = std::mem::take(&mut self.transformed);
        let state = DrawState { program, uniforms, layout };
        for polygon in mesh.polygons() {
            let corners = polygon.indices;
            if program.is_wireframe() {
                for (i, &a) in corners.iter().enumerate() {
                    let b = corners[(i + 1) % corners.len()];
                    self.line(target, &state, &transformed[a], &transformed[b]);
                }
                continue;
            }
            for k in 1..corners.len() - 1 {
                let triangle = [transformed[corners[0]], transformed[corners[k]], transformed[corners[k + 1]]];
                self.primitive(target, &state, &triangle);
            }
        }
        self.transformed = transformed;
    }

    /// Rasterizes one clip-space triangle produced by `program`'s vertex shader, clipping it
    /// first when a vertex has non-positive w.
    pub fn draw_primitive(
        &mut self,
        target: &mut RenderTarget,
        program: &ShaderProgram,
        uniforms: &Uniforms,
        triangle: &[TransformedVertex; 3],
    ) {
        let layout = program.layout();
        layout.validate();
        target.check_viewport();
        self.primitive(target, &DrawState { program, uniforms, layout }, triangle);
    }

    fn primitive(&mut self, target: &mut RenderTarget, state: &DrawState, triangle: &[TransformedVertex; 3]) {
        if triangle.iter().any(|v| v.position.w <= 0.0) {
            self.clipped_triangle(target, state, triangle);
            return;
        }
        if fast_clip_triangle(triangle) {
            self.stats.triangles_rejected += 1;
            return;
        }
        self.polygon(target, state, triangle);
    }

    /// Rasterizes a triangle whose vertices all have positive w.
    pub fn draw_triangle(
        &mut self,
        target: &mut RenderTarget,
        program: &ShaderProgram,
        uniforms: &Uniforms,
        triangle: &[TransformedVertex; 3],
    ) {
        debug_assert!(triangle.iter().all(|v| v.position.w > 0.0), "draw_triangle needs w > 0, use draw_primitive");
        let layout = program.layout();
        layout.validate();
        target.check_viewport();
        self.polygon(target, &DrawState { program, uniforms, layout }, triangle);
    }

    /// Clips against the side planes, then rasterizes the fan of the clipped polygon.
    pub fn draw_clipped_triangle(
        &mut self,
        target: &mut RenderTarget,
        program: &ShaderProgram,
        uniforms: &Uniforms,
        triangle: &[TransformedVertex; 3],
    ) {
        let layout = program.layout();
        layout.validate();
        target.check_viewport();
        self.clipped_triangle(target, &DrawState { program, uniforms, layout }, triangle);
    }

    fn clipped_triangle(&mut self, target: &mut RenderTarget, state: &DrawState, triangle: &[TransformedVertex; 3]) {
        self.stats.triangles_clipped += 1;
        let mut clipped = std::mem::take(&mut self.clipped);
        let mut scratch = std::mem::take(&mut self.clip_scratch);
        clip_polygon(triangle, &state.layout, &mut clipped, &mut scratch);
        // A vertex exactly on a plane corner can still end up with w == 0.
        if clipped.len() >= 3 && clipped.iter().all(|v| v.position.w > 0.0) {
            self.polygon(target, state, &clipped);
        }
        self.clipped = clipped;
        self.clip_scratch = scratch;
    }

    /// Projects a convex polygon with w > 0, determines its facing, culls and fills its fan.
    fn polygon(&mut self, target: &mut RenderTarget, state: &DrawState, vertices: &[TransformedVertex]) {
        let mut device = std::mem::take(&mut self.device);
        device.clear();
        let perspective = state.uniforms.perspective_correct;
        for v in vertices {
            device.push(to_device(v, &target.viewport, &state.layout, perspective));
        }

        let back_facing = shoelace(device.len(), |i| (device[i].x, device[i].y)) > 0.0;
        let culled = match state.uniforms.cull {
            CullMode::None => false,
            CullMode::Back => back_facing,
            CullMode::Front => !back_facing,
        };
        if culled {
            self.stats.triangles_culled += 1;
        } else {
            let flat = &vertices[0].attributes;
            for k in 1..device.len() - 1 {
                self.fill_triangle(target, state, flat, [&device[0], &device[k], &device[k + 1]], back_facing);
            }
        }
        self.device = device;
    }

    fn fill_triangle(
        &mut self,
        target: &mut RenderTarget,
        state: &DrawState,
        flat: &Attributes,
        vertices: [&DeviceVertex; 3],
        back_facing: bool,
    ) {
        let [a, b, c] = vertices;
        let dx1 = b.x - a.x;
        let dy1 = b.y - a.y;
        let dx2 = c.x - a.x;
        let dy2 = c.y - a.y;
        let det = dx1 * dy2 - dy1 * dx2;
        if !(det.abs() >= DEGENERATE_AREA) {
            self.stats.triangles_degenerate += 1;
            return;
        }
        self.stats.triangles_drawn += 1;

        // Gradients of every interpolated value: v(x, y) = v_a + (x - x_a) * ddx + (y - y_a) * ddy.
        let inv_det = 1.0 / det;
        let count = 2 + 3 * state.layout.interpolated();
        let mut ddx = [0.0; MAX_VALUES];
        let mut ddy = [0.0; MAX_VALUES];
        for k in 0..count {
            let d1 = b.values[k] - a.values[k];
            let d2 = c.values[k] - a.values[k];
            ddx[k] = (d1 * dy2 - d2 * dy1) * inv_det;
            ddy[k] = (d2 * dx1 - d1 * dx2) * inv_det;
        }

        let mut sorted = [a, b, c];
        sorted.sort_by(|p, q| p.y.total_cmp(&q.y));
        let [top, mid, bottom] = sorted;

        let viewport = target.viewport;
        let y_min = viewport.y as i64;
        let y_max = (viewport.y + viewport.height) as i64;
        let y_start = (top.y.ceil() as i64).max(y_min);
        let y_mid = (mid.y.ceil() as i64).clamp(y_min, y_max);
        let y_end = (bottom.y.ceil() as i64).min(y_max);

        let long_slope = (bottom.x - top.x) / (bottom.y - top.y);
        let upper_slope = if mid.y > top.y { (mid.x - top.x) / (mid.y - top.y) } else { 0.0 };
        let lower_slope = if bottom.y > mid.y { (bottom.x - mid.x) / (bottom.y - mid.y) } else { 0.0 };

        let setup = TriangleSetup { flat, origin: a, ddx, ddy, count, back_facing };
        for y in y_start..y_end {
            let fy = y as f32;
            let x_long = top.x + (fy - top.y) * long_slope;
            let x_short = if y < y_mid {
                top.x + (fy - top.y) * upper_slope
            } else {
                mid.x + (fy - mid.y) * lower_slope
            };
            self.span(target, state, &setup, y, x_long.min(x_short), x_long.max(x_short));
        }
    }

    /// Walks one scanline from `x_left` to `x_right` (half-open at pixel centres).
    fn span(
        &mut self,
        target: &mut RenderTarget,
        state: &DrawState,
        setup: &TriangleSetup,
        y: i64,
        x_left: f32,
        x_right: f32,
    ) {
        let (flat, origin, count, back_facing) = (setup.flat, setup.origin, setup.count, setup.back_facing);
        let (ddx, ddy) = (&setup.ddx, &setup.ddy);
        let viewport = target.viewport;
        let x_start = (x_left.ceil() as i64).max(viewport.x as i64);
        let x_end = (x_right.ceil() as i64).min((viewport.x + viewport.width) as i64);
        if x_start >= x_end {
            return;
        }

        let mut values = [0.0; MAX_VALUES];
        let ox = x_start as f32 - origin.x;
        let oy = y as f32 - origin.y;
        for k in 0..count {
            values[k] = origin.values[k] + ox * ddx[k] + oy * ddy[k];
        }

        let perspective = state.uniforms.perspective_correct;
        let layout = state.layout;
        let py = y as usize;
        for x in x_start..x_end {
            let px = x as usize;
            // Early depth test: the pixel shader never runs for hidden pixels.
            if target.depth.z_test(px, py, values[0]) {
                if let Some(ids) = target.ids.as_deref_mut() {
                    ids.set(px, py, state.uniforms.object_id);
                }
                if let Some(color) = target.color.as_deref_mut() {
                    let mut attributes = *flat;
                    let w = if perspective { 1.0 / values[1] } else { 1.0 };
                    for slot in layout.flat..layout.total() {
                        let k = layout.value_offset(slot);
                        let a = Vector3::new(values[k], values[k + 1], values[k + 2]);
                        attributes[slot] = if slot < layout.flat + layout.smooth { a * w } else { a };
                    }
                    let fragment = Fragment {
                        x: px,
                        y: py,
                        depth: values[0],
                        back_facing,
                        attributes,
                        slopes: Some(Slopes { values: &values, ddx, ddy, layout, perspective }),
                    };
                    color.set(px, py, state.program.shade_pixel(state.uniforms, &fragment));
                    self.stats.pixels_shaded += 1;
                }
            }
            for k in 0..count {
                values[k] += ddx[k];
            }
        }
    }

    /// Draws a clip-space segment with Bresenham stepping and a small depth bias.
    pub fn draw_line(
        &mut self,
        target: &mut RenderTarget,
        program: &ShaderProgram,
        uniforms: &Uniforms,
        a: &TransformedVertex,
        b: &TransformedVertex,
    ) {
        let layout = program.layout();
        layout.validate();
        target.check_viewport();
        self.line(target, &DrawState { program, uniforms, layout }, a, b);
    }

    /// Unlit overlay lines between object-space points, e.g. bounding boxes and axes.
    pub fn draw_line_list(
        &mut self,
        target: &mut RenderTarget,
        uniforms: &Uniforms,
        points: &[Vector3<f32>],
        segments: &[[usize; 2]],
        color: Vector3<f32>,
    ) {
        let program = ShaderProgram::Wireframe;
        let layout = program.layout();
        target.check_viewport();
        let state = DrawState { program: &program, uniforms, layout };
        let to_clip = |p: Vector3<f32>| {
            let mut v = TransformedVertex::new(uniforms.model_view_projection * to_hom_point(p));
            v.attributes[0] = color;
            return v;
        };
        for &[i, j] in segments {
            self.line(target, &state, &to_clip(points[i]), &to_clip(points[j]));
        }
    }

    fn line(&mut self, target: &mut RenderTarget, state: &DrawState, a: &TransformedVertex, b: &TransformedVertex) {
        let in_front = a.position.w > 0.0 && b.position.w > 0.0;
        if in_front && fast_clip_line(a, b) {
            return;
        }
        // Segments leaving the frustum sides are clipped too, so Bresenham never walks far
        // outside the viewport.
        let (a, b) = if in_front && inside_side_planes(&a.position) && inside_side_planes(&b.position) {
            (*a, *b)
        } else {
            match clip_line(a, b, &state.layout) {
                Some(clipped) => clipped,
                None => return,
            }
        };
        if a.position.w <= 0.0 || b.position.w <= 0.0 {
            return;
        }
        self.stats.lines_drawn += 1;

        let viewport = target.viewport;
        let start = to_device(&a, &viewport, &state.layout, false);
        let end = to_device(&b, &viewport, &state.layout, false);
        let mut x_0 = start.x.round() as i64;
        let mut y_0 = start.y.round() as i64;
        let x_1 = end.x.round() as i64;
        let y_1 = end.y.round() as i64;
        let dx = (x_1 - x_0).abs();
        let sx = if x_0 < x_1 { 1 } else { -1 };
        let dy = -(y_1 - y_0).abs();
        let sy = if y_0 < y_1 { 1 } else { -1 };
        let steps = dx.max(-dy).max(1) as f32;
        let mut error = dx + dy;
        let mut step = 0;

        let x_range = viewport.x as i64..(viewport.x + viewport.width) as i64;
        let y_range = viewport.y as i64..(viewport.y + viewport.height) as i64;
        loop {
            if x_range.contains(&x_0) && y_range.contains(&y_0) {
                let t = step as f32 / steps;
                let depth = start.values[0] + (end.values[0] - start.values[0]) * t + LINE_DEPTH_BIAS;
                self.line_pixel(target, state, &a, &b, LinePixel { x: x_0 as usize, y: y_0 as usize, t, depth });
            }
            if x_0 == x_1 && y_0 == y_1 {
                break;
            }
            let e2 = 2 * error;
            if e2 >= dy {
                error += dy;
                x_0 += sx;
            }
            if e2 <= dx {
                error += dx;
                y_0 += sy;
            }
            step += 1;
        }
    }

    fn line_pixel(
        &mut self,
        target: &mut RenderTarget,
        state: &DrawState,
        a: &TransformedVertex,
        b: &TransformedVertex,
        pixel: LinePixel,
    ) {
        let LinePixel { x, y, t, depth } = pixel;
        if !target.depth.z_test(x, y, depth) {
            return;
        }
        if let Some(ids) = target.ids.as_deref_mut() {
            ids.set(x, y, state.uniforms.object_id);
        }
        if let Some(color) = target.color.as_deref_mut() {
            let mut attributes = a.attributes;
            for slot in state.layout.flat..state.layout.total() {
                attributes[slot] = a.attributes[slot] + (b.attributes[slot] - a.attributes[slot]) * t;
            }
            let fragment = Fragment { x, y, depth, back_facing: false, attributes, slopes: None };
            color.set(x, y, state.program.shade_pixel(state.uniforms, &fragment));
            self.stats.pixels_shaded += 1;
        }
    }
}

/// Perspective divide and viewport mapping. Pixel centres land on integer coordinates.
fn to_device(v: &TransformedVertex, viewport: &Viewport, layout: &AttributeLayout, perspective: bool) -> DeviceVertex {
    let p: Vector4<f32> = v.position;
    let inv_w = 1.0 / p.w;
    let mut values = [0.0; MAX_VALUES];
    values[0] = p.z * inv_w;
    values[1] = inv_w;
    for slot in layout.flat..layout.total() {
        let k = layout.value_offset(slot);
        let scale = if perspective && slot < layout.flat + layout.smooth { inv_w } else { 1.0 };
        let a = v.attributes[slot] * scale;
        values[k] = a.x;
        values[k + 1] = a.y;
        values[k + 2] = a.z;
    }
    debug_assert!(layout.total() <= MAX_ATTRIBUTES);
    return DeviceVertex {
        x: viewport.x as f32 + (p.x * inv_w + 1.0) * 0.5 * viewport.width as f32 - 0.5,
        y: viewport.y as f32 + (1.0 - p.y * inv_w) * 0.5 * viewport.height as f32 - 0.5,
        values,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shoelace_sign_matches_screen_winding() {
        // Clockwise on a Y-down screen.
        let clockwise = [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)];
        assert!(is_back_facing(&clockwise));
        let counter = [(0.0, 0.0), (0.0, 4.0), (4.0, 0.0)];
        assert!(!is_back_facing(&counter));
        assert_eq!(signed_area(&clockwise), 32.0);
    }

    #[test]
    fn device_winding_matches_point_winding() {
        let layout = AttributeLayout::default();
        let viewport = Viewport::full(8, 8);
        let device: Vec<DeviceVertex> = [(-0.5, -0.5), (0.5, -0.5), (0.0, 0.5)]
            .iter()
            .map(|&(x, y)| to_device(&TransformedVertex::new(Vector4::new(x, y, 0.0, 1.0)), &viewport, &layout, true))
            .collect();
        let points: Vec<(f32, f32)> = device.iter().map(|d| (d.x, d.y)).collect();
        let area = shoelace(device.len(), |i| (device[i].x, device[i].y));
        assert_eq!(area, signed_area(&points));
        // Counter-clockwise in NDC faces the viewer.
        assert!(area < 0.0);
    }

    #[test]
    fn device_mapping_puts_ndc_corners_on_pixel_edges() {
        let layout = AttributeLayout::default();
        let viewport = Viewport::new(10, 0, 100, 50);
        let v = TransformedVertex::new(Vector4::new(-2.0, 2.0, 1.0, 2.0));
        let d = to_device(&v, &viewport, &layout, true);
        assert_eq!(d.x, 9.5);
        assert_eq!(d.y, -0.5);
        assert_eq!(d.values[0], 0.5);
        assert_eq!(d.values[1], 0.5);
    }
}
