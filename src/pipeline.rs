//! Clip-space primitive processing: attribute layouts, frustum clipping and the scanline
//! rasterizer that drives the shading programs.

mod attributes;
mod clip;
mod raster;

pub use attributes::{AttributeKind, AttributeLayout, Attributes, TransformedVertex, MAX_ATTRIBUTES, MAX_VALUES};
pub use clip::{
    clip_line, clip_polygon, clip_polygon_against_plane, fast_clip_line, fast_clip_triangle, inside_side_planes, plane_distance,
    CLIP_PLANES, MAX_CLIPPED_VERTICES,
};
pub use raster::{
    is_back_facing, signed_area, CullMode, Fragment, RasterStats, Rasterizer, RenderTarget, Viewport,
    DEGENERATE_AREA, LINE_DEPTH_BIAS,
};
