use std::path::PathBuf;

/// Errors from the I/O boundary of the renderer (asset loading and image output).
///
/// Contract violations inside the pipeline are not reported here, they panic.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode or encode an image.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to parse an OBJ mesh file.
    #[error("OBJ parse error: {0}")]
    Obj(#[from] obj::ObjError),

    /// Mesh file parsed, but contained no usable polygons.
    #[error("mesh {path} has no polygons with at least 3 corners")]
    EmptyMesh { path: PathBuf },
}
