use std::path::PathBuf;

/// Failure of a single asset load request
///
/// Scoped to the request that produced it; the running loop and any
/// previously attached asset are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid asset name {0:?}")]
    InvalidName(String),

    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse asset {path}: {message}")]
    Parse { path: String, message: String },

    #[error("asset {0} has no triangle geometry")]
    MissingGeometry(String),

    #[error("loader worker failed: {0}")]
    Worker(String),
}

/// Failure while presenting a frame
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface lost or outdated, reconfigured")]
    SurfaceLost,

    #[error("timed out acquiring the next surface texture")]
    Timeout,

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("failed to initialise GPU: {0}")]
    Init(String),

    #[error("surface error: {0}")]
    Surface(String),
}
