//! Error types for Icon Studio
//!
//! Every fallible operation in the crate returns [`Result`]. Failures are
//! best-effort: the application logs them and shows them in the status line,
//! nothing is retried.

use std::path::PathBuf;

/// Errors raised while loading assets, rendering or exporting icons
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("failed to load model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model {path} contains no triangles")]
    EmptyModel { path: PathBuf },

    #[error("failed to load material library {path}: {source}")]
    MaterialLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("material '{name}' not found in {path}")]
    MaterialNotFound { path: PathBuf, name: String },

    #[error("material library {path} is empty")]
    EmptyMaterialLibrary { path: PathBuf },

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to acquire surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),

    #[error("render pipeline '{0}' unavailable")]
    Pipeline(String),

    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("invalid output size {width}x{height} (supersample x{supersample})")]
    InvalidOutputSize {
        width: u32,
        height: u32,
        supersample: u32,
    },

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse settings file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("window event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("model loader worker stopped before reporting a result")]
    LoaderDisconnected,
}

impl StudioError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StudioError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
