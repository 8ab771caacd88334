//! Error types for the renderer
//!
//! Fatal platform and device failures are returned as [`RenderError`] and end
//! the program. Asset failures are [`AssetError`]s that callers log before
//! continuing with a fallback resource.

use std::path::PathBuf;

/// Errors raised by GPU setup and resource management
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create event loop: {0}")]
    EventLoop(String),

    #[error("failed to create window: {0}")]
    Window(String),

    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("no compatible graphics adapter found: {0}")]
    Adapter(String),

    #[error("failed to request device: {0}")]
    Device(String),

    #[error("surface ran out of memory")]
    SurfaceOutOfMemory,

    #[error("shader '{name}' failed to compile: {message}")]
    ShaderCompile { name: String, message: String },

    #[error("write of {len} bytes at offset {offset} exceeds uniform block of {size} bytes")]
    UniformOutOfBounds { offset: usize, len: usize, size: usize },

    #[error("uniform binding slot {0} is already allocated")]
    BindingSlotInUse(u32),

    #[error("texture unit {unit} requested by '{requested}' is already assigned to '{existing}'")]
    TextureUnitCollision {
        unit: u32,
        existing: String,
        requested: String,
    },

    #[error("texture unit {unit} is outside the {max} available units")]
    TextureUnitOutOfRange { unit: u32, max: u32 },

    #[error("no free texture unit left for '{0}'")]
    TextureUnitsExhausted(String),
}

/// Errors raised while loading assets from disk
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model '{path}': {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model '{0}' contains no meshes")]
    EmptyModel(PathBuf),
}

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
