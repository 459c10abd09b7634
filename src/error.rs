//! Error types for engine construction and asset loading.
//!
//! Only start-up can fail. Once an engine is built, every per-tick anomaly
//! is clamped or logged instead of surfacing here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// No cell images were supplied
    #[error("texture pool is empty: at least one cell image is required")]
    EmptyTexturePool,

    #[error("viewport {width}x{height} has no drawable area")]
    EmptyViewport { width: u32, height: u32 },

    /// A layer's cell size leaves no room for a single slot
    #[error("layer {layer} has an empty grid: viewport {width}x{height} with cell size {cell_size}")]
    EmptyGrid {
        layer: u8,
        width: u32,
        height: u32,
        cell_size: f32,
    },

    #[error("layer {layer} grid of {columns}x{rows} slots exceeds the slot limit")]
    GridTooLarge { layer: u8, columns: u32, rows: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image directory {} could not be read: {source}", path.display())]
    ImageDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer error: {0}")]
    Renderer(String),

    /// Sound capture could not start; callers fall back to a synthetic meter
    #[error("audio capture error: {0}")]
    Audio(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}
