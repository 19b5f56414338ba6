//! Error types for tile generation.

use thiserror::Error;

/// Result type for tiling operations.
pub type TileResult<T> = Result<T, TileError>;

/// Errors that can occur while reading raster tiles or splitting vectors.
///
/// Every error aborts the tile it was raised for; nothing is retried here.
#[derive(Debug, Error)]
pub enum TileError {
    /// A caller-supplied argument is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A buffer access fell outside the buffer's limit.
    #[error("Index out of bounds: {index} (limit: {limit})")]
    IndexOutOfBounds { index: usize, limit: usize },

    /// An operation was invoked in a state that does not allow it.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Domain failure while producing a tile.
    #[error("Tiler error: {0}")]
    Tiler(String),

    /// Failure reported by the dataset access layer.
    #[error("Native I/O error: {0}")]
    NativeIo(#[from] std::io::Error),
}

impl TileError {
    /// Shorthand for [`TileError::InvalidArgument`].
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        TileError::InvalidArgument(msg.into())
    }

    /// Shorthand for [`TileError::IllegalState`].
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        TileError::IllegalState(msg.into())
    }

    /// Shorthand for [`TileError::Tiler`].
    pub fn tiler(msg: impl Into<String>) -> Self {
        TileError::Tiler(msg.into())
    }
}
