//! Error types for resxml-common.

use thiserror::Error;

/// Common error type for resxml binary I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Seek target outside the buffer.
    #[error("position {position} out of bounds (buffer size: {size})")]
    OutOfBounds { position: usize, size: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
