//! World-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("level name must not be empty")]
    EmptyName,

    #[error("invalid level dimensions {width}x{height}x{length}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        length: usize,
    },

    #[error("invalid level name: {0}")]
    InvalidName(String),

    #[error("unknown generator: {0}")]
    UnknownGenerator(String),

    #[error("level {0} not found in storage")]
    NotFound(String),

    #[error("bad level file: {0}")]
    BadFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
