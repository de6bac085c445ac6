//! Error types for patch archive operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for patch archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patch archive operations
#[derive(Error, Debug)]
pub enum Error {
    /// Cursor or OS error
    #[error(transparent)]
    Io(#[from] umd_io::Error),

    /// Header or directory record is malformed
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    /// Nested archives go deeper than the supported limit
    #[error("Nested archive {path} exceeds the nesting limit of {limit}")]
    NestingTooDeep {
        /// Archive that would have been opened
        path: PathBuf,
        /// Maximum depth
        limit: usize,
    },

    /// No entry with this name in the archive or any nested archive
    #[error("Missing archive entry: {0}")]
    FileNotFound(String),

    /// Builder was given two entries with the same name
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Check if this error indicates a damaged archive
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_) | Error::NestingTooDeep { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(umd_io::Error::from(err))
    }
}
