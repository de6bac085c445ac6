//! Error types for the ISO9660 engine

use thiserror::Error;

/// Result type alias for ISO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ISO operations
#[derive(Error, Debug)]
pub enum Error {
    /// Cursor or OS error while reading or writing the image
    #[error(transparent)]
    Io(#[from] umd_io::Error),

    /// Structure violates the supported ISO9660 subset
    #[error("Invalid ISO9660 format: {0}")]
    InvalidFormat(String),

    /// Volume descriptor identifier is not `CD001`
    #[error("Invalid volume descriptor identifier at offset {offset}: {found:?}")]
    InvalidMagic {
        /// Absolute offset of the identifier
        offset: u64,
        /// Identifier actually present
        found: String,
    },

    /// No ordinary file with this relative path
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Patched content needs more sectors than the file occupies
    #[error("{path} won't fit in place: {required} sectors needed, {available} available")]
    CapacityExceeded {
        /// Relative path of the file
        path: String,
        /// Sectors available at the current location
        available: u64,
        /// Sectors the patched content would need
        required: u64,
    },

    /// Patched content has a different size than required
    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Relative path of the file
        path: String,
        /// Required size
        expected: u64,
        /// Size actually produced
        actual: u64,
    },

    /// Byte range lies outside the file
    #[error("Range {offset}+{size} is outside {path} ({length} bytes)")]
    RangeOutOfFile {
        /// Relative path of the file
        path: String,
        /// Start of the range within the file
        offset: u64,
        /// Size of the range
        size: u64,
        /// Length of the file
        length: u64,
    },

    /// Delta engine failed to produce output
    #[error("Delta patch failed: {0}")]
    Delta(String),
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a new Delta error
    pub fn delta<S: Into<String>>(msg: S) -> Self {
        Error::Delta(msg.into())
    }

    /// Check if this error indicates a damaged or unsupported image
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::InvalidFormat(_) | Error::InvalidMagic { .. })
    }

    /// Check if this error means the patch does not fit where the file lives
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Error::CapacityExceeded { .. } | Error::SizeMismatch { .. }
        )
    }
}
