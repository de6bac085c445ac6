//! Error types for the LZ decoders

use thiserror::Error;

/// Result type alias for decompression
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for decompression
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying bit or byte cursor
    #[error("Cursor error: {0}")]
    Io(#[from] umd_io::Error),

    /// Container does not start with the expected magic
    #[error("Invalid {format} magic: {found:02X?}")]
    InvalidMagic {
        /// Container format that was expected
        format: &'static str,
        /// Leading bytes actually present
        found: Vec<u8>,
    },

    /// Malformed container
    #[error("Invalid compressed data: {0}")]
    InvalidFormat(String),

    /// Input matched none of the known container magics
    #[error("Unknown compression format")]
    UnknownFormat,

    /// Back-reference resolving before the start of the produced output
    #[error("Lookback distance {distance} at output position {position} reaches before the start")]
    InvalidLookback {
        /// Output position of the copy
        position: usize,
        /// Requested distance
        distance: usize,
    },

    /// Decoder produced more bytes than the declared size
    #[error("Output overflow: writing {count} bytes at {position} exceeds declared size {capacity}")]
    OutputOverflow {
        /// Output position of the write
        position: usize,
        /// Bytes requested
        count: usize,
        /// Declared output size
        capacity: usize,
    },

    /// Compressed input ended in the middle of a token
    #[error("Compressed input truncated at offset {offset}: need {needed} bytes, {available} available")]
    OutOfBounds {
        /// Input offset of the token
        offset: usize,
        /// Bytes required by the token
        needed: usize,
        /// Bytes left in the input
        available: usize,
    },
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Check if this error is a format error (bad magic or container layout)
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::InvalidMagic { .. } | Error::InvalidFormat(_) | Error::UnknownFormat
        )
    }

    /// Check if this error is a bounds error raised while decoding the payload
    pub fn is_bounds(&self) -> bool {
        match self {
            Error::Io(inner) => inner.is_bounds(),
            Error::InvalidLookback { .. }
            | Error::OutputOverflow { .. }
            | Error::OutOfBounds { .. } => true,
            _ => false,
        }
    }
}
