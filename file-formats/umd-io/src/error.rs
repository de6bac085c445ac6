//! Error types for cursor operations

use std::io;
use thiserror::Error;

/// Result type alias for cursor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Raised by [`MemoryBacking`](crate::MemoryBacking) when an access would run
/// past the end of its buffer.
///
/// It travels inside an [`io::Error`] so the backing can implement the std I/O
/// traits, and is turned back into [`Error::OutOfBounds`] on conversion.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("access of {len} bytes at offset {offset} exceeds buffer extent {extent}")]
pub struct BoundsViolation {
    /// Offset of the attempted access
    pub offset: u64,
    /// Number of bytes requested
    pub len: u64,
    /// Fixed size of the buffer
    pub extent: u64,
}

impl From<BoundsViolation> for io::Error {
    fn from(violation: BoundsViolation) -> Self {
        io::Error::new(io::ErrorKind::UnexpectedEof, violation)
    }
}

/// Main error type for byte and bit cursors
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from a file backing
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Read or write past the extent of a memory backing
    #[error("Out of bounds: access of {len} bytes at offset {offset} exceeds extent {extent}")]
    OutOfBounds {
        /// Offset of the attempted access
        offset: u64,
        /// Number of bytes requested
        len: u64,
        /// Fixed size of the buffer
        extent: u64,
    },

    /// Bit field wider than the 32-bit accumulator
    #[error("Invalid bit width {0}, must be <= 32")]
    InvalidBitWidth(u32),

    /// Bit cursor read after the last bit of its buffer
    #[error("Bit stream exhausted at byte {position}")]
    EndOfBitStream {
        /// Byte position at which the read was attempted
        position: usize,
    },

    /// Alignment boundary of zero
    #[error("Invalid alignment: {0}")]
    InvalidAlignment(u64),

    /// Value does not fit into the width of a patchable field
    #[error("Value {value} does not fit into a {bits}-bit field at offset {offset}")]
    ValueOutOfRange {
        /// Value that was rejected
        value: u64,
        /// Width of the field in bits
        bits: u32,
        /// Absolute offset of the field
        offset: u64,
    },

    /// Both-endian field whose two halves disagree
    #[error("Both-endian field at offset {offset} disagrees: LE {little}, BE {big}")]
    EndianMismatch {
        /// Absolute offset of the field
        offset: u64,
        /// Little-endian half
        little: u64,
        /// Big-endian half
        big: u64,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<BoundsViolation>())
        {
            Some(violation) => Error::OutOfBounds {
                offset: violation.offset,
                len: violation.len,
                extent: violation.extent,
            },
            None => Error::Io(err),
        }
    }
}

impl Error {
    /// Check if this error is a bounds violation rather than an OS failure
    pub fn is_bounds(&self) -> bool {
        matches!(
            self,
            Error::OutOfBounds { .. } | Error::InvalidBitWidth(_) | Error::EndOfBitStream { .. }
        )
    }
}
