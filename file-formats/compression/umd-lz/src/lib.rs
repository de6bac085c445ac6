//! # umd_lz - LZ decoders for PSP game data
//!
//! Two proprietary LZ-family container formats show up inside PSP game
//! archives:
//!
//! - [`crilayla`]: CRI Middleware's `CRILAYLA`, a backwards-built bit stream
//!   with a verbatim 256-byte prefix.
//! - [`cmp`]: `IECP`, a byte-oriented LZSS with a 4 KiB ring dictionary.
//!
//! Both decoders are stateless functions from a complete container to the
//! decoded bytes. [`Compression`] detects the format from its magic.
//!
//! ## Example
//!
//! ```
//! use umd_lz::Compression;
//!
//! # fn main() -> umd_lz::Result<()> {
//! let data = b"IECP\x03\0\0\0\x07abc";
//! assert_eq!(Compression::detect(data), Some(Compression::Cmp));
//! assert_eq!(umd_lz::decompress(data)?, b"abc");
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod cmp;
pub mod crilayla;
pub mod error;
pub mod format;

pub use error::{Error, Result};
pub use format::{Compression, decompress};

/// Largest decoded size accepted from a container header (1 GiB)
pub const MAX_OUTPUT_SIZE: u64 = 1 << 30;
