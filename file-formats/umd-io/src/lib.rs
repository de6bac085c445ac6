//! # umd_io - Binary cursors for disc image patching
//!
//! Shared binary I/O primitives for the `umd-*` crates:
//!
//! - [`ByteCursor`] reads and writes fixed-width integers in both byte orders,
//!   fixed-length and NUL-terminated strings, and pads to alignment
//!   boundaries. It runs over a file ([`FileCursor`]) or over a fixed-extent
//!   buffer ([`MemoryCursor`]) that refuses to grow.
//! - [`BitCursor`] reads single bits and MSB-first bit fields from a byte
//!   slice, as needed by the LZ decoders.
//! - [`PatchableField`] remembers where an on-disc integer lives so it can be
//!   rewritten after the surrounding structure has been parsed.
//!
//! ## Example
//!
//! ```
//! use umd_io::{MemoryCursor, PatchableField};
//!
//! # fn main() -> umd_io::Result<()> {
//! let mut cursor = MemoryCursor::from_vec(vec![0u8; 16]);
//! cursor.write_u32(0x2000)?;
//! cursor.write_u32_be(0x2000)?;
//!
//! let field = PatchableField::both_endian_u32(0);
//! assert_eq!(field.read(&mut cursor)?, 0x2000);
//!
//! field.write(&mut cursor, 0x3000)?;
//! cursor.seek(0)?;
//! assert_eq!(cursor.read_u32()?, 0x3000);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod bits;
pub mod cursor;
pub mod error;
pub mod field;
pub mod memory;

pub use bits::{BitCursor, BitOrder};
pub use cursor::{ByteCursor, FileCursor, MemoryCursor};
pub use error::{BoundsViolation, Error, Result};
pub use field::{FieldOrder, FieldWidth, PatchableField};
pub use memory::MemoryBacking;
