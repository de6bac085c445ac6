//! # umd_patchfs - nested patch archives
//!
//! PATCHFS is a flat name-to-blob store used to ship patch payloads. An
//! archive may reference sibling archive files by name; those are opened
//! with it and searched after its own entries.
//!
//! ```text
//! 0x00  "PATCHFS" + 1 unchecked byte
//! 0x08  file count (i32)
//! 0x0C  nested archive count (i32)
//! 0x10  nested count x i64 name offsets
//!       file count x 32-byte records: name offset, content offset, length, reserved
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use umd_patchfs::PatchFs;
//!
//! # fn main() -> umd_patchfs::Result<()> {
//! let mut archive = PatchFs::open("patch.patchfs")?;
//! println!("{} files", archive.files_count());
//! let manifest = archive.get("manifest.json")?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod builder;
pub mod error;

pub use archive::{PatchFs, PatchFsEntry};
pub use builder::PatchFsBuilder;
pub use error::{Error, Result};

/// Archive magic, followed by one unchecked byte
pub const MAGIC: &[u8; 7] = b"PATCHFS";

/// Magic plus its trailing byte
pub const SIGNATURE_SIZE: u64 = 8;

/// Offset of the nested archive pointer table
pub const HEADER_SIZE: u64 = 0x10;

/// Size of one nested archive pointer
pub const POINTER_SIZE: u64 = 8;

/// Size of one directory record
pub const RECORD_SIZE: u64 = 32;

/// Deepest chain of nested archives that will be opened
pub const MAX_NESTING_DEPTH: usize = 16;
