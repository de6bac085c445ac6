//! # umd_iso - ISO9660 engine for PSP UMD images
//!
//! Reads the subset of ISO9660 used by UMD images (one primary volume
//! descriptor, 2048-byte sectors, no extended attributes, no interleaving)
//! into an immutable directory tree, and edits files of a writable copy of
//! the image without rebuilding it.
//!
//! ## Relative paths
//!
//! Files are addressed by their path from the root without the root
//! component, using `/` separators and identifiers exactly as stored:
//! `"UMD_DATA.BIN"`, `"PSP_GAME/SYSDIR/EBOOT.BIN"`.
//!
//! ## Examples
//!
//! ```no_run
//! use umd_io::FileCursor;
//! use umd_iso::IsoImage;
//!
//! # fn main() -> umd_iso::Result<()> {
//! let image = IsoImage::open("game.iso")?;
//! for entry in image.files() {
//!     println!("{} ({} bytes at LBA {})", entry.path, entry.length, entry.lba);
//! }
//!
//! let mut cursor = FileCursor::open_read_only("game.iso")?;
//! let sfo = image.read_file(&mut cursor, "PSP_GAME/PARAM.SFO")?;
//! # Ok(())
//! # }
//! ```
//!
//! Editing goes through an [`IsoEditor`] session; see the [`editor`] module.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod delta;
pub mod directory;
pub mod editor;
pub mod error;
pub mod image;
pub mod path_table;
pub mod volume;

pub use delta::{DeltaPatch, Replace};
#[cfg(feature = "xdelta")]
pub use delta::Xdelta3;
pub use directory::DirectoryEntry;
pub use editor::{IsoEditor, Placement};
pub use error::{Error, Result};
pub use image::{IsoImage, IsoInfo};
pub use path_table::{PathTable, PathTableEntry};
pub use volume::PrimaryVolumeDescriptor;

/// Logical sector size
pub const SECTOR_SIZE: u64 = 2048;

/// Sector holding the first volume descriptor
pub const VOLUME_DESCRIPTOR_SECTOR: u64 = 16;

/// An image must be larger than this many sectors
pub const MIN_IMAGE_SECTORS: u64 = 18;
