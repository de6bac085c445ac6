//! Directory records
//!
//! Each directory listed in the path table owns a run of records starting at
//! its sector. Records never straddle a sector boundary; a zero length byte
//! marks the padding at the end of a sector.

use crate::SECTOR_SIZE;
use crate::error::{Error, Result};
use crate::path_table::PathTableEntry;
use crate::volume::{FLAG_DIRECTORY, expect_u8, read_both_u16, read_both_u32};
use std::io::{Read, Seek};
use umd_io::{ByteCursor, PatchableField};

/// Offset of the extent sector within a record
pub const SECTOR_FIELD_OFFSET: u64 = 2;

/// Offset of the data length within a record
pub const LENGTH_FIELD_OFFSET: u64 = 10;

/// Size of a record without its identifier
const FIXED_RECORD_SIZE: u8 = 33;

/// A file or directory described by a directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File identifier as stored, including any `;1` suffix
    pub name: String,
    /// Relative path: owning directory's path plus `name`
    pub path: String,
    /// First sector of the file's data
    pub lba: u32,
    /// Data length in bytes
    pub length: u32,
    /// File flags byte (0 for an ordinary file)
    pub attributes: u8,
    /// Absolute offset of the record header
    pub header_offset: u64,
}

impl DirectoryEntry {
    /// Check whether this is an ordinary file
    pub fn is_file(&self) -> bool {
        self.attributes == 0
    }

    /// Check whether this record describes a directory
    pub fn is_directory(&self) -> bool {
        self.attributes & FLAG_DIRECTORY != 0
    }

    /// Absolute offset of the first data byte
    pub fn data_offset(&self) -> u64 {
        u64::from(self.lba) * SECTOR_SIZE
    }

    /// Number of sectors the data occupies
    pub fn sectors(&self) -> u64 {
        sectors_for(u64::from(self.length))
    }

    /// Both-byte-order extent sector field in the record header
    pub fn sector_field(&self) -> PatchableField {
        PatchableField::both_endian_u32(self.header_offset + SECTOR_FIELD_OFFSET)
    }

    /// Both-byte-order data length field in the record header
    pub fn length_field(&self) -> PatchableField {
        PatchableField::both_endian_u32(self.header_offset + LENGTH_FIELD_OFFSET)
    }
}

/// Sectors needed to hold `len` bytes
pub fn sectors_for(len: u64) -> u64 {
    len.div_ceil(SECTOR_SIZE)
}

/// Read the record run of one directory
///
/// The first record (`.`) gives the directory's extent. A zero length byte
/// moves to the next sector while still inside that extent and ends the run
/// otherwise.
pub fn read_directory<S: Read + Seek>(
    cursor: &mut ByteCursor<S>,
    directory: &PathTableEntry,
) -> Result<Vec<DirectoryEntry>> {
    let start = u64::from(directory.lba) * SECTOR_SIZE;
    cursor.seek(start)?;
    log::trace!(
        "Directory records at {start}, base path {:?}",
        directory.path
    );

    let mut entries: Vec<DirectoryEntry> = Vec::new();
    let mut extent_end = start + SECTOR_SIZE;

    loop {
        let record_start = cursor.position()?;
        let record_length = cursor.read_u8()?;
        if record_length == 0 {
            let next_sector = (record_start / SECTOR_SIZE + 1) * SECTOR_SIZE;
            if next_sector < extent_end {
                cursor.seek(next_sector)?;
                continue;
            }
            break;
        }

        let entry = read_record(cursor, directory, record_start, record_length)?;
        if entries.is_empty() {
            extent_end = start + sectors_for(u64::from(entry.length)).max(1) * SECTOR_SIZE;
        }
        log::trace!(
            "Entry at {record_start}, name: {:?}, LBA: {}, data length: {}, attributes: {}",
            entry.name,
            entry.lba,
            entry.length,
            entry.attributes
        );
        entries.push(entry);

        if cursor.position()? >= extent_end {
            break;
        }
    }

    Ok(entries)
}

fn read_record<S: Read + Seek>(
    cursor: &mut ByteCursor<S>,
    directory: &PathTableEntry,
    record_start: u64,
    record_length: u8,
) -> Result<DirectoryEntry> {
    if record_length < FIXED_RECORD_SIZE {
        return Err(Error::invalid_format(format!(
            "directory record at {record_start} is only {record_length} bytes"
        )));
    }

    expect_u8(cursor, 0, "directory record extended attribute length")?;
    let (lba, _) = read_both_u32(cursor)?;
    let (length, _) = read_both_u32(cursor)?;
    cursor.skip(7)?;
    let attributes = cursor.read_u8()?;
    expect_u8(cursor, 0, "directory record file unit size")?;
    expect_u8(cursor, 0, "directory record interleave gap")?;
    let (sequence, _) = read_both_u16(cursor)?;
    if sequence != 1 {
        return Err(Error::invalid_format(format!(
            "directory record at {record_start} has volume sequence number {sequence}"
        )));
    }

    let name_len = cursor.read_u8()?;
    if u64::from(FIXED_RECORD_SIZE) + u64::from(name_len) > u64::from(record_length) {
        return Err(Error::invalid_format(format!(
            "directory record at {record_start}: identifier of {name_len} bytes overruns record of {record_length}"
        )));
    }
    let name = cursor.read_string(name_len as usize)?;

    // Padding byte and system use area
    cursor.seek(record_start + u64::from(record_length))?;

    Ok(DirectoryEntry {
        path: directory.child_path(&name),
        name,
        lba,
        length,
        attributes,
        header_offset: record_start,
    })
}
