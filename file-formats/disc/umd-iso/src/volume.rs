//! Volume descriptor parsing
//!
//! Descriptors start at sector 16 and occupy one sector each. Only the
//! primary descriptor (type 1) is interpreted; the set terminator (type 255)
//! ends the scan and anything else is skipped once a primary descriptor has
//! been seen.

use crate::error::{Error, Result};
use crate::{SECTOR_SIZE, VOLUME_DESCRIPTOR_SECTOR};
use std::io::{Read, Seek};
use umd_io::{ByteCursor, PatchableField};

/// Standard identifier shared by every volume descriptor
pub const STANDARD_IDENTIFIER: &str = "CD001";

/// Descriptor type of the primary volume descriptor
pub const TYPE_PRIMARY: u8 = 1;

/// Descriptor type of the set terminator
pub const TYPE_TERMINATOR: u8 = 255;

/// Offset of the volume space size within the primary descriptor
pub const VOLUME_SPACE_SIZE_OFFSET: u64 = 80;

/// Offset of the root directory record within the primary descriptor
const ROOT_RECORD_OFFSET: u64 = 156;

/// Offset of the volume creation date within the primary descriptor
const CREATION_DATE_OFFSET: u64 = 813;

/// Size of the root directory record
const ROOT_RECORD_SIZE: u8 = 34;

/// Directory flag in a record's file flags
pub(crate) const FLAG_DIRECTORY: u8 = 2;

/// Primary volume descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryVolumeDescriptor {
    /// Absolute offset of the descriptor sector
    pub offset: u64,
    /// Descriptor version byte
    pub version: u8,
    /// System identifier without padding
    pub system_id: String,
    /// Volume identifier without padding
    pub volume_id: String,
    /// Number of logical blocks in the volume
    pub volume_space_size: u32,
    /// Logical block size (always 2048 once parsed)
    pub logical_block_size: u16,
    /// Path table size in bytes
    pub path_table_size: u32,
    /// Sector of the little-endian path table
    pub path_table_lba: u32,
    /// Sector of the optional little-endian path table
    pub optional_path_table_lba: u32,
    /// Sector of the big-endian path table
    pub path_table_lba_be: u32,
    /// Sector of the optional big-endian path table
    pub optional_path_table_lba_be: u32,
    /// Sector of the root directory
    pub root_lba: u32,
    /// Byte length of the root directory
    pub root_length: u32,
    /// Volume creation date as stored (17 characters)
    pub creation_date: String,
}

impl PrimaryVolumeDescriptor {
    /// Parse a primary descriptor; the cursor must be positioned just after
    /// the type byte
    pub fn read<S: Read + Seek>(cursor: &mut ByteCursor<S>) -> Result<Self> {
        let offset = cursor.position()?.saturating_sub(1);
        expect_identifier(cursor)?;
        let version = cursor.read_u8()?;
        log::trace!("ISO version: {version}");
        cursor.skip(1)?;

        let system_id = read_identifier(cursor, 32)?;
        let volume_id = read_identifier(cursor, 32)?;
        log::trace!("ISO system identifier: {system_id:?}, volume identifier: {volume_id:?}");
        cursor.skip(8)?;

        let (volume_space_size, _) = read_both_u32(cursor)?;
        log::trace!("ISO volume space size: {volume_space_size}");
        cursor.skip(32)?;

        let set_size = read_both_u16(cursor)?;
        let sequence_number = read_both_u16(cursor)?;
        if set_size != (1, 1) || sequence_number != (1, 1) {
            return Err(Error::invalid_format(format!(
                "multi-disc volume sets are not supported (set size {}, sequence {})",
                set_size.0, sequence_number.0
            )));
        }

        let (logical_block_size, block_size_be) = read_both_u16(cursor)?;
        if u64::from(logical_block_size) != SECTOR_SIZE || u64::from(block_size_be) != SECTOR_SIZE
        {
            return Err(Error::invalid_format(format!(
                "logical block size is {logical_block_size}, expected {SECTOR_SIZE}"
            )));
        }

        let (path_table_size, _) = read_both_u32(cursor)?;
        let path_table_lba = cursor.read_u32()?;
        let optional_path_table_lba = cursor.read_u32()?;
        let path_table_lba_be = cursor.read_u32_be()?;
        let optional_path_table_lba_be = cursor.read_u32_be()?;
        log::trace!(
            "ISO path table: {path_table_size} bytes at LBA {path_table_lba} (BE {path_table_lba_be})"
        );

        cursor.seek(offset + ROOT_RECORD_OFFSET)?;
        let (root_lba, root_length) = read_root_record(cursor)?;
        log::trace!("ISO root directory: LBA {root_lba}, {root_length} bytes");

        cursor.seek(offset + CREATION_DATE_OFFSET)?;
        let creation_date = cursor.read_string(17)?;
        log::trace!("ISO volume creation date: {creation_date:?}");

        Ok(Self {
            offset,
            version,
            system_id,
            volume_id,
            volume_space_size,
            logical_block_size,
            path_table_size,
            path_table_lba,
            optional_path_table_lba,
            path_table_lba_be,
            optional_path_table_lba_be,
            root_lba,
            root_length,
            creation_date,
        })
    }

    /// Location of the volume space size (both byte orders)
    pub fn volume_space_size_field(&self) -> PatchableField {
        PatchableField::both_endian_u32(self.offset + VOLUME_SPACE_SIZE_OFFSET)
    }

    /// Size of the volume in bytes as declared by the descriptor
    pub fn volume_size(&self) -> u64 {
        u64::from(self.volume_space_size) * SECTOR_SIZE
    }
}

/// Scan the descriptor set starting at sector 16 and return the primary descriptor
pub fn read_volume_descriptors<S: Read + Seek>(
    cursor: &mut ByteCursor<S>,
    image_len: u64,
) -> Result<PrimaryVolumeDescriptor> {
    let mut primary: Option<PrimaryVolumeDescriptor> = None;
    let mut sector_start = VOLUME_DESCRIPTOR_SECTOR * SECTOR_SIZE;

    while sector_start < image_len {
        cursor.seek(sector_start)?;
        let descriptor_type = cursor.read_u8()?;
        log::trace!("Volume descriptor of type {descriptor_type} at {sector_start}");

        match descriptor_type {
            TYPE_PRIMARY => {
                primary = Some(PrimaryVolumeDescriptor::read(cursor)?);
            }
            TYPE_TERMINATOR => {
                expect_identifier(cursor)?;
                let version = cursor.read_u8()?;
                if version != 1 {
                    return Err(Error::invalid_format(format!(
                        "volume descriptor set terminator has version {version}"
                    )));
                }
                break;
            }
            other => {
                if primary.is_none() {
                    return Err(Error::invalid_format(format!(
                        "volume descriptor type {other} precedes the primary descriptor"
                    )));
                }
                log::warn!("Skipped volume descriptor type: {other}");
            }
        }

        sector_start += SECTOR_SIZE;
    }

    primary.ok_or_else(|| Error::invalid_format("primary volume descriptor missing"))
}

/// Read a fixed-width text field, dropping space and NUL padding
fn read_identifier<S: Read + Seek>(cursor: &mut ByteCursor<S>, len: usize) -> Result<String> {
    let text = cursor.read_string(len)?;
    Ok(text.trim_end_matches([' ', '\0']).to_string())
}

fn expect_identifier<S: Read + Seek>(cursor: &mut ByteCursor<S>) -> Result<()> {
    let offset = cursor.position()?;
    let found = cursor.read_string(STANDARD_IDENTIFIER.len())?;
    if found == STANDARD_IDENTIFIER {
        Ok(())
    } else {
        Err(Error::InvalidMagic { offset, found })
    }
}

/// Validate the fixed shape of the root directory record and return its extent
fn read_root_record<S: Read + Seek>(cursor: &mut ByteCursor<S>) -> Result<(u32, u32)> {
    let record_length = cursor.read_u8()?;
    if record_length != ROOT_RECORD_SIZE {
        return Err(Error::invalid_format(format!(
            "root record is {record_length} bytes, expected {ROOT_RECORD_SIZE}"
        )));
    }
    expect_u8(cursor, 0, "root record extended attribute length")?;
    let (lba, _) = read_both_u32(cursor)?;
    let (length, _) = read_both_u32(cursor)?;
    cursor.skip(7)?;
    expect_u8(cursor, FLAG_DIRECTORY, "root record file flags")?;
    expect_u8(cursor, 0, "root record file unit size")?;
    expect_u8(cursor, 0, "root record interleave gap")?;
    let (sequence, _) = read_both_u16(cursor)?;
    if sequence != 1 {
        return Err(Error::invalid_format(format!(
            "root record volume sequence number is {sequence}"
        )));
    }
    expect_u8(cursor, 1, "root record identifier length")?;
    cursor.skip(1)?;
    Ok((lba, length))
}

/// Read a byte and fail unless it equals `expected`
pub(crate) fn expect_u8<S: Read + Seek>(
    cursor: &mut ByteCursor<S>,
    expected: u8,
    what: &str,
) -> Result<()> {
    let offset = cursor.position()?;
    let value = cursor.read_u8()?;
    if value == expected {
        Ok(())
    } else {
        Err(Error::invalid_format(format!(
            "{what} at offset {offset} is {value}, expected {expected}"
        )))
    }
}

/// Read a both-byte-order u16 as (little-endian, big-endian)
pub(crate) fn read_both_u16<S: Read + Seek>(cursor: &mut ByteCursor<S>) -> Result<(u16, u16)> {
    Ok((cursor.read_u16()?, cursor.read_u16_be()?))
}

/// Read a both-byte-order u32 as (little-endian, big-endian)
pub(crate) fn read_both_u32<S: Read + Seek>(cursor: &mut ByteCursor<S>) -> Result<(u32, u32)> {
    Ok((cursor.read_u32()?, cursor.read_u32_be()?))
}
