//! Parsed view of an ISO9660 image

use crate::directory::{DirectoryEntry, read_directory};
use crate::error::{Error, Result};
use crate::path_table::PathTable;
use crate::volume::{PrimaryVolumeDescriptor, read_volume_descriptors};
use crate::{MIN_IMAGE_SECTORS, SECTOR_SIZE};
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use umd_io::{ByteCursor, FileCursor};

/// Summary of an image, as reported by [`IsoImage::info`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoInfo {
    /// System identifier
    pub system_id: String,
    /// Volume identifier
    pub volume_id: String,
    /// Creation date as stored
    pub creation_date: String,
    /// Declared volume size in sectors
    pub volume_sectors: u32,
    /// Actual image size in bytes
    pub image_size: u64,
    /// Path table size in bytes
    pub path_table_size: u32,
    /// Path table sector
    pub path_table_lba: u32,
    /// Number of directories in the path table
    pub directory_count: usize,
    /// Number of ordinary files
    pub file_count: usize,
    /// Sum of all file lengths
    pub total_file_size: u64,
}

/// Directory tree of an ISO9660 image
///
/// The tree is read once and never changes; [`IsoEditor`](crate::IsoEditor)
/// keeps its own record of where edited files now live.
#[derive(Debug, Clone)]
pub struct IsoImage {
    descriptor: PrimaryVolumeDescriptor,
    path_table: PathTable,
    entries: Vec<DirectoryEntry>,
    index: HashMap<String, usize>,
    image_size: u64,
}

impl IsoImage {
    /// Open and parse an image file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading ISO: {}", path.display());
        let mut cursor = FileCursor::open_read_only(path)?;
        Self::read(&mut cursor)
    }

    /// Parse an image from any seekable cursor
    pub fn read<S: Read + Seek>(cursor: &mut ByteCursor<S>) -> Result<Self> {
        let image_size = cursor.length()?;
        if image_size <= MIN_IMAGE_SECTORS * SECTOR_SIZE {
            return Err(Error::invalid_format(format!(
                "image is {image_size} bytes, expected more than {MIN_IMAGE_SECTORS} sectors"
            )));
        }

        let descriptor = read_volume_descriptors(cursor, image_size)?;
        let path_table = PathTable::read(
            cursor,
            descriptor.path_table_lba,
            descriptor.path_table_size,
        )?;

        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for directory in path_table.entries() {
            for entry in read_directory(cursor, directory)? {
                if index.insert(entry.path.clone(), entries.len()).is_some() {
                    return Err(Error::invalid_format(format!(
                        "duplicate directory entry {:?}",
                        entry.path
                    )));
                }
                entries.push(entry);
            }
        }

        log::debug!(
            "Parsed ISO {:?}: {} directories, {} entries",
            descriptor.volume_id,
            path_table.len(),
            entries.len()
        );

        Ok(Self {
            descriptor,
            path_table,
            entries,
            index,
            image_size,
        })
    }

    /// Primary volume descriptor
    pub fn descriptor(&self) -> &PrimaryVolumeDescriptor {
        &self.descriptor
    }

    /// Path table
    pub fn path_table(&self) -> &PathTable {
        &self.path_table
    }

    /// Every directory record, in path table order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Ordinary files only
    pub fn files(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter().filter(|entry| entry.is_file())
    }

    /// Size of the image in bytes when it was parsed
    pub fn image_size(&self) -> u64 {
        self.image_size
    }

    /// Look up an ordinary file by relative path
    pub fn find_file(&self, path: &str) -> Result<&DirectoryEntry> {
        self.index
            .get(path)
            .map(|&i| &self.entries[i])
            .filter(|entry| entry.is_file())
            .ok_or_else(|| Error::FileNotFound(path.to_string()))
    }

    /// Look up a file and seek `cursor` to its first byte
    pub fn locate_file<S: Seek>(
        &self,
        cursor: &mut ByteCursor<S>,
        path: &str,
    ) -> Result<&DirectoryEntry> {
        let entry = self.find_file(path)?;
        log::trace!("Found {path} at LBA {}", entry.lba);
        cursor.seek(entry.data_offset())?;
        Ok(entry)
    }

    /// Read a file's bytes
    pub fn read_file<S: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<S>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let entry = self.locate_file(cursor, path)?;
        Ok(cursor.read_bytes(entry.length as usize)?)
    }

    /// Summarize the image
    pub fn info(&self) -> IsoInfo {
        let (file_count, total_file_size) = self
            .files()
            .fold((0, 0u64), |(n, size), entry| (n + 1, size + u64::from(entry.length)));

        IsoInfo {
            system_id: self.descriptor.system_id.clone(),
            volume_id: self.descriptor.volume_id.clone(),
            creation_date: self.descriptor.creation_date.clone(),
            volume_sectors: self.descriptor.volume_space_size,
            image_size: self.image_size,
            path_table_size: self.descriptor.path_table_size,
            path_table_lba: self.descriptor.path_table_lba,
            directory_count: self.path_table.len(),
            file_count,
            total_file_size,
        }
    }
}
