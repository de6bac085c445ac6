//! In-place and relocating file edits on a destination image
//!
//! An [`IsoEditor`] is a patch session over a writable copy of an image whose
//! tree was parsed beforehand with [`IsoImage`]. Opening the session blanks
//! the primary volume descriptor sector so a half-written image is never
//! mistaken for a valid disc; [`IsoEditor::finish`] puts it back and records
//! the final volume size.
//!
//! There is no rollback. If an edit fails, discard the destination image.
//!
//! ```no_run
//! use umd_io::FileCursor;
//! use umd_iso::{IsoEditor, IsoImage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! std::fs::copy("game.iso", "patched.iso")?;
//! let image = IsoImage::open("game.iso")?;
//! let mut source = FileCursor::open_read_only("game.iso")?;
//!
//! let mut editor = IsoEditor::begin(FileCursor::open("patched.iso")?)?;
//! editor.replace_file(&image, "PSP_GAME/PARAM.SFO", &std::fs::read("PARAM.SFO")?)?;
//! editor.relocate_file(&image, &mut source, "PSP_GAME/ICON0.PNG")?;
//! editor.finish()?;
//! # Ok(())
//! # }
//! ```

use crate::delta::{DeltaPatch, Replace};
use crate::directory::{DirectoryEntry, sectors_for};
use crate::error::{Error, Result};
use crate::image::IsoImage;
use crate::volume::VOLUME_SPACE_SIZE_OFFSET;
use crate::{SECTOR_SIZE, VOLUME_DESCRIPTOR_SECTOR};
use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use umd_io::{ByteCursor, PatchableField};

/// Where a file's data currently lives in the destination image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// First sector
    pub lba: u32,
    /// Length in bytes
    pub length: u32,
    /// Sectors reserved at `lba`; in-place patches may not exceed this.
    /// Zero for an empty file, which may share its LBA with the next file.
    pub capacity_sectors: u64,
}

impl Placement {
    fn of(entry: &DirectoryEntry) -> Self {
        Self {
            lba: entry.lba,
            length: entry.length,
            capacity_sectors: entry.sectors(),
        }
    }

    /// Absolute offset of the first data byte
    pub fn data_offset(&self) -> u64 {
        u64::from(self.lba) * SECTOR_SIZE
    }
}

/// Patch session over a destination image
#[derive(Debug)]
pub struct IsoEditor<S> {
    cursor: ByteCursor<S>,
    descriptor_offset: u64,
    stashed_descriptor: Vec<u8>,
    placements: HashMap<String, Placement>,
}

impl<S: Read + Write + Seek> IsoEditor<S> {
    /// Start a session: stash the primary descriptor and blank its sector
    pub fn begin(mut cursor: ByteCursor<S>) -> Result<Self> {
        let descriptor_offset = VOLUME_DESCRIPTOR_SECTOR * SECTOR_SIZE;
        log::trace!("Removing primary volume descriptor at {descriptor_offset}");

        cursor.seek(descriptor_offset)?;
        let stashed_descriptor = cursor.read_bytes(SECTOR_SIZE as usize)?;
        cursor.seek(descriptor_offset)?;
        cursor.write_zeros(SECTOR_SIZE)?;

        Ok(Self {
            cursor,
            descriptor_offset,
            stashed_descriptor,
            placements: HashMap::new(),
        })
    }

    /// The destination cursor
    pub fn cursor(&mut self) -> &mut ByteCursor<S> {
        &mut self.cursor
    }

    /// Current location of a file, reflecting earlier edits in this session
    pub fn placement(&self, image: &IsoImage, path: &str) -> Result<Placement> {
        let entry = image.find_file(path)?;
        Ok(self.current(entry))
    }

    fn current(&self, entry: &DirectoryEntry) -> Placement {
        self.placements
            .get(&entry.path)
            .copied()
            .unwrap_or_else(|| Placement::of(entry))
    }

    /// Read a file's current content from the destination image
    pub fn read_file(&mut self, image: &IsoImage, path: &str) -> Result<Vec<u8>> {
        let place = self.placement(image, path)?;
        self.cursor.seek(place.data_offset())?;
        Ok(self.cursor.read_bytes(place.length as usize)?)
    }

    /// Patch a file where it lives
    ///
    /// The file's current bytes and `patch` go through `engine`. The result
    /// must fit in the sectors the file already occupies; otherwise nothing is
    /// written and [`Error::CapacityExceeded`] is returned. Unused trailing
    /// bytes up to the old length are zeroed and the record's length field is
    /// rewritten.
    pub fn patch_file<D>(
        &mut self,
        image: &IsoImage,
        path: &str,
        patch: &[u8],
        engine: &D,
    ) -> Result<Placement>
    where
        D: DeltaPatch + ?Sized,
    {
        let entry = image.find_file(path)?;
        let place = self.current(entry);

        self.cursor.seek(place.data_offset())?;
        let source = self.cursor.read_bytes(place.length as usize)?;
        let patched = engine.apply(&source, patch)?;

        let required = sectors_for(patched.len() as u64);
        let new_length = u32::try_from(patched.len())
            .ok()
            .filter(|_| required <= place.capacity_sectors)
            .ok_or_else(|| Error::CapacityExceeded {
                path: path.to_string(),
                available: place.capacity_sectors,
                required,
            })?;

        self.cursor.seek(place.data_offset())?;
        self.cursor.write_all(&patched)?;
        if new_length < place.length {
            self.cursor
                .write_zeros(u64::from(place.length - new_length))?;
        }
        entry
            .length_field()
            .write(&mut self.cursor, u64::from(new_length))?;

        let updated = Placement {
            length: new_length,
            ..place
        };
        self.placements.insert(entry.path.clone(), updated);
        log::debug!(
            "Patched {path} in place at LBA {}: {} -> {} bytes",
            place.lba,
            place.length,
            new_length
        );
        Ok(updated)
    }

    /// Overwrite a file in place with new content
    pub fn replace_file(
        &mut self,
        image: &IsoImage,
        path: &str,
        content: &[u8],
    ) -> Result<Placement> {
        self.patch_file(image, path, content, &Replace)
    }

    /// Patch `size` bytes at `offset` inside a file
    ///
    /// The engine must return exactly `size` bytes. No metadata changes.
    pub fn patch_file_range<D>(
        &mut self,
        image: &IsoImage,
        path: &str,
        offset: u64,
        size: u64,
        patch: &[u8],
        engine: &D,
    ) -> Result<()>
    where
        D: DeltaPatch + ?Sized,
    {
        let entry = image.find_file(path)?;
        let place = self.current(entry);
        let length = u64::from(place.length);
        if offset.checked_add(size).is_none_or(|end| end > length) {
            return Err(Error::RangeOutOfFile {
                path: path.to_string(),
                offset,
                size,
                length,
            });
        }

        let start = place.data_offset() + offset;
        self.cursor.seek(start)?;
        let source = self.cursor.read_bytes(size as usize)?;
        let patched = engine.apply(&source, patch)?;
        if patched.len() as u64 != size {
            return Err(Error::SizeMismatch {
                path: path.to_string(),
                expected: size,
                actual: patched.len() as u64,
            });
        }

        self.cursor.seek(start)?;
        self.cursor.write_all(&patched)?;
        log::debug!("Patched {size} bytes of {path} at offset {offset}");
        Ok(())
    }

    /// Copy a file from `source` to a new sector-aligned location at the end
    /// of the destination image and point its record there
    pub fn relocate_file<R: Read + Seek>(
        &mut self,
        image: &IsoImage,
        source: &mut ByteCursor<R>,
        path: &str,
    ) -> Result<Placement> {
        let entry = image.find_file(path)?;
        let data = image.read_file(source, path)?;
        self.append(entry, &data)
    }

    /// Relocate a file and patch it on the way, so it may grow without limit
    pub fn relocate_and_patch_file<R, D>(
        &mut self,
        image: &IsoImage,
        source: &mut ByteCursor<R>,
        path: &str,
        patch: &[u8],
        engine: &D,
    ) -> Result<Placement>
    where
        R: Read + Seek,
        D: DeltaPatch + ?Sized,
    {
        let entry = image.find_file(path)?;
        let data = image.read_file(source, path)?;
        let patched = engine.apply(&data, patch)?;
        self.append(entry, &patched)
    }

    fn append(&mut self, entry: &DirectoryEntry, data: &[u8]) -> Result<Placement> {
        let length = u32::try_from(data.len()).map_err(|_| Error::CapacityExceeded {
            path: entry.path.clone(),
            available: u64::from(u32::MAX).div_ceil(SECTOR_SIZE),
            required: sectors_for(data.len() as u64),
        })?;

        self.cursor.seek_to_end()?;
        let start = self.cursor.align(SECTOR_SIZE)?;
        let lba = u32::try_from(start / SECTOR_SIZE)
            .map_err(|_| Error::invalid_format("destination image exceeds 2^32 sectors"))?;

        self.cursor.write_all(data)?;
        self.cursor.align(SECTOR_SIZE)?;

        entry
            .sector_field()
            .write(&mut self.cursor, u64::from(lba))?;
        entry
            .length_field()
            .write(&mut self.cursor, u64::from(length))?;

        let placement = Placement {
            lba,
            length,
            capacity_sectors: sectors_for(u64::from(length)),
        };
        self.placements.insert(entry.path.clone(), placement);
        log::debug!(
            "Relocated {} from LBA {} to LBA {lba} ({length} bytes)",
            entry.path,
            entry.lba
        );
        Ok(placement)
    }

    /// End the session: restore the primary descriptor and rewrite the
    /// volume space size to the image's final sector count
    pub fn finish(mut self) -> Result<ByteCursor<S>> {
        log::trace!("Restoring primary volume descriptor");
        self.cursor.seek(self.descriptor_offset)?;
        self.cursor.write_all(&self.stashed_descriptor)?;

        let sectors = self.cursor.length()? / SECTOR_SIZE;
        PatchableField::both_endian_u32(self.descriptor_offset + VOLUME_SPACE_SIZE_OFFSET)
            .write(&mut self.cursor, sectors)?;
        self.cursor.flush()?;

        log::debug!(
            "Finished ISO session: {} files edited, volume is {sectors} sectors",
            self.placements.len()
        );
        Ok(self.cursor)
    }
}
