//! Archive builder for creating PATCHFS archives

use crate::error::{Error, Result};
use crate::{HEADER_SIZE, MAGIC, POINTER_SIZE, RECORD_SIZE};
use std::collections::HashSet;
use std::io::{Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use umd_io::ByteCursor;

/// Builder for PATCHFS archives
///
/// Layout written: header, nested name pointers, directory records, every
/// NUL-terminated name (nested archives first), then file contents in the
/// order they were added.
///
/// ```no_run
/// use umd_patchfs::PatchFsBuilder;
///
/// # fn main() -> umd_patchfs::Result<()> {
/// PatchFsBuilder::new()
///     .add_file("fate/EBOOT.xdelta", std::fs::read("EBOOT.xdelta")?)
///     .add_nested("assets.patchfs")
///     .build("patch.patchfs")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PatchFsBuilder {
    files: Vec<(String, Vec<u8>)>,
    nested: Vec<String>,
}

impl PatchFsBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named blob
    pub fn add_file<S: Into<String>, D: Into<Vec<u8>>>(mut self, name: S, data: D) -> Self {
        self.files.push((name.into(), data.into()));
        self
    }

    /// Reference a sibling archive by file name, resolved next to this archive
    pub fn add_nested<S: Into<String>>(mut self, file_name: S) -> Self {
        self.nested.push(file_name.into());
        self
    }

    /// Number of blobs added so far
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, _) in &self.files {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateEntry(name.clone()));
            }
        }
        for name in self.files.iter().map(|(name, _)| name).chain(&self.nested) {
            if name.is_empty() || name.contains('\0') {
                return Err(Error::invalid_format(format!(
                    "entry name {name:?} is empty or contains NUL"
                )));
            }
        }
        if self.files.len() > i32::MAX as usize || self.nested.len() > i32::MAX as usize {
            return Err(Error::invalid_format("too many entries"));
        }
        Ok(())
    }

    /// Write the archive to `cursor` starting at offset 0 and return its size
    pub fn write_to<S: Write + Seek>(&self, cursor: &mut ByteCursor<S>) -> Result<u64> {
        self.validate()?;

        let records_start = HEADER_SIZE + self.nested.len() as u64 * POINTER_SIZE;
        let names_start = records_start + self.files.len() as u64 * RECORD_SIZE;

        let mut next = names_start;
        let mut name_offset = |name: &str| {
            let at = next;
            next += name.len() as u64 + 1;
            at
        };
        let nested_offsets: Vec<u64> = self
            .nested
            .iter()
            .map(|n| name_offset(n.as_str()))
            .collect();
        let file_name_offsets: Vec<u64> = self
            .files
            .iter()
            .map(|(n, _)| name_offset(n.as_str()))
            .collect();
        let contents_start = next;

        cursor.seek(0)?;
        cursor.write_all(MAGIC)?;
        cursor.write_u8(0)?;
        cursor.write_i32(self.files.len() as i32)?;
        cursor.write_i32(self.nested.len() as i32)?;

        for offset in &nested_offsets {
            cursor.write_i64(*offset as i64)?;
        }

        let mut content_offset = contents_start;
        for ((_, data), name_offset) in self.files.iter().zip(&file_name_offsets) {
            cursor.write_i64(*name_offset as i64)?;
            cursor.write_i64(content_offset as i64)?;
            cursor.write_i64(data.len() as i64)?;
            cursor.write_i64(0)?;
            content_offset += data.len() as u64;
        }

        for name in self.nested.iter().chain(self.files.iter().map(|(n, _)| n)) {
            cursor.write_string(name)?;
            cursor.write_u8(0)?;
        }
        for (_, data) in &self.files {
            cursor.write_all(data)?;
        }

        log::debug!(
            "Wrote PATCHFS with {} files and {} nested archives ({content_offset} bytes)",
            self.files.len(),
            self.nested.len()
        );
        Ok(content_offset)
    }

    /// Write the archive to `path`, replacing it atomically
    pub fn build<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        log::info!("Creating PATCHFS archive: {}", path.display());

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut cursor = ByteCursor::new(temp.as_file());
            self.write_to(&mut cursor)?;
            cursor.flush()?;
        }
        temp.persist(path).map_err(|err| Error::from(err.error))?;
        Ok(())
    }
}
