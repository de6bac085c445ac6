//! Reading PATCHFS archives

use crate::error::{Error, Result};
use crate::{HEADER_SIZE, MAGIC, MAX_NESTING_DEPTH, POINTER_SIZE, RECORD_SIZE, SIGNATURE_SIZE};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use umd_io::FileCursor;

/// Directory record of one archived blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchFsEntry {
    /// Absolute offset of the NUL-terminated name
    pub name_offset: u64,
    /// Absolute offset of the content
    pub offset: u64,
    /// Content length in bytes
    pub length: u64,
}

/// An opened patch archive and its nested archives
///
/// Lookups search this archive first, then each nested archive in declared
/// order, depth first.
pub struct PatchFs {
    path: PathBuf,
    cursor: Option<FileCursor>,
    valid: bool,
    index: BTreeMap<String, PatchFsEntry>,
    nested: Vec<PatchFs>,
}

impl fmt::Debug for PatchFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchFs")
            .field("path", &self.path)
            .field("valid", &self.valid)
            .field("entries", &self.index.len())
            .field("nested", &self.nested)
            .finish()
    }
}

impl PatchFs {
    /// Open an archive and every archive it nests
    ///
    /// A file without the `PATCHFS` magic opens as an empty, invalid archive,
    /// as does a nested archive that cannot be opened. A top-level archive
    /// that cannot be opened is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_at_depth(path.as_ref(), 0)
    }

    fn open_at_depth(path: &Path, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                path: path.to_path_buf(),
                limit: MAX_NESTING_DEPTH,
            });
        }

        let mut cursor = match FileCursor::open_read_only(path) {
            Ok(cursor) => cursor,
            Err(err) if depth > 0 => {
                log::warn!(
                    "Cannot open nested archive {}, treating it as empty: {err}",
                    path.display()
                );
                return Ok(Self::unusable(path, None));
            }
            Err(err) => return Err(err.into()),
        };
        let archive_len = cursor.length()?;
        let signature = cursor.read_bytes(archive_len.min(SIGNATURE_SIZE) as usize)?;
        // The byte after the magic is not checked
        if !signature.starts_with(MAGIC) || signature.len() < SIGNATURE_SIZE as usize {
            log::warn!(
                "{} is not a PATCHFS archive, treating it as empty",
                path.display()
            );
            return Ok(Self::unusable(path, Some(cursor)));
        }

        let file_count = read_count(&mut cursor, "file count")?;
        let nested_count = read_count(&mut cursor, "nested archive count")?;
        let tables_end =
            HEADER_SIZE + nested_count * POINTER_SIZE + file_count * RECORD_SIZE;
        if tables_end > archive_len {
            return Err(Error::invalid_format(format!(
                "{} declares {file_count} files and {nested_count} nested archives, \
                 which overrun the {archive_len} byte archive",
                path.display()
            )));
        }
        log::debug!(
            "PATCHFS {}: {file_count} files, {nested_count} nested archives",
            path.display()
        );

        cursor.seek(HEADER_SIZE)?;
        let mut nested_pointers = Vec::with_capacity(nested_count as usize);
        for i in 0..nested_count {
            nested_pointers.push(read_offset(&mut cursor, "nested name offset", i)?);
        }

        let mut records = Vec::with_capacity(file_count as usize);
        for i in 0..file_count {
            let name_offset = read_offset(&mut cursor, "name offset", i)?;
            let offset = read_offset(&mut cursor, "content offset", i)?;
            let length = read_offset(&mut cursor, "content length", i)?;
            cursor.skip(8)?;
            if offset.checked_add(length).is_none_or(|end| end > archive_len) {
                return Err(Error::invalid_format(format!(
                    "entry {i} content {offset}+{length} lies outside the archive"
                )));
            }
            records.push(PatchFsEntry {
                name_offset,
                offset,
                length,
            });
        }

        let mut index = BTreeMap::new();
        for entry in records {
            cursor.seek(entry.name_offset)?;
            let name = cursor.read_cstring()?;
            log::trace!(
                "Entry {name:?}: {} bytes at {}",
                entry.length,
                entry.offset
            );
            if index.contains_key(&name) {
                log::warn!("Duplicate entry {name:?} in {}, keeping the first", path.display());
                continue;
            }
            index.insert(name, entry);
        }

        let parent_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut nested = Vec::with_capacity(nested_pointers.len());
        for pointer in nested_pointers {
            cursor.seek(pointer)?;
            let name = cursor.read_cstring()?;
            let nested_path = parent_dir.join(&name);
            log::info!("Open nested PATCHFS: {}", nested_path.display());
            nested.push(Self::open_at_depth(&nested_path, depth + 1)?);
        }

        Ok(Self {
            path: path.to_path_buf(),
            cursor: Some(cursor),
            valid: true,
            index,
            nested,
        })
    }

    fn unusable(path: &Path, cursor: Option<FileCursor>) -> Self {
        Self {
            path: path.to_path_buf(),
            cursor,
            valid: false,
            index: BTreeMap::new(),
            nested: Vec::new(),
        }
    }

    /// Location of this archive on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the archive opened and carried the `PATCHFS` magic
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of entries in this archive and all nested archives
    pub fn files_count(&self) -> usize {
        self.index.len() + self.nested.iter().map(Self::files_count).sum::<usize>()
    }

    /// Content length of `name`, searching nested archives too
    pub fn file_length(&self, name: &str) -> Option<u64> {
        self.find(name).map(|entry| entry.length)
    }

    /// Check whether `name` exists here or in a nested archive
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Entries of this archive only, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PatchFsEntry)> {
        self.index.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Nested archives in declared order
    pub fn nested(&self) -> &[PatchFs] {
        &self.nested
    }

    /// Read the content of `name`
    pub fn get(&mut self, name: &str) -> Result<Vec<u8>> {
        log::trace!("Get PATCHFS entry for: {name:?}");
        self.read_entry(name)?
            .ok_or_else(|| Error::FileNotFound(name.to_string()))
    }

    fn find(&self, name: &str) -> Option<&PatchFsEntry> {
        if let Some(entry) = self.index.get(name) {
            return Some(entry);
        }
        self.nested.iter().find_map(|child| child.find(name))
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        if let (Some(entry), Some(cursor)) = (self.index.get(name).copied(), &mut self.cursor) {
            cursor.seek(entry.offset)?;
            return Ok(Some(cursor.read_bytes(entry.length as usize)?));
        }
        for child in &mut self.nested {
            if let Some(data) = child.read_entry(name)? {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}

fn read_count(cursor: &mut FileCursor, what: &str) -> Result<u64> {
    let value = cursor.read_i32()?;
    u64::try_from(value).map_err(|_| Error::invalid_format(format!("negative {what}: {value}")))
}

fn read_offset(cursor: &mut FileCursor, what: &str, index: u64) -> Result<u64> {
    let value = cursor.read_i64()?;
    u64::try_from(value)
        .map_err(|_| Error::invalid_format(format!("entry {index} has negative {what}: {value}")))
}
