//! Little-endian path table
//!
//! The path table lists every directory once, parents before children, with
//! 1-based parent indices. The first entry is the root directory, which names
//! itself as its own parent.

use crate::SECTOR_SIZE;
use crate::error::{Error, Result};
use std::io::{Read, Seek};
use umd_io::ByteCursor;

/// Parent index of the root directory
pub const ROOT_INDEX: u16 = 1;

/// One directory listed in the path table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTableEntry {
    /// Directory identifier as stored (`"\0"` for the root)
    pub name: String,
    /// First sector of the directory's records
    pub lba: u32,
    /// 1-based index of the parent directory
    pub parent: u16,
    /// Relative path without the root component (`""` for the root)
    pub path: String,
}

impl PathTableEntry {
    /// Check whether this is the root directory
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Relative path of a child named `name`
    pub fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }
}

/// Parsed path table with resolved relative paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTable {
    entries: Vec<PathTableEntry>,
}

impl PathTable {
    /// Read `size` bytes of path table starting at sector `lba`
    pub fn read<S: Read + Seek>(cursor: &mut ByteCursor<S>, lba: u32, size: u32) -> Result<Self> {
        let start = u64::from(lba) * SECTOR_SIZE;
        let end = start + u64::from(size);
        cursor.seek(start)?;
        log::trace!("Path table at {start}, size {size}");

        let mut raw = Vec::new();
        while cursor.position()? < end {
            let name_len = cursor.read_u8()?;
            let ext_attr_len = cursor.read_u8()?;
            if ext_attr_len != 0 {
                return Err(Error::invalid_format(format!(
                    "path table entry {} has an extended attribute record",
                    raw.len() + 1
                )));
            }
            let entry_lba = cursor.read_u32()?;
            let parent = cursor.read_u16()?;
            let name = cursor.read_string(name_len as usize)?;
            if name_len % 2 == 1 {
                cursor.skip(1)?;
            }
            log::trace!("Path table entry: {name:?}, LBA: {entry_lba}, parent: {parent}");
            raw.push((name, entry_lba, parent));
        }

        if raw.is_empty() {
            return Err(Error::invalid_format("path table is empty"));
        }

        Self::resolve(raw)
    }

    /// Build entries from (name, lba, parent) triples, resolving every path
    fn resolve(raw: Vec<(String, u32, u16)>) -> Result<Self> {
        let count = raw.len();
        let mut entries = Vec::with_capacity(count);

        for (index, (name, lba, parent)) in raw.iter().enumerate() {
            let path = if index == 0 {
                String::new()
            } else {
                let mut parts = vec![name.as_str()];
                let mut current = *parent;
                // A well-formed chain reaches the root in fewer steps than there are entries
                let mut steps = 0;
                while current != ROOT_INDEX {
                    if current == 0 || usize::from(current) > count {
                        return Err(Error::invalid_format(format!(
                            "path table entry {} has parent index {current} outside 1..={count}",
                            index + 1
                        )));
                    }
                    steps += 1;
                    if steps >= count {
                        return Err(Error::invalid_format(format!(
                            "path table entry {} has a cyclic parent chain",
                            index + 1
                        )));
                    }
                    let (parent_name, _, next) = &raw[usize::from(current) - 1];
                    parts.push(parent_name.as_str());
                    current = *next;
                }
                parts.reverse();
                parts.join("/")
            };

            entries.push(PathTableEntry {
                name: name.clone(),
                lba: *lba,
                parent: *parent,
                path,
            });
        }

        Ok(Self { entries })
    }

    /// All entries in table order
    pub fn entries(&self) -> &[PathTableEntry] {
        &self.entries
    }

    /// Entry by 1-based index
    pub fn get(&self, index: u16) -> Option<&PathTableEntry> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
    }

    /// Number of directories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the table lists no directories
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
