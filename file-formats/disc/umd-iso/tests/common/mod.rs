//! Synthetic ISO9660 images for integration tests

#![allow(dead_code)]

use std::collections::BTreeSet;

pub const SECTOR: usize = 2048;
pub const DESCRIPTOR_OFFSET: usize = 16 * SECTOR;
pub const VOLUME_SPACE_SIZE_OFFSET: usize = DESCRIPTOR_OFFSET + 80;
pub const BLOCK_SIZE_OFFSET: usize = DESCRIPTOR_OFFSET + 128;

/// Where the builder put a file
#[derive(Debug, Clone)]
pub struct Placed {
    pub path: String,
    pub lba: u32,
    pub length: u32,
}

/// A built image plus the file layout
#[derive(Debug, Clone)]
pub struct SyntheticIso {
    pub bytes: Vec<u8>,
    pub files: Vec<Placed>,
}

impl SyntheticIso {
    pub fn file(&self, path: &str) -> &Placed {
        self.files
            .iter()
            .find(|f| f.path == path)
            .unwrap_or_else(|| panic!("no synthetic file {path}"))
    }

    pub fn sectors(&self) -> u32 {
        (self.bytes.len() / SECTOR) as u32
    }
}

/// Builds a single-volume image: descriptors, one path table, one sector per
/// directory, then file data with every file starting on a sector boundary
#[derive(Debug, Default)]
pub struct IsoBuilder {
    files: Vec<(String, Vec<u8>)>,
    supplementary: bool,
}

impl IsoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; directories in its path are created implicitly
    pub fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.push((path.to_string(), data.to_vec()));
        self
    }

    /// Put a type 2 descriptor between the primary descriptor and the terminator
    pub fn with_supplementary_descriptor(mut self) -> Self {
        self.supplementary = true;
        self
    }

    pub fn build(self) -> SyntheticIso {
        // Directories ordered by depth so parents precede children
        let mut dir_set = BTreeSet::new();
        for (path, _) in &self.files {
            let mut parts: Vec<&str> = path.split('/').collect();
            parts.pop();
            for depth in 1..=parts.len() {
                dir_set.insert(parts[..depth].join("/"));
            }
        }
        let mut dirs: Vec<String> = vec![String::new()];
        let mut rest: Vec<String> = dir_set.into_iter().collect();
        rest.sort_by_key(|d| (d.matches('/').count(), d.clone()));
        dirs.extend(rest);

        let descriptor_count = if self.supplementary { 3 } else { 2 };
        let path_table_lba = 16 + descriptor_count;
        let first_dir_lba = path_table_lba + 1;
        let dir_lba = |dir: &str| -> u32 {
            first_dir_lba + dirs.iter().position(|d| d == dir).unwrap() as u32
        };

        let mut next_lba = first_dir_lba + dirs.len() as u32;
        let mut placed = Vec::new();
        for (path, data) in &self.files {
            placed.push(Placed {
                path: path.clone(),
                lba: next_lba,
                length: data.len() as u32,
            });
            next_lba += data.len().div_ceil(SECTOR).max(1) as u32;
        }
        let total_sectors = next_lba;
        let mut image = vec![0u8; total_sectors as usize * SECTOR];

        // Path table
        let mut table = Vec::new();
        for dir in &dirs {
            let (name, parent) = match dir.rsplit_once('/') {
                _ if dir.is_empty() => ("\0".to_string(), 1u16),
                Some((parent, name)) => (
                    name.to_string(),
                    dirs.iter().position(|d| d == parent).unwrap() as u16 + 1,
                ),
                None => (dir.clone(), 1u16),
            };
            table.push(name.len() as u8);
            table.push(0);
            table.extend_from_slice(&dir_lba(dir).to_le_bytes());
            table.extend_from_slice(&parent.to_le_bytes());
            table.extend_from_slice(name.as_bytes());
            if name.len() % 2 == 1 {
                table.push(0);
            }
        }
        put(&mut image, path_table_lba as usize * SECTOR, &table);

        // Descriptors
        let mut pvd = vec![0u8; SECTOR];
        pvd[0] = 1;
        pvd[1..6].copy_from_slice(b"CD001");
        pvd[6] = 1;
        pvd[8..40].copy_from_slice(&pad(b"PSP GAME", 32));
        pvd[40..72].copy_from_slice(&pad(b"UMD_TEST", 32));
        pvd[80..88].copy_from_slice(&both32(total_sectors));
        pvd[120..124].copy_from_slice(&both16(1));
        pvd[124..128].copy_from_slice(&both16(1));
        pvd[128..132].copy_from_slice(&both16(SECTOR as u16));
        pvd[132..140].copy_from_slice(&both32(table.len() as u32));
        pvd[140..144].copy_from_slice(&path_table_lba.to_le_bytes());
        pvd[148..152].copy_from_slice(&path_table_lba.to_be_bytes());
        pvd[156..190].copy_from_slice(&record(b"\0", first_dir_lba, SECTOR as u32, 2));
        pvd[813..829].copy_from_slice(b"2008012312000000");
        put(&mut image, DESCRIPTOR_OFFSET, &pvd);

        let mut next_descriptor = DESCRIPTOR_OFFSET + SECTOR;
        if self.supplementary {
            image[next_descriptor] = 2;
            image[next_descriptor + 1..next_descriptor + 6].copy_from_slice(b"CD001");
            next_descriptor += SECTOR;
        }
        image[next_descriptor] = 255;
        image[next_descriptor + 1..next_descriptor + 6].copy_from_slice(b"CD001");
        image[next_descriptor + 6] = 1;

        // Directory records
        for dir in &dirs {
            let own = dir_lba(dir);
            let parent = match dir.rsplit_once('/') {
                _ if dir.is_empty() => own,
                Some((parent, _)) => dir_lba(parent),
                None => first_dir_lba,
            };
            let mut run = record(b"\0", own, SECTOR as u32, 2);
            run.extend(record(b"\x01", parent, SECTOR as u32, 2));

            for child in dirs.iter().filter(|d| !d.is_empty() && parent_of(d) == *dir) {
                let name = child.rsplit('/').next().unwrap();
                run.extend(record(name.as_bytes(), dir_lba(child), SECTOR as u32, 2));
            }
            for file in placed.iter().filter(|f| parent_of(&f.path) == *dir) {
                let name = file.path.rsplit('/').next().unwrap();
                run.extend(record(name.as_bytes(), file.lba, file.length, 0));
            }
            assert!(run.len() <= SECTOR, "directory {dir:?} overflows one sector");
            put(&mut image, own as usize * SECTOR, &run);
        }

        for (file, (_, data)) in placed.iter().zip(&self.files) {
            put(&mut image, file.lba as usize * SECTOR, data);
        }

        SyntheticIso {
            bytes: image,
            files: placed,
        }
    }
}

/// Directory record with identifier `name`
pub fn record(name: &[u8], lba: u32, length: u32, attributes: u8) -> Vec<u8> {
    let size = 33 + name.len() + (name.len() + 1) % 2;
    let mut out = vec![size as u8, 0];
    out.extend_from_slice(&both32(lba));
    out.extend_from_slice(&both32(length));
    out.extend_from_slice(&[0u8; 7]);
    out.extend_from_slice(&[attributes, 0, 0]);
    out.extend_from_slice(&both16(1));
    out.push(name.len() as u8);
    out.extend_from_slice(name);
    out.resize(size, 0);
    out
}

pub fn both32(value: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&value.to_le_bytes());
    out[4..].copy_from_slice(&value.to_be_bytes());
    out
}

pub fn both16(value: u16) -> [u8; 4] {
    let mut out = [0u8; 4];
    out[..2].copy_from_slice(&value.to_le_bytes());
    out[2..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Little-endian half of a both-byte-order u32 at `offset`
pub fn read_le32(image: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(image[offset..offset + 4].try_into().unwrap())
}

/// Big-endian half of a both-byte-order u32 at `offset`
pub fn read_be32(image: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(image[offset + 4..offset + 8].try_into().unwrap())
}

fn parent_of(path: &str) -> String {
    path.rsplit_once('/')
        .map(|(parent, _)| parent.to_string())
        .unwrap_or_default()
}

fn pad(text: &[u8], len: usize) -> Vec<u8> {
    let mut out = text.to_vec();
    out.resize(len, b' ');
    out
}

fn put(image: &mut [u8], offset: usize, data: &[u8]) {
    image[offset..offset + data.len()].copy_from_slice(data);
}
