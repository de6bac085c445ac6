//! Container detection and dispatch

use crate::error::{Error, Result};
use crate::{cmp, crilayla};
use std::fmt;

/// Compressed container formats understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// CRI Middleware `CRILAYLA`
    CriLayla,
    /// `IECP` LZSS ("CMP")
    Cmp,
}

impl Compression {
    /// All supported formats
    pub const ALL: [Compression; 2] = [Compression::CriLayla, Compression::Cmp];

    /// Identify a container by its leading magic
    pub fn detect(data: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| data.starts_with(format.magic()))
    }

    /// Leading magic bytes of the container
    pub fn magic(self) -> &'static [u8] {
        match self {
            Compression::CriLayla => crilayla::MAGIC.as_slice(),
            Compression::Cmp => cmp::MAGIC.as_slice(),
        }
    }

    /// Size the decoded output will have, read from the container header
    pub fn decompressed_size(self, data: &[u8]) -> Result<u64> {
        match self {
            Compression::CriLayla => Ok(crilayla::Header::parse(data)?.output_size()),
            Compression::Cmp => Ok(u64::from(cmp::declared_size(data)?)),
        }
    }

    /// Decode a container of this format
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::CriLayla => crilayla::decompress(data),
            Compression::Cmp => cmp::decompress(data),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::CriLayla => write!(f, "CRILAYLA"),
            Compression::Cmp => write!(f, "CMP"),
        }
    }
}

/// Detect the container format and decode it
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let format = Compression::detect(data).ok_or(Error::UnknownFormat)?;
    log::debug!("Detected {format} container");
    format.decompress(data)
}
