//! Locations of on-disc integers that get rewritten after parsing
//!
//! Parsers record a [`PatchableField`] for every value an editor may later
//! change (a directory record's sector and length, the volume size). The field
//! knows its absolute offset, width and byte order, so rewriting it needs no
//! knowledge of the surrounding structure.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use std::io::{Read, Seek, Write};

/// Width of a single encoded copy of the value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    /// 16-bit value
    U16,
    /// 32-bit value
    U32,
    /// 64-bit value
    U64,
}

impl FieldWidth {
    /// Size of one copy in bytes
    pub const fn bytes(self) -> u64 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Size of one copy in bits
    pub const fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    fn max(self) -> u64 {
        match self {
            Self::U16 => u64::from(u16::MAX),
            Self::U32 => u64::from(u32::MAX),
            Self::U64 => u64::MAX,
        }
    }
}

/// Byte order of the encoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// Little-endian only
    Little,
    /// Big-endian only
    Big,
    /// Little-endian copy immediately followed by a big-endian copy (ISO9660 "both-byte order")
    Both,
}

/// An absolute offset, width and byte order identifying a rewritable integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchableField {
    offset: u64,
    width: FieldWidth,
    order: FieldOrder,
}

impl PatchableField {
    /// Describe a field at `offset`
    pub const fn new(offset: u64, width: FieldWidth, order: FieldOrder) -> Self {
        Self {
            offset,
            width,
            order,
        }
    }

    /// A both-byte-order 32-bit field, as used for ISO9660 sectors and sizes
    pub const fn both_endian_u32(offset: u64) -> Self {
        Self::new(offset, FieldWidth::U32, FieldOrder::Both)
    }

    /// A both-byte-order 16-bit field
    pub const fn both_endian_u16(offset: u64) -> Self {
        Self::new(offset, FieldWidth::U16, FieldOrder::Both)
    }

    /// Absolute offset of the first encoded byte
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Width of one copy
    pub const fn width(&self) -> FieldWidth {
        self.width
    }

    /// Byte order
    pub const fn order(&self) -> FieldOrder {
        self.order
    }

    /// Total encoded size in bytes
    pub const fn encoded_len(&self) -> u64 {
        match self.order {
            FieldOrder::Both => self.width.bytes() * 2,
            FieldOrder::Little | FieldOrder::Big => self.width.bytes(),
        }
    }

    /// Rewrite the field with `value`
    ///
    /// The cursor position is restored afterwards.
    pub fn write<S: Write + Seek>(&self, cursor: &mut ByteCursor<S>, value: u64) -> Result<()> {
        if value > self.width.max() {
            return Err(Error::ValueOutOfRange {
                value,
                bits: self.width.bits(),
                offset: self.offset,
            });
        }

        let mut encoded = Vec::with_capacity(self.encoded_len() as usize);
        if matches!(self.order, FieldOrder::Little | FieldOrder::Both) {
            encoded.extend_from_slice(&value.to_le_bytes()[..self.width.bytes() as usize]);
        }
        if matches!(self.order, FieldOrder::Big | FieldOrder::Both) {
            encoded.extend_from_slice(&value.to_be_bytes()[(8 - self.width.bytes()) as usize..]);
        }

        let saved = cursor.position()?;
        cursor.seek(self.offset)?;
        let written = cursor.write_all(&encoded);
        cursor.seek(saved)?;
        written?;

        log::trace!(
            "Rewrote {:?}/{:?} field at {:#x} to {}",
            self.width,
            self.order,
            self.offset,
            value
        );
        Ok(())
    }

    /// Read the field's current value
    ///
    /// Both-byte-order fields must agree in their two halves. The cursor
    /// position is restored afterwards.
    pub fn read<S: Read + Seek>(&self, cursor: &mut ByteCursor<S>) -> Result<u64> {
        let saved = cursor.position()?;
        cursor.seek(self.offset)?;
        let raw = cursor.read_bytes(self.encoded_len() as usize);
        cursor.seek(saved)?;
        let raw = raw?;

        let n = self.width.bytes() as usize;
        let little = || {
            let mut bytes = [0u8; 8];
            bytes[..n].copy_from_slice(&raw[..n]);
            u64::from_le_bytes(bytes)
        };
        let big = |start: usize| {
            let mut bytes = [0u8; 8];
            bytes[8 - n..].copy_from_slice(&raw[start..start + n]);
            u64::from_be_bytes(bytes)
        };

        match self.order {
            FieldOrder::Little => Ok(little()),
            FieldOrder::Big => Ok(big(0)),
            FieldOrder::Both => {
                let (le, be) = (little(), big(n));
                if le == be {
                    Ok(le)
                } else {
                    Err(Error::EndianMismatch {
                        offset: self.offset,
                        little: le,
                        big: be,
                    })
                }
            }
        }
    }
}
