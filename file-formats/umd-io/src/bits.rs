//! Bit-granularity reader over a byte slice

use crate::error::{Error, Result};

/// Order in which bits are taken from each byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Bit 7 first, bit 0 last
    #[default]
    MsbFirst,
    /// Bit 0 first, bit 7 last
    LsbFirst,
}

/// Reads individual bits and bit fields from a materialized buffer
///
/// Multi-bit values are always assembled most-significant-bit first,
/// whatever the per-byte [`BitOrder`]. A read that would run past the
/// buffer fails and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    order: BitOrder,
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitCursor<'a> {
    /// Create a cursor at the first bit of `data`
    pub fn new(data: &'a [u8], order: BitOrder) -> Self {
        Self {
            data,
            order,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// Index of the byte holding the next bit
    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }

    /// Index (0-7) of the next bit within the current byte, counted in read order
    pub fn bit_position(&self) -> u8 {
        self.bit_pos
    }

    /// Configured bit order
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Check whether every bit has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.byte_pos >= self.data.len()
    }

    /// Number of bits left to read
    pub fn remaining_bits(&self) -> usize {
        self.data
            .len()
            .saturating_sub(self.byte_pos)
            .saturating_mul(8)
            .saturating_sub(self.bit_pos as usize)
    }

    /// Read the next bit
    pub fn read_bit(&mut self) -> Result<bool> {
        let byte = *self
            .data
            .get(self.byte_pos)
            .ok_or(Error::EndOfBitStream {
                position: self.byte_pos,
            })?;

        let shift = match self.order {
            BitOrder::MsbFirst => 7 - self.bit_pos,
            BitOrder::LsbFirst => self.bit_pos,
        };

        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok((byte >> shift) & 1 == 1)
    }

    /// Read 8 bits as a byte, first bit read becoming the most significant
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read `width` bits (at most 32) as an unsigned integer, MSB first
    pub fn read_bits(&mut self, width: u32) -> Result<u32> {
        if width > 32 {
            return Err(Error::InvalidBitWidth(width));
        }
        if self.remaining_bits() < width as usize {
            return Err(Error::EndOfBitStream {
                position: self.byte_pos,
            });
        }

        let mut value = 0u32;
        for _ in 0..width {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }
}
