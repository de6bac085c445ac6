//! CRILAYLA decoder
//!
//! Container layout (little-endian):
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0x00 | 8 | magic `"CRILAYLA"` |
//! | 0x08 | 4 | decoded payload size `N` |
//! | 0x0C | 4 | compressed payload size `C` |
//! | 0x10 | `C` | compressed payload |
//! | 0x10 + `C` | 0x100 | uncompressed prefix |
//!
//! The encoder works from the end of the file towards the start, so the
//! payload is reversed before being read as an MSB-first bit stream and the
//! decoded buffer is reversed again afterwards. The result is the prefix
//! followed by the `N` decoded bytes.

use crate::error::{Error, Result};
use crate::MAX_OUTPUT_SIZE;
use umd_io::{BitCursor, BitOrder};

/// Container magic
pub const MAGIC: &[u8; 8] = b"CRILAYLA";

/// Size of the fixed header
pub const HEADER_SIZE: usize = 0x10;

/// Size of the uncompressed block that trails the payload
pub const PREFIX_SIZE: usize = 0x100;

/// Width of a back-reference distance field
const LOOKBACK_BITS: u32 = 13;

/// Smallest distance and smallest copy length of a back-reference
const MIN_MATCH: usize = 3;

/// Field widths used to accumulate a copy length; the last one repeats
const LENGTH_FIELD_WIDTHS: [u32; 4] = [2, 3, 5, 8];

/// Parsed container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Decoded payload size, excluding the prefix
    pub uncompressed_size: u32,
    /// Compressed payload size
    pub compressed_size: u32,
}

impl Header {
    /// Parse and validate the header of a container
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
            return Err(Error::InvalidMagic {
                format: "CRILAYLA",
                found: data[..data.len().min(MAGIC.len())].to_vec(),
            });
        }
        if data.len() < HEADER_SIZE {
            return Err(Error::invalid_format(format!(
                "CRILAYLA header truncated: {} bytes",
                data.len()
            )));
        }

        let read_u32 =
            |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        Ok(Self {
            uncompressed_size: read_u32(8),
            compressed_size: read_u32(12),
        })
    }

    /// Size of the fully decoded file, prefix included
    pub fn output_size(&self) -> u64 {
        u64::from(self.uncompressed_size) + PREFIX_SIZE as u64
    }
}

/// Decode a CRILAYLA container
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let header = Header::parse(data)?;
    let size = header.uncompressed_size as usize;
    let payload_len = header.compressed_size as usize;

    let available = data.len() - HEADER_SIZE;
    if available < payload_len.saturating_add(PREFIX_SIZE) {
        return Err(Error::invalid_format(format!(
            "CRILAYLA container truncated: need {} bytes after header, have {}",
            payload_len.saturating_add(PREFIX_SIZE),
            available
        )));
    }
    if header.output_size() > MAX_OUTPUT_SIZE {
        return Err(Error::invalid_format(format!(
            "CRILAYLA declared size {} exceeds limit",
            header.output_size()
        )));
    }

    log::debug!(
        "Decoding CRILAYLA: {} compressed bytes -> {} bytes",
        payload_len,
        header.output_size()
    );

    let payload_start = HEADER_SIZE;
    let prefix_start = payload_start + payload_len;

    let mut payload = data[payload_start..prefix_start].to_vec();
    payload.reverse();

    let mut decoded = decode_payload(&payload, size)?;
    decoded.reverse();

    let mut output = Vec::with_capacity(PREFIX_SIZE + size);
    output.extend_from_slice(&data[prefix_start..prefix_start + PREFIX_SIZE]);
    output.extend_from_slice(&decoded);
    Ok(output)
}

/// Run the bit-level decoder over an already reversed payload
fn decode_payload(payload: &[u8], size: usize) -> Result<Vec<u8>> {
    let mut bits = BitCursor::new(payload, BitOrder::MsbFirst);
    let mut out = vec![0u8; size];
    let mut pos = 0usize;

    while pos < size {
        if !bits.read_bit()? {
            out[pos] = bits.read_byte()?;
            pos += 1;
            continue;
        }

        let distance = bits.read_bits(LOOKBACK_BITS)? as usize + MIN_MATCH;
        let count = read_copy_length(&mut bits)?;

        if distance > pos {
            return Err(Error::InvalidLookback {
                position: pos,
                distance,
            });
        }
        if count > size - pos {
            return Err(Error::OutputOverflow {
                position: pos,
                count,
                capacity: size,
            });
        }

        // Byte-wise so overlapping copies repeat the most recent output
        for _ in 0..count {
            out[pos] = out[pos - distance];
            pos += 1;
        }
        log::trace!("Back-reference: distance {distance}, {count} bytes, now at {pos}");
    }

    Ok(out)
}

fn read_copy_length(bits: &mut BitCursor<'_>) -> Result<usize> {
    let mut count = MIN_MATCH;
    let widths = LENGTH_FIELD_WIDTHS
        .iter()
        .copied()
        .chain(std::iter::repeat(LENGTH_FIELD_WIDTHS[LENGTH_FIELD_WIDTHS.len() - 1]));

    for width in widths {
        let field = bits.read_bits(width)? as usize;
        count += field;
        if field != (1usize << width) - 1 {
            break;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// MSB-first bit packer mirroring the decoder's reader
    struct Bits {
        bytes: Vec<u8>,
        used: u8,
    }

    impl Bits {
        fn new() -> Self {
            Self {
                bytes: Vec::new(),
                used: 8,
            }
        }

        fn push(&mut self, value: u32, width: u32) {
            for i in (0..width).rev() {
                if self.used == 8 {
                    self.bytes.push(0);
                    self.used = 0;
                }
                if (value >> i) & 1 == 1 {
                    *self.bytes.last_mut().unwrap() |= 0x80 >> self.used;
                }
                self.used += 1;
            }
        }
    }

    fn container(bits: Bits, size: u32, prefix: &[u8; PREFIX_SIZE]) -> Vec<u8> {
        let mut payload = bits.bytes;
        payload.reverse();

        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&payload);
        data.extend_from_slice(prefix);
        data
    }

    #[test]
    fn test_literals_only() {
        let prefix = [0x5Au8; PREFIX_SIZE];
        let mut bits = Bits::new();
        // Decoded back to front: emit "DCBA" to get "ABCD"
        for &b in b"DCBA" {
            bits.push(0, 1);
            bits.push(u32::from(b), 8);
        }

        let output = decompress(&container(bits, 4, &prefix)).unwrap();
        assert_eq!(output.len(), PREFIX_SIZE + 4);
        assert_eq!(&output[..PREFIX_SIZE], &prefix[..]);
        assert_eq!(&output[PREFIX_SIZE..], b"ABCD");
    }

    #[test]
    fn test_escalating_copy_length() {
        // 3 literals then a copy of 3 + 3 + 7 + 2 = 15 bytes at distance 3
        let mut bits = Bits::new();
        for &b in b"ZYX" {
            bits.push(0, 1);
            bits.push(u32::from(b), 8);
        }
        bits.push(1, 1);
        bits.push(0, 13);
        bits.push(3, 2);
        bits.push(7, 3);
        bits.push(2, 5);

        let output = decompress(&container(bits, 18, &[0u8; PREFIX_SIZE])).unwrap();
        assert_eq!(&output[PREFIX_SIZE..], b"XYZXYZXYZXYZXYZXYZ");
    }

    #[test]
    fn test_lookback_before_start() {
        let mut bits = Bits::new();
        bits.push(0, 1);
        bits.push(0x41, 8);
        bits.push(1, 1);
        bits.push(0, 13);
        bits.push(0, 2);

        let err = decompress(&container(bits, 8, &[0u8; PREFIX_SIZE])).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLookback {
                position: 1,
                distance: 3
            }
        ));
    }

    #[test]
    fn test_copy_overrun() {
        let mut bits = Bits::new();
        for &b in b"abc" {
            bits.push(0, 1);
            bits.push(u32::from(b), 8);
        }
        bits.push(1, 1);
        bits.push(0, 13);
        bits.push(2, 2);

        let err = decompress(&container(bits, 6, &[0u8; PREFIX_SIZE])).unwrap_err();
        assert!(matches!(
            err,
            Error::OutputOverflow {
                position: 3,
                count: 5,
                capacity: 6
            }
        ));
    }

    #[test]
    fn test_exhausted_bitstream() {
        let mut bits = Bits::new();
        bits.push(0, 1);
        bits.push(0x41, 8);

        let err = decompress(&container(bits, 4, &[0u8; PREFIX_SIZE])).unwrap_err();
        assert!(err.is_bounds());
    }

    #[test]
    fn test_bad_magic() {
        let err = decompress(b"CRILAYLB\0\0\0\0\0\0\0\0").unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
        assert!(decompress(b"CRI").unwrap_err().is_format());
    }

    #[test]
    fn test_truncated_container() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 100]);

        let err = decompress(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_header_output_size() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.compressed_size, 3);
        assert_eq!(header.output_size(), 266);
    }
}
