//! IECP ("CMP") decoder
//!
//! An LZSS variant with a 4 KiB ring dictionary. After the 8-byte header the
//! input is a sequence of groups: one control byte whose bits, least
//! significant first, select a literal byte (bit set) or a two-byte
//! back-reference (bit clear) for each of the next eight tokens.
//!
//! A back-reference `b1 b2` addresses dictionary offset
//! `((b2 & 0xF0) << 4) | b1` and copies `(b2 & 0x0F) + 3` bytes. Every
//! produced byte is also written into the dictionary.

use crate::error::{Error, Result};
use crate::MAX_OUTPUT_SIZE;

/// Container magic
pub const MAGIC: &[u8; 4] = b"IECP";

/// Size of the fixed header (magic + decoded size)
pub const HEADER_SIZE: usize = 8;

/// Size of the ring dictionary
pub const DICTIONARY_SIZE: usize = 4096;

/// Initial dictionary write position
pub const DICTIONARY_START: usize = 0xFEE;

const DICTIONARY_MASK: usize = DICTIONARY_SIZE - 1;

/// Read the declared decoded size from a container header
pub fn declared_size(data: &[u8]) -> Result<u32> {
    if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
        return Err(Error::InvalidMagic {
            format: "IECP",
            found: data[..data.len().min(MAGIC.len())].to_vec(),
        });
    }
    if data.len() < HEADER_SIZE {
        return Err(Error::invalid_format(format!(
            "IECP header truncated: {} bytes",
            data.len()
        )));
    }
    Ok(u32::from_le_bytes([data[4], data[5], data[6], data[7]]))
}

/// Decoder state: output buffer plus ring dictionary
struct Window {
    out: Vec<u8>,
    written: usize,
    dict: [u8; DICTIONARY_SIZE],
    dict_pos: usize,
}

impl Window {
    fn new(size: usize) -> Self {
        Self {
            out: vec![0u8; size],
            written: 0,
            dict: [0u8; DICTIONARY_SIZE],
            dict_pos: DICTIONARY_START,
        }
    }

    fn emit(&mut self, byte: u8) -> Result<()> {
        let capacity = self.out.len();
        let slot = self.out.get_mut(self.written).ok_or(Error::OutputOverflow {
            position: self.written,
            count: 1,
            capacity,
        })?;
        *slot = byte;
        self.written += 1;
        self.dict[self.dict_pos] = byte;
        self.dict_pos = (self.dict_pos + 1) & DICTIONARY_MASK;
        Ok(())
    }

    fn copy(&mut self, offset: usize, length: usize) -> Result<()> {
        // Inclusive bound: a length of L yields L + 1 bytes
        for i in 0..=length {
            let byte = self.dict[(offset + i) & DICTIONARY_MASK];
            self.emit(byte)?;
        }
        Ok(())
    }
}

/// Decode an IECP container
///
/// The result always has exactly the declared size; bytes the stream never
/// produces stay zero.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let size = declared_size(data)?;
    if u64::from(size) > MAX_OUTPUT_SIZE {
        return Err(Error::invalid_format(format!(
            "IECP declared size {size} exceeds limit"
        )));
    }

    log::debug!(
        "Decoding IECP: {} compressed bytes -> {} bytes",
        data.len() - HEADER_SIZE,
        size
    );

    let mut window = Window::new(size as usize);
    let mut pos = HEADER_SIZE;

    while pos < data.len() {
        let control = data[pos];
        pos += 1;

        for bit in 0..8 {
            if pos == data.len() {
                break;
            }

            if control & (1 << bit) != 0 {
                window.emit(data[pos])?;
                pos += 1;
                continue;
            }

            let (b1, b2) = match data.get(pos..pos + 2) {
                Some(&[b1, b2]) => (b1 as usize, b2 as usize),
                _ => {
                    return Err(Error::OutOfBounds {
                        offset: pos,
                        needed: 2,
                        available: data.len() - pos,
                    });
                }
            };
            pos += 2;

            let length = (b2 & 0x0F) + 2;
            let offset = ((b2 & 0xF0) << 4) | b1;
            window.copy(offset, length)?;
        }
    }

    if window.written < window.out.len() {
        log::debug!(
            "IECP stream ended after {} of {} bytes",
            window.written,
            window.out.len()
        );
    }
    Ok(window.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn container(size: u32, body: &[u8]) -> Vec<u8> {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_all_literals() {
        let data = container(8, &[0xFF, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(decompress(&data).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_back_reference_copies_length_plus_one() {
        // Literals land at 0xFEE..=0xFF0; the pair points back at 0xFEE
        let data = container(6, &[0x07, b'a', b'b', b'c', 0xEE, 0xF0]);
        assert_eq!(decompress(&data).unwrap(), b"abcabc".to_vec());
    }

    #[test]
    fn test_back_reference_into_zeroed_dictionary() {
        let data = container(4, &[0x00, 0x00, 0x00]);
        assert_eq!(decompress(&data).unwrap(), vec![0u8; 3 + 1]);
    }

    #[test]
    fn test_overlapping_copy_repeats_run() {
        // One literal at 0xFEE, then copy 5 bytes from 0xFEE while writing at 0xFEF
        let data = container(6, &[0x01, b'x', 0xEE, 0xF2]);
        assert_eq!(decompress(&data).unwrap(), b"xxxxxx".to_vec());
    }

    #[test]
    fn test_short_stream_zero_fills() {
        let data = container(5, &[0x03, 9, 8]);
        assert_eq!(decompress(&data).unwrap(), vec![9, 8, 0, 0, 0]);
    }

    #[test]
    fn test_output_overflow() {
        let data = container(2, &[0x07, 1, 2, 3]);
        assert!(matches!(
            decompress(&data).unwrap_err(),
            Error::OutputOverflow {
                position: 2,
                capacity: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_cut_back_reference() {
        let data = container(8, &[0x01, 1, 0xEE]);
        assert!(matches!(
            decompress(&data).unwrap_err(),
            Error::OutOfBounds {
                offset: 10,
                needed: 2,
                available: 1
            }
        ));
    }

    #[test_case(b"IECQ\x08\0\0\0" ; "wrong magic")]
    #[test_case(b"IE" ; "short magic")]
    #[test_case(b"IECP\x08" ; "truncated size")]
    fn test_rejects_bad_header(data: &[u8]) {
        assert!(decompress(data).unwrap_err().is_format());
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decompress(&container(3, &[])).unwrap(), vec![0, 0, 0]);
    }
}
