//! Test-only encoders producing containers the decoders accept

#![allow(dead_code)]

/// MSB-first bit packer
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            used: 8,
        }
    }

    pub fn push(&mut self, value: u32, width: u32) {
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

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

const MAX_DISTANCE: usize = (1 << 13) - 1 + 3;

fn push_copy_length(bits: &mut BitWriter, count: usize) {
    let mut remaining = count - 3;
    for width in [2u32, 3, 5].into_iter().chain(std::iter::repeat(8)) {
        let max = (1usize << width) - 1;
        if remaining >= max {
            bits.push(max as u32, width);
            remaining -= max;
        } else {
            bits.push(remaining as u32, width);
            break;
        }
    }
}

/// Greedy CRILAYLA encoder; `data` must be at least 256 bytes
pub fn encode_crilayla(data: &[u8]) -> Vec<u8> {
    assert!(data.len() >= 0x100);
    let (prefix, body) = data.split_at(0x100);

    let mut work = body.to_vec();
    work.reverse();

    let mut bits = BitWriter::new();
    let mut pos = 0;
    while pos < work.len() {
        let mut best = (0usize, 0usize);
        for distance in 3..=pos.min(MAX_DISTANCE) {
            let mut len = 0;
            while pos + len < work.len() && work[pos + len] == work[pos + len - distance] {
                len += 1;
            }
            if len > best.1 {
                best = (distance, len);
            }
        }

        if best.1 >= 3 {
            bits.push(1, 1);
            bits.push((best.0 - 3) as u32, 13);
            push_copy_length(&mut bits, best.1);
            pos += best.1;
        } else {
            bits.push(0, 1);
            bits.push(u32::from(work[pos]), 8);
            pos += 1;
        }
    }

    let mut payload = bits.into_bytes();
    payload.reverse();

    let mut out = b"CRILAYLA".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(prefix);
    out
}

/// IECP container holding only literal groups
pub fn encode_cmp_literals(data: &[u8]) -> Vec<u8> {
    let mut out = b"IECP".to_vec();
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    for chunk in data.chunks(8) {
        out.push(0xFF);
        out.extend_from_slice(chunk);
    }
    out
}

/// Repetitive sample text of `len` bytes
pub fn sample_text(len: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}
