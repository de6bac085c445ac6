//! Bounds-enforcing in-memory backing
//!
//! [`MemoryBacking`] behaves like [`std::io::Cursor`] with one difference: its
//! extent is fixed at construction. Any read, write or seek that would cross
//! the end of the buffer fails with a [`BoundsViolation`] before a single byte
//! is copied or the position moves.

use crate::error::BoundsViolation;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Fixed-extent buffer usable as a [`ByteCursor`](crate::ByteCursor) backing
///
/// Any `B: AsRef<[u8]>` can be read. Writing additionally requires
/// `B: AsMut<[u8]>`, so a borrowed `&[u8]` yields a read-only cursor.
#[derive(Debug, Clone)]
pub struct MemoryBacking<B> {
    buf: B,
    pos: u64,
}

impl<B: AsRef<[u8]>> MemoryBacking<B> {
    /// Wrap a buffer, positioned at its start
    pub fn new(buf: B) -> Self {
        Self { buf, pos: 0 }
    }

    /// Fixed size of the buffer in bytes
    pub fn len(&self) -> u64 {
        self.buf.as_ref().len() as u64
    }

    /// Check whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buf.as_ref().is_empty()
    }

    /// Borrow the underlying buffer
    pub fn get_ref(&self) -> &B {
        &self.buf
    }

    /// Recover the underlying buffer
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// Resolve an access of `len` bytes at the current position to a slice
    /// range, or report the violation without side effects.
    fn span(&self, len: usize) -> io::Result<std::ops::Range<usize>> {
        let extent = self.len();
        let end = self.pos.checked_add(len as u64);
        match end {
            Some(end) if end <= extent => Ok(self.pos as usize..end as usize),
            _ => Err(BoundsViolation {
                offset: self.pos,
                len: len as u64,
                extent,
            }
            .into()),
        }
    }
}

impl<B: AsRef<[u8]>> Read for MemoryBacking<B> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let data = self.buf.as_ref();
        let start = (self.pos as usize).min(data.len());
        let n = out.len().min(data.len() - start);
        out[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn read_exact(&mut self, out: &mut [u8]) -> io::Result<()> {
        let range = self.span(out.len())?;
        out.copy_from_slice(&self.buf.as_ref()[range]);
        self.pos += out.len() as u64;
        Ok(())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Write for MemoryBacking<B> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write_all(data)?;
        Ok(data.len())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let range = self.span(data.len())?;
        self.buf.as_mut()[range].copy_from_slice(data);
        self.pos += data.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<B: AsRef<[u8]>> Seek for MemoryBacking<B> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let extent = self.len();
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => extent.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        match target {
            Some(target) if target <= extent => {
                self.pos = target;
                Ok(target)
            }
            Some(target) => Err(BoundsViolation {
                offset: target,
                len: 0,
                extent,
            }
            .into()),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_exact_rejects_overrun_without_moving() {
        let mut backing = MemoryBacking::new(vec![1u8, 2, 3]);
        backing.seek(SeekFrom::Start(1)).unwrap();

        let mut out = [0u8; 4];
        let err = backing.read_exact(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(out, [0, 0, 0, 0]);
        assert_eq!(backing.stream_position().unwrap(), 1);
    }

    #[test]
    fn test_write_is_all_or_nothing() {
        let mut backing = MemoryBacking::new(vec![0u8; 4]);
        backing.seek(SeekFrom::Start(2)).unwrap();

        assert!(backing.write_all(&[9, 9, 9]).is_err());
        assert_eq!(backing.get_ref(), &vec![0u8; 4]);
        assert_eq!(backing.stream_position().unwrap(), 2);

        backing.write_all(&[7, 8]).unwrap();
        assert_eq!(backing.into_inner(), vec![0, 0, 7, 8]);
    }

    #[test]
    fn test_seek_bounds() {
        let mut backing = MemoryBacking::new([0u8; 8]);
        assert_eq!(backing.seek(SeekFrom::End(0)).unwrap(), 8);
        assert_eq!(backing.seek(SeekFrom::Current(-3)).unwrap(), 5);
        assert!(backing.seek(SeekFrom::Start(9)).is_err());
        assert!(backing.seek(SeekFrom::Current(-6)).is_err());
        assert_eq!(backing.stream_position().unwrap(), 5);
    }

    #[test]
    fn test_short_read_at_end() {
        let mut backing = MemoryBacking::new(&b"abc"[..]);
        let mut out = [0u8; 8];
        assert_eq!(backing.read(&mut out).unwrap(), 3);
        assert_eq!(backing.read(&mut out).unwrap(), 0);
    }
}
