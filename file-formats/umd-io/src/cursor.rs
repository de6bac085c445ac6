//! Positionable binary reader/writer
//!
//! [`ByteCursor`] wraps any seekable backing and exposes fixed-width integer,
//! string and bulk operations in both byte orders. The two backings used
//! throughout the workspace are [`std::fs::File`] ([`FileCursor`]) and the
//! bounds-enforcing [`MemoryBacking`] ([`MemoryCursor`]).
//!
//! Every operation either completes or leaves the position where it was. A
//! memory backing checks its extent up front; for file backings the cursor
//! seeks back to the starting position when the OS reports a failure.

use crate::error::{Error, Result};
use crate::memory::MemoryBacking;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Byte cursor over an OS file
pub type FileCursor = ByteCursor<File>;

/// Byte cursor over a fixed-extent buffer
pub type MemoryCursor<B = Vec<u8>> = ByteCursor<MemoryBacking<B>>;

const ZERO_CHUNK: [u8; 4096] = [0u8; 4096];

/// Binary reader/writer with a single position
#[derive(Debug)]
pub struct ByteCursor<S> {
    inner: S,
}

impl<S> ByteCursor<S> {
    /// Wrap an arbitrary backing
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Borrow the backing
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the backing
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Recover the backing
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl FileCursor {
    /// Open an existing file for reading and writing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::new(file))
    }

    /// Open an existing file for reading only
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }

    /// Create a file, truncating it if it already exists
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file))
    }
}

impl<B: AsRef<[u8]>> MemoryCursor<B> {
    /// Wrap a buffer; the cursor can never grow past its length
    pub fn from_buffer(buf: B) -> Self {
        Self::new(MemoryBacking::new(buf))
    }

    /// Recover the buffer
    pub fn into_buffer(self) -> B {
        self.inner.into_inner()
    }
}

impl MemoryCursor {
    /// Wrap an owned byte vector
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self::from_buffer(buf)
    }
}

impl<'a> MemoryCursor<&'a [u8]> {
    /// Wrap a borrowed slice as a read-only cursor
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self::from_buffer(buf)
    }
}

impl<S: Seek> ByteCursor<S> {
    /// Current absolute position
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Move to an absolute position
    pub fn seek(&mut self, pos: u64) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::Start(pos))?)
    }

    /// Move relative to the current position
    pub fn skip(&mut self, delta: i64) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::Current(delta))?)
    }

    /// Move to the end of the backing, returning its length
    pub fn seek_to_end(&mut self) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::End(0))?)
    }

    /// Total length of the backing; the position is left unchanged
    pub fn length(&mut self) -> Result<u64> {
        let pos = self.inner.stream_position()?;
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }

    /// Run `op` against the backing, rewinding to the start position on failure
    fn guarded<T>(&mut self, op: impl FnOnce(&mut S) -> io::Result<T>) -> Result<T> {
        let start = self.inner.stream_position()?;
        op(&mut self.inner).map_err(|err| {
            if let Err(rewind) = self.inner.seek(SeekFrom::Start(start)) {
                log::warn!("Failed to rewind cursor to {start} after error: {rewind}");
            }
            Error::from(err)
        })
    }
}

impl<S: Read + Seek> ByteCursor<S> {
    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.guarded(|s| s.read_u8())
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self) -> Result<u16> {
        self.guarded(|s| s.read_u16::<LittleEndian>())
    }

    /// Read a little-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        self.guarded(|s| s.read_u32::<LittleEndian>())
    }

    /// Read a little-endian u64
    pub fn read_u64(&mut self) -> Result<u64> {
        self.guarded(|s| s.read_u64::<LittleEndian>())
    }

    /// Read a big-endian u16
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.guarded(|s| s.read_u16::<BigEndian>())
    }

    /// Read a big-endian u32
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.guarded(|s| s.read_u32::<BigEndian>())
    }

    /// Read a big-endian u64
    pub fn read_u64_be(&mut self) -> Result<u64> {
        self.guarded(|s| s.read_u64::<BigEndian>())
    }

    /// Read a little-endian i32
    pub fn read_i32(&mut self) -> Result<i32> {
        self.guarded(|s| s.read_i32::<LittleEndian>())
    }

    /// Read a little-endian i64
    pub fn read_i64(&mut self) -> Result<i64> {
        self.guarded(|s| s.read_i64::<LittleEndian>())
    }

    /// Fill `buf` completely
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.guarded(|s| s.read_exact(buf))
    }

    /// Read exactly `len` bytes into a new vector
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes as text, replacing invalid UTF-8 sequences
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read bytes up to a NUL terminator, consuming the terminator
    pub fn read_cstring(&mut self) -> Result<String> {
        let bytes = self.guarded(|s| {
            let mut bytes = Vec::new();
            loop {
                match s.read_u8()? {
                    0 => break,
                    b => bytes.push(b),
                }
            }
            Ok(bytes)
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<S: Write + Seek> ByteCursor<S> {
    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.guarded(|s| s.write_u8(value))
    }

    /// Write a little-endian u16
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.guarded(|s| s.write_u16::<LittleEndian>(value))
    }

    /// Write a little-endian u32
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.guarded(|s| s.write_u32::<LittleEndian>(value))
    }

    /// Write a little-endian u64
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.guarded(|s| s.write_u64::<LittleEndian>(value))
    }

    /// Write a big-endian u16
    pub fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.guarded(|s| s.write_u16::<BigEndian>(value))
    }

    /// Write a big-endian u32
    pub fn write_u32_be(&mut self, value: u32) -> Result<()> {
        self.guarded(|s| s.write_u32::<BigEndian>(value))
    }

    /// Write a big-endian u64
    pub fn write_u64_be(&mut self, value: u64) -> Result<()> {
        self.guarded(|s| s.write_u64::<BigEndian>(value))
    }

    /// Write a little-endian i32
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.guarded(|s| s.write_i32::<LittleEndian>(value))
    }

    /// Write a little-endian i64
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.guarded(|s| s.write_i64::<LittleEndian>(value))
    }

    /// Write every byte of `data`
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.guarded(|s| s.write_all(data))
    }

    /// Write the bytes of `text` without a terminator
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        self.write_all(text.as_bytes())
    }

    /// Write exactly `len` bytes: `text` truncated or padded with zeros
    pub fn write_fixed_string(&mut self, text: &str, len: usize) -> Result<()> {
        let mut field = vec![0u8; len];
        let bytes = text.as_bytes();
        let n = bytes.len().min(len);
        field[..n].copy_from_slice(&bytes[..n]);
        self.write_all(&field)
    }

    /// Write `count` zero bytes
    pub fn write_zeros(&mut self, count: u64) -> Result<()> {
        self.guarded(|s| {
            let mut remaining = count;
            while remaining > 0 {
                let n = remaining.min(ZERO_CHUNK.len() as u64) as usize;
                s.write_all(&ZERO_CHUNK[..n])?;
                remaining -= n as u64;
            }
            Ok(())
        })
    }

    /// Pad with zeros up to the next multiple of `boundary`
    ///
    /// Does nothing when the position is already aligned. Returns the
    /// resulting position.
    pub fn align(&mut self, boundary: u64) -> Result<u64> {
        if boundary == 0 {
            return Err(Error::InvalidAlignment(boundary));
        }
        let pos = self.position()?;
        let rem = pos % boundary;
        if rem != 0 {
            self.write_zeros(boundary - rem)?;
        }
        self.position()
    }

    /// Flush buffered writes to the backing
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }
}
