//! A positioned cursor over an in-memory byte buffer.
//!
//! `ByteCursor` is the sole way higher layers touch raw bytes: absolute
//! seeks, sized big/little-endian reads, and bounds-checked slices. Every
//! parser in this crate (`utf::table`, `afs::archive`) is built on top of it.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// A read-only, seekable view over a byte buffer.
///
/// Holds either a borrowed slice or a buffer it owns (e.g. one read in full
/// from a file via [`ByteCursor::from_file`]); either way reads are bounds
/// checked against the buffer's length and never panic.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor over a borrowed byte slice, positioned at the start.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read an entire file into memory and hand back an owned buffer.
    ///
    /// Callers that want a `ByteCursor` over it construct one with
    /// [`ByteCursor::new`] on the returned `Vec`; the file handle itself does
    /// not outlive this call.
    pub fn read_file(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    /// Current absolute position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the cursor has no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes remaining after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::OffsetOutOfBounds {
                offset: pos,
                len: 0,
                region_size: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Read a slice of `len` bytes and advance the cursor.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::OffsetOutOfBounds {
                offset: self.pos,
                len,
                region_size: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a big-endian `i16`.
    pub fn read_i16_be(&mut self) -> Result<i16> {
        Ok(self.read_u16_be()? as i16)
    }

    /// Read a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian `i32`.
    pub fn read_i32_be(&mut self) -> Result<i32> {
        Ok(self.read_u32_be()? as i32)
    }

    /// Read a big-endian `u64`.
    pub fn read_u64_be(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a big-endian `i64`.
    pub fn read_i64_be(&mut self) -> Result<i64> {
        Ok(self.read_u64_be()? as i64)
    }

    /// Read a big-endian `f32`.
    pub fn read_f32_be(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32_be()?))
    }

    /// Read a big-endian `f64`.
    pub fn read_f64_be(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64_be()?))
    }

    /// Read a NUL-terminated byte run starting at `offset` (absolute), not
    /// touching the cursor's own position.
    pub fn read_cstr_at(&self, offset: usize) -> Result<&'a [u8]> {
        if offset > self.data.len() {
            return Err(Error::OffsetOutOfBounds {
                offset,
                len: 1,
                region_size: self.data.len(),
            });
        }
        let end = self.data[offset..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::OffsetOutOfBounds {
                offset,
                len: 1,
                region_size: self.data.len(),
            })?;
        Ok(&self.data[offset..offset + end])
    }

    /// Get a sub-cursor over `data[offset..offset+len]`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<ByteCursor<'a>> {
        if offset + len > self.data.len() {
            return Err(Error::OffsetOutOfBounds {
                offset,
                len,
                region_size: self.data.len(),
            });
        }
        Ok(ByteCursor::new(&self.data[offset..offset + len]))
    }

    /// Borrow the whole underlying buffer, ignoring position.
    #[must_use]
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}
