//! Random-access byte streams that block framing is read from.
//!
//! All multi-byte fields in BTGA files are little-endian and are decoded
//! explicitly from byte arrays, never by reinterpreting buffers.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::BtgaError;

/// A byte stream with a known total length and a read position.
pub trait BlockSource {
    /// Total length of the underlying stream in bytes.
    fn total_len(&self) -> u64;

    /// Current read position.
    fn position(&self) -> u64;

    /// Fill `buf` from the current position and advance past it.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BtgaError>;

    /// Advance the position by `n` bytes without reading them.
    fn skip(&mut self, n: u64) -> Result<(), BtgaError>;

    /// Move the position to an absolute offset.
    fn seek_to(&mut self, pos: u64) -> Result<(), BtgaError>;

    fn read_u16_le(&mut self) -> Result<u16, BtgaError> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32_le(&mut self) -> Result<u32, BtgaError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_i32_le(&mut self) -> Result<i32, BtgaError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Read `len` bytes into a fresh buffer.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, BtgaError> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Fail unless `[start, start + len)` lies within `file_len`.
pub(crate) fn check_range(start: u64, len: u64, file_len: u64) -> Result<(), BtgaError> {
    match start.checked_add(len) {
        Some(end) if end <= file_len => Ok(()),
        Some(end) => Err(BtgaError::TruncatedInput { end, file_len }),
        None => Err(BtgaError::TruncatedInput {
            end: u64::MAX,
            file_len,
        }),
    }
}

/// In-memory source over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn position_after(&self, n: u64) -> Result<usize, BtgaError> {
        let file_len = self.data.len() as u64;
        check_range(self.pos as u64, n, file_len)?;
        // check_range bounds the result by data.len()
        Ok(self.pos + n as usize)
    }
}

impl BlockSource for SliceSource<'_> {
    fn total_len(&self) -> u64 {
        self.data.len() as u64
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BtgaError> {
        let end = self.position_after(buf.len() as u64)?;
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<(), BtgaError> {
        self.pos = self.position_after(n)?;
        Ok(())
    }

    fn seek_to(&mut self, pos: u64) -> Result<(), BtgaError> {
        check_range(0, pos, self.data.len() as u64)?;
        self.pos = pos as usize;
        Ok(())
    }
}

/// Source over any seekable reader, such as an open file.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    len: u64,
    pos: u64,
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> IoSource<R> {
    /// Wrap a reader, measuring its length and rewinding to the start.
    pub fn new(mut inner: R) -> Result<Self, BtgaError> {
        use std::io::SeekFrom;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len, pos: 0 })
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> BlockSource for IoSource<R> {
    fn total_len(&self) -> u64 {
        self.len
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BtgaError> {
        check_range(self.pos, buf.len() as u64, self.len)?;
        std::io::Read::read_exact(&mut self.inner, buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<(), BtgaError> {
        check_range(self.pos, n, self.len)?;
        self.seek_to(self.pos + n)
    }

    fn seek_to(&mut self, pos: u64) -> Result<(), BtgaError> {
        check_range(0, pos, self.len)?;
        self.inner.seek(std::io::SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }
}
