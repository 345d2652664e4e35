use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::endian::Endianness;
use crate::error::Error;

/// Round `len` up to the next multiple of eight. Records and the strings
/// inside them are u64-aligned on the wire.
pub fn pad8(len: usize) -> usize {
    (len + 7) & !7
}

/// A byte-oriented read cursor over a contiguous buffer.
///
/// All multi-byte reads honor the buffer's endianness, so codec code never
/// has to swap anything itself. Reads past the end of the buffer fail with
/// [`Error::Truncated`].
#[derive(Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endianness,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8], endian: Endianness) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    /// Current cursor position.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Total buffer size.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Absolute seek. Seeking past the end fails.
    pub fn seek_set(&mut self, offset: usize) -> Result<(), Error> {
        if offset > self.buf.len() {
            return Err(Error::Truncated("seek target"));
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        if n > self.remaining() {
            return Err(Error::Truncated("skip"));
        }
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if n > self.remaining() {
            return Err(Error::Truncated("bytes"));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let b = self.read_bytes(2)?;
        Ok(match self.endian {
            Endianness::LittleEndian => LittleEndian::read_u16(b),
            Endianness::BigEndian => BigEndian::read_u16(b),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let b = self.read_bytes(4)?;
        Ok(match self.endian {
            Endianness::LittleEndian => LittleEndian::read_u32(b),
            Endianness::BigEndian => BigEndian::read_u32(b),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let b = self.read_bytes(8)?;
        Ok(match self.endian {
            Endianness::LittleEndian => LittleEndian::read_u64(b),
            Endianness::BigEndian => BigEndian::read_u64(b),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(self.read_u32()? as i32)
    }

    /// Read `padded_len` bytes that hold a NUL-terminated string. The
    /// logical string ends at the first NUL inside the padded region.
    pub fn read_string_padded(&mut self, padded_len: usize) -> Result<&'a [u8], Error> {
        let bytes = self.read_bytes(padded_len)?;
        let actual_len = memchr::memchr(0, bytes).unwrap_or(bytes.len());
        Ok(&bytes[..actual_len])
    }

    /// Read a `perf_header_string`: a u32 length prefix (the padded size)
    /// followed by that many bytes, padded to an 8-byte boundary with NULs.
    pub fn read_perf_string(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u32()? as usize;
        self.read_string_padded(len)
    }
}

/// A byte-oriented write cursor producing a contiguous buffer.
///
/// The inverse of [`ByteReader`]: values are converted to the requested
/// endianness on the way out. Writing is append-only; the few header fields
/// whose values are only known after the body exists are patched in place
/// with the `patch_*` methods.
pub struct ByteWriter {
    buf: Vec<u8>,
    endian: Endianness,
}

impl ByteWriter {
    pub fn new(endian: Endianness) -> Self {
        Self {
            buf: Vec::new(),
            endian,
        }
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn tell(&self) -> usize {
        self.buf.len()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut b = [0u8; 2];
        match self.endian {
            Endianness::LittleEndian => LittleEndian::write_u16(&mut b, v),
            Endianness::BigEndian => BigEndian::write_u16(&mut b, v),
        }
        self.buf.extend_from_slice(&b);
    }

    pub fn write_u32(&mut self, v: u32) {
        let mut b = [0u8; 4];
        match self.endian {
            Endianness::LittleEndian => LittleEndian::write_u32(&mut b, v),
            Endianness::BigEndian => BigEndian::write_u32(&mut b, v),
        }
        self.buf.extend_from_slice(&b);
    }

    pub fn write_u64(&mut self, v: u64) {
        let mut b = [0u8; 8];
        match self.endian {
            Endianness::LittleEndian => LittleEndian::write_u64(&mut b, v),
            Endianness::BigEndian => BigEndian::write_u64(&mut b, v),
        }
        self.buf.extend_from_slice(&b);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_u32(v as u32);
    }

    /// Write a string NUL-terminated and padded with NULs to `padded_len`.
    pub fn write_string_padded(&mut self, s: &[u8], padded_len: usize) {
        debug_assert!(s.len() < padded_len);
        self.buf.extend_from_slice(s);
        self.write_zeros(padded_len - s.len());
    }

    /// Write a `perf_header_string`: padded size prefix, then the padded
    /// NUL-terminated string.
    pub fn write_perf_string(&mut self, s: &[u8]) {
        let padded_len = pad8(s.len() + 1);
        self.write_u32(padded_len as u32);
        self.write_string_padded(s, padded_len);
    }

    pub fn patch_u64(&mut self, offset: usize, v: u64) {
        let slot = &mut self.buf[offset..offset + 8];
        match self.endian {
            Endianness::LittleEndian => LittleEndian::write_u64(slot, v),
            Endianness::BigEndian => BigEndian::write_u64(slot, v),
        }
    }

    pub fn patch_u16(&mut self, offset: usize, v: u16) {
        let slot = &mut self.buf[offset..offset + 2];
        match self.endian {
            Endianness::LittleEndian => LittleEndian::write_u16(slot, v),
            Endianness::BigEndian => BigEndian::write_u16(slot, v),
        }
    }
}
