use std::io::Read;
use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

#[derive(thiserror::Error, Debug)]
pub enum MemoryError {
    #[error("access of {len} bytes at offset {offset} is out of bounds (size={size})")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    #[error("guest address {addr} is negative")]
    NegativeAddress { addr: i32 },

    #[error("no NUL terminator after offset {offset} (size={size})")]
    Unterminated { offset: usize, size: usize },

    #[error("I/O error while filling memory: {0}")]
    Io(#[from] std::io::Error),
}

/// A fixed-width value that can be stored little-endian in a [`MemoryBuffer`].
pub trait Scalar: Copy {
    const WIDTH: usize;

    fn read_le(bytes: &[u8]) -> Self;
    fn write_le(self, bytes: &mut [u8]);
}

impl Scalar for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self;
    }
}

impl Scalar for i8 {
    const WIDTH: usize = 1;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

macro_rules! le_scalar {
    ($ty:ty, $width:expr, $read:ident, $write:ident) => {
        impl Scalar for $ty {
            const WIDTH: usize = $width;

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                LittleEndian::$read(bytes)
            }

            #[inline]
            fn write_le(self, bytes: &mut [u8]) {
                LittleEndian::$write(bytes, self)
            }
        }
    };
}

le_scalar!(i16, 2, read_i16, write_i16);
le_scalar!(u16, 2, read_u16, write_u16);
le_scalar!(i32, 4, read_i32, write_i32);
le_scalar!(u32, 4, read_u32, write_u32);
le_scalar!(f32, 4, read_f32, write_f32);
le_scalar!(f64, 8, read_f64, write_f64);

/// Owned byte region of fixed size with bounds-checked little-endian access.
///
/// This is both the guest's data memory and the payload of binary resources; data
/// moves between the two with [`MemoryBuffer::copy_into`].
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryBuffer {
    data: Box<[u8]>,
}

impl std::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBuffer").field("size", &self.data.len()).finish()
    }
}

impl From<Vec<u8>> for MemoryBuffer {
    fn from(v: Vec<u8>) -> Self {
        Self { data: v.into_boxed_slice() }
    }
}

impl MemoryBuffer {
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size].into_boxed_slice() }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Validate `[offset, offset + len)` against the buffer.
    pub fn check_range(&self, offset: usize, len: usize) -> Result<Range<usize>, MemoryError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(offset..end),
            _ => Err(MemoryError::OutOfBounds { offset, len, size: self.data.len() }),
        }
    }

    /// Convert a guest address (signed VM word) into a buffer offset.
    pub fn guest_offset(addr: i32) -> Result<usize, MemoryError> {
        usize::try_from(addr).map_err(|_| MemoryError::NegativeAddress { addr })
    }

    pub fn read<T: Scalar>(&self, offset: usize) -> Result<T, MemoryError> {
        let r = self.check_range(offset, T::WIDTH)?;
        Ok(T::read_le(&self.data[r]))
    }

    pub fn write<T: Scalar>(&mut self, offset: usize, value: T) -> Result<(), MemoryError> {
        let r = self.check_range(offset, T::WIDTH)?;
        value.write_le(&mut self.data[r]);
        Ok(())
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8], MemoryError> {
        let r = self.check_range(offset, len)?;
        Ok(&self.data[r])
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        let r = self.check_range(offset, bytes.len())?;
        self.data[r].copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes from `offset` up to (not including) the first NUL.
    pub fn read_cstr(&self, offset: usize) -> Result<&[u8], MemoryError> {
        let rest = self.read_bytes(offset, self.data.len().saturating_sub(offset))?;
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(MemoryError::Unterminated { offset, size: self.data.len() })?;
        Ok(&rest[..end])
    }

    /// Copy exactly `length` bytes from `source` into the buffer at `offset`.
    ///
    /// The range is checked before anything is read from `source`.
    pub fn fill_from<R: Read + ?Sized>(
        &mut self,
        source: &mut R,
        offset: usize,
        length: usize,
    ) -> Result<(), MemoryError> {
        let r = self.check_range(offset, length)?;
        source.read_exact(&mut self.data[r])?;
        Ok(())
    }

    /// Copy `length` bytes from this buffer at `src_offset` into `other` at `dst_offset`.
    ///
    /// Both ranges are checked before any byte is written.
    pub fn copy_into(
        &self,
        other: &mut MemoryBuffer,
        src_offset: usize,
        dst_offset: usize,
        length: usize,
    ) -> Result<(), MemoryError> {
        let src = self.check_range(src_offset, length)?;
        let dst = other.check_range(dst_offset, length)?;
        other.data[dst].copy_from_slice(&self.data[src]);
        Ok(())
    }
}
