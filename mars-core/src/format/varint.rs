use std::io::{self, Read, Write};

use byteorder::ReadBytesExt;

use super::FormatError;

/// A varint is at most this many 7-bit groups.
pub const MAX_VARINT_GROUPS: u32 = 4;

pub const MAX_VARINT: u32 = (1 << (7 * MAX_VARINT_GROUPS)) - 1;

/// Read an unsigned varint.
///
/// Groups are little-endian: the first byte carries the low seven bits. The *last*
/// byte is the one with its high bit set. If four groups go by without a terminating
/// byte the value is 0; the four bytes stay consumed.
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    let mut res = 0u32;
    let mut groups = 0u32;
    loop {
        let b = r.read_u8()?;
        res |= u32::from(b & 0x7f) << (groups * 7);
        if b > 0x7f {
            break;
        }
        groups += 1;
        if groups >= MAX_VARINT_GROUPS {
            log::debug!("varint overflow after {} groups, yielding 0", groups);
            return Ok(0);
        }
    }
    Ok(res)
}

pub fn varint_len(value: u32) -> usize {
    let mut len = 1;
    let mut v = value >> 7;
    while v != 0 {
        len += 1;
        v >>= 7;
    }
    len
}

/// Write `value` as a varint, returning the number of bytes written.
pub fn write_varint<W: Write + ?Sized>(w: &mut W, value: u32) -> Result<usize, FormatError> {
    if value > MAX_VARINT {
        return Err(FormatError::VarintTooLarge(value));
    }

    let mut buf = [0u8; MAX_VARINT_GROUPS as usize];
    let mut v = value;
    let mut n = 0;
    loop {
        buf[n] = (v & 0x7f) as u8;
        v >>= 7;
        n += 1;
        if v == 0 {
            break;
        }
    }
    buf[n - 1] |= 0x80;
    w.write_all(&buf[..n])?;
    Ok(n)
}
