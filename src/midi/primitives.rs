//! Binary primitives for Standard MIDI Files
//!
//! Variable-length quantities (VLQ) carry delta times; every other integer in
//! the file is fixed-width big-endian.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

/// Largest value a MIDI variable-length quantity can carry (28 bits)
pub const VLQ_MAX: u32 = 0x0FFF_FFFF;

/// Number of bytes `value` occupies as a variable-length quantity
pub fn vlq_len(value: u32) -> usize {
    let mut len = 1;
    let mut rest = value >> 7;
    while rest > 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

/// Write `value` as a variable-length quantity.
///
/// Big-endian groups of 7 bits; every byte but the last has its high bit set.
/// The encoding is minimal, so `0` is a single zero byte.
///
/// # Returns
/// Number of bytes written
pub fn write_vlq<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<usize> {
    let len = vlq_len(value);
    let mut buf = [0u8; 5];
    for (i, byte) in buf[..len].iter_mut().enumerate() {
        let shift = 7 * (len - 1 - i);
        *byte = ((value >> shift) & 0x7F) as u8;
        if i + 1 < len {
            *byte |= 0x80;
        }
    }
    w.write_all(&buf[..len])?;
    Ok(len)
}

/// Decode a variable-length quantity from the front of `bytes`.
///
/// # Returns
/// `(value, bytes consumed)`, or `None` if the input ends mid-quantity or the
/// quantity is longer than the four bytes MIDI allows
pub fn read_vlq(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value = 0u32;
    for (i, &byte) in bytes.iter().take(4).enumerate() {
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

pub fn write_u16_be<W: Write + ?Sized>(w: &mut W, value: u16) -> io::Result<usize> {
    w.write_u16::<BigEndian>(value)?;
    Ok(2)
}

pub fn write_u32_be<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<usize> {
    w.write_u32::<BigEndian>(value)?;
    Ok(4)
}

/// Write the low 24 bits of `value` big-endian (tempo payloads)
pub fn write_u24_be<W: Write + ?Sized>(w: &mut W, value: u32) -> io::Result<usize> {
    w.write_u24::<BigEndian>(value)?;
    Ok(3)
}

pub fn write_bytes<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> io::Result<usize> {
    w.write_all(bytes)?;
    Ok(bytes.len())
}

/// Write a chunk header: four-character tag followed by the payload length
pub fn write_chunk_header<W: Write + ?Sized>(w: &mut W, tag: &[u8; 4], len: u32) -> io::Result<usize> {
    Ok(write_bytes(w, tag)? + write_u32_be(w, len)?)
}
