//! utils.rs
//! Bounded byte reader and big-endian write helpers shared by every codec.
//!
//! Design notes:
//! - Reads never panic: every short read becomes `FormatError::Truncated` with context.
//! - Strings use a 1–4 byte variable-length prefix: the count of leading zero
//!   bits in the first byte (plus one) is the prefix length, and the highest set
//!   bit of the prefix is a marker that is stripped from the value.

use std::fmt;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;

use crate::headers::FormatError;

/// Largest length the variable-length prefix can carry (4 bytes, 28 value bits).
pub const MAX_PREFIXED_LEN: usize = (1 << 28) - 1;

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Everything not consumed yet.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::Truncated { context, needed: n, available: self.remaining() });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn peek_u8(&self, context: &'static str) -> Result<u8, FormatError> {
        self.buf.get(self.pos).copied()
            .ok_or(FormatError::Truncated { context, needed: 1, available: 0 })
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8, FormatError> {
        Ok(self.take(1, context)?[0])
    }

    pub fn read_u16_be(&mut self, context: &'static str) -> Result<u16, FormatError> {
        Ok(BigEndian::read_u16(self.take(2, context)?))
    }

    pub fn read_u32_be(&mut self, context: &'static str) -> Result<u32, FormatError> {
        Ok(BigEndian::read_u32(self.take(4, context)?))
    }

    pub fn read_u32_le(&mut self, context: &'static str) -> Result<u32, FormatError> {
        Ok(LittleEndian::read_u32(self.take(4, context)?))
    }

    pub fn read_u64_le(&mut self, context: &'static str) -> Result<u64, FormatError> {
        Ok(LittleEndian::read_u64(self.take(8, context)?))
    }

    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], FormatError> {
        self.take(n, context)
    }

    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, context)?);
        Ok(out)
    }

    /// Read a variable-length size prefix followed by that many bytes.
    pub fn read_length_prefixed(&mut self, context: &'static str) -> Result<&'a [u8], FormatError> {
        let first = self.peek_u8(context)?;
        let prefix_len = first.leading_zeros() as usize + 1;
        if prefix_len > 4 {
            return Err(FormatError::Invalid(format!("{context}: size prefix longer than 4 bytes")));
        }
        let prefix = self.take(prefix_len, context)?;
        let mut value = prefix.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
        // marker bit sits right above the 7*n value bits
        value ^= 1 << (7 * prefix_len);
        self.take(value as usize, context)
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_string(&mut self, context: &'static str) -> Result<String, FormatError> {
        let raw = self.read_length_prefixed(context)?;
        String::from_utf8(raw.to_vec()).map_err(|_| FormatError::InvalidUtf8 { context })
    }
}

pub fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn put_u16_be(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn put_u32_be(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn put_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn put_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write `data` behind the shortest variable-length prefix that fits it.
pub fn put_length_prefixed(out: &mut Vec<u8>, data: &[u8], context: &'static str) -> Result<(), FormatError> {
    let len = data.len();
    let prefix_len = (1..=4usize)
        .find(|n| len < (1usize << (7 * n)))
        .ok_or(FormatError::LengthOverflow { context, len, max: MAX_PREFIXED_LEN })?;
    let encoded = (len as u32) | (1u32 << (7 * prefix_len));
    out.extend_from_slice(&encoded.to_be_bytes()[4 - prefix_len..]);
    out.extend_from_slice(data);
    Ok(())
}

/// Write a u16 big-endian length then the bytes; fails when `data` exceeds `max`.
pub fn put_u16_prefixed(out: &mut Vec<u8>, data: &[u8], max: usize, context: &'static str) -> Result<(), FormatError> {
    if data.len() > max {
        return Err(FormatError::LengthOverflow { context, len: data.len(), max });
    }
    put_u16_be(out, data.len() as u16);
    out.extend_from_slice(data);
    Ok(())
}
