//! Zig-zag varint encoding used by Avro `int` and `long`.
//!
//! Values are zig-zag mapped to unsigned (sign bit moved to the least
//! significant bit) and then written base-128, least significant group first,
//! with the high bit of each byte marking continuation.

use bytes::{Buf, BufMut};

use crate::WireError;

const DATA_BITS_PER_BYTE: u32 = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Longest encoding of a 64-bit value.
pub const MAX_LEN: usize = 10;

#[inline]
pub fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
}

/// Number of bytes `value` occupies once encoded.
pub fn size(value: i64) -> usize {
    let data_bits = 64 - zigzag(value).leading_zeros();
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE) as usize)
}

/// Writes `value` as a zig-zag varint. The caller checks capacity.
pub fn write(value: i64, buf: &mut impl BufMut) {
    let mut val = zigzag(value);
    while val >= u64::from(CONTINUATION_BIT_MASK) {
        buf.put_u8((val as u8) | CONTINUATION_BIT_MASK);
        val >>= DATA_BITS_PER_BYTE;
    }
    buf.put_u8(val as u8);
}

/// Reads a zig-zag varint.
pub fn read(buf: &mut impl Buf) -> Result<i64, WireError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        if !buf.has_remaining() {
            return Err(WireError::EndOfInput { needed: 1, remaining: 0 });
        }
        let byte = buf.get_u8();

        // The tenth byte may only carry the single remaining bit.
        if shift == 63 && byte > 1 {
            return Err(WireError::InvalidVarint);
        }
        result |= u64::from(byte & DATA_BITS_MASK) << shift;

        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok(unzigzag(result));
        }
        shift += DATA_BITS_PER_BYTE;
        if shift > 63 {
            return Err(WireError::InvalidVarint);
        }
    }
}
