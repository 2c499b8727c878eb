//! Variable-length Integer Encoding (Varint)
//!
//! Instead of always using 8 bytes for a u64, varints use only as many bytes as needed:
//! - Small numbers (0-127) use just 1 byte
//! - Larger numbers use 2-10 bytes depending on magnitude
//! - Each byte uses 7 bits for data and 1 bit as a "continuation" flag
//!
//! Varints show up all over the segment format: page row counts, string lengths,
//! dictionary sizes and every pointer in the footer.
//!
//! Decoding never panics. Truncated input or an over-long encoding is reported as
//! [`Error::Corruption`], because every varint we decode comes from disk.
//!
//! ## Usage
//! ```ignore
//! let mut buf = BytesMut::new();
//! encode_varint_u64(&mut buf, 300);
//! let mut cursor = &buf[..];
//! assert_eq!(decode_varint_u64(&mut cursor)?, 300);
//! ```

use bytes::BufMut;

use crate::error::{Error, Result};

/// Maximum encoded length of a u64 varint
pub const MAX_VARINT_LEN: usize = 10;

/// Encode an unsigned integer as a varint
pub fn encode_varint_u64(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80; // Set continuation bit
        }

        buf.put_u8(byte);

        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `encode_varint_u64` writes for `value`
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint, advancing the cursor past it
pub fn decode_varint_u64(cursor: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in cursor.iter().enumerate() {
        if shift >= 64 || (shift == 63 && (byte & 0x7F) > 1) {
            return Err(Error::corruption("varint overflows u64"));
        }
        value |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            *cursor = &cursor[i + 1..];
            return Ok(value);
        }

        shift += 7;
    }

    Err(Error::corruption("truncated varint"))
}

/// Decode a varint that must fit in a u32
pub fn decode_varint_u32(cursor: &mut &[u8]) -> Result<u32> {
    let value = decode_varint_u64(cursor)?;
    u32::try_from(value).map_err(|_| Error::corruption(format!("varint {} overflows u32", value)))
}
