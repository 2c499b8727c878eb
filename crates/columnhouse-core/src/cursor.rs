//! Bounds-checked readers over `&[u8]`.
//!
//! `bytes::Buf` panics when a read runs past the end of the buffer, which is
//! fine for data we just produced but not for bytes read back from disk. These
//! helpers return [`Error::Corruption`] instead, naming what was being read.

use crate::error::{Error, Result};

/// Split `len` bytes off the front of the cursor
pub fn take<'a>(cursor: &mut &'a [u8], len: usize, what: &str) -> Result<&'a [u8]> {
    if cursor.len() < len {
        return Err(Error::corruption(format!(
            "truncated {}: need {} bytes, {} remaining",
            what,
            len,
            cursor.len()
        )));
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Ok(head)
}

pub fn get_u8(cursor: &mut &[u8], what: &str) -> Result<u8> {
    Ok(take(cursor, 1, what)?[0])
}

pub fn get_u32_le(cursor: &mut &[u8], what: &str) -> Result<u32> {
    let bytes = take(cursor, 4, what)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn get_u64_le(cursor: &mut &[u8], what: &str) -> Result<u64> {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(take(cursor, 8, what)?);
    Ok(u64::from_le_bytes(raw))
}

/// Read a fixed-size array
pub fn get_array<const N: usize>(cursor: &mut &[u8], what: &str) -> Result<[u8; N]> {
    let mut raw = [0u8; N];
    raw.copy_from_slice(take(cursor, N, what)?);
    Ok(raw)
}

/// Read a presence byte (0 or 1)
pub fn get_flag(cursor: &mut &[u8], what: &str) -> Result<bool> {
    match get_u8(cursor, what)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::corruption(format!("invalid {} flag: {}", what, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_advances() {
        let data = [1u8, 2, 3, 4];
        let mut cursor = &data[..];
        assert_eq!(take(&mut cursor, 3, "head").unwrap(), &[1, 2, 3]);
        assert_eq!(cursor, &[4]);
    }

    #[test]
    fn test_take_past_end_is_corruption() {
        let data = [1u8, 2];
        let mut cursor = &data[..];
        let err = take(&mut cursor, 3, "body").unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("body"));
    }

    #[test]
    fn test_fixed_width_le() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        data.extend_from_slice(&42u64.to_le_bytes());
        let mut cursor = &data[..];
        assert_eq!(get_u32_le(&mut cursor, "a").unwrap(), 0xDEADBEEF);
        assert_eq!(get_u64_le(&mut cursor, "b").unwrap(), 42);
        assert!(get_u8(&mut cursor, "c").is_err());
    }

    #[test]
    fn test_flag_rejects_garbage() {
        let mut cursor: &[u8] = &[0, 1, 7];
        assert!(!get_flag(&mut cursor, "f").unwrap());
        assert!(get_flag(&mut cursor, "f").unwrap());
        assert!(get_flag(&mut cursor, "f").is_err());
    }
}
