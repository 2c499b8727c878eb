//! Short-Key Index
//!
//! A sparse index over the leading key columns: one encoded key for the first row
//! of every `num_rows_per_block` rows. A reader binary-searches the keys to find
//! the block a target key starts in, then scans forward from there.
//!
//! ## Format
//!
//! The index is written as three slices, back to back:
//!
//! ```text
//! ┌────────────────────────────┬──────────────────────┬────────────────────────┐
//! │ header (7 × u32 LE)        │ key bytes            │ key offsets (u32 LE)*  │
//! └────────────────────────────┴──────────────────────┴────────────────────────┘
//!
//! header: segment_id | num_rows_per_block | num_items | num_rows |
//!         key_bytes_len | offsets_len | crc32c(key bytes ‖ offsets)
//! ```
//!
//! Key `i` spans `key_bytes[offsets[i]..offsets[i + 1]]` (the last one runs to the
//! end of the key bytes). Keys are memcmp-comparable, see `columnhouse_core::key`.

use bytes::{BufMut, Bytes};
use tracing::debug;

use columnhouse_core::cursor;
use columnhouse_core::{Error, Result};

pub const SHORT_KEY_HEADER_SIZE: usize = 28;

#[derive(Debug)]
pub struct ShortKeyIndexBuilder {
    segment_id: u32,
    num_rows_per_block: u32,
    key_buf: Vec<u8>,
    offsets: Vec<u32>,
    finalized: bool,
}

impl ShortKeyIndexBuilder {
    pub fn new(segment_id: u32, num_rows_per_block: u32) -> Self {
        Self {
            segment_id,
            num_rows_per_block,
            key_buf: Vec::new(),
            offsets: Vec::new(),
            finalized: false,
        }
    }

    /// Add the key of the next block's first row
    pub fn add_item(&mut self, key: &[u8]) -> Result<()> {
        if self.finalized {
            return Err(Error::InvalidState(
                "short key index already finalized".to_string(),
            ));
        }
        let offset = u32::try_from(self.key_buf.len())
            .map_err(|_| Error::Unsupported("short key index exceeds 4 GiB".to_string()))?;
        self.offsets.push(offset);
        self.key_buf.extend_from_slice(key);
        Ok(())
    }

    pub fn num_items(&self) -> usize {
        self.offsets.len()
    }

    /// Encoded size if finalized now
    pub fn size(&self) -> usize {
        SHORT_KEY_HEADER_SIZE + self.key_buf.len() + self.offsets.len() * 4
    }

    /// Produce the encoded index as `[header, key bytes, offsets]`
    pub fn finalize(
        &mut self,
        segment_size_hint: u64,
        num_rows: u64,
        slices: &mut Vec<Bytes>,
    ) -> Result<()> {
        if self.finalized {
            return Err(Error::InvalidState(
                "short key index already finalized".to_string(),
            ));
        }
        self.finalized = true;

        let num_rows = u32::try_from(num_rows)
            .map_err(|_| Error::Unsupported(format!("{} rows exceed u32", num_rows)))?;

        let mut offsets: Vec<u8> = Vec::with_capacity(self.offsets.len() * 4);
        for offset in &self.offsets {
            offsets.put_u32_le(*offset);
        }
        let keys = std::mem::take(&mut self.key_buf);

        let checksum = crc32c::crc32c_append(crc32c::crc32c(&keys), &offsets);

        let mut header: Vec<u8> = Vec::with_capacity(SHORT_KEY_HEADER_SIZE);
        header.put_u32_le(self.segment_id);
        header.put_u32_le(self.num_rows_per_block);
        header.put_u32_le(self.offsets.len() as u32);
        header.put_u32_le(num_rows);
        header.put_u32_le(keys.len() as u32);
        header.put_u32_le(offsets.len() as u32);
        header.put_u32_le(checksum);

        debug!(
            segment_id = self.segment_id,
            num_items = self.offsets.len(),
            num_rows,
            segment_size_hint,
            "Finalized short key index"
        );

        slices.push(Bytes::from(header));
        slices.push(Bytes::from(keys));
        slices.push(Bytes::from(offsets));
        Ok(())
    }
}

/// Parsed short-key index
#[derive(Debug, Clone)]
pub struct ShortKeyIndexDecoder {
    segment_id: u32,
    num_rows_per_block: u32,
    num_rows: u32,
    keys: Bytes,
    offsets: Vec<u32>,
}

impl ShortKeyIndexDecoder {
    pub fn parse(data: Bytes) -> Result<Self> {
        let mut cursor = data.as_ref();
        let segment_id = cursor::get_u32_le(&mut cursor, "short key segment id")?;
        let num_rows_per_block = cursor::get_u32_le(&mut cursor, "short key rows per block")?;
        let num_items = cursor::get_u32_le(&mut cursor, "short key item count")? as usize;
        let num_rows = cursor::get_u32_le(&mut cursor, "short key row count")?;
        let key_bytes_len = cursor::get_u32_le(&mut cursor, "short key bytes length")? as usize;
        let offsets_len = cursor::get_u32_le(&mut cursor, "short key offsets length")? as usize;
        let stored = cursor::get_u32_le(&mut cursor, "short key checksum")?;

        if cursor.len() != key_bytes_len + offsets_len {
            return Err(Error::corruption(format!(
                "short key index body is {} bytes, header says {}",
                cursor.len(),
                key_bytes_len + offsets_len
            )));
        }
        let body_start = SHORT_KEY_HEADER_SIZE;
        let keys = data.slice(body_start..body_start + key_bytes_len);
        let mut offset_bytes = &cursor[key_bytes_len..];

        let computed = crc32c::crc32c_append(crc32c::crc32c(&keys), offset_bytes);
        if stored != computed {
            return Err(Error::ChecksumMismatch { stored, computed });
        }

        if offsets_len != num_items.saturating_mul(4) {
            return Err(Error::corruption(format!(
                "{} short key items but {} offset bytes",
                num_items, offsets_len
            )));
        }
        let expected_items = if num_rows_per_block == 0 {
            0
        } else {
            num_rows.div_ceil(num_rows_per_block) as usize
        };
        if num_rows_per_block == 0 || num_items != expected_items {
            return Err(Error::corruption(format!(
                "{} short key items for {} rows at {} rows per block",
                num_items, num_rows, num_rows_per_block
            )));
        }

        let mut offsets = Vec::with_capacity(num_items);
        for i in 0..num_items {
            let offset = cursor::get_u32_le(&mut offset_bytes, "short key offset")?;
            let ordered = match offsets.last() {
                None => offset == 0,
                Some(&prev) => offset >= prev,
            };
            if !ordered || offset as usize > key_bytes_len {
                return Err(Error::corruption(format!(
                    "short key offset {} at item {} is out of order",
                    offset, i
                )));
            }
            offsets.push(offset);
        }

        Ok(Self {
            segment_id,
            num_rows_per_block,
            num_rows,
            keys,
            offsets,
        })
    }

    pub fn segment_id(&self) -> u32 {
        self.segment_id
    }

    pub fn num_rows_per_block(&self) -> u32 {
        self.num_rows_per_block
    }

    pub fn num_rows(&self) -> u32 {
        self.num_rows
    }

    pub fn num_items(&self) -> usize {
        self.offsets.len()
    }

    pub fn key(&self, index: usize) -> Option<&[u8]> {
        let start = *self.offsets.get(index)? as usize;
        let end = self
            .offsets
            .get(index + 1)
            .map_or(self.keys.len(), |&next| next as usize);
        Some(&self.keys[start..end])
    }

    pub fn block_start_ordinal(&self, index: usize) -> u64 {
        index as u64 * self.num_rows_per_block as u64
    }

    /// First item whose key is `>= target`
    pub fn lower_bound(&self, target: &[u8]) -> usize {
        self.partition(|key| key < target)
    }

    /// First item whose key is `> target`
    pub fn upper_bound(&self, target: &[u8]) -> usize {
        self.partition(|key| key <= target)
    }

    /// Block to start scanning from to find rows with key `target`
    pub fn seek_block(&self, target: &[u8]) -> usize {
        self.lower_bound(target).saturating_sub(1)
    }

    fn partition(&self, pred: impl Fn(&[u8]) -> bool) -> usize {
        let mut left = 0;
        let mut right = self.num_items();
        while left < right {
            let mid = (left + right) / 2;
            match self.key(mid) {
                Some(key) if pred(key) => left = mid + 1,
                _ => right = mid,
            }
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(slices: &[Bytes]) -> Bytes {
        let mut out = Vec::new();
        for slice in slices {
            out.extend_from_slice(slice);
        }
        Bytes::from(out)
    }

    fn build(keys: &[&[u8]], rows_per_block: u32, num_rows: u64) -> Bytes {
        let mut builder = ShortKeyIndexBuilder::new(7, rows_per_block);
        for key in keys {
            builder.add_item(key).unwrap();
        }
        let expected_size = builder.size();
        let mut slices = Vec::new();
        builder.finalize(0, num_rows, &mut slices).unwrap();
        assert_eq!(slices.len(), 3);
        let data = concat(&slices);
        assert_eq!(data.len(), expected_size);
        data
    }

    #[test]
    fn test_roundtrip() {
        let data = build(&[b"aa", b"bb", b"", b"cc"], 4, 14);
        let decoder = ShortKeyIndexDecoder::parse(data).unwrap();
        assert_eq!(decoder.segment_id(), 7);
        assert_eq!(decoder.num_items(), 4);
        assert_eq!(decoder.num_rows(), 14);
        assert_eq!(decoder.key(0), Some(&b"aa"[..]));
        assert_eq!(decoder.key(2), Some(&b""[..]));
        assert_eq!(decoder.key(3), Some(&b"cc"[..]));
        assert!(decoder.key(4).is_none());
        assert_eq!(decoder.block_start_ordinal(3), 12);
    }

    #[test]
    fn test_bounds_and_seek() {
        let data = build(&[b"b", b"d", b"d", b"f"], 2, 8);
        let decoder = ShortKeyIndexDecoder::parse(data).unwrap();
        assert_eq!(decoder.lower_bound(b"d"), 1);
        assert_eq!(decoder.upper_bound(b"d"), 3);
        assert_eq!(decoder.seek_block(b"d"), 0);
        assert_eq!(decoder.seek_block(b"e"), 2);
        assert_eq!(decoder.seek_block(b"z"), 3);
        assert_eq!(decoder.seek_block(b"a"), 0);
    }

    #[test]
    fn test_empty_index() {
        let data = build(&[], 1024, 0);
        let decoder = ShortKeyIndexDecoder::parse(data).unwrap();
        assert_eq!(decoder.num_items(), 0);
        assert_eq!(decoder.seek_block(b"x"), 0);
    }

    #[test]
    fn test_add_after_finalize_is_invalid_state() {
        let mut builder = ShortKeyIndexBuilder::new(0, 1024);
        let mut slices = Vec::new();
        builder.finalize(0, 0, &mut slices).unwrap();
        assert!(matches!(builder.add_item(b"k"), Err(Error::InvalidState(_))));
        assert!(matches!(
            builder.finalize(0, 0, &mut slices),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_corrupted_key_bytes_detected() {
        let data = build(&[b"abc", b"def"], 2, 4);
        let mut raw = data.to_vec();
        raw[SHORT_KEY_HEADER_SIZE + 1] ^= 0x01;
        let err = ShortKeyIndexDecoder::parse(Bytes::from(raw)).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_item_count_must_match_rows() {
        let data = build(&[b"abc"], 2, 4);
        assert!(ShortKeyIndexDecoder::parse(data).unwrap_err().is_corruption());
    }

    #[test]
    fn test_truncated_index() {
        let data = build(&[b"abc", b"def"], 2, 4);
        let truncated = data.slice(..data.len() - 1);
        assert!(ShortKeyIndexDecoder::parse(truncated).is_err());
    }
}
