//! Ordinal Index
//!
//! Maps the first row ordinal of every data page to the page's location, so a
//! seek to row `n` costs one binary search instead of a scan.
//!
//! ## Format
//!
//! ```text
//! ┌──────────────┬─────────────────────────────────────────────────┬─────┐
//! │ count u32 LE │ first_ordinal u64 LE │ offset u64 LE │ size u32 │ ... │
//! └──────────────┴─────────────────────────────────────────────────┴─────┘
//!                  └──────────────── 20 bytes per page ───────────┘
//! ```
//!
//! Entries are in page order, start at ordinal 0 and are strictly increasing.

use bytes::BufMut;

use columnhouse_core::cursor;
use columnhouse_core::{Error, Result};

use crate::page::PagePointer;

pub const ORDINAL_INDEX_ENTRY_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalIndexEntry {
    /// Ordinal of the first row in the page
    pub first_ordinal: u64,
    pub pointer: PagePointer,
}

#[derive(Debug, Default)]
pub struct OrdinalIndexBuilder {
    entries: Vec<OrdinalIndexEntry>,
}

impl OrdinalIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_entry(&mut self, first_ordinal: u64, pointer: PagePointer) {
        self.entries.push(OrdinalIndexEntry {
            first_ordinal,
            pointer,
        });
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn size(&self) -> usize {
        4 + self.entries.len() * ORDINAL_INDEX_ENTRY_SIZE
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::with_capacity(self.size());
        buf.put_u32_le(self.entries.len() as u32);
        for entry in &self.entries {
            buf.put_u64_le(entry.first_ordinal);
            buf.put_u64_le(entry.pointer.offset);
            buf.put_u32_le(entry.pointer.size);
        }
        buf
    }
}

#[derive(Debug, Clone)]
pub struct OrdinalIndexReader {
    entries: Vec<OrdinalIndexEntry>,
    num_rows: u64,
}

impl OrdinalIndexReader {
    /// Parse and validate the index of a column holding `num_rows` rows
    pub fn parse(data: &[u8], num_rows: u64) -> Result<Self> {
        let mut cursor = data;
        let count = cursor::get_u32_le(&mut cursor, "ordinal index count")? as usize;
        if cursor.len() != count.saturating_mul(ORDINAL_INDEX_ENTRY_SIZE) {
            return Err(Error::corruption(format!(
                "ordinal index claims {} entries but holds {} bytes",
                count,
                cursor.len()
            )));
        }

        let mut entries: Vec<OrdinalIndexEntry> = Vec::with_capacity(count);
        for _ in 0..count {
            let first_ordinal = cursor::get_u64_le(&mut cursor, "ordinal")?;
            let offset = cursor::get_u64_le(&mut cursor, "page offset")?;
            let size = cursor::get_u32_le(&mut cursor, "page size")?;

            let expected_order = match entries.last() {
                None => first_ordinal == 0,
                Some(prev) => first_ordinal > prev.first_ordinal,
            };
            if !expected_order || first_ordinal >= num_rows {
                return Err(Error::corruption(format!(
                    "ordinal index entry {} has ordinal {} (rows: {})",
                    entries.len(),
                    first_ordinal,
                    num_rows
                )));
            }
            entries.push(OrdinalIndexEntry {
                first_ordinal,
                pointer: PagePointer::new(offset, size),
            });
        }

        if (num_rows > 0) != !entries.is_empty() {
            return Err(Error::corruption(format!(
                "ordinal index has {} entries for {} rows",
                entries.len(),
                num_rows
            )));
        }

        Ok(Self { entries, num_rows })
    }

    pub fn num_pages(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[OrdinalIndexEntry] {
        &self.entries
    }

    pub fn entry(&self, page: usize) -> Option<&OrdinalIndexEntry> {
        self.entries.get(page)
    }

    /// Half-open row range `[first, end)` covered by `page`
    pub fn page_row_range(&self, page: usize) -> Option<(u64, u64)> {
        let first = self.entries.get(page)?.first_ordinal;
        let end = self
            .entries
            .get(page + 1)
            .map_or(self.num_rows, |next| next.first_ordinal);
        Some((first, end))
    }

    /// Index of the page containing `ordinal` (binary search)
    pub fn find_page(&self, ordinal: u64) -> usize {
        // Last entry whose first ordinal is <= ordinal
        let after = self
            .entries
            .partition_point(|entry| entry.first_ordinal <= ordinal);
        after.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut builder = OrdinalIndexBuilder::new();
        builder.append_entry(0, PagePointer::new(0, 100));
        builder.append_entry(1024, PagePointer::new(100, 90));
        builder.append_entry(2048, PagePointer::new(190, 40));
        assert_eq!(builder.size(), 64);
        builder.finish()
    }

    #[test]
    fn test_roundtrip_and_find_page() {
        let reader = OrdinalIndexReader::parse(&sample(), 2500).unwrap();
        assert_eq!(reader.num_pages(), 3);
        assert_eq!(reader.find_page(0), 0);
        assert_eq!(reader.find_page(1023), 0);
        assert_eq!(reader.find_page(1024), 1);
        assert_eq!(reader.find_page(2499), 2);
        assert_eq!(reader.page_row_range(2), Some((2048, 2500)));
        assert_eq!(reader.entry(1).unwrap().pointer, PagePointer::new(100, 90));
    }

    #[test]
    fn test_empty_index() {
        let data = OrdinalIndexBuilder::new().finish();
        let reader = OrdinalIndexReader::parse(&data, 0).unwrap();
        assert_eq!(reader.num_pages(), 0);
        assert_eq!(reader.find_page(0), 0);
        assert!(reader.page_row_range(0).is_none());
    }

    #[test]
    fn test_rejects_ordinal_beyond_rows() {
        assert!(OrdinalIndexReader::parse(&sample(), 2048).is_err());
    }

    #[test]
    fn test_rejects_unordered_entries() {
        let mut builder = OrdinalIndexBuilder::new();
        builder.append_entry(0, PagePointer::new(0, 10));
        builder.append_entry(0, PagePointer::new(10, 10));
        assert!(OrdinalIndexReader::parse(&builder.finish(), 10).is_err());
    }

    #[test]
    fn test_rejects_nonzero_start() {
        let mut builder = OrdinalIndexBuilder::new();
        builder.append_entry(5, PagePointer::new(0, 10));
        assert!(OrdinalIndexReader::parse(&builder.finish(), 10).is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut data = sample();
        data.pop();
        assert!(OrdinalIndexReader::parse(&data, 2500).unwrap_err().is_corruption());
    }

    #[test]
    fn test_rejects_missing_entries_for_rows() {
        let data = OrdinalIndexBuilder::new().finish();
        assert!(OrdinalIndexReader::parse(&data, 3).is_err());
    }
}
