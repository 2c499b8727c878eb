//! Zone Maps
//!
//! A zone map summarizes a run of cells: min, max, and whether nulls and
//! non-nulls were seen. Higher layers compare predicates against zone maps to
//! skip whole pages (or whole segments) without decoding them.
//!
//! ## Two Granularities
//!
//! [`ZoneMapBuilder`] keeps two accumulators over the same cells:
//! - the **page** zone map, emitted on every `flush()` and then reset
//! - the **segment** zone map, which survives flushes and is exported once into
//!   the column's footer entry by `fill_segment_zone_map()`
//!
//! ## Stream Format
//!
//! ```text
//! ┌─────────────────┬──────────────────────────────┬─────┐
//! │ count u32 LE    │ varint len │ record (page 0) │ ... │
//! └─────────────────┴──────────────────────────────┴─────┘
//!
//! record:
//! ┌──────────┬───────────┬───────────┐
//! │ flags u8 │ min value │ max value │   (min/max only if has_not_null)
//! └──────────┴───────────┴───────────┘
//! flags: bit0 = has_null, bit1 = has_not_null
//! ```
//!
//! ## String Bounds
//!
//! CHAR/VARCHAR bounds are capped at `zone_map_max_string_length` bytes. The min
//! keeps its prefix (never larger than the original). The max keeps its prefix
//! with the last non-0xFF byte incremented, so it stays an upper bound; a prefix of
//! only 0xFF bytes cannot be bumped and the max is kept whole.

use std::cmp::Ordering;

use bytes::{BufMut, Bytes};
use tracing::debug;

use columnhouse_core::cursor;
use columnhouse_core::varint;
use columnhouse_core::{Datum, Error, Field, Result};

use crate::column::ColumnMeta;

const FLAG_HAS_NULL: u8 = 0x01;
const FLAG_HAS_NOT_NULL: u8 = 0x02;

/// Min/max/null summary of a run of cells.
///
/// Both flags false means no cells were seen. Bounds exist iff `has_not_null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneMap {
    bounds: Option<(Datum, Datum)>,
    has_null: bool,
}

impl ZoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(&self) -> Option<&Datum> {
        self.bounds.as_ref().map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<&Datum> {
        self.bounds.as_ref().map(|(_, max)| max)
    }

    pub fn has_null(&self) -> bool {
        self.has_null
    }

    pub fn has_not_null(&self) -> bool {
        self.bounds.is_some()
    }

    /// True if no cells were observed
    pub fn is_empty(&self) -> bool {
        !self.has_null && self.bounds.is_none()
    }

    pub fn update(&mut self, field: &Field, cell: Option<&Datum>) {
        let Some(value) = cell else {
            self.has_null = true;
            return;
        };
        match &mut self.bounds {
            None => self.bounds = Some((value.deep_copy(), value.deep_copy())),
            Some((min, max)) => {
                if field.compare(value, min) == Ordering::Less {
                    *min = value.deep_copy();
                }
                if field.compare(value, max) == Ordering::Greater {
                    *max = value.deep_copy();
                }
            }
        }
    }

    /// Fold another zone map over the same field into this one
    pub fn merge(&mut self, field: &Field, other: &ZoneMap) {
        self.has_null |= other.has_null;
        if let Some((min, max)) = &other.bounds {
            self.update(field, Some(min));
            self.update(field, Some(max));
        }
    }

    /// Whether a cell equal to `value` could be in the summarized run
    pub fn may_contain(&self, field: &Field, value: &Datum) -> bool {
        match &self.bounds {
            None => false,
            Some((min, max)) => {
                field.compare(value, min) != Ordering::Less
                    && field.compare(value, max) != Ordering::Greater
            }
        }
    }

    /// Copy with string bounds capped at `max_len` bytes
    pub fn truncated(&self, max_len: usize) -> ZoneMap {
        let bounds = self.bounds.as_ref().map(|(min, max)| {
            let min = match min {
                Datum::Bytes(b) if b.len() > max_len => Datum::Bytes(b.slice(..max_len)),
                other => other.clone(),
            };
            let max = match max {
                Datum::Bytes(b) if b.len() > max_len => match successor_prefix(&b[..max_len]) {
                    Some(bumped) => Datum::Bytes(bumped),
                    None => {
                        debug!(
                            len = b.len(),
                            max_len,
                            "Zone map max has an all-0xFF prefix, keeping it whole"
                        );
                        Datum::Bytes(b.clone())
                    }
                },
                other => other.clone(),
            };
            (min, max)
        });
        ZoneMap {
            bounds,
            has_null: self.has_null,
        }
    }

    pub fn encode(&self, field: &Field, buf: &mut impl BufMut) {
        let mut flags = 0;
        if self.has_null {
            flags |= FLAG_HAS_NULL;
        }
        if self.bounds.is_some() {
            flags |= FLAG_HAS_NOT_NULL;
        }
        buf.put_u8(flags);
        if let Some((min, max)) = &self.bounds {
            field.encode_value(min, buf);
            field.encode_value(max, buf);
        }
    }

    pub fn decode(field: &Field, cursor: &mut &[u8]) -> Result<Self> {
        let flags = cursor::get_u8(cursor, "zone map flags")?;
        if flags & !(FLAG_HAS_NULL | FLAG_HAS_NOT_NULL) != 0 {
            return Err(Error::corruption(format!("invalid zone map flags {:#04x}", flags)));
        }
        let bounds = if flags & FLAG_HAS_NOT_NULL != 0 {
            let min = field.decode_value(cursor)?;
            let max = field.decode_value(cursor)?;
            if field.compare(&min, &max) == Ordering::Greater {
                return Err(Error::corruption("zone map min is greater than max"));
            }
            Some((min, max))
        } else {
            None
        };
        Ok(Self {
            bounds,
            has_null: flags & FLAG_HAS_NULL != 0,
        })
    }

    /// Encode as a standalone record: `varint len | record`
    pub fn encode_record(&self, field: &Field, buf: &mut impl BufMut) {
        let mut record: Vec<u8> = Vec::new();
        self.encode(field, &mut record);
        varint::encode_varint_u64(buf, record.len() as u64);
        buf.put_slice(&record);
    }

    pub fn decode_record(field: &Field, cursor: &mut &[u8]) -> Result<Self> {
        let len = varint::decode_varint_u64(cursor)? as usize;
        let mut record = cursor::take(cursor, len, "zone map record")?;
        let zone_map = Self::decode(field, &mut record)?;
        if !record.is_empty() {
            return Err(Error::corruption("trailing bytes in zone map record"));
        }
        Ok(zone_map)
    }
}

/// Smallest string sorting after every string that starts with `prefix`
fn successor_prefix(prefix: &[u8]) -> Option<Bytes> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut bumped = prefix[..=last].to_vec();
    bumped[last] += 1;
    Some(Bytes::from(bumped))
}

/// Builds per-page zone maps plus the segment-level zone map for one column
#[derive(Debug)]
pub struct ZoneMapBuilder {
    field: Field,
    max_string_length: usize,
    page_zone_map: ZoneMap,
    segment_zone_map: ZoneMap,
    num_pages: u32,
    records: Vec<u8>,
}

impl ZoneMapBuilder {
    pub fn new(field: Field, max_string_length: usize) -> Self {
        Self {
            field,
            max_string_length,
            page_zone_map: ZoneMap::new(),
            segment_zone_map: ZoneMap::new(),
            num_pages: 0,
            records: Vec::new(),
        }
    }

    pub fn add(&mut self, cells: &[Option<Datum>]) {
        for cell in cells {
            self.add_cell(cell.as_ref());
        }
    }

    pub fn add_cell(&mut self, cell: Option<&Datum>) {
        self.page_zone_map.update(&self.field, cell);
        self.segment_zone_map.update(&self.field, cell);
    }

    /// Emit the page zone map as one record and start a new page
    pub fn flush(&mut self) {
        let page = std::mem::take(&mut self.page_zone_map);
        page.truncated(self.max_string_length)
            .encode_record(&self.field, &mut self.records);
        self.num_pages += 1;
    }

    pub fn segment_zone_map(&self) -> ZoneMap {
        self.segment_zone_map.truncated(self.max_string_length)
    }

    /// Export the segment-level zone map into the column's footer entry
    pub fn fill_segment_zone_map(&self, meta: &mut ColumnMeta) {
        meta.segment_zone_map = Some(self.segment_zone_map());
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Bytes the encoded stream occupies
    pub fn size(&self) -> usize {
        4 + self.records.len()
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::with_capacity(self.size());
        buf.put_u32_le(self.num_pages);
        buf.put_slice(&self.records);
        buf
    }
}

/// Reader side: the page zone maps of one column
#[derive(Debug)]
pub struct ColumnZoneMap {
    data: Bytes,
    field: Field,
    page_zone_maps: Vec<ZoneMap>,
}

impl ColumnZoneMap {
    pub fn new(data: Bytes, field: Field) -> Self {
        Self {
            data,
            field,
            page_zone_maps: Vec::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        let mut cursor = self.data.as_ref();
        let count = cursor::get_u32_le(&mut cursor, "zone map count")? as usize;
        // A record is at least a length byte and a flags byte
        if count > cursor.len() / 2 {
            return Err(Error::corruption(format!(
                "{} zone map records in {} bytes",
                count,
                cursor.len()
            )));
        }
        let mut page_zone_maps = Vec::with_capacity(count);
        for _ in 0..count {
            page_zone_maps.push(ZoneMap::decode_record(&self.field, &mut cursor)?);
        }
        if !cursor.is_empty() {
            return Err(Error::corruption("trailing bytes after zone map records"));
        }
        self.page_zone_maps = page_zone_maps;
        Ok(())
    }

    pub fn page_zone_maps(&self) -> &[ZoneMap] {
        &self.page_zone_maps
    }

    pub fn num_pages(&self) -> usize {
        self.page_zone_maps.len()
    }
}
