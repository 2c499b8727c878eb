//! Columns
//!
//! Each schema column is written and read independently:
//!
//! - [`ColumnWriter`] buffers cells into pages, seals them, and later writes its
//!   data pages, ordinal index and zone map as three separate sections
//! - [`ColumnReader`] validates a column's footer entry against the file and
//!   hands out [`ColumnIterator`]s for sequential scans and seeks
//!
//! [`ColumnMeta`] is the column's footer entry: identity, type, encoding,
//! and a pointer to every section the writer produced.

mod reader;
mod writer;

pub use reader::{BatchStatus, ColumnIterator, ColumnReader};
pub use writer::ColumnWriter;

use bytes::BufMut;

use columnhouse_core::cursor;
use columnhouse_core::varint;
use columnhouse_core::{ColumnSchema, Compression, Encoding, Error, Field, FieldType, Result};

use crate::page::PagePointer;
use crate::zone_map::ZoneMap;

/// Footer entry of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    /// Position in the schema
    pub column_id: u32,
    pub unique_id: u32,
    pub field_type: FieldType,
    pub length: u32,
    pub is_nullable: bool,
    pub encoding: Encoding,
    pub compression: Compression,
    pub num_rows: u64,
    pub data_page_pointers: Vec<PagePointer>,
    pub ordinal_index_pointer: Option<PagePointer>,
    pub zone_map_pointer: Option<PagePointer>,
    pub segment_zone_map: Option<ZoneMap>,
}

impl ColumnMeta {
    pub fn new(
        column_id: u32,
        column: &ColumnSchema,
        encoding: Encoding,
        compression: Compression,
    ) -> Self {
        Self {
            column_id,
            unique_id: column.unique_id,
            field_type: column.field_type,
            length: column.length,
            is_nullable: column.is_nullable,
            encoding,
            compression,
            num_rows: 0,
            data_page_pointers: Vec::new(),
            ordinal_index_pointer: None,
            zone_map_pointer: None,
            segment_zone_map: None,
        }
    }

    pub fn field(&self) -> Field {
        Field::new(self.field_type, self.length)
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        varint::encode_varint_u64(buf, self.column_id as u64);
        varint::encode_varint_u64(buf, self.unique_id as u64);
        buf.put_u8(self.field_type as u8);
        varint::encode_varint_u64(buf, self.length as u64);
        buf.put_u8(self.is_nullable as u8);
        buf.put_u8(self.encoding as u8);
        buf.put_u8(self.compression as u8);
        varint::encode_varint_u64(buf, self.num_rows);
        varint::encode_varint_u64(buf, self.data_page_pointers.len() as u64);
        for pointer in &self.data_page_pointers {
            pointer.encode(buf);
        }
        encode_optional_pointer(self.ordinal_index_pointer, buf);
        encode_optional_pointer(self.zone_map_pointer, buf);
        match &self.segment_zone_map {
            Some(zone_map) => {
                buf.put_u8(1);
                zone_map.encode_record(&self.field(), buf);
            }
            None => buf.put_u8(0),
        }
    }

    pub fn decode(cursor: &mut &[u8]) -> Result<Self> {
        let column_id = varint::decode_varint_u32(cursor)?;
        let unique_id = varint::decode_varint_u32(cursor)?;
        let field_type = FieldType::try_from(cursor::get_u8(cursor, "field type")?)?;
        let length = varint::decode_varint_u32(cursor)?;
        let is_nullable = cursor::get_flag(cursor, "is_nullable")?;
        let encoding = Encoding::try_from(cursor::get_u8(cursor, "encoding")?)?;
        let compression = Compression::try_from(cursor::get_u8(cursor, "compression")?)?;
        if !encoding.supports(field_type) {
            return Err(Error::corruption(format!(
                "column {} stores {} with {} encoding",
                column_id, field_type, encoding
            )));
        }
        let num_rows = varint::decode_varint_u64(cursor)?;

        let num_pages = varint::decode_varint_u64(cursor)? as usize;
        // Each pointer takes at least two bytes
        if num_pages > cursor.len() / 2 {
            return Err(Error::corruption(format!(
                "column {} claims {} pages in {} footer bytes",
                column_id,
                num_pages,
                cursor.len()
            )));
        }
        let mut data_page_pointers = Vec::with_capacity(num_pages);
        for _ in 0..num_pages {
            data_page_pointers.push(PagePointer::decode(cursor)?);
        }

        let ordinal_index_pointer = decode_optional_pointer(cursor, "ordinal index pointer")?;
        let zone_map_pointer = decode_optional_pointer(cursor, "zone map pointer")?;
        let field = Field::new(field_type, length);
        let segment_zone_map = if cursor::get_flag(cursor, "segment zone map")? {
            Some(ZoneMap::decode_record(&field, cursor)?)
        } else {
            None
        };

        Ok(Self {
            column_id,
            unique_id,
            field_type,
            length,
            is_nullable,
            encoding,
            compression,
            num_rows,
            data_page_pointers,
            ordinal_index_pointer,
            zone_map_pointer,
            segment_zone_map,
        })
    }
}

pub(crate) fn encode_optional_pointer(pointer: Option<PagePointer>, buf: &mut impl BufMut) {
    match pointer {
        Some(pointer) => {
            buf.put_u8(1);
            pointer.encode(buf);
        }
        None => buf.put_u8(0),
    }
}

pub(crate) fn decode_optional_pointer(
    cursor: &mut &[u8],
    what: &str,
) -> Result<Option<PagePointer>> {
    if cursor::get_flag(cursor, what)? {
        Ok(Some(PagePointer::decode(cursor)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnhouse_core::Datum;

    #[test]
    fn test_column_meta_roundtrip() {
        let schema = ColumnSchema::new(42, "name", FieldType::Varchar).with_length(16);
        let mut meta = ColumnMeta::new(3, &schema, Encoding::Dictionary, Compression::Lz4);
        meta.num_rows = 2048;
        meta.data_page_pointers = vec![PagePointer::new(0, 300), PagePointer::new(300, 120)];
        meta.ordinal_index_pointer = Some(PagePointer::new(420, 44));
        let mut zone_map = ZoneMap::new();
        zone_map.update(&meta.field(), Some(&Datum::from("alpha")));
        zone_map.update(&meta.field(), None);
        meta.segment_zone_map = Some(zone_map);

        let mut buf: Vec<u8> = Vec::new();
        meta.encode(&mut buf);
        let mut cursor = buf.as_slice();
        let decoded = ColumnMeta::decode(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_decode_rejects_invalid_encoding_for_type() {
        let schema = ColumnSchema::new(1, "v", FieldType::Double);
        let meta = ColumnMeta::new(0, &schema, Encoding::Dictionary, Compression::None);
        let mut buf: Vec<u8> = Vec::new();
        meta.encode(&mut buf);
        assert!(ColumnMeta::decode(&mut buf.as_slice()).unwrap_err().is_corruption());
    }

    #[test]
    fn test_decode_rejects_truncated_entry() {
        let schema = ColumnSchema::new(1, "v", FieldType::Int);
        let meta = ColumnMeta::new(0, &schema, Encoding::BitPacked, Compression::Lz4);
        let mut buf: Vec<u8> = Vec::new();
        meta.encode(&mut buf);
        buf.pop();
        assert!(ColumnMeta::decode(&mut buf.as_slice()).is_err());
    }
}
