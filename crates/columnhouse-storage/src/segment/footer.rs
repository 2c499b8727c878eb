use bytes::BufMut;

use columnhouse_core::cursor;
use columnhouse_core::varint;
use columnhouse_core::{Error, Result};

use super::SEGMENT_VERSION;
use crate::column::{decode_optional_pointer, encode_optional_pointer, ColumnMeta};
use crate::page::PagePointer;

/// Self-describing summary of a segment, written once at finalize
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFooter {
    pub version: u8,
    pub num_rows: u64,
    pub columns: Vec<ColumnMeta>,
    pub short_key_index_pointer: Option<PagePointer>,
}

impl SegmentFooter {
    pub fn new(num_rows: u64, columns: Vec<ColumnMeta>) -> Self {
        Self {
            version: SEGMENT_VERSION,
            num_rows,
            columns,
            short_key_index_pointer: None,
        }
    }

    pub fn column(&self, column_id: usize) -> Option<&ColumnMeta> {
        self.columns.get(column_id)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        buf.put_u8(self.version);
        varint::encode_varint_u64(&mut buf, self.num_rows);
        varint::encode_varint_u64(&mut buf, self.columns.len() as u64);
        for column in &self.columns {
            column.encode(&mut buf);
        }
        encode_optional_pointer(self.short_key_index_pointer, &mut buf);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        let version = cursor::get_u8(&mut cursor, "footer version")?;
        if version != SEGMENT_VERSION {
            return Err(Error::Unsupported(format!(
                "segment footer version {} (supported: {})",
                version, SEGMENT_VERSION
            )));
        }
        let num_rows = varint::decode_varint_u64(&mut cursor)?;

        let num_columns = varint::decode_varint_u64(&mut cursor)? as usize;
        // A column entry is well over eight bytes
        if num_columns > cursor.len() / 8 {
            return Err(Error::corruption(format!(
                "footer claims {} columns in {} bytes",
                num_columns,
                cursor.len()
            )));
        }
        let mut columns = Vec::with_capacity(num_columns);
        for column_id in 0..num_columns {
            let column = ColumnMeta::decode(&mut cursor)?;
            if column.column_id as usize != column_id {
                return Err(Error::corruption(format!(
                    "footer entry {} describes column {}",
                    column_id, column.column_id
                )));
            }
            columns.push(column);
        }

        let short_key_index_pointer = decode_optional_pointer(&mut cursor, "short key pointer")?;
        if !cursor.is_empty() {
            return Err(Error::corruption(format!(
                "{} trailing bytes after segment footer",
                cursor.len()
            )));
        }

        Ok(Self {
            version,
            num_rows,
            columns,
            short_key_index_pointer,
        })
    }
}
