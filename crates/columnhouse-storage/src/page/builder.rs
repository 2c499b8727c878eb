use bytes::{BufMut, BytesMut};

use columnhouse_core::varint;
use columnhouse_core::{Datum, Result};

use super::compression::compress;
use super::encoding::encode_values;
use super::PageFormat;

/// Accumulates the cells of the active page and seals them into page bytes
#[derive(Debug)]
pub struct PageBuilder {
    format: PageFormat,
    values: Vec<Datum>,
    nulls: Vec<bool>,
    has_nulls: bool,
    /// Plain-encoded size of `values`, an upper bound for the packed encodings
    values_size: usize,
}

impl PageBuilder {
    pub fn new(format: PageFormat) -> Self {
        Self {
            format,
            values: Vec::new(),
            nulls: Vec::new(),
            has_nulls: false,
            values_size: 0,
        }
    }

    pub fn add(&mut self, cell: Option<&Datum>) {
        match cell {
            Some(datum) => {
                self.values_size += self.format.field.encoded_size(datum);
                self.values.push(datum.clone());
                self.nulls.push(false);
            }
            None => {
                self.has_nulls = true;
                self.nulls.push(true);
            }
        }
    }

    pub fn num_rows(&self) -> usize {
        self.nulls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty()
    }

    /// Estimated uncompressed body size
    pub fn estimated_size(&self) -> usize {
        let rows = self.nulls.len();
        varint::varint_len(rows as u64) + 1 + rows.div_ceil(8) + self.values_size
    }

    pub fn is_full(&self, max_rows: usize, page_size: usize) -> bool {
        self.num_rows() >= max_rows || self.estimated_size() >= page_size
    }

    /// Seal the buffered cells into `compressed(body) | crc32c` and reset
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let rows = self.nulls.len();
        let mut body = BytesMut::with_capacity(self.estimated_size());
        varint::encode_varint_u64(&mut body, rows as u64);
        body.put_u8(self.has_nulls as u8);
        if self.has_nulls {
            let mut bitmap = vec![0u8; rows.div_ceil(8)];
            for (i, _) in self.nulls.iter().enumerate().filter(|(_, null)| **null) {
                bitmap[i / 8] |= 1 << (i % 8);
            }
            body.put_slice(&bitmap);
        }
        encode_values(&self.format.field, self.format.encoding, &self.values, &mut body)?;

        let mut page = compress(self.format.compression, &body);
        let crc = crc32c::crc32c(&page);
        page.put_u32_le(crc);

        self.values.clear();
        self.nulls.clear();
        self.has_nulls = false;
        self.values_size = 0;
        Ok(page)
    }
}
