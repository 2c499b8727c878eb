//! Data Pages
//!
//! A page is a run of up to `max_rows_per_page` cells of one column. Pages are
//! the unit of compression, checksumming and decoding.
//!
//! ## Page Layout on Disk
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────┐
//! │ compressed(body)                             │ CRC32C u32 LE│
//! └──────────────────────────────────────────────┴──────────────┘
//!
//! body:
//! ┌───────────────────┬──────────────┬────────────────────┬────────────────────┐
//! │ varint num_values │ has_nulls u8 │ null bitmap        │ encoded non-nulls  │
//! │                   │              │ (only if has_nulls)│                    │
//! └───────────────────┴──────────────┴────────────────────┴────────────────────┘
//! ```
//!
//! The null bitmap holds `ceil(num_values / 8)` bytes, LSB-first, bit set = null.
//! The CRC covers the compressed bytes, so corruption is caught before the
//! decompressor ever sees them.

mod builder;
pub mod compression;
mod decoder;
pub mod encoding;

pub use builder::PageBuilder;
pub use decoder::decode_page;

use bytes::BufMut;

use columnhouse_core::varint;
use columnhouse_core::{Compression, Encoding, Error, Field, Result};

/// Size of the CRC32C trailer on every page
pub const PAGE_CRC_SIZE: usize = 4;

/// Upper bound on rows in one page, enforced on write and on read
pub const MAX_PAGE_ROWS: usize = 1 << 20;

/// Location of a byte range in the segment file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PagePointer {
    pub offset: u64,
    pub size: u32,
}

impl PagePointer {
    pub fn new(offset: u64, size: u32) -> Self {
        Self { offset, size }
    }

    /// Pointer for a section of `len` bytes
    pub fn for_section(offset: u64, len: usize) -> Result<Self> {
        let size = u32::try_from(len).map_err(|_| {
            Error::Unsupported(format!("section of {} bytes exceeds 4 GiB", len))
        })?;
        Ok(Self { offset, size })
    }

    /// End of the range, saturating for offsets read from a corrupt footer
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size as u64)
    }

    /// True if the pointed-to range lies inside a file of `file_size` bytes
    pub fn within(&self, file_size: u64) -> bool {
        self.offset
            .checked_add(self.size as u64)
            .is_some_and(|end| end <= file_size)
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        varint::encode_varint_u64(buf, self.offset);
        varint::encode_varint_u64(buf, self.size as u64);
    }

    pub fn decode(cursor: &mut &[u8]) -> Result<Self> {
        let offset = varint::decode_varint_u64(cursor)?;
        let size = varint::decode_varint_u32(cursor)?;
        Ok(Self { offset, size })
    }
}

/// How the pages of one column are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFormat {
    pub field: Field,
    pub encoding: Encoding,
    pub compression: Compression,
}

impl PageFormat {
    pub fn new(field: Field, encoding: Encoding, compression: Compression) -> Result<Self> {
        if !encoding.supports(field.field_type()) {
            return Err(Error::Unsupported(format!(
                "{} encoding is not valid for {} columns",
                encoding,
                field.field_type()
            )));
        }
        Ok(Self {
            field,
            encoding,
            compression,
        })
    }
}
