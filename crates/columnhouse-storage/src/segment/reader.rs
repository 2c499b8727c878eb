//! Segment Reader
//!
//! ## Validation Process
//! 1. Check the file holds at least the 12-byte trailer
//! 2. Verify the magic bytes at the end ("D0R1")
//! 3. Check the footer size fits in front of the trailer
//! 4. Verify CRC32C of the footer bytes
//! 5. Decode the footer (version, columns, short-key pointer)
//!
//! Column sections are validated lazily by [`ColumnReader::create`] when a
//! column is opened. A file truncated by a crash mid-write has no valid trailer
//! and fails at step 2 or 4, before any row is decoded.
//!
//! ## Example Usage
//!
//! ```ignore
//! let reader = SegmentReader::open("seg_7.dat")?;
//! let mut rows = reader.new_row_iterator(ColumnReaderOptions::default())?;
//! let mut block = RowBlock::new(0);
//! while let BatchStatus::Read(n) = rows.next_batch(1024, &mut block)? {
//!     for row in block.rows() { /* ... */ }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use columnhouse_core::cursor;
use columnhouse_core::{Error, Result, RowBlock};

use super::footer::SegmentFooter;
use super::{FOOTER_TRAILER_SIZE, SEGMENT_MAGIC};
use crate::column::{BatchStatus, ColumnIterator, ColumnReader};
use crate::config::ColumnReaderOptions;
use crate::file::{LocalReadableFile, ReadableFile};
use crate::short_key_index::ShortKeyIndexDecoder;
use crate::zone_map::ZoneMap;

pub struct SegmentReader {
    file: Arc<dyn ReadableFile>,
    footer: SegmentFooter,
}

impl std::fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentReader")
            .field("file_size", &self.file.size())
            .field("num_rows", &self.footer.num_rows)
            .field("num_columns", &self.footer.columns.len())
            .finish()
    }
}

impl SegmentReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = LocalReadableFile::open(path)?;
        Self::from_file(Arc::new(file)).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "Failed to open segment");
        })
    }

    pub fn from_file(file: Arc<dyn ReadableFile>) -> Result<Self> {
        let file_size = file.size();
        if file_size < FOOTER_TRAILER_SIZE as u64 {
            return Err(Error::corruption(format!(
                "{}-byte file is too small for a segment trailer",
                file_size
            )));
        }

        let trailer_offset = file_size - FOOTER_TRAILER_SIZE as u64;
        let trailer = file.read_at(trailer_offset, FOOTER_TRAILER_SIZE)?;
        let mut cursor = trailer.as_ref();
        let footer_size = cursor::get_u32_le(&mut cursor, "footer size")? as u64;
        let stored = cursor::get_u32_le(&mut cursor, "footer checksum")?;
        if cursor != SEGMENT_MAGIC {
            return Err(Error::InvalidMagic);
        }
        if footer_size > trailer_offset {
            return Err(Error::corruption(format!(
                "footer of {} bytes does not fit in {}-byte file",
                footer_size, file_size
            )));
        }

        let footer_offset = trailer_offset - footer_size;
        let footer_bytes = file.read_at(footer_offset, footer_size as usize)?;
        let computed = crc32c::crc32c(&footer_bytes);
        if stored != computed {
            return Err(Error::ChecksumMismatch { stored, computed });
        }
        let footer = SegmentFooter::decode(&footer_bytes)?;

        if let Some(pointer) = footer.short_key_index_pointer {
            if !pointer.within(footer_offset) {
                return Err(Error::corruption(format!(
                    "short key index [{}, {}) overlaps footer at {}",
                    pointer.offset,
                    pointer.end(),
                    footer_offset
                )));
            }
        }

        debug!(
            file_size,
            footer_size,
            num_rows = footer.num_rows,
            num_columns = footer.columns.len(),
            "Opened segment"
        );
        Ok(Self { file, footer })
    }

    pub fn num_rows(&self) -> u64 {
        self.footer.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.footer.columns.len()
    }

    pub fn footer(&self) -> &SegmentFooter {
        &self.footer
    }

    pub fn file_size(&self) -> u64 {
        self.file.size()
    }

    pub fn column_reader(
        &self,
        column_id: usize,
        options: ColumnReaderOptions,
    ) -> Result<Arc<ColumnReader>> {
        let meta = self.footer.column(column_id).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "column {} out of range ({} columns)",
                column_id,
                self.num_columns()
            ))
        })?;
        let reader = ColumnReader::create(
            options,
            meta.clone(),
            self.footer.num_rows,
            Arc::clone(&self.file),
        )
        .inspect_err(|err| {
            if err.is_corruption() {
                warn!(column_id, error = %err, "Corrupt column metadata");
            }
        })?;
        Ok(Arc::new(reader))
    }

    /// Load and verify the short-key index, if the segment has one
    pub fn short_key_index(&self) -> Result<Option<ShortKeyIndexDecoder>> {
        let Some(pointer) = self.footer.short_key_index_pointer else {
            return Ok(None);
        };
        let data = self.file.read_at(pointer.offset, pointer.size as usize)?;
        let decoder = ShortKeyIndexDecoder::parse(data)?;
        if decoder.num_rows() as u64 != self.footer.num_rows {
            return Err(Error::corruption(format!(
                "short key index covers {} rows, segment holds {}",
                decoder.num_rows(),
                self.footer.num_rows
            )));
        }
        Ok(Some(decoder))
    }

    /// Segment-level zone map of a key column
    pub fn segment_zone_map(&self, column_id: usize) -> Option<&ZoneMap> {
        self.footer.column(column_id)?.segment_zone_map.as_ref()
    }

    /// Iterator over every column in lockstep
    pub fn new_row_iterator(&self, options: ColumnReaderOptions) -> Result<SegmentIterator> {
        let mut columns = Vec::with_capacity(self.num_columns());
        for column_id in 0..self.num_columns() {
            columns.push(self.column_reader(column_id, options)?.new_iterator());
        }
        Ok(SegmentIterator {
            columns,
            num_rows: self.footer.num_rows,
            current_ordinal: 0,
        })
    }
}

/// Row-wise view over all columns of a segment
pub struct SegmentIterator {
    columns: Vec<ColumnIterator>,
    num_rows: u64,
    current_ordinal: u64,
}

impl SegmentIterator {
    pub fn current_ordinal(&self) -> u64 {
        self.current_ordinal
    }

    pub fn seek_to_ordinal(&mut self, ordinal: u64) -> Result<()> {
        for column in &mut self.columns {
            column.seek_to_ordinal(ordinal)?;
        }
        self.current_ordinal = ordinal;
        Ok(())
    }

    /// Fill `block` with up to `max_rows` rows
    pub fn next_batch(&mut self, max_rows: usize, block: &mut RowBlock) -> Result<BatchStatus> {
        block.reset(self.columns.len());
        if max_rows == 0 {
            return Err(Error::InvalidArgument("next_batch of zero rows".to_string()));
        }
        if self.current_ordinal >= self.num_rows {
            return Ok(BatchStatus::EndOfData);
        }

        let mut produced = None;
        for (column_id, column) in self.columns.iter_mut().enumerate() {
            let output = block.column_mut(column_id).ok_or_else(|| {
                Error::InvalidState(format!("row block lacks column {}", column_id))
            })?;
            let count = match column.next_batch(max_rows, output)? {
                BatchStatus::Read(n) => n,
                BatchStatus::EndOfData => 0,
            };
            match produced {
                None => produced = Some(count),
                Some(expected) if expected != count => {
                    return Err(Error::corruption(format!(
                        "column {} produced {} rows, expected {}",
                        column_id, count, expected
                    )));
                }
                Some(_) => {}
            }
        }

        match produced {
            Some(n) if n > 0 => {
                self.current_ordinal += n as u64;
                Ok(BatchStatus::Read(n))
            }
            _ => Ok(BatchStatus::EndOfData),
        }
    }
}
