//! Column Reader and Iterator
//!
//! ## Open
//!
//! ```text
//! ColumnReader::create(meta, total_rows, file)
//!   ├─ every pointer within file extent      (else corruption)
//!   ├─ parse ordinal index, entries == data_page_pointers
//!   └─ load zone-map stream, num_pages == data page count
//! ```
//!
//! ## Scan
//!
//! A [`ColumnIterator`] keeps one decoded page. `seek_to_ordinal` binary-searches
//! the ordinal index and decodes the page holding the target row; `next_batch`
//! copies cells out of the cached page and decodes the next page when the
//! position crosses a page boundary.
//!
//! Iterators share the reader through `Arc` and never share their page cache, so
//! several can scan one column concurrently.

use std::sync::Arc;

use tracing::warn;

use columnhouse_core::{ColumnBlock, Datum, Error, Result};

use super::ColumnMeta;
use crate::config::ColumnReaderOptions;
use crate::file::ReadableFile;
use crate::ordinal_index::OrdinalIndexReader;
use crate::page::{decode_page, PageFormat, PagePointer};
use crate::zone_map::{ColumnZoneMap, ZoneMap};

/// Outcome of [`ColumnIterator::next_batch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// This many cells were produced (never zero)
    Read(usize),
    /// The iterator is past the last row
    EndOfData,
}

pub struct ColumnReader {
    options: ColumnReaderOptions,
    meta: ColumnMeta,
    format: PageFormat,
    ordinal_index: OrdinalIndexReader,
    zone_map: Option<ColumnZoneMap>,
    file: Arc<dyn ReadableFile>,
}

impl std::fmt::Debug for ColumnReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnReader")
            .field("column_id", &self.meta.column_id)
            .field("num_rows", &self.meta.num_rows)
            .field("num_pages", &self.ordinal_index.num_pages())
            .finish()
    }
}

impl ColumnReader {
    pub fn create(
        options: ColumnReaderOptions,
        meta: ColumnMeta,
        total_rows: u64,
        file: Arc<dyn ReadableFile>,
    ) -> Result<Self> {
        let column_id = meta.column_id;
        if meta.num_rows != total_rows {
            return Err(Error::corruption(format!(
                "column {} holds {} rows, segment holds {}",
                column_id, meta.num_rows, total_rows
            )));
        }

        let file_size = file.size();
        let out_of_file = |what: &str, pointer: &PagePointer| {
            Error::corruption(format!(
                "column {} {} [{}, {}) outside {}-byte file",
                column_id,
                what,
                pointer.offset,
                pointer.end(),
                file_size
            ))
        };
        for pointer in &meta.data_page_pointers {
            if !pointer.within(file_size) {
                return Err(out_of_file("data page", pointer));
            }
        }
        let ordinal_pointer = meta.ordinal_index_pointer.ok_or_else(|| {
            Error::corruption(format!("column {} has no ordinal index", column_id))
        })?;
        if !ordinal_pointer.within(file_size) {
            return Err(out_of_file("ordinal index", &ordinal_pointer));
        }
        if let Some(pointer) = &meta.zone_map_pointer {
            if !pointer.within(file_size) {
                return Err(out_of_file("zone map", pointer));
            }
        }

        let data = file.read_at(ordinal_pointer.offset, ordinal_pointer.size as usize)?;
        let ordinal_index = OrdinalIndexReader::parse(&data, total_rows)?;
        let indexed_pages = ordinal_index.entries().iter().map(|entry| entry.pointer);
        if ordinal_index.num_pages() != meta.data_page_pointers.len()
            || !indexed_pages.eq(meta.data_page_pointers.iter().copied())
        {
            return Err(Error::corruption(format!(
                "column {} ordinal index disagrees with its data page pointers",
                column_id
            )));
        }

        let zone_map = match meta.zone_map_pointer {
            Some(pointer) => {
                let data = file.read_at(pointer.offset, pointer.size as usize)?;
                let mut zone_map = ColumnZoneMap::new(data, meta.field());
                zone_map.load()?;
                if zone_map.num_pages() != ordinal_index.num_pages() {
                    return Err(Error::corruption(format!(
                        "column {} has {} zone maps for {} pages",
                        column_id,
                        zone_map.num_pages(),
                        ordinal_index.num_pages()
                    )));
                }
                Some(zone_map)
            }
            None => None,
        };

        let format = PageFormat::new(meta.field(), meta.encoding, meta.compression)?;

        Ok(Self {
            options,
            meta,
            format,
            ordinal_index,
            zone_map,
            file,
        })
    }

    /// Iterator positioned before row 0
    pub fn new_iterator(self: &Arc<Self>) -> ColumnIterator {
        ColumnIterator {
            reader: Arc::clone(self),
            current_ordinal: 0,
            page: None,
        }
    }

    pub fn num_rows(&self) -> u64 {
        self.meta.num_rows
    }

    pub fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    pub fn num_pages(&self) -> usize {
        self.ordinal_index.num_pages()
    }

    pub fn ordinal_index(&self) -> &OrdinalIndexReader {
        &self.ordinal_index
    }

    /// Per-page zone maps, for key columns
    pub fn page_zone_maps(&self) -> Option<&[ZoneMap]> {
        self.zone_map.as_ref().map(ColumnZoneMap::page_zone_maps)
    }

    /// Read and decode page `page` into its cells
    pub fn read_page(&self, page: usize) -> Result<Vec<Option<Datum>>> {
        let (entry, (first, end)) = self
            .ordinal_index
            .entry(page)
            .zip(self.ordinal_index.page_row_range(page))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "page {} out of range ({} pages)",
                    page,
                    self.num_pages()
                ))
            })?;

        let raw = self
            .file
            .read_at(entry.pointer.offset, entry.pointer.size as usize)?;
        decode_page(
            &self.format,
            &raw,
            (end - first) as usize,
            self.options.verify_checksums,
        )
        .inspect_err(|err| {
            if err.is_corruption() {
                warn!(
                    column_id = self.meta.column_id,
                    page,
                    offset = entry.pointer.offset,
                    error = %err,
                    "Corrupt data page"
                );
            }
        })
    }
}

/// Decoded page held by an iterator
struct CachedPage {
    index: usize,
    first_ordinal: u64,
    cells: Vec<Option<Datum>>,
}

impl CachedPage {
    fn end_ordinal(&self) -> u64 {
        self.first_ordinal + self.cells.len() as u64
    }

    fn contains(&self, ordinal: u64) -> bool {
        ordinal >= self.first_ordinal && ordinal < self.end_ordinal()
    }
}

pub struct ColumnIterator {
    reader: Arc<ColumnReader>,
    current_ordinal: u64,
    page: Option<CachedPage>,
}

impl ColumnIterator {
    pub fn reader(&self) -> &Arc<ColumnReader> {
        &self.reader
    }

    /// Ordinal of the next row `next_batch` produces
    pub fn current_ordinal(&self) -> u64 {
        self.current_ordinal
    }

    pub fn seek_to_first(&mut self) {
        self.current_ordinal = 0;
        self.page = None;
    }

    /// Position at row `ordinal`; `num_rows` positions at end-of-data
    pub fn seek_to_ordinal(&mut self, ordinal: u64) -> Result<()> {
        let num_rows = self.reader.num_rows();
        if ordinal > num_rows {
            return Err(Error::InvalidArgument(format!(
                "seek to ordinal {} past {} rows",
                ordinal, num_rows
            )));
        }
        self.current_ordinal = ordinal;
        if ordinal < num_rows {
            self.load_page_for(ordinal)?;
        }
        Ok(())
    }

    /// Copy up to `max_count` cells into `output` (cleared first)
    pub fn next_batch(&mut self, max_count: usize, output: &mut ColumnBlock) -> Result<BatchStatus> {
        output.clear();
        if max_count == 0 {
            return Err(Error::InvalidArgument("next_batch of zero rows".to_string()));
        }
        let num_rows = self.reader.num_rows();
        if self.current_ordinal >= num_rows {
            return Ok(BatchStatus::EndOfData);
        }

        while output.len() < max_count && self.current_ordinal < num_rows {
            self.load_page_for(self.current_ordinal)?;
            let Some(page) = &self.page else {
                break;
            };
            let start = (self.current_ordinal - page.first_ordinal) as usize;
            let take = (max_count - output.len()).min(page.cells.len() - start);
            output.extend_from_slice(&page.cells[start..start + take]);
            self.current_ordinal += take as u64;
        }

        if output.is_empty() {
            return Ok(BatchStatus::EndOfData);
        }
        Ok(BatchStatus::Read(output.len()))
    }

    fn load_page_for(&mut self, ordinal: u64) -> Result<()> {
        if self.page.as_ref().is_some_and(|page| page.contains(ordinal)) {
            return Ok(());
        }
        let index = self.reader.ordinal_index.find_page(ordinal);
        let first_ordinal = self
            .reader
            .ordinal_index
            .entry(index)
            .map_or(0, |entry| entry.first_ordinal);
        // Drop the stale page before decoding so a failure leaves no cache behind
        self.page = None;
        let cells = self.reader.read_page(index)?;
        self.page = Some(CachedPage {
            index,
            first_ordinal,
            cells,
        });
        Ok(())
    }

    /// Index of the cached page, if any
    pub fn cached_page(&self) -> Option<usize> {
        self.page.as_ref().map(|page| page.index)
    }
}
