//! Column Writer
//!
//! Turns a stream of cells for one column into sealed pages, an ordinal index and
//! (for key columns) a zone map.
//!
//! ## Write Path
//!
//! ```text
//! append(cells) ──► PageBuilder ──(full)──► seal: encode → compress → crc
//!        │                                        │
//!        └──► ZoneMapBuilder::add                 ├──► sealed pages (in memory)
//!                                                 └──► ZoneMapBuilder::flush
//!
//! finish()               seal the trailing partial page
//! write_data()           append every sealed page, record (first ordinal → offset,size)
//! write_ordinal_index()  append the ordinal index
//! write_zone_map()       append the zone-map stream, export the segment zone map
//! write_meta()           copy encoding, compression and all pointers to the footer entry
//! ```
//!
//! Sealed pages stay in memory until `write_data`, because the absolute file
//! offset of a page is only known once every earlier column's data is on disk.

use tracing::debug;

use columnhouse_core::{ColumnSchema, Datum, Encoding, Error, Result};

use super::ColumnMeta;
use crate::config::ColumnWriterOptions;
use crate::file::WritableFile;
use crate::ordinal_index::{OrdinalIndexBuilder, ORDINAL_INDEX_ENTRY_SIZE};
use crate::page::{PageBuilder, PageFormat, PagePointer, MAX_PAGE_ROWS};
use crate::zone_map::ZoneMapBuilder;

/// A page sealed but not yet written
struct SealedPage {
    first_ordinal: u64,
    data: Vec<u8>,
}

pub struct ColumnWriter {
    meta: ColumnMeta,
    options: ColumnWriterOptions,
    page_builder: PageBuilder,
    zone_map_builder: Option<ZoneMapBuilder>,
    ordinal_index_builder: OrdinalIndexBuilder,
    sealed_pages: Vec<SealedPage>,
    /// Bytes held in `sealed_pages`
    sealed_bytes: usize,
    /// Ordinal of the first row of the active page
    page_first_ordinal: u64,
    finished: bool,
}

impl ColumnWriter {
    /// Writer for the column at schema position `column_id`
    pub fn new(column_id: u32, column: &ColumnSchema, options: ColumnWriterOptions) -> Result<Self> {
        if options.max_rows_per_page == 0 || options.max_rows_per_page > MAX_PAGE_ROWS {
            return Err(Error::InvalidArgument(format!(
                "max_rows_per_page {} outside 1..={}",
                options.max_rows_per_page, MAX_PAGE_ROWS
            )));
        }
        let field = column.field();
        let encoding = options
            .encoding
            .unwrap_or_else(|| Encoding::default_for(column.field_type));
        let format = PageFormat::new(field, encoding, options.compression)?;

        let zone_map_builder = options
            .need_zone_map
            .then(|| ZoneMapBuilder::new(field, options.zone_map_max_string_length));

        Ok(Self {
            meta: ColumnMeta::new(column_id, column, encoding, options.compression),
            options,
            page_builder: PageBuilder::new(format),
            zone_map_builder,
            ordinal_index_builder: OrdinalIndexBuilder::new(),
            sealed_pages: Vec::new(),
            sealed_bytes: 0,
            page_first_ordinal: 0,
            finished: false,
        })
    }

    /// Validate a cell without appending it
    pub fn check_cell(&self, cell: Option<&Datum>) -> Result<()> {
        match cell {
            None if !self.meta.is_nullable => Err(Error::InvalidArgument(format!(
                "null appended to non-nullable column {}",
                self.meta.column_id
            ))),
            None => Ok(()),
            Some(datum) => self.meta.field().check(datum),
        }
    }

    /// Append a run of cells (`None` = null)
    pub fn append(&mut self, cells: &[Option<Datum>]) -> Result<()> {
        for cell in cells {
            self.append_cell(cell.as_ref())?;
        }
        Ok(())
    }

    pub fn append_cell(&mut self, cell: Option<&Datum>) -> Result<()> {
        if self.finished {
            return Err(Error::InvalidState(format!(
                "column {} already finished",
                self.meta.column_id
            )));
        }
        self.check_cell(cell)?;

        self.page_builder.add(cell);
        if let Some(zone_map_builder) = &mut self.zone_map_builder {
            zone_map_builder.add_cell(cell);
        }
        self.meta.num_rows += 1;

        if self
            .page_builder
            .is_full(self.options.max_rows_per_page, self.options.data_page_size)
        {
            self.flush_page()?;
        }
        Ok(())
    }

    fn flush_page(&mut self) -> Result<()> {
        if self.page_builder.is_empty() {
            return Ok(());
        }
        let num_rows = self.page_builder.num_rows();
        let data = self.page_builder.finish()?;

        debug!(
            column_id = self.meta.column_id,
            first_ordinal = self.page_first_ordinal,
            num_rows,
            page_bytes = data.len(),
            "Sealed data page"
        );

        self.sealed_bytes += data.len();
        self.sealed_pages.push(SealedPage {
            first_ordinal: self.page_first_ordinal,
            data,
        });
        self.page_first_ordinal = self.meta.num_rows;

        if let Some(zone_map_builder) = &mut self.zone_map_builder {
            zone_map_builder.flush();
        }
        Ok(())
    }

    /// Seal the trailing partial page; no appends are accepted afterwards
    pub fn finish(&mut self) -> Result<()> {
        self.flush_page()?;
        self.finished = true;
        Ok(())
    }

    fn ensure_finished(&self, step: &str) -> Result<()> {
        if !self.finished {
            return Err(Error::InvalidState(format!(
                "{} on column {} before finish()",
                step, self.meta.column_id
            )));
        }
        Ok(())
    }

    /// Append every sealed page to `file`
    pub fn write_data(&mut self, file: &mut dyn WritableFile) -> Result<()> {
        self.ensure_finished("write_data")?;
        for page in self.sealed_pages.drain(..) {
            let pointer = PagePointer::for_section(file.current_size(), page.data.len())?;
            file.append(&page.data)?;
            self.ordinal_index_builder
                .append_entry(page.first_ordinal, pointer);
            self.meta.data_page_pointers.push(pointer);
        }
        self.sealed_bytes = 0;
        Ok(())
    }

    pub fn write_ordinal_index(&mut self, file: &mut dyn WritableFile) -> Result<()> {
        self.ensure_finished("write_ordinal_index")?;
        let data = self.ordinal_index_builder.finish();
        let pointer = PagePointer::for_section(file.current_size(), data.len())?;
        file.append(&data)?;
        self.meta.ordinal_index_pointer = Some(pointer);
        Ok(())
    }

    /// Append the zone-map stream (key columns only)
    pub fn write_zone_map(&mut self, file: &mut dyn WritableFile) -> Result<()> {
        self.ensure_finished("write_zone_map")?;
        let Some(zone_map_builder) = &self.zone_map_builder else {
            return Ok(());
        };
        let data = zone_map_builder.finish();
        let pointer = PagePointer::for_section(file.current_size(), data.len())?;
        file.append(&data)?;
        self.meta.zone_map_pointer = Some(pointer);
        zone_map_builder.fill_segment_zone_map(&mut self.meta);
        Ok(())
    }

    /// Record encoding, compression and every section pointer into `meta`
    pub fn write_meta(&self, meta: &mut ColumnMeta) {
        meta.clone_from(&self.meta);
    }

    /// Bytes encoded but not yet written
    pub fn estimate_buffer_size(&self) -> usize {
        let zone_map_size = self
            .zone_map_builder
            .as_ref()
            .map_or(0, ZoneMapBuilder::size);
        self.sealed_bytes
            + self.page_builder.estimated_size()
            + self.ordinal_index_builder.size()
            + self.sealed_pages.len() * ORDINAL_INDEX_ENTRY_SIZE
            + zone_map_size
    }

    pub fn num_rows(&self) -> u64 {
        self.meta.num_rows
    }

    pub fn column_id(&self) -> u32 {
        self.meta.column_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::InMemoryFile;
    use columnhouse_core::{Compression, FieldType};

    fn int_column() -> ColumnSchema {
        ColumnSchema::new(1, "v", FieldType::Int).key()
    }

    fn small_pages() -> ColumnWriterOptions {
        ColumnWriterOptions {
            need_zone_map: true,
            max_rows_per_page: 4,
            ..Default::default()
        }
    }

    fn write_all(writer: &mut ColumnWriter, file: &mut InMemoryFile) {
        writer.finish().unwrap();
        writer.write_data(file).unwrap();
        writer.write_ordinal_index(file).unwrap();
        writer.write_zone_map(file).unwrap();
    }

    #[test]
    fn test_pages_split_by_row_count() {
        let mut writer = ColumnWriter::new(0, &int_column(), small_pages()).unwrap();
        let cells: Vec<Option<Datum>> = (0..10).map(|i| Some(Datum::Int32(i))).collect();
        writer.append(&cells).unwrap();

        let mut file = InMemoryFile::new();
        write_all(&mut writer, &mut file);

        let mut meta = ColumnMeta::new(9, &int_column(), Encoding::Plain, Compression::None);
        writer.write_meta(&mut meta);
        assert_eq!(meta.column_id, 0);
        assert_eq!(meta.num_rows, 10);
        assert_eq!(meta.encoding, Encoding::BitPacked);
        assert_eq!(meta.data_page_pointers.len(), 3);
        assert_eq!(meta.data_page_pointers[0].offset, 0);
        assert_eq!(
            meta.data_page_pointers[1].offset,
            meta.data_page_pointers[0].end()
        );
        let ordinal = meta.ordinal_index_pointer.unwrap();
        assert_eq!(ordinal.offset, meta.data_page_pointers[2].end());
        assert_eq!(ordinal.size, 4 + 3 * 20);
        assert_eq!(meta.zone_map_pointer.unwrap().offset, ordinal.end());

        let segment = meta.segment_zone_map.unwrap();
        assert_eq!(segment.min(), Some(&Datum::Int32(0)));
        assert_eq!(segment.max(), Some(&Datum::Int32(9)));
    }

    #[test]
    fn test_pages_split_by_byte_size() {
        let options = ColumnWriterOptions {
            data_page_size: 64,
            ..Default::default()
        };
        let column = ColumnSchema::new(1, "s", FieldType::Varchar);
        let mut writer = ColumnWriter::new(0, &column, options).unwrap();
        for _ in 0..10 {
            writer.append_cell(Some(&Datum::from("0123456789abcdef"))).unwrap();
        }
        let mut file = InMemoryFile::new();
        write_all(&mut writer, &mut file);

        let mut meta = ColumnMeta::new(0, &column, Encoding::Plain, Compression::None);
        writer.write_meta(&mut meta);
        assert!(meta.data_page_pointers.len() >= 3);
        assert!(meta.zone_map_pointer.is_none());
        assert!(meta.segment_zone_map.is_none());
    }

    #[test]
    fn test_rejects_null_in_non_nullable_column() {
        let column = ColumnSchema::new(1, "v", FieldType::Int).not_null();
        let mut writer = ColumnWriter::new(0, &column, ColumnWriterOptions::default()).unwrap();
        let err = writer.append_cell(None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(writer.num_rows(), 0);
    }

    #[test]
    fn test_rejects_type_mismatch() {
        let mut writer =
            ColumnWriter::new(0, &int_column(), ColumnWriterOptions::default()).unwrap();
        assert!(writer.append_cell(Some(&Datum::from("nope"))).is_err());
    }

    #[test]
    fn test_rejects_unsupported_encoding() {
        let options = ColumnWriterOptions {
            encoding: Some(Encoding::Dictionary),
            ..Default::default()
        };
        let err = ColumnWriter::new(0, &int_column(), options).err().unwrap();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_write_before_finish_is_invalid_state() {
        let mut writer = ColumnWriter::new(0, &int_column(), small_pages()).unwrap();
        let mut file = InMemoryFile::new();
        assert!(matches!(
            writer.write_data(&mut file),
            Err(Error::InvalidState(_))
        ));
        writer.finish().unwrap();
        assert!(writer.append_cell(Some(&Datum::Int32(1))).is_err());
    }

    #[test]
    fn test_estimate_buffer_size_grows_then_drains() {
        let mut writer = ColumnWriter::new(0, &int_column(), small_pages()).unwrap();
        let empty = writer.estimate_buffer_size();
        for i in 0..9 {
            writer.append_cell(Some(&Datum::Int32(i * 1000))).unwrap();
        }
        assert!(writer.estimate_buffer_size() > empty);

        writer.finish().unwrap();
        let before_write = writer.estimate_buffer_size();
        let mut file = InMemoryFile::new();
        writer.write_data(&mut file).unwrap();
        assert!(writer.estimate_buffer_size() < before_write);
    }

    #[test]
    fn test_empty_column_writes_empty_sections() {
        let mut writer = ColumnWriter::new(0, &int_column(), small_pages()).unwrap();
        let mut file = InMemoryFile::new();
        write_all(&mut writer, &mut file);

        let mut meta = ColumnMeta::new(0, &int_column(), Encoding::Plain, Compression::None);
        writer.write_meta(&mut meta);
        assert!(meta.data_page_pointers.is_empty());
        assert_eq!(meta.ordinal_index_pointer.unwrap().size, 4);
        let segment = meta.segment_zone_map.unwrap();
        assert!(!segment.has_null());
        assert!(!segment.has_not_null());
    }
}
