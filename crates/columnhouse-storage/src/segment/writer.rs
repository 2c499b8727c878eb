//! Segment Writer
//!
//! ## State Machine
//!
//! ```text
//! Created ──init()──► Initialized ──append_row()──► Appending ──finalize()──► Finalized
//!                          │                                       ▲
//!                          └──────────────finalize()───────────────┘
//! ```
//!
//! `append_row` and `finalize` fail with `InvalidState` outside their states.
//! `finalize` moves to `Finalized` even when it fails: a partially written file
//! has no trailer and is rejected by the reader, so it must be discarded.
//!
//! ## Example Usage
//!
//! ```ignore
//! use columnhouse_storage::{SegmentWriter, SegmentWriterOptions};
//! use columnhouse_core::OwnedRow;
//!
//! let mut writer = SegmentWriter::new(7, schema, SegmentWriterOptions::default(), "seg_7.dat");
//! writer.init()?;
//! for row in rows {
//!     writer.append_row(&row)?;
//! }
//! let file_size = writer.finalize()?;
//! ```

use std::path::PathBuf;

use bytes::Bytes;
use tracing::{debug, info};

use columnhouse_core::key::encode_short_key;
use columnhouse_core::{Encoding, Error, Result, Row, Schema};

use super::footer::SegmentFooter;
use super::{MAGIC_HEADER_ESTIMATE, SEGMENT_MAGIC};
use crate::column::{ColumnMeta, ColumnWriter};
use crate::config::SegmentWriterOptions;
use crate::file::{LocalWritableFile, WritableFile};
use crate::page::PagePointer;
use crate::short_key_index::ShortKeyIndexBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Created,
    Initialized,
    Appending,
    Finalized,
}

enum Output {
    /// Created on `init()`
    Path(PathBuf),
    File(Box<dyn WritableFile>),
}

pub struct SegmentWriter {
    segment_id: u32,
    schema: Schema,
    options: SegmentWriterOptions,
    state: WriterState,
    output: Option<Output>,
    column_writers: Vec<ColumnWriter>,
    short_key_index_builder: Option<ShortKeyIndexBuilder>,
    row_count: u64,
    key_buf: Vec<u8>,
}

impl SegmentWriter {
    /// Writer for a new local file at `path` (must not exist yet)
    pub fn new(
        segment_id: u32,
        schema: Schema,
        options: SegmentWriterOptions,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::with_output(segment_id, schema, options, Output::Path(path.into()))
    }

    /// Writer appending to a caller-supplied file
    pub fn with_file(
        segment_id: u32,
        schema: Schema,
        options: SegmentWriterOptions,
        file: Box<dyn WritableFile>,
    ) -> Self {
        Self::with_output(segment_id, schema, options, Output::File(file))
    }

    fn with_output(
        segment_id: u32,
        schema: Schema,
        options: SegmentWriterOptions,
        output: Output,
    ) -> Self {
        Self {
            segment_id,
            schema,
            options,
            state: WriterState::Created,
            output: Some(output),
            column_writers: Vec::new(),
            short_key_index_builder: None,
            row_count: 0,
            key_buf: Vec::new(),
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn segment_id(&self) -> u32 {
        self.segment_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Rows appended so far
    pub fn num_rows_written(&self) -> u64 {
        self.row_count
    }

    /// Open the output and create one column writer per schema column
    pub fn init(&mut self) -> Result<()> {
        if self.state != WriterState::Created {
            return Err(Error::InvalidState(format!(
                "init() on segment {} in state {:?}",
                self.segment_id, self.state
            )));
        }
        if self.options.num_rows_per_block == 0 || self.options.max_rows_per_page == 0 {
            return Err(Error::InvalidArgument(
                "num_rows_per_block and max_rows_per_page must be positive".to_string(),
            ));
        }
        let num_rows_per_block = u32::try_from(self.options.num_rows_per_block).map_err(|_| {
            Error::InvalidArgument(format!(
                "num_rows_per_block {} exceeds u32",
                self.options.num_rows_per_block
            ))
        })?;

        let mut column_writers = Vec::with_capacity(self.schema.num_columns());
        for (column_id, column) in self.schema.columns().iter().enumerate() {
            let options = self.options.column_options(column);
            column_writers.push(ColumnWriter::new(column_id as u32, column, options)?);
        }

        if let Some(Output::Path(path)) = &self.output {
            let file = LocalWritableFile::create(path)?;
            debug!(segment_id = self.segment_id, path = %path.display(), "Created segment file");
            self.output = Some(Output::File(Box::new(file)));
        }

        self.column_writers = column_writers;
        self.short_key_index_builder = Some(ShortKeyIndexBuilder::new(
            self.segment_id,
            num_rows_per_block,
        ));
        self.state = WriterState::Initialized;
        Ok(())
    }

    /// Append one row; every cell is validated before any column sees it
    pub fn append_row<R: Row + ?Sized>(&mut self, row: &R) -> Result<()> {
        if !matches!(self.state, WriterState::Initialized | WriterState::Appending) {
            return Err(Error::InvalidState(format!(
                "append_row() on segment {} in state {:?}",
                self.segment_id, self.state
            )));
        }
        if row.num_cells() != self.column_writers.len() {
            return Err(Error::InvalidArgument(format!(
                "row has {} cells, schema has {} columns",
                row.num_cells(),
                self.column_writers.len()
            )));
        }
        for (index, writer) in self.column_writers.iter().enumerate() {
            writer.check_cell(row.cell(index))?;
        }

        for (index, writer) in self.column_writers.iter_mut().enumerate() {
            writer.append_cell(row.cell(index))?;
        }

        if self.row_count % self.options.num_rows_per_block as u64 == 0 {
            self.key_buf.clear();
            encode_short_key(&self.schema, row, &mut self.key_buf);
            if let Some(builder) = &mut self.short_key_index_builder {
                builder.add_item(&self.key_buf)?;
            }
        }
        self.row_count += 1;
        self.state = WriterState::Appending;
        Ok(())
    }

    /// Rough size of the finished file, for capacity checks
    pub fn estimate_segment_size(&self) -> u64 {
        let columns: usize = self
            .column_writers
            .iter()
            .map(ColumnWriter::estimate_buffer_size)
            .sum();
        let short_key = self
            .short_key_index_builder
            .as_ref()
            .map_or(0, ShortKeyIndexBuilder::size);
        (MAGIC_HEADER_ESTIMATE + columns + short_key) as u64
    }

    /// Write every section and the footer trailer; returns the file size
    pub fn finalize(&mut self) -> Result<u64> {
        if !matches!(self.state, WriterState::Initialized | WriterState::Appending) {
            return Err(Error::InvalidState(format!(
                "finalize() on segment {} in state {:?}",
                self.segment_id, self.state
            )));
        }
        self.state = WriterState::Finalized;

        let mut file = match self.output.take() {
            Some(Output::File(file)) => file,
            _ => {
                return Err(Error::InvalidState(format!(
                    "segment {} has no open output",
                    self.segment_id
                )))
            }
        };
        let file = file.as_mut();

        for writer in &mut self.column_writers {
            writer.finish()?;
            writer.write_data(file)?;
        }
        let data_end = file.current_size();
        for writer in &mut self.column_writers {
            writer.write_ordinal_index(file)?;
        }
        for writer in &mut self.column_writers {
            writer.write_zone_map(file)?;
        }
        debug!(
            segment_id = self.segment_id,
            data_bytes = data_end,
            index_bytes = file.current_size() - data_end,
            "Wrote column sections"
        );

        let mut columns = Vec::with_capacity(self.column_writers.len());
        for (writer, column) in self.column_writers.iter().zip(self.schema.columns()) {
            let mut meta = ColumnMeta::new(
                writer.column_id(),
                column,
                Encoding::Plain,
                self.options.compression,
            );
            writer.write_meta(&mut meta);
            columns.push(meta);
        }
        let mut footer = SegmentFooter::new(self.row_count, columns);

        let mut builder = self.short_key_index_builder.take().ok_or_else(|| {
            Error::InvalidState(format!("segment {} has no short key index", self.segment_id))
        })?;
        let mut slices: Vec<Bytes> = Vec::new();
        builder.finalize(file.current_size(), self.row_count, &mut slices)?;
        let short_key_offset = file.current_size();
        let short_key_len: usize = slices.iter().map(Bytes::len).sum();
        let slice_refs: Vec<&[u8]> = slices.iter().map(Bytes::as_ref).collect();
        file.appendv(&slice_refs)?;
        footer.short_key_index_pointer =
            Some(PagePointer::for_section(short_key_offset, short_key_len)?);

        let footer_bytes = footer.encode();
        let footer_size = u32::try_from(footer_bytes.len()).map_err(|_| {
            Error::Serialization(format!("footer of {} bytes exceeds u32", footer_bytes.len()))
        })?;
        let size_bytes = footer_size.to_le_bytes();
        let checksum_bytes = crc32c::crc32c(&footer_bytes).to_le_bytes();
        let trailer: [&[u8]; 4] = [&footer_bytes, &size_bytes, &checksum_bytes, SEGMENT_MAGIC];
        file.appendv(&trailer)?;
        file.sync()?;

        let file_size = file.current_size();
        info!(
            segment_id = self.segment_id,
            num_rows = self.row_count,
            num_columns = self.column_writers.len(),
            footer_bytes = footer_size,
            file_size,
            "Finalized segment"
        );
        Ok(file_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::InMemoryFile;
    use columnhouse_core::{ColumnSchema, Datum, FieldType, OwnedRow};

    fn schema() -> Schema {
        Schema::new(
            vec![
                ColumnSchema::new(1, "id", FieldType::Int).key().not_null(),
                ColumnSchema::new(2, "name", FieldType::Varchar).with_length(32),
            ],
            1,
        )
        .unwrap()
    }

    fn row(id: i32, name: Option<&str>) -> OwnedRow {
        OwnedRow::new(vec![Some(Datum::Int32(id)), name.map(Datum::from)])
    }

    fn in_memory_writer(options: SegmentWriterOptions) -> (SegmentWriter, InMemoryFile) {
        let file = InMemoryFile::new();
        let writer = SegmentWriter::with_file(1, schema(), options, Box::new(file.clone()));
        (writer, file)
    }

    #[test]
    fn test_state_machine() {
        let (mut writer, _file) = in_memory_writer(SegmentWriterOptions::default());
        assert_eq!(writer.state(), WriterState::Created);
        assert!(matches!(
            writer.append_row(&row(1, None)),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(writer.finalize(), Err(Error::InvalidState(_))));

        writer.init().unwrap();
        assert_eq!(writer.state(), WriterState::Initialized);
        assert!(matches!(writer.init(), Err(Error::InvalidState(_))));

        writer.append_row(&row(1, Some("a"))).unwrap();
        assert_eq!(writer.state(), WriterState::Appending);

        writer.finalize().unwrap();
        assert_eq!(writer.state(), WriterState::Finalized);
        assert!(matches!(
            writer.append_row(&row(2, None)),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(writer.finalize(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_rejected_row_leaves_columns_untouched() {
        let (mut writer, _file) = in_memory_writer(SegmentWriterOptions::default());
        writer.init().unwrap();
        writer.append_row(&row(1, Some("a"))).unwrap();

        // null in the non-nullable key column
        let bad = OwnedRow::new(vec![None, Some(Datum::from("b"))]);
        assert!(matches!(writer.append_row(&bad), Err(Error::InvalidArgument(_))));
        let short = OwnedRow::new(vec![Some(Datum::Int32(2))]);
        assert!(matches!(writer.append_row(&short), Err(Error::InvalidArgument(_))));
        let wrong_type = OwnedRow::new(vec![Some(Datum::Int32(2)), Some(Datum::Int32(3))]);
        assert!(writer.append_row(&wrong_type).is_err());

        assert_eq!(writer.num_rows_written(), 1);
        writer.finalize().unwrap();
    }

    #[test]
    fn test_trailer_layout() {
        let (mut writer, file) = in_memory_writer(SegmentWriterOptions::default());
        writer.init().unwrap();
        for i in 0..10 {
            writer.append_row(&row(i, Some("x"))).unwrap();
        }
        let size = writer.finalize().unwrap();

        let bytes = file.to_bytes();
        assert_eq!(bytes.len() as u64, size);
        assert_eq!(&bytes[bytes.len() - 4..], SEGMENT_MAGIC);
        let footer_size =
            u32::from_le_bytes(bytes[bytes.len() - 12..bytes.len() - 8].try_into().unwrap());
        let stored_crc =
            u32::from_le_bytes(bytes[bytes.len() - 8..bytes.len() - 4].try_into().unwrap());
        let footer_start = bytes.len() - 12 - footer_size as usize;
        let footer = &bytes[footer_start..bytes.len() - 12];
        assert_eq!(stored_crc, crc32c::crc32c(footer));

        let decoded = SegmentFooter::decode(footer).unwrap();
        assert_eq!(decoded.num_rows, 10);
        assert_eq!(decoded.columns.len(), 2);
        assert!(decoded.columns[0].zone_map_pointer.is_some());
        assert!(decoded.columns[1].zone_map_pointer.is_none());
    }

    #[test]
    fn test_sections_are_not_interleaved() {
        let options = SegmentWriterOptions {
            max_rows_per_page: 4,
            ..Default::default()
        };
        let (mut writer, file) = in_memory_writer(options);
        writer.init().unwrap();
        for i in 0..25 {
            writer.append_row(&row(i, Some("name"))).unwrap();
        }
        writer.finalize().unwrap();

        let bytes = file.to_bytes();
        let footer_size =
            u32::from_le_bytes(bytes[bytes.len() - 12..bytes.len() - 8].try_into().unwrap());
        let footer =
            SegmentFooter::decode(&bytes[bytes.len() - 12 - footer_size as usize..bytes.len() - 12])
                .unwrap();

        let last_data_end = footer
            .columns
            .iter()
            .flat_map(|c| c.data_page_pointers.iter())
            .map(PagePointer::end)
            .max()
            .unwrap();
        let first_ordinal = footer.columns[0].ordinal_index_pointer.unwrap();
        let last_ordinal = footer.columns[1].ordinal_index_pointer.unwrap();
        let zone_map = footer.columns[0].zone_map_pointer.unwrap();
        let short_key = footer.short_key_index_pointer.unwrap();

        assert_eq!(first_ordinal.offset, last_data_end);
        assert_eq!(last_ordinal.offset, first_ordinal.end());
        assert_eq!(zone_map.offset, last_ordinal.end());
        assert_eq!(short_key.offset, zone_map.end());
        assert_eq!(short_key.end() as usize, bytes.len() - 12 - footer_size as usize);
    }

    #[test]
    fn test_estimate_grows_with_rows() {
        let (mut writer, _file) = in_memory_writer(SegmentWriterOptions::default());
        writer.init().unwrap();
        let empty = writer.estimate_segment_size();
        assert!(empty >= MAGIC_HEADER_ESTIMATE as u64);
        for i in 0..500 {
            writer.append_row(&row(i, Some("some longer value"))).unwrap();
        }
        assert!(writer.estimate_segment_size() > empty);
    }

    #[test]
    fn test_init_rejects_zero_block_size() {
        let options = SegmentWriterOptions {
            num_rows_per_block: 0,
            ..Default::default()
        };
        let (mut writer, _file) = in_memory_writer(options);
        assert!(matches!(writer.init(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_path_output_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.seg");
        std::fs::write(&path, b"keep me").unwrap();

        let mut writer = SegmentWriter::new(1, schema(), SegmentWriterOptions::default(), &path);
        assert!(matches!(writer.init(), Err(Error::Io(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }
}
