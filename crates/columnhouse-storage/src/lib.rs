//! columnhouse Storage Layer
//!
//! This crate implements the on-disk columnar segment format: the layer that
//! encodes column values into compressed pages, keeps min/max/null statistics
//! ("zone maps") for predicate pruning, builds sparse indexes for random access,
//! and assembles a self-describing, checksummed file.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────┐
//! │    Rows     │  OwnedRow / BlockRow
//! └──────┬──────┘
//!        │ append_row
//!        ▼
//! ┌─────────────────┐      ┌──────────────────────┐
//! │ SegmentWriter   │─────►│ ShortKeyIndexBuilder │  one key per row block
//! └────────┬────────┘      └──────────────────────┘
//!          │ one cell per column
//!          ▼
//! ┌─────────────────┐
//! │ ColumnWriter    │ ──► PageBuilder ──► sealed pages
//! │  (per column)   │ ──► ZoneMapBuilder (key columns)
//! │                 │ ──► OrdinalIndexBuilder
//! └────────┬────────┘
//!          │ data │ ordinal indexes │ zone maps │ short keys │ footer
//!          ▼
//! ┌─────────────────┐
//! │  segment file   │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ SegmentReader   │ ── validates trailer, magic, footer CRC32C
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ ColumnReader    │ ── validates pointers, ordinal index, zone maps
//! │ ColumnIterator  │ ── seek / next_batch, one cached page
//! └─────────────────┘
//! ```
//!
//! ## Main Components
//!
//! ### SegmentWriter
//! Drives one [`ColumnWriter`] per schema column and writes the sections in a
//! fixed order: all data pages, all ordinal indexes, all zone maps, the short-key
//! index, then the footer trailer.
//!
//! ### SegmentReader
//! Opens a finished segment, verifies the trailer, and hands out
//! [`ColumnReader`]s, the short-key index and segment zone maps.
//!
//! ### Pages
//! Plain, bit-packed (frame of reference) and dictionary encodings, optional
//! LZ4 compression, and a CRC32C trailer on every page.
//!
//! ## Data Integrity
//!
//! Every page and the footer carry a CRC32C checksum; all pointers are checked
//! against the file size before they are followed. Corrupt input yields an
//! error for which [`Error::is_corruption`](columnhouse_core::Error::is_corruption)
//! is true, never a panic.

pub mod column;
pub mod config;
pub mod file;
pub mod ordinal_index;
pub mod page;
pub mod segment;
pub mod short_key_index;
pub mod zone_map;

pub use column::{BatchStatus, ColumnIterator, ColumnMeta, ColumnReader, ColumnWriter};
pub use config::{ColumnReaderOptions, ColumnWriterOptions, SegmentWriterOptions};
pub use file::{InMemoryFile, LocalReadableFile, LocalWritableFile, ReadableFile, WritableFile};
pub use ordinal_index::{OrdinalIndexBuilder, OrdinalIndexReader};
pub use page::PagePointer;
pub use segment::{SegmentFooter, SegmentIterator, SegmentReader, SegmentWriter, WriterState};
pub use short_key_index::{ShortKeyIndexBuilder, ShortKeyIndexDecoder};
pub use zone_map::{ColumnZoneMap, ZoneMap, ZoneMapBuilder};
