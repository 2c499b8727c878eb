//! Segment File Format
//!
//! A segment holds a fixed set of rows for one schema, stored column by column.
//!
//! ## Segment File Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Column 0 data pages                                         │
//! │ Column 1 data pages                                         │
//! │ ...                                                         │
//! │ Column N data pages                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Column 0 ordinal index ... Column N ordinal index           │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Column 0 zone map ... Column N zone map (key columns only)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Short-key index                                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer bytes (serialized SegmentFooter)                     │
//! │ Footer size    (4 bytes, u32 LE)                            │
//! │ Footer CRC32C  (4 bytes, u32 LE)                            │
//! │ Magic bytes: "D0R1" (4 bytes)                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sections are never interleaved across columns. A section's pointer is only
//! known once its bytes are on disk, so every data section precedes every index
//! section, and the footer comes last.
//!
//! The magic sits at the end of the file: a reader locates and validates the
//! footer with a single read of the last 12 bytes, without a header seek.
//!
//! ## Footer
//!
//! ```text
//! version u8 (= 1)
//! varint num_rows
//! varint num_columns
//! ColumnMeta × num_columns
//! optional short-key index pointer (presence byte + varint offset + varint size)
//! ```

mod footer;
mod reader;
mod writer;

pub use footer::SegmentFooter;
pub use reader::{SegmentIterator, SegmentReader};
pub use writer::{SegmentWriter, WriterState};

/// Trailing magic bytes
pub const SEGMENT_MAGIC: &[u8; 4] = b"D0R1";

/// Footer format version
pub const SEGMENT_VERSION: u8 = 1;

/// Footer size + footer CRC32C + magic
pub const FOOTER_TRAILER_SIZE: usize = 12;

/// Fixed overhead counted by `SegmentWriter::estimate_segment_size`
pub const MAGIC_HEADER_ESTIMATE: usize = 8;
