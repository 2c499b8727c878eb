//! Segment Configuration
//!
//! This module defines the options for the write and read paths.
//!
//! ## SegmentWriterOptions
//!
//! Controls how a whole segment is laid out:
//!
//! - **num_rows_per_block**: Rows between two short-key index entries (default: 1024)
//! - **compression**: Page compression for every column (default: lz4)
//! - **data_page_size**: Seal a page once its encoded size reaches this (default: 64KB)
//! - **max_rows_per_page**: Seal a page once it holds this many rows (default: 1024)
//! - **zone_map_max_string_length**: Longest CHAR/VARCHAR min/max kept in a zone map (default: 512;
//!   a max with an all-0xFF prefix is kept whole)
//!
//! ## ColumnWriterOptions
//!
//! Per-column options derived from the segment options and the column schema. The
//! encoding is `None` unless overridden, which selects the type's default
//! (bit-packed for integers, dictionary for strings, plain otherwise).
//!
//! ## ColumnReaderOptions
//!
//! - **verify_checksums**: Check each page's CRC32C trailer before decoding (default: true)
//!
//! ## Usage
//!
//! ```ignore
//! use columnhouse_storage::SegmentWriterOptions;
//!
//! let options = SegmentWriterOptions {
//!     max_rows_per_page: 256,
//!     ..Default::default()
//! };
//!
//! let options: SegmentWriterOptions = serde_json::from_str(r#"{"compression": "none"}"#)?;
//! ```

use serde::{Deserialize, Serialize};

use columnhouse_core::{ColumnSchema, Compression, Encoding};

pub const DEFAULT_NUM_ROWS_PER_BLOCK: usize = 1024;
pub const DEFAULT_DATA_PAGE_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAX_ROWS_PER_PAGE: usize = 1024;
pub const DEFAULT_ZONE_MAP_MAX_STRING_LENGTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentWriterOptions {
    /// Rows between short-key index entries (default: 1024)
    #[serde(default = "default_num_rows_per_block")]
    pub num_rows_per_block: usize,

    /// Page compression (default: lz4)
    #[serde(default)]
    pub compression: Compression,

    /// Encoded page size that seals a page (default: 64KB)
    #[serde(default = "default_data_page_size")]
    pub data_page_size: usize,

    /// Row count that seals a page (default: 1024)
    #[serde(default = "default_max_rows_per_page")]
    pub max_rows_per_page: usize,

    /// Byte budget for CHAR/VARCHAR zone-map bounds (default: 512).
    ///
    /// Not a hard cap: a max whose first `zone_map_max_string_length` bytes are
    /// all 0xFF has no shorter upper bound and is stored whole.
    #[serde(default = "default_zone_map_max_string_length")]
    pub zone_map_max_string_length: usize,
}

fn default_num_rows_per_block() -> usize {
    DEFAULT_NUM_ROWS_PER_BLOCK
}

fn default_data_page_size() -> usize {
    DEFAULT_DATA_PAGE_SIZE
}

fn default_max_rows_per_page() -> usize {
    DEFAULT_MAX_ROWS_PER_PAGE
}

fn default_zone_map_max_string_length() -> usize {
    DEFAULT_ZONE_MAP_MAX_STRING_LENGTH
}

fn default_verify_checksums() -> bool {
    true
}

impl Default for SegmentWriterOptions {
    fn default() -> Self {
        Self {
            num_rows_per_block: default_num_rows_per_block(),
            compression: Compression::default(),
            data_page_size: default_data_page_size(),
            max_rows_per_page: default_max_rows_per_page(),
            zone_map_max_string_length: default_zone_map_max_string_length(),
        }
    }
}

impl SegmentWriterOptions {
    /// Options for one column: zone map only for key columns
    pub fn column_options(&self, column: &ColumnSchema) -> ColumnWriterOptions {
        ColumnWriterOptions {
            encoding: None,
            compression: self.compression,
            need_zone_map: column.is_key,
            data_page_size: self.data_page_size,
            max_rows_per_page: self.max_rows_per_page,
            zone_map_max_string_length: self.zone_map_max_string_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnWriterOptions {
    /// Page encoding; `None` picks the type's default
    #[serde(default)]
    pub encoding: Option<Encoding>,

    #[serde(default)]
    pub compression: Compression,

    #[serde(default)]
    pub need_zone_map: bool,

    #[serde(default = "default_data_page_size")]
    pub data_page_size: usize,

    #[serde(default = "default_max_rows_per_page")]
    pub max_rows_per_page: usize,

    #[serde(default = "default_zone_map_max_string_length")]
    pub zone_map_max_string_length: usize,
}

impl Default for ColumnWriterOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            compression: Compression::default(),
            need_zone_map: false,
            data_page_size: default_data_page_size(),
            max_rows_per_page: default_max_rows_per_page(),
            zone_map_max_string_length: default_zone_map_max_string_length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReaderOptions {
    /// Verify page CRC32C before decoding (default: true)
    #[serde(default = "default_verify_checksums")]
    pub verify_checksums: bool,
}

impl Default for ColumnReaderOptions {
    fn default() -> Self {
        Self {
            verify_checksums: default_verify_checksums(),
        }
    }
}
