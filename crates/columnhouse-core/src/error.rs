//! Error Types for columnhouse
//!
//! This module defines all error types that can occur while writing or reading
//! segment files.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - `Io`: open/read/write failures from the file abstraction, propagated verbatim
//!
//! ### Data Integrity Errors (non-retryable)
//! - `InvalidMagic`: Segment file doesn't end with the expected magic bytes ("D0R1")
//! - `ChecksumMismatch`: CRC32C of the footer or of a page doesn't match
//! - `Corruption`: Malformed bytes, truncated sections, pointers outside the file
//! - `Decompression`: A compressed page could not be decompressed
//!
//! ### Writer Errors
//! - `Serialization`: The footer could not be serialized; the trailer is never written
//! - `InvalidState`: Writer used before `init()` or after `finalize()`
//!
//! ### Caller Errors
//! - `InvalidArgument`: Type mismatch, null in a non-nullable column, seek out of range
//! - `Unsupported`: Encoding not valid for a field type
//!
//! ## Usage
//! All functions in columnhouse return `Result<T>` which is aliased to `Result<T, Error>`.
//!
//! ```ignore
//! use columnhouse_core::{Error, Result};
//!
//! fn check_magic(trailer: &[u8]) -> Result<()> {
//!     if &trailer[8..12] != b"D0R1" {
//!         return Err(Error::InvalidMagic);
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic bytes")]
    InvalidMagic,

    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("Corruption: {0}")]
    Corruption(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

impl Error {
    /// True for errors that mean the bytes on disk cannot be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidMagic
                | Error::ChecksumMismatch { .. }
                | Error::Corruption(_)
                | Error::Decompression(_)
        )
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
