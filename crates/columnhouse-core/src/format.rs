//! Page Encodings and Compression Codecs
//!
//! Both enums are stored as a single byte in every column's footer entry, and
//! serialize as lowercase strings in option structs (`"lz4"`, `"bitpacked"`).
//!
//! ## Compression
//! - **None**: pages are stored as encoded
//! - **Lz4**: LZ4 block format with the uncompressed size prepended (default)
//!
//! ## Encoding
//! - **Plain**: every value in its fixed-width/varint serialization, valid for all types
//! - **BitPacked**: frame of reference plus fixed bit width, integer-like types only
//! - **Dictionary**: distinct values once, bit-packed codes per row, CHAR/VARCHAR only

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::FieldType;

/// Compression type for data pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Compression {
    None = 0,
    #[default]
    Lz4 = 1,
}

impl TryFrom<u8> for Compression {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Lz4),
            _ => Err(Error::corruption(format!("unknown compression id {}", value))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => f.write_str("none"),
            Compression::Lz4 => f.write_str("lz4"),
        }
    }
}

/// Value encoding inside a data page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Encoding {
    Plain = 0,
    BitPacked = 1,
    Dictionary = 2,
}

impl Encoding {
    /// Encoding a column of `field_type` gets when none is configured
    pub fn default_for(field_type: FieldType) -> Encoding {
        if field_type.is_string() {
            Encoding::Dictionary
        } else if field_type.is_integer_like() {
            Encoding::BitPacked
        } else {
            Encoding::Plain
        }
    }

    pub fn supports(self, field_type: FieldType) -> bool {
        match self {
            Encoding::Plain => true,
            Encoding::BitPacked => field_type.is_integer_like(),
            Encoding::Dictionary => field_type.is_string(),
        }
    }
}

impl TryFrom<u8> for Encoding {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Encoding::Plain),
            1 => Ok(Encoding::BitPacked),
            2 => Ok(Encoding::Dictionary),
            _ => Err(Error::corruption(format!("unknown encoding id {}", value))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Plain => f.write_str("plain"),
            Encoding::BitPacked => f.write_str("bitpacked"),
            Encoding::Dictionary => f.write_str("dictionary"),
        }
    }
}
