//! Segment Schema
//!
//! A [`Schema`] is the ordered list of columns a segment stores. Key columns come
//! first; the leading `num_short_key_columns` of them feed the short-key index.
//!
//! Schemas deserialize through the same validation as [`Schema::new`], so a JSON
//! schema with a key column after a value column is rejected at load time.
//!
//! ```ignore
//! let schema = Schema::new(
//!     vec![
//!         ColumnSchema::new(1, "id", FieldType::BigInt).key().not_null(),
//!         ColumnSchema::new(2, "name", FieldType::Varchar).with_length(64),
//!     ],
//!     1,
//! )?;
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Field, FieldType};

/// Default prefix length of CHAR/VARCHAR values in the short-key index
pub const DEFAULT_INDEX_LENGTH: u32 = 20;

fn default_index_length() -> u32 {
    DEFAULT_INDEX_LENGTH
}

fn default_nullable() -> bool {
    true
}

/// One column of a segment schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Stable id that survives column renames
    pub unique_id: u32,

    pub name: String,

    pub field_type: FieldType,

    /// Maximum byte length for CHAR/VARCHAR (0 = unbounded)
    #[serde(default)]
    pub length: u32,

    /// Bytes of a CHAR/VARCHAR value kept in the short-key index
    #[serde(default = "default_index_length")]
    pub index_length: u32,

    #[serde(default)]
    pub is_key: bool,

    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
}

impl ColumnSchema {
    pub fn new(unique_id: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            unique_id,
            name: name.into(),
            field_type,
            length: 0,
            index_length: DEFAULT_INDEX_LENGTH,
            is_key: false,
            is_nullable: true,
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_index_length(mut self, index_length: u32) -> Self {
        self.index_length = index_length;
        self
    }

    pub fn field(&self) -> Field {
        Field::new(self.field_type, self.length)
    }
}

#[derive(Deserialize)]
struct RawSchema {
    columns: Vec<ColumnSchema>,
    #[serde(default)]
    num_short_key_columns: usize,
}

/// Ordered column list of a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    columns: Vec<ColumnSchema>,
    num_short_key_columns: usize,
}

impl TryFrom<RawSchema> for Schema {
    type Error = Error;

    fn try_from(raw: RawSchema) -> Result<Self> {
        Schema::new(raw.columns, raw.num_short_key_columns)
    }
}

impl Schema {
    pub fn new(columns: Vec<ColumnSchema>, num_short_key_columns: usize) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::InvalidArgument("schema has no columns".to_string()));
        }

        let mut ids = HashSet::new();
        for column in &columns {
            if !ids.insert(column.unique_id) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate column unique id {}",
                    column.unique_id
                )));
            }
        }

        let num_key_columns = columns.iter().take_while(|c| c.is_key).count();
        if columns[num_key_columns..].iter().any(|c| c.is_key) {
            return Err(Error::InvalidArgument(
                "key columns must precede value columns".to_string(),
            ));
        }
        if num_short_key_columns > num_key_columns {
            return Err(Error::InvalidArgument(format!(
                "{} short key columns requested but schema has {} key columns",
                num_short_key_columns, num_key_columns
            )));
        }

        Ok(Self {
            columns,
            num_short_key_columns,
        })
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnSchema> {
        self.columns.get(index)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_key_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.is_key).count()
    }

    pub fn num_short_key_columns(&self) -> usize {
        self.num_short_key_columns
    }
}
