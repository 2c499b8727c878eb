pub mod block;
pub mod cursor;
pub mod error;
pub mod format;
pub mod key;
pub mod row;
pub mod schema;
pub mod types;
pub mod varint;

pub use block::{BlockRow, ColumnBlock, RowBlock};
pub use error::{Error, Result};
pub use format::{Compression, Encoding};
pub use row::{OwnedRow, Row};
pub use schema::{ColumnSchema, Schema};
pub use types::{Datum, Decimal12, Field, FieldType};
