//! Short-Key Encoding
//!
//! Encodes the leading short-key columns of a row into a byte string whose
//! lexicographic order matches the row order under the schema:
//!
//! ```text
//! ┌────────┬───────────────┬────────┬───────────────┬─────┐
//! │ marker │ ascending(k0) │ marker │ ascending(k1) │ ... │
//! └────────┴───────────────┴────────┴───────────────┴─────┘
//! ```
//!
//! The marker is `0x01` for null and `0x02` for a value, so nulls sort first.
//! Null cells have no payload. CHAR/VARCHAR payloads are cut to the column's
//! `index_length` before encoding.

use crate::row::Row;
use crate::schema::Schema;

pub const KEY_NULL_MARKER: u8 = 0x01;
pub const KEY_NORMAL_MARKER: u8 = 0x02;

/// Append the short key of `row` to `buf`
pub fn encode_short_key<R: Row + ?Sized>(schema: &Schema, row: &R, buf: &mut Vec<u8>) {
    for (index, column) in schema
        .columns()
        .iter()
        .take(schema.num_short_key_columns())
        .enumerate()
    {
        match row.cell(index) {
            None => buf.push(KEY_NULL_MARKER),
            Some(datum) => {
                buf.push(KEY_NORMAL_MARKER);
                column
                    .field()
                    .encode_ascending(datum, column.index_length as usize, buf);
            }
        }
    }
}
