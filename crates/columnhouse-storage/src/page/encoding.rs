//! Value Encodings
//!
//! Encodes the non-null values of one page. The value count is not stored here;
//! the page header carries it.
//!
//! ## Plain
//! Each value in its `Field::encode_value` form, back to back.
//!
//! ## BitPacked (frame of reference)
//! ```text
//! ┌───────────────────┬──────────┬────────────────────────────────────┐
//! │ reference i64 LE  │ width u8 │ (value - reference) in `width` bits│
//! └───────────────────┴──────────┴────────────────────────────────────┘
//! ```
//! Deltas are packed LSB-first. A page of identical values has width 0 and no
//! packed bytes at all.
//!
//! ## Dictionary
//! ```text
//! ┌──────────────┬──────────────────────────┬──────────┬────────────────────┐
//! │ varint count │ (varint len, bytes)*     │ width u8 │ codes in `width`   │
//! └──────────────┴──────────────────────────┴──────────┴────────────────────┘
//! ```
//! Entries appear in first-seen order; codes index into them.

use std::collections::HashMap;

use bytes::{BufMut, Bytes};

use columnhouse_core::cursor;
use columnhouse_core::varint;
use columnhouse_core::{Datum, Encoding, Error, Field, Result};

/// Bits needed to represent `value`
fn bit_width(value: u64) -> u8 {
    (64 - value.leading_zeros()) as u8
}

fn pack_bits(values: impl IntoIterator<Item = u64>, width: u8, buf: &mut impl BufMut) {
    if width == 0 {
        return;
    }
    let mut acc: u128 = 0;
    let mut bits: u32 = 0;
    for value in values {
        acc |= (value as u128) << bits;
        bits += width as u32;
        while bits >= 8 {
            buf.put_u8(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        buf.put_u8(acc as u8);
    }
}

fn unpack_bits(cursor: &mut &[u8], width: u8, count: usize) -> Result<Vec<u64>> {
    if width > 64 {
        return Err(Error::corruption(format!("bit width {} exceeds 64", width)));
    }
    if width == 0 {
        return Ok(vec![0; count]);
    }
    let total_bits = count
        .checked_mul(width as usize)
        .ok_or_else(|| Error::corruption("bit-packed run too long"))?;
    let packed = cursor::take(cursor, total_bits.div_ceil(8), "bit-packed values")?;

    let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
    let mut bytes = packed.iter();
    let mut acc: u128 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        while bits < width as u32 {
            // `take` guaranteed enough bytes for every value
            let byte = bytes.next().copied().unwrap_or(0);
            acc |= (byte as u128) << bits;
            bits += 8;
        }
        out.push((acc as u64) & mask);
        acc >>= width;
        bits -= width as u32;
    }
    Ok(out)
}

/// Encode `values` (all non-null, all of `field`'s type)
pub fn encode_values(
    field: &Field,
    encoding: Encoding,
    values: &[Datum],
    buf: &mut impl BufMut,
) -> Result<()> {
    match encoding {
        Encoding::Plain => {
            for value in values {
                field.encode_value(value, buf);
            }
            Ok(())
        }
        Encoding::BitPacked => encode_bit_packed(field, values, buf),
        Encoding::Dictionary => encode_dictionary(field, values, buf),
    }
}

/// Decode `count` values written by `encode_values`
pub fn decode_values(
    field: &Field,
    encoding: Encoding,
    cursor: &mut &[u8],
    count: usize,
) -> Result<Vec<Datum>> {
    match encoding {
        Encoding::Plain => (0..count).map(|_| field.decode_value(cursor)).collect(),
        Encoding::BitPacked => decode_bit_packed(field, cursor, count),
        Encoding::Dictionary => decode_dictionary(field, cursor, count),
    }
}

fn encode_bit_packed(field: &Field, values: &[Datum], buf: &mut impl BufMut) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    let images = values
        .iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| {
                Error::Unsupported(format!(
                    "bit-packed encoding of {} values for {} column",
                    v.kind_name(),
                    field.field_type()
                ))
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    let min = images.iter().copied().min().unwrap_or(0);
    let max = images.iter().copied().max().unwrap_or(0);
    let width = bit_width((max as i128 - min as i128) as u64);

    buf.put_i64_le(min);
    buf.put_u8(width);
    pack_bits(
        images.iter().map(|&v| (v as i128 - min as i128) as u64),
        width,
        buf,
    );
    Ok(())
}

fn decode_bit_packed(field: &Field, cursor: &mut &[u8], count: usize) -> Result<Vec<Datum>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let reference = i64::from_le_bytes(cursor::get_array(cursor, "frame reference")?);
    let width = cursor::get_u8(cursor, "bit width")?;
    unpack_bits(cursor, width, count)?
        .into_iter()
        .map(|delta| field.datum_from_i64(reference.wrapping_add(delta as i64)))
        .collect()
}

fn encode_dictionary(field: &Field, values: &[Datum], buf: &mut impl BufMut) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    let mut lookup: HashMap<&[u8], u64> = HashMap::new();
    let mut entries: Vec<&[u8]> = Vec::new();
    let mut codes = Vec::with_capacity(values.len());

    for value in values {
        let bytes = value.as_bytes().ok_or_else(|| {
            Error::Unsupported(format!(
                "dictionary encoding of {} values for {} column",
                value.kind_name(),
                field.field_type()
            ))
        })?;
        let code = *lookup.entry(bytes.as_ref()).or_insert_with(|| {
            entries.push(bytes.as_ref());
            (entries.len() - 1) as u64
        });
        codes.push(code);
    }

    varint::encode_varint_u64(buf, entries.len() as u64);
    for entry in &entries {
        varint::encode_varint_u64(buf, entry.len() as u64);
        buf.put_slice(entry);
    }
    let width = bit_width(entries.len() as u64 - 1);
    buf.put_u8(width);
    pack_bits(codes, width, buf);
    Ok(())
}

fn decode_dictionary(field: &Field, cursor: &mut &[u8], count: usize) -> Result<Vec<Datum>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let dict_len = varint::decode_varint_u64(cursor)? as usize;
    // Every entry needs at least its length byte
    if dict_len == 0 || dict_len > cursor.len() {
        return Err(Error::corruption(format!(
            "dictionary of {} entries in {} bytes",
            dict_len,
            cursor.len()
        )));
    }
    let mut entries = Vec::with_capacity(dict_len);
    for _ in 0..dict_len {
        let len = varint::decode_varint_u64(cursor)? as usize;
        entries.push(Bytes::copy_from_slice(cursor::take(
            cursor,
            len,
            "dictionary entry",
        )?));
    }
    let length = field.length() as usize;
    if length > 0 && entries.iter().any(|e| e.len() > length) {
        return Err(Error::corruption(format!(
            "dictionary entry longer than declared length {}",
            length
        )));
    }

    let width = cursor::get_u8(cursor, "dictionary code width")?;
    unpack_bits(cursor, width, count)?
        .into_iter()
        .map(|code| {
            entries
                .get(code as usize)
                .map(|e| Datum::Bytes(e.clone()))
                .ok_or_else(|| {
                    Error::corruption(format!(
                        "dictionary code {} out of range ({} entries)",
                        code, dict_len
                    ))
                })
        })
        .collect()
}
