//! Field Types and Values
//!
//! This module defines the type system shared by every layer of the segment format.
//!
//! ## Field Types
//! Each column has one [`FieldType`]. Fixed-width types have a known byte width on
//! disk; CHAR and VARCHAR are stored as `varint length + bytes`.
//!
//! | Type      | Datum             | Width | Default encoding |
//! |-----------|-------------------|-------|------------------|
//! | BOOL      | `Bool`            | 1     | bit-packed       |
//! | TINYINT   | `Int8`            | 1     | bit-packed       |
//! | SMALLINT  | `Int16`           | 2     | bit-packed       |
//! | INT       | `Int32`           | 4     | bit-packed       |
//! | BIGINT    | `Int64`           | 8     | bit-packed       |
//! | LARGEINT  | `Int128`          | 16    | plain            |
//! | FLOAT     | `Float32`         | 4     | plain            |
//! | DOUBLE    | `Float64`         | 8     | plain            |
//! | DATE      | `Date` (days)     | 4     | bit-packed       |
//! | DATETIME  | `DateTime`        | 8     | bit-packed       |
//! | DECIMAL   | `Decimal`         | 12    | plain            |
//! | CHAR      | `Bytes`           | var   | dictionary       |
//! | VARCHAR   | `Bytes`           | var   | dictionary       |
//!
//! ## Field
//! [`Field`] is the type-aware handle the zone maps, page codecs and key encoder use:
//! - `compare`: total order (floats via `total_cmp`, bytes lexicographically)
//! - `encode_value` / `decode_value`: on-disk value serialization
//! - `encode_ascending`: memcmp-comparable key encoding for the short-key index

use std::cmp::Ordering;
use std::fmt;

use bytes::{BufMut, Bytes};
use serde::{Deserialize, Serialize};

use crate::cursor;
use crate::error::{Error, Result};
use crate::varint;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FieldType {
    Bool = 1,
    TinyInt = 2,
    SmallInt = 3,
    Int = 4,
    BigInt = 5,
    LargeInt = 6,
    Float = 7,
    Double = 8,
    Date = 9,
    DateTime = 10,
    Decimal = 11,
    Char = 12,
    Varchar = 13,
}

impl FieldType {
    /// On-disk width of a single value, `None` for variable-length types
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            FieldType::Bool | FieldType::TinyInt => Some(1),
            FieldType::SmallInt => Some(2),
            FieldType::Int | FieldType::Float | FieldType::Date => Some(4),
            FieldType::BigInt | FieldType::Double | FieldType::DateTime => Some(8),
            FieldType::Decimal => Some(12),
            FieldType::LargeInt => Some(16),
            FieldType::Char | FieldType::Varchar => None,
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, FieldType::Char | FieldType::Varchar)
    }

    /// Types whose values map losslessly onto an i64 (frame-of-reference packable)
    pub fn is_integer_like(self) -> bool {
        matches!(
            self,
            FieldType::Bool
                | FieldType::TinyInt
                | FieldType::SmallInt
                | FieldType::Int
                | FieldType::BigInt
                | FieldType::Date
                | FieldType::DateTime
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "BOOL",
            FieldType::TinyInt => "TINYINT",
            FieldType::SmallInt => "SMALLINT",
            FieldType::Int => "INT",
            FieldType::BigInt => "BIGINT",
            FieldType::LargeInt => "LARGEINT",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Date => "DATE",
            FieldType::DateTime => "DATETIME",
            FieldType::Decimal => "DECIMAL",
            FieldType::Char => "CHAR",
            FieldType::Varchar => "VARCHAR",
        }
    }
}

impl TryFrom<u8> for FieldType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            1 => FieldType::Bool,
            2 => FieldType::TinyInt,
            3 => FieldType::SmallInt,
            4 => FieldType::Int,
            5 => FieldType::BigInt,
            6 => FieldType::LargeInt,
            7 => FieldType::Float,
            8 => FieldType::Double,
            9 => FieldType::Date,
            10 => FieldType::DateTime,
            11 => FieldType::Decimal,
            12 => FieldType::Char,
            13 => FieldType::Varchar,
            _ => return Err(Error::corruption(format!("unknown field type id {}", value))),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-point decimal: integer part plus nine-digit fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Decimal12 {
    pub integer: i64,
    pub fraction: i32,
}

impl Decimal12 {
    pub fn new(integer: i64, fraction: i32) -> Self {
        Self { integer, fraction }
    }
}

impl fmt::Display for Decimal12 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.integer < 0 || self.fraction < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:09}",
            sign,
            self.integer.unsigned_abs(),
            self.fraction.unsigned_abs()
        )
    }
}

/// A single non-null value. Nulls are represented as `None` in `Option<Datum>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Float32(f32),
    Float64(f64),
    /// Days since 0000-01-01
    Date(u32),
    /// Packed `YYYYMMDDhhmmss`
    DateTime(u64),
    Decimal(Decimal12),
    Bytes(Bytes),
}

impl Datum {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Bool(_) => "bool",
            Datum::Int8(_) => "int8",
            Datum::Int16(_) => "int16",
            Datum::Int32(_) => "int32",
            Datum::Int64(_) => "int64",
            Datum::Int128(_) => "int128",
            Datum::Float32(_) => "float32",
            Datum::Float64(_) => "float64",
            Datum::Date(_) => "date",
            Datum::DateTime(_) => "datetime",
            Datum::Decimal(_) => "decimal",
            Datum::Bytes(_) => "bytes",
        }
    }

    /// Copy that shares no buffer with `self`
    pub fn deep_copy(&self) -> Datum {
        match self {
            Datum::Bytes(b) => Datum::Bytes(Bytes::copy_from_slice(b)),
            other => other.clone(),
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Datum::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Integer-like values as i64 (DATETIME is reinterpreted bitwise)
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Datum::Bool(v) => Some(v as i64),
            Datum::Int8(v) => Some(v as i64),
            Datum::Int16(v) => Some(v as i64),
            Datum::Int32(v) => Some(v as i64),
            Datum::Int64(v) => Some(v),
            Datum::Date(v) => Some(v as i64),
            Datum::DateTime(v) => Some(v as i64),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Datum::Bool(_) => 0,
            Datum::Int8(_) => 1,
            Datum::Int16(_) => 2,
            Datum::Int32(_) => 3,
            Datum::Int64(_) => 4,
            Datum::Int128(_) => 5,
            Datum::Float32(_) => 6,
            Datum::Float64(_) => 7,
            Datum::Date(_) => 8,
            Datum::DateTime(_) => 9,
            Datum::Decimal(_) => 10,
            Datum::Bytes(_) => 11,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Bool(v) => write!(f, "{}", v),
            Datum::Int8(v) => write!(f, "{}", v),
            Datum::Int16(v) => write!(f, "{}", v),
            Datum::Int32(v) => write!(f, "{}", v),
            Datum::Int64(v) => write!(f, "{}", v),
            Datum::Int128(v) => write!(f, "{}", v),
            Datum::Float32(v) => write!(f, "{}", v),
            Datum::Float64(v) => write!(f, "{}", v),
            Datum::Date(v) => write!(f, "{}", v),
            Datum::DateTime(v) => write!(f, "{}", v),
            Datum::Decimal(v) => write!(f, "{}", v),
            Datum::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
        }
    }
}

macro_rules! impl_datum_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Datum {
                fn from(v: $ty) -> Self {
                    Datum::$variant(v)
                }
            }
        )*
    };
}

impl_datum_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    i128 => Int128,
    f32 => Float32,
    f64 => Float64,
    Decimal12 => Decimal,
    Bytes => Bytes,
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Bytes(Bytes::copy_from_slice(v.as_bytes()))
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Bytes(Bytes::from(v))
    }
}

/// Type-aware field handle: comparison and serialization for one column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    field_type: FieldType,
    /// Declared maximum byte length for CHAR/VARCHAR (0 = unbounded)
    length: u32,
}

impl Field {
    pub fn new(field_type: FieldType, length: u32) -> Self {
        Self { field_type, length }
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Check that `datum` is a value of this field's type
    pub fn check(&self, datum: &Datum) -> Result<()> {
        let ok = matches!(
            (self.field_type, datum),
            (FieldType::Bool, Datum::Bool(_))
                | (FieldType::TinyInt, Datum::Int8(_))
                | (FieldType::SmallInt, Datum::Int16(_))
                | (FieldType::Int, Datum::Int32(_))
                | (FieldType::BigInt, Datum::Int64(_))
                | (FieldType::LargeInt, Datum::Int128(_))
                | (FieldType::Float, Datum::Float32(_))
                | (FieldType::Double, Datum::Float64(_))
                | (FieldType::Date, Datum::Date(_))
                | (FieldType::DateTime, Datum::DateTime(_))
                | (FieldType::Decimal, Datum::Decimal(_))
                | (FieldType::Char | FieldType::Varchar, Datum::Bytes(_))
        );
        if !ok {
            return Err(Error::InvalidArgument(format!(
                "{} value does not match column type {}",
                datum.kind_name(),
                self.field_type
            )));
        }
        if let Datum::Bytes(b) = datum {
            if self.length > 0 && b.len() > self.length as usize {
                return Err(Error::InvalidArgument(format!(
                    "{} value of {} bytes exceeds declared length {}",
                    self.field_type,
                    b.len(),
                    self.length
                )));
            }
        }
        Ok(())
    }

    /// Total order under this field's type
    pub fn compare(&self, a: &Datum, b: &Datum) -> Ordering {
        match (a, b) {
            (Datum::Bool(x), Datum::Bool(y)) => x.cmp(y),
            (Datum::Int8(x), Datum::Int8(y)) => x.cmp(y),
            (Datum::Int16(x), Datum::Int16(y)) => x.cmp(y),
            (Datum::Int32(x), Datum::Int32(y)) => x.cmp(y),
            (Datum::Int64(x), Datum::Int64(y)) => x.cmp(y),
            (Datum::Int128(x), Datum::Int128(y)) => x.cmp(y),
            (Datum::Float32(x), Datum::Float32(y)) => x.total_cmp(y),
            (Datum::Float64(x), Datum::Float64(y)) => x.total_cmp(y),
            (Datum::Date(x), Datum::Date(y)) => x.cmp(y),
            (Datum::DateTime(x), Datum::DateTime(y)) => x.cmp(y),
            (Datum::Decimal(x), Datum::Decimal(y)) => x.cmp(y),
            (Datum::Bytes(x), Datum::Bytes(y)) => x.as_ref().cmp(y.as_ref()),
            _ => a.rank().cmp(&b.rank()),
        }
    }

    /// Serialized size of `datum` as written by `encode_value`
    pub fn encoded_size(&self, datum: &Datum) -> usize {
        match datum {
            Datum::Bytes(b) => varint::varint_len(b.len() as u64) + b.len(),
            _ => self.field_type.fixed_size().unwrap_or(0),
        }
    }

    /// Write the on-disk value representation (little-endian for fixed types)
    pub fn encode_value(&self, datum: &Datum, buf: &mut impl BufMut) {
        match datum {
            Datum::Bool(v) => buf.put_u8(*v as u8),
            Datum::Int8(v) => buf.put_i8(*v),
            Datum::Int16(v) => buf.put_i16_le(*v),
            Datum::Int32(v) => buf.put_i32_le(*v),
            Datum::Int64(v) => buf.put_i64_le(*v),
            Datum::Int128(v) => buf.put_i128_le(*v),
            Datum::Float32(v) => buf.put_f32_le(*v),
            Datum::Float64(v) => buf.put_f64_le(*v),
            Datum::Date(v) => buf.put_u32_le(*v),
            Datum::DateTime(v) => buf.put_u64_le(*v),
            Datum::Decimal(d) => {
                buf.put_i64_le(d.integer);
                buf.put_i32_le(d.fraction);
            }
            Datum::Bytes(b) => {
                varint::encode_varint_u64(buf, b.len() as u64);
                buf.put_slice(b);
            }
        }
    }

    /// Read one value written by `encode_value`
    pub fn decode_value(&self, cursor: &mut &[u8]) -> Result<Datum> {
        let what = self.field_type.name();
        Ok(match self.field_type {
            FieldType::Bool => match cursor::get_u8(cursor, what)? {
                0 => Datum::Bool(false),
                1 => Datum::Bool(true),
                other => return Err(Error::corruption(format!("invalid BOOL byte {}", other))),
            },
            FieldType::TinyInt => Datum::Int8(cursor::get_u8(cursor, what)? as i8),
            FieldType::SmallInt => Datum::Int16(i16::from_le_bytes(cursor::get_array(cursor, what)?)),
            FieldType::Int => Datum::Int32(i32::from_le_bytes(cursor::get_array(cursor, what)?)),
            FieldType::BigInt => Datum::Int64(i64::from_le_bytes(cursor::get_array(cursor, what)?)),
            FieldType::LargeInt => {
                Datum::Int128(i128::from_le_bytes(cursor::get_array(cursor, what)?))
            }
            FieldType::Float => Datum::Float32(f32::from_le_bytes(cursor::get_array(cursor, what)?)),
            FieldType::Double => {
                Datum::Float64(f64::from_le_bytes(cursor::get_array(cursor, what)?))
            }
            FieldType::Date => Datum::Date(u32::from_le_bytes(cursor::get_array(cursor, what)?)),
            FieldType::DateTime => {
                Datum::DateTime(u64::from_le_bytes(cursor::get_array(cursor, what)?))
            }
            FieldType::Decimal => {
                let integer = i64::from_le_bytes(cursor::get_array(cursor, what)?);
                let fraction = i32::from_le_bytes(cursor::get_array(cursor, what)?);
                Datum::Decimal(Decimal12::new(integer, fraction))
            }
            FieldType::Char | FieldType::Varchar => {
                let len = varint::decode_varint_u64(cursor)? as usize;
                let bytes = cursor::take(cursor, len, what)?;
                Datum::Bytes(Bytes::copy_from_slice(bytes))
            }
        })
    }

    /// Rebuild an integer-like value from its i64 image (inverse of `Datum::as_i64`)
    pub fn datum_from_i64(&self, v: i64) -> Result<Datum> {
        let out_of_range =
            || Error::corruption(format!("value {} out of range for {}", v, self.field_type));
        Ok(match self.field_type {
            FieldType::Bool => match v {
                0 => Datum::Bool(false),
                1 => Datum::Bool(true),
                _ => return Err(out_of_range()),
            },
            FieldType::TinyInt => Datum::Int8(i8::try_from(v).map_err(|_| out_of_range())?),
            FieldType::SmallInt => Datum::Int16(i16::try_from(v).map_err(|_| out_of_range())?),
            FieldType::Int => Datum::Int32(i32::try_from(v).map_err(|_| out_of_range())?),
            FieldType::BigInt => Datum::Int64(v),
            FieldType::Date => Datum::Date(u32::try_from(v).map_err(|_| out_of_range())?),
            FieldType::DateTime => Datum::DateTime(v as u64),
            other => {
                return Err(Error::Unsupported(format!(
                    "{} values are not integer-like",
                    other
                )))
            }
        })
    }

    /// Append a memcmp-comparable encoding of `datum`.
    ///
    /// Strings are cut to `prefix_len` bytes (0 keeps them whole), then escaped so an
    /// embedded 0x00 can't end the key early: `0x00 -> 0x00 0xFF`, terminated by `0x00 0x00`.
    pub fn encode_ascending(&self, datum: &Datum, prefix_len: usize, buf: &mut Vec<u8>) {
        match datum {
            Datum::Bool(v) => buf.push(*v as u8),
            Datum::Int8(v) => buf.push((*v as u8) ^ 0x80),
            Datum::Int16(v) => buf.extend_from_slice(&((*v as u16) ^ (1 << 15)).to_be_bytes()),
            Datum::Int32(v) => buf.extend_from_slice(&((*v as u32) ^ (1 << 31)).to_be_bytes()),
            Datum::Int64(v) => buf.extend_from_slice(&((*v as u64) ^ (1 << 63)).to_be_bytes()),
            Datum::Int128(v) => buf.extend_from_slice(&((*v as u128) ^ (1 << 127)).to_be_bytes()),
            Datum::Float32(v) => {
                let bits = v.to_bits();
                let ordered = if bits & (1 << 31) != 0 { !bits } else { bits ^ (1 << 31) };
                buf.extend_from_slice(&ordered.to_be_bytes());
            }
            Datum::Float64(v) => {
                let bits = v.to_bits();
                let ordered = if bits & (1 << 63) != 0 { !bits } else { bits ^ (1 << 63) };
                buf.extend_from_slice(&ordered.to_be_bytes());
            }
            Datum::Date(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Datum::DateTime(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Datum::Decimal(d) => {
                buf.extend_from_slice(&((d.integer as u64) ^ (1 << 63)).to_be_bytes());
                buf.extend_from_slice(&((d.fraction as u32) ^ (1 << 31)).to_be_bytes());
            }
            Datum::Bytes(b) => {
                let end = if prefix_len == 0 { b.len() } else { b.len().min(prefix_len) };
                for &byte in &b[..end] {
                    buf.push(byte);
                    if byte == 0x00 {
                        buf.push(0xFF);
                    }
                }
                buf.extend_from_slice(&[0x00, 0x00]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn roundtrip(field: Field, datum: Datum) {
        let mut buf = BytesMut::new();
        field.encode_value(&datum, &mut buf);
        assert_eq!(buf.len(), field.encoded_size(&datum));
        let mut cursor = buf.as_ref();
        let decoded = field.decode_value(&mut cursor).unwrap();
        assert_eq!(decoded, datum);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_value_roundtrip_each_type() {
        roundtrip(Field::new(FieldType::Bool, 0), Datum::Bool(true));
        roundtrip(Field::new(FieldType::TinyInt, 0), Datum::Int8(-7));
        roundtrip(Field::new(FieldType::SmallInt, 0), Datum::Int16(-300));
        roundtrip(Field::new(FieldType::Int, 0), Datum::Int32(i32::MIN));
        roundtrip(Field::new(FieldType::BigInt, 0), Datum::Int64(i64::MAX));
        roundtrip(Field::new(FieldType::LargeInt, 0), Datum::Int128(-(1i128 << 100)));
        roundtrip(Field::new(FieldType::Float, 0), Datum::Float32(1.5));
        roundtrip(Field::new(FieldType::Double, 0), Datum::Float64(-2.25));
        roundtrip(Field::new(FieldType::Date, 0), Datum::Date(738_000));
        roundtrip(Field::new(FieldType::DateTime, 0), Datum::DateTime(20240101120000));
        roundtrip(
            Field::new(FieldType::Decimal, 0),
            Datum::Decimal(Decimal12::new(12, 500_000_000)),
        );
        roundtrip(Field::new(FieldType::Varchar, 0), Datum::from("hello"));
        roundtrip(Field::new(FieldType::Char, 8), Datum::from(""));
    }

    #[test]
    fn test_field_type_id_roundtrip() {
        for id in 1u8..=13 {
            let ty = FieldType::try_from(id).unwrap();
            assert_eq!(ty as u8, id);
        }
        assert!(FieldType::try_from(0).is_err());
        assert!(FieldType::try_from(14).is_err());
    }

    #[test]
    fn test_check_rejects_mismatch_and_overlong() {
        let int = Field::new(FieldType::Int, 0);
        assert!(int.check(&Datum::Int32(1)).is_ok());
        assert!(int.check(&Datum::Int64(1)).is_err());

        let varchar = Field::new(FieldType::Varchar, 4);
        assert!(varchar.check(&Datum::from("abcd")).is_ok());
        assert!(varchar.check(&Datum::from("abcde")).is_err());
    }

    #[test]
    fn test_compare_floats_total_order() {
        let field = Field::new(FieldType::Double, 0);
        assert_eq!(
            field.compare(&Datum::Float64(-0.0), &Datum::Float64(0.0)),
            Ordering::Less
        );
        assert_eq!(
            field.compare(&Datum::Float64(f64::NAN), &Datum::Float64(f64::INFINITY)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_bytes_lexicographic() {
        let field = Field::new(FieldType::Varchar, 0);
        assert_eq!(field.compare(&Datum::from("ab"), &Datum::from("b")), Ordering::Less);
        assert_eq!(field.compare(&Datum::from("ab"), &Datum::from("a")), Ordering::Greater);
    }

    #[test]
    fn test_ascending_encoding_preserves_int_order() {
        let field = Field::new(FieldType::BigInt, 0);
        let values = [i64::MIN, -100, -1, 0, 1, 100, i64::MAX];
        let encoded: Vec<Vec<u8>> = values
            .iter()
            .map(|v| {
                let mut buf = Vec::new();
                field.encode_ascending(&Datum::Int64(*v), 0, &mut buf);
                buf
            })
            .collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_ascending_encoding_preserves_float_order() {
        let field = Field::new(FieldType::Float, 0);
        let values = [f32::NEG_INFINITY, -2.5, -0.0, 0.0, 1.0e-3, 7.0, f32::INFINITY];
        let mut prev: Option<Vec<u8>> = None;
        for v in values {
            let mut buf = Vec::new();
            field.encode_ascending(&Datum::Float32(v), 0, &mut buf);
            if let Some(p) = prev {
                assert!(p < buf, "order broken at {}", v);
            }
            prev = Some(buf);
        }
    }

    #[test]
    fn test_ascending_encoding_strings_with_nul() {
        let field = Field::new(FieldType::Varchar, 0);
        let mut a = Vec::new();
        let mut b = Vec::new();
        field.encode_ascending(&Datum::from("a"), 0, &mut a);
        field.encode_ascending(&Datum::Bytes(Bytes::from_static(b"a\0")), 0, &mut b);
        assert!(a < b);
    }

    #[test]
    fn test_ascending_encoding_truncates_prefix() {
        let field = Field::new(FieldType::Varchar, 0);
        let mut buf = Vec::new();
        field.encode_ascending(&Datum::from("abcdef"), 3, &mut buf);
        assert_eq!(buf, b"abc\0\0");
    }

    #[test]
    fn test_datum_from_i64_inverse() {
        let cases = [
            (FieldType::Bool, Datum::Bool(true)),
            (FieldType::TinyInt, Datum::Int8(-128)),
            (FieldType::SmallInt, Datum::Int16(12345)),
            (FieldType::Int, Datum::Int32(-42)),
            (FieldType::BigInt, Datum::Int64(i64::MIN)),
            (FieldType::Date, Datum::Date(u32::MAX)),
            (FieldType::DateTime, Datum::DateTime(u64::MAX)),
        ];
        for (ty, datum) in cases {
            let field = Field::new(ty, 0);
            let image = datum.as_i64().unwrap();
            assert_eq!(field.datum_from_i64(image).unwrap(), datum);
        }
        assert!(Field::new(FieldType::TinyInt, 0).datum_from_i64(300).is_err());
    }

    #[test]
    fn test_deep_copy_does_not_share_buffer() {
        let original = Bytes::from(vec![1u8, 2, 3]);
        let datum = Datum::Bytes(original.clone());
        let copy = datum.deep_copy();
        assert_eq!(copy, datum);
        assert_ne!(copy.as_bytes().unwrap().as_ptr(), original.as_ptr());
    }

    #[test]
    fn test_decimal_display() {
        assert_eq!(Decimal12::new(3, 140_000_000).to_string(), "3.140000000");
        assert_eq!(Decimal12::new(-1, -500_000_000).to_string(), "-1.500000000");
    }
}
