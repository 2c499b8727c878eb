use columnhouse_core::cursor;
use columnhouse_core::varint;
use columnhouse_core::{Datum, Error, Result};

use super::compression::decompress;
use super::encoding::decode_values;
use super::{PageFormat, MAX_PAGE_ROWS, PAGE_CRC_SIZE};

/// Decode one on-disk page into its cells.
///
/// `expected_rows` comes from the ordinal index; a page holding any other
/// number of values is corrupt.
pub fn decode_page(
    format: &PageFormat,
    raw: &[u8],
    expected_rows: usize,
    verify_checksum: bool,
) -> Result<Vec<Option<Datum>>> {
    if expected_rows > MAX_PAGE_ROWS {
        return Err(Error::corruption(format!(
            "page of {} rows exceeds the {} row limit",
            expected_rows, MAX_PAGE_ROWS
        )));
    }
    if raw.len() < PAGE_CRC_SIZE {
        return Err(Error::corruption(format!(
            "page of {} bytes has no checksum trailer",
            raw.len()
        )));
    }
    let (compressed, mut trailer) = raw.split_at(raw.len() - PAGE_CRC_SIZE);
    if verify_checksum {
        let stored = cursor::get_u32_le(&mut trailer, "page checksum")?;
        let computed = crc32c::crc32c(compressed);
        if stored != computed {
            return Err(Error::ChecksumMismatch { stored, computed });
        }
    }

    let body = decompress(format.compression, compressed)?;
    let mut cursor = body.as_slice();

    let num_values = varint::decode_varint_u64(&mut cursor)?;
    if num_values != expected_rows as u64 {
        return Err(Error::corruption(format!(
            "page holds {} values, ordinal index expects {}",
            num_values, expected_rows
        )));
    }
    let has_nulls = cursor::get_flag(&mut cursor, "has_nulls")?;
    let nulls: Vec<bool> = if has_nulls {
        let bitmap = cursor::take(&mut cursor, expected_rows.div_ceil(8), "null bitmap")?;
        (0..expected_rows)
            .map(|i| (bitmap[i / 8] >> (i % 8)) & 1 == 1)
            .collect()
    } else {
        vec![false; expected_rows]
    };

    let non_null = nulls.iter().filter(|null| !**null).count();
    let mut values = decode_values(&format.field, format.encoding, &mut cursor, non_null)?
        .into_iter();
    if !cursor.is_empty() {
        return Err(Error::corruption(format!(
            "{} trailing bytes after page values",
            cursor.len()
        )));
    }

    Ok(nulls
        .into_iter()
        .map(|null| if null { None } else { values.next() })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageBuilder, PageFormat};
    use columnhouse_core::{Compression, Encoding, Field, FieldType};

    fn int_format(compression: Compression) -> PageFormat {
        PageFormat::new(Field::new(FieldType::Int, 0), Encoding::BitPacked, compression).unwrap()
    }

    fn build(format: PageFormat, cells: &[Option<Datum>]) -> Vec<u8> {
        let mut builder = PageBuilder::new(format);
        for cell in cells {
            builder.add(cell.as_ref());
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_page_roundtrip_with_nulls() {
        let cells = vec![
            Some(Datum::Int32(5)),
            None,
            Some(Datum::Int32(2)),
            Some(Datum::Int32(9)),
        ];
        for compression in [Compression::None, Compression::Lz4] {
            let format = int_format(compression);
            let page = build(format, &cells);
            assert_eq!(decode_page(&format, &page, 4, true).unwrap(), cells);
        }
    }

    #[test]
    fn test_page_all_nulls() {
        let format = PageFormat::new(
            Field::new(FieldType::Varchar, 0),
            Encoding::Dictionary,
            Compression::Lz4,
        )
        .unwrap();
        let cells = vec![None; 17];
        let page = build(format, &cells);
        assert_eq!(decode_page(&format, &page, 17, true).unwrap(), cells);
    }

    #[test]
    fn test_builder_resets_after_finish() {
        let format = int_format(Compression::None);
        let mut builder = PageBuilder::new(format);
        builder.add(None);
        builder.add(Some(&Datum::Int32(1)));
        builder.finish().unwrap();
        assert!(builder.is_empty());

        builder.add(Some(&Datum::Int32(3)));
        let page = builder.finish().unwrap();
        assert_eq!(
            decode_page(&format, &page, 1, true).unwrap(),
            vec![Some(Datum::Int32(3))]
        );
    }

    #[test]
    fn test_builder_is_full() {
        let format = int_format(Compression::Lz4);
        let mut builder = PageBuilder::new(format);
        for i in 0..3 {
            builder.add(Some(&Datum::Int32(i)));
        }
        assert!(builder.is_full(3, 1 << 20));
        assert!(!builder.is_full(4, 1 << 20));
        assert!(builder.is_full(100, 8));
    }

    #[test]
    fn test_flipped_byte_is_checksum_mismatch() {
        let format = int_format(Compression::Lz4);
        let mut page = build(format, &[Some(Datum::Int32(1)), Some(Datum::Int32(2))]);
        page[0] ^= 0x40;
        let err = decode_page(&format, &page, 2, true).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_row_count_mismatch_is_corruption() {
        let format = int_format(Compression::None);
        let page = build(format, &[Some(Datum::Int32(1))]);
        assert!(decode_page(&format, &page, 2, true).unwrap_err().is_corruption());
    }

    #[test]
    fn test_short_page_is_corruption() {
        let format = int_format(Compression::None);
        assert!(decode_page(&format, &[1, 2], 0, true).unwrap_err().is_corruption());
    }
}
