//! Page compression
//!
//! LZ4 pages use the block format with the uncompressed length prepended
//! (`lz4_flex::compress_prepend_size`), so decompression needs no side channel.

use columnhouse_core::cursor;
use columnhouse_core::{Compression, Error, Result};

pub fn compress(compression: Compression, data: &[u8]) -> Vec<u8> {
    match compression {
        Compression::None => data.to_vec(),
        Compression::Lz4 => lz4_flex::compress_prepend_size(data),
    }
}

/// LZ4 cannot expand input by more than this factor
const LZ4_MAX_RATIO: usize = 255;

pub fn decompress(compression: Compression, data: &[u8]) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Lz4 => {
            // Refuse to allocate a prepended size the input could never expand to
            let mut cursor = data;
            let claimed = cursor::get_u32_le(&mut cursor, "lz4 size prefix")
                .map_err(|e| Error::Decompression(e.to_string()))? as usize;
            if claimed > cursor.len().saturating_mul(LZ4_MAX_RATIO) + 16 {
                return Err(Error::Decompression(format!(
                    "{} compressed bytes cannot expand to {}",
                    cursor.len(),
                    claimed
                )));
            }
            lz4_flex::decompress_size_prepended(data)
                .map_err(|e| Error::Decompression(e.to_string()))
        }
    }
}
