#![no_main]

use std::sync::Arc;

use bytes::Bytes;
use columnhouse_core::{ColumnBlock, RowBlock};
use columnhouse_storage::{BatchStatus, ColumnReaderOptions, SegmentReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must produce an error, never a panic:
    // - bad magic, truncated trailer or footer
    // - footer CRC32C mismatch
    // - pointers outside the file, malformed ordinal index or zone maps
    // - page CRC mismatch, undecodable LZ4, malformed bit-packed or dictionary payloads
    let Ok(reader) = SegmentReader::from_file(Arc::new(Bytes::copy_from_slice(data))) else {
        return;
    };

    let _ = reader.short_key_index();
    for column in 0..reader.num_columns() {
        let _ = reader.segment_zone_map(column);
        let Ok(column_reader) = reader.column_reader(column, ColumnReaderOptions::default()) else {
            continue;
        };
        let mut iter = column_reader.new_iterator();
        let mut block = ColumnBlock::new();
        let _ = iter.seek_to_ordinal(reader.num_rows() / 2);
        let _ = iter.next_batch(64, &mut block);
    }

    if let Ok(mut rows) = reader.new_row_iterator(ColumnReaderOptions::default()) {
        let mut block = RowBlock::new(0);
        while let Ok(BatchStatus::Read(_)) = rows.next_batch(256, &mut block) {}
    }
});
