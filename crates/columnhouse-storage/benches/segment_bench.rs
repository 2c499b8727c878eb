//! Segment Performance Benchmarks
//!
//! ## What We Benchmark
//!
//! ### 1. Write Performance (`bench_segment_write`)
//! - Rows/second for writing a three-column segment
//! - Different row counts (1K, 10K, 100K)
//! - No compression vs LZ4
//!
//! ### 2. Scan Performance (`bench_segment_scan`)
//! - Rows/second for a full lockstep scan of every column
//!
//! ### 3. Seek Performance (`bench_seek_to_ordinal`)
//! - Time to seek one column to 0%, 25%, 50%, 75%, 90% and read a batch
//! - Only the page holding the target row is decoded
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench -p columnhouse-storage
//! cargo bench -p columnhouse-storage --bench segment_bench segment_write
//! cargo bench -p columnhouse-storage -- --save-baseline main
//! ```

use std::sync::Arc;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use columnhouse_core::{ColumnBlock, ColumnSchema, Compression, Datum, FieldType, OwnedRow, RowBlock, Schema};
use columnhouse_storage::{
    BatchStatus, ColumnReaderOptions, InMemoryFile, SegmentReader, SegmentWriter,
    SegmentWriterOptions,
};

fn schema() -> Schema {
    Schema::new(
        vec![
            ColumnSchema::new(1, "event_time", FieldType::DateTime).key().not_null(),
            ColumnSchema::new(2, "city", FieldType::Varchar).with_length(32),
            ColumnSchema::new(3, "latency", FieldType::Double),
        ],
        1,
    )
    .unwrap()
}

const CITIES: [&str; 6] = ["amsterdam", "berlin", "lisbon", "oslo", "paris", "rome"];

fn create_test_row(i: u64) -> OwnedRow {
    OwnedRow::new(vec![
        Some(Datum::DateTime(20240101000000 + i)),
        Some(Datum::from(CITIES[(i % CITIES.len() as u64) as usize])),
        (i % 11 != 0).then(|| Datum::Float64((i % 997) as f64 * 0.25)),
    ])
}

fn write_segment(row_count: u64, compression: Compression) -> Bytes {
    let file = InMemoryFile::new();
    let options = SegmentWriterOptions {
        compression,
        ..Default::default()
    };
    let mut writer = SegmentWriter::with_file(1, schema(), options, Box::new(file.clone()));
    writer.init().unwrap();
    for i in 0..row_count {
        writer.append_row(&create_test_row(i)).unwrap();
    }
    writer.finalize().unwrap();
    file.to_bytes()
}

fn bench_segment_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_write");

    for row_count in [1_000u64, 10_000, 100_000] {
        for compression in [Compression::None, Compression::Lz4] {
            group.throughput(Throughput::Elements(row_count));
            group.bench_with_input(
                BenchmarkId::new(format!("{}_compression", compression), row_count),
                &row_count,
                |b, &count| {
                    b.iter(|| black_box(write_segment(count, compression)));
                },
            );
        }
    }

    group.finish();
}

fn bench_segment_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_scan");

    for row_count in [1_000u64, 10_000, 100_000] {
        for compression in [Compression::None, Compression::Lz4] {
            let data = write_segment(row_count, compression);

            group.throughput(Throughput::Elements(row_count));
            group.bench_with_input(
                BenchmarkId::new(format!("{}_compression", compression), row_count),
                &data,
                |b, data| {
                    b.iter(|| {
                        let reader = SegmentReader::from_file(Arc::new(data.clone())).unwrap();
                        let mut rows = reader
                            .new_row_iterator(ColumnReaderOptions::default())
                            .unwrap();
                        let mut block = RowBlock::new(0);
                        let mut total = 0;
                        while let BatchStatus::Read(n) = rows.next_batch(1024, &mut block).unwrap() {
                            total += n;
                        }
                        black_box(total)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_seek_to_ordinal(c: &mut Criterion) {
    let mut group = c.benchmark_group("seek_to_ordinal");

    let row_count = 100_000u64;
    let data = write_segment(row_count, Compression::Lz4);
    let reader = SegmentReader::from_file(Arc::new(data)).unwrap();
    let column = reader
        .column_reader(1, ColumnReaderOptions::default())
        .unwrap();

    for ordinal_pct in [0u64, 25, 50, 75, 90] {
        let ordinal = row_count * ordinal_pct / 100;
        group.bench_with_input(
            BenchmarkId::new("ordinal_pct", ordinal_pct),
            &ordinal,
            |b, &ordinal| {
                b.iter(|| {
                    let mut iter = column.new_iterator();
                    iter.seek_to_ordinal(ordinal).unwrap();
                    let mut block = ColumnBlock::new();
                    black_box(iter.next_batch(128, &mut block).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_segment_write,
    bench_segment_scan,
    bench_seek_to_ordinal
);
criterion_main!(benches);
