//! columnhouse CLI (segctl)
//!
//! Command-line tool for looking inside columnhouse segment files.
//!
//! ## Overview
//!
//! - **inspect**: footer summary (rows, per-column type, encoding, pages, zone maps,
//!   short-key index)
//! - **dump**: seek one column to an ordinal and print its values
//! - **verify**: decode every page of every column and report the first corruption
//!
//! ## Quick Start
//!
//! ```bash
//! segctl inspect segment_42.dat
//! segctl inspect segment_42.dat --json
//! segctl dump segment_42.dat --column 1 --from 1000 --limit 20
//! RUST_LOG=debug segctl verify segment_42.dat
//! ```
//!
//! ## Architecture
//!
//! The CLI uses:
//! - **clap**: argument parsing and help generation
//! - **anyhow**: error context for every failing step
//! - **serde_json**: `--json` output of the inspect report
//! - **tracing-subscriber**: log output filtered by `RUST_LOG` (default: warn)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use columnhouse_core::ColumnBlock;
use columnhouse_storage::{BatchStatus, ColumnReaderOptions, SegmentReader};

mod report;

use report::SegmentReport;

#[derive(Parser)]
#[command(name = "segctl")]
#[command(about = "Inspect columnhouse segment files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the footer summary of a segment
    Inspect {
        /// Segment file
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the values of one column
    Dump {
        /// Segment file
        file: PathBuf,

        /// Column position in the schema
        #[arg(short, long)]
        column: usize,

        /// First row ordinal
        #[arg(long, default_value_t = 0)]
        from: u64,

        /// Maximum number of rows to print
        #[arg(short, long, default_value_t = 100)]
        limit: usize,

        /// Skip page checksum verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Decode every page of every column
    Verify {
        /// Segment file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { file, json } => inspect(&file, json),
        Commands::Dump {
            file,
            column,
            from,
            limit,
            no_verify,
        } => dump(&file, column, from, limit, !no_verify),
        Commands::Verify { file } => verify(&file),
    }
}

fn open(file: &Path) -> Result<SegmentReader> {
    let reader = SegmentReader::open(file)
        .with_context(|| format!("Failed to open segment {}", file.display()))?;
    tracing::debug!(
        path = %file.display(),
        rows = reader.num_rows(),
        columns = reader.num_columns(),
        "Opened segment"
    );
    Ok(reader)
}

fn inspect(file: &Path, json: bool) -> Result<()> {
    let reader = open(file)?;
    let report = SegmentReport::build(&reader).context("Failed to read short key index")?;
    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", out);
    } else {
        report.print_text();
    }
    Ok(())
}

fn dump(file: &Path, column: usize, from: u64, limit: usize, verify_checksums: bool) -> Result<()> {
    let reader = open(file)?;
    let column_reader = reader
        .column_reader(column, ColumnReaderOptions { verify_checksums })
        .with_context(|| format!("Failed to open column {}", column))?;

    let mut iter = column_reader.new_iterator();
    iter.seek_to_ordinal(from)
        .with_context(|| format!("Failed to seek column {} to ordinal {}", column, from))?;

    let mut block = ColumnBlock::new();
    let mut remaining = limit;
    while remaining > 0 {
        let ordinal = iter.current_ordinal();
        let status = iter
            .next_batch(remaining.min(1024), &mut block)
            .with_context(|| format!("Failed to read column {} at ordinal {}", column, ordinal))?;
        let BatchStatus::Read(n) = status else {
            break;
        };
        for (offset, cell) in block.cells().iter().enumerate() {
            match cell {
                Some(value) => println!("{}\t{}", ordinal + offset as u64, value),
                None => println!("{}\tNULL", ordinal + offset as u64),
            }
        }
        remaining -= n;
    }
    Ok(())
}

fn verify(file: &Path) -> Result<()> {
    let reader = open(file)?;
    reader
        .short_key_index()
        .context("Short key index is corrupt")?;

    let mut block = ColumnBlock::new();
    for column in 0..reader.num_columns() {
        let column_reader = reader
            .column_reader(column, ColumnReaderOptions::default())
            .with_context(|| format!("Column {} metadata is corrupt", column))?;
        let mut iter = column_reader.new_iterator();
        let mut rows = 0u64;
        loop {
            let status = iter
                .next_batch(4096, &mut block)
                .with_context(|| format!("Column {} is corrupt near ordinal {}", column, rows))?;
            match status {
                BatchStatus::Read(n) => rows += n as u64,
                BatchStatus::EndOfData => break,
            }
        }
        if rows != reader.num_rows() {
            bail!(
                "Column {} produced {} rows, segment holds {}",
                column,
                rows,
                reader.num_rows()
            );
        }
        println!(
            "column {:>3}: {} rows in {} pages OK",
            column,
            rows,
            column_reader.num_pages()
        );
    }
    println!("{}: OK", file.display());
    Ok(())
}
