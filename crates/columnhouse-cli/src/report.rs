//! Footer summary printed by `segctl inspect`

use serde::Serialize;

use columnhouse_core::{Compression, Encoding, FieldType, Result};
use columnhouse_storage::{ColumnMeta, SegmentReader, ZoneMap};

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub file_size: u64,
    pub version: u8,
    pub num_rows: u64,
    pub columns: Vec<ColumnReport>,
    pub short_key_index: Option<ShortKeyReport>,
}

#[derive(Debug, Serialize)]
pub struct ColumnReport {
    pub column_id: u32,
    pub unique_id: u32,
    pub field_type: FieldType,
    pub length: u32,
    pub nullable: bool,
    pub encoding: Encoding,
    pub compression: Compression,
    pub num_pages: usize,
    pub data_bytes: u64,
    pub zone_map: Option<ZoneMapReport>,
}

#[derive(Debug, Serialize)]
pub struct ZoneMapReport {
    pub min: Option<String>,
    pub max: Option<String>,
    pub has_null: bool,
    pub has_not_null: bool,
}

#[derive(Debug, Serialize)]
pub struct ShortKeyReport {
    pub segment_id: u32,
    pub num_rows_per_block: u32,
    pub num_items: usize,
    pub bytes: u32,
}

impl SegmentReport {
    pub fn build(reader: &SegmentReader) -> Result<Self> {
        let footer = reader.footer();
        let short_key_index = match (reader.short_key_index()?, footer.short_key_index_pointer) {
            (Some(index), Some(pointer)) => Some(ShortKeyReport {
                segment_id: index.segment_id(),
                num_rows_per_block: index.num_rows_per_block(),
                num_items: index.num_items(),
                bytes: pointer.size,
            }),
            _ => None,
        };

        Ok(Self {
            file_size: reader.file_size(),
            version: footer.version,
            num_rows: footer.num_rows,
            columns: footer.columns.iter().map(ColumnReport::from_meta).collect(),
            short_key_index,
        })
    }

    pub fn print_text(&self) {
        println!("file size:   {} bytes", self.file_size);
        println!("version:     {}", self.version);
        println!("rows:        {}", self.num_rows);
        match &self.short_key_index {
            Some(index) => println!(
                "short keys:  {} entries, every {} rows ({} bytes)",
                index.num_items, index.num_rows_per_block, index.bytes
            ),
            None => println!("short keys:  none"),
        }
        println!();
        println!(
            "{:>4} {:>6} {:<10} {:<11} {:<6} {:>6} {:>10}  zone map",
            "col", "uid", "type", "encoding", "codec", "pages", "bytes"
        );
        for column in &self.columns {
            let zone_map = column
                .zone_map
                .as_ref()
                .map_or_else(|| "-".to_string(), ZoneMapReport::describe);
            println!(
                "{:>4} {:>6} {:<10} {:<11} {:<6} {:>6} {:>10}  {}",
                column.column_id,
                column.unique_id,
                column.field_type.to_string(),
                column.encoding.to_string(),
                column.compression.to_string(),
                column.num_pages,
                column.data_bytes,
                zone_map
            );
        }
    }
}

impl ColumnReport {
    fn from_meta(meta: &ColumnMeta) -> Self {
        Self {
            column_id: meta.column_id,
            unique_id: meta.unique_id,
            field_type: meta.field_type,
            length: meta.length,
            nullable: meta.is_nullable,
            encoding: meta.encoding,
            compression: meta.compression,
            num_pages: meta.data_page_pointers.len(),
            data_bytes: meta.data_page_pointers.iter().map(|p| p.size as u64).sum(),
            zone_map: meta.segment_zone_map.as_ref().map(ZoneMapReport::from_zone_map),
        }
    }
}

impl ZoneMapReport {
    fn from_zone_map(zone_map: &ZoneMap) -> Self {
        Self {
            min: zone_map.min().map(ToString::to_string),
            max: zone_map.max().map(ToString::to_string),
            has_null: zone_map.has_null(),
            has_not_null: zone_map.has_not_null(),
        }
    }

    fn describe(&self) -> String {
        let range = match (&self.min, &self.max) {
            (Some(min), Some(max)) => format!("[{}, {}]", min, max),
            _ => "empty".to_string(),
        };
        if self.has_null {
            format!("{} +null", range)
        } else {
            range
        }
    }
}
