//! Export of aggregate tables.
//!
//! Macrodata CSV (optionally gzip-compressed), heatmap pivot CSV and JSON
//! section reports. Missing metrics are written as empty CSV fields.

use crate::engine::{AggregateTable, Pivot};
use crate::error::Result;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Column order of the macrodata export.
pub const MACRODATA_HEADER: [&str; 6] = [
    "start_time",
    "start_space",
    "avg_speed",
    "density",
    "flow",
    "vehicle_count",
];

/// Logs the aggregate table using Rust's debug pretty-print format.
pub fn print_pretty(table: &AggregateTable) {
    debug!("{:#?}", table);
}

/// Serializes the table as macrodata CSV into any writer.
pub fn write_table_to<W: Write>(writer: W, table: &AggregateTable) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    writer.write_record(MACRODATA_HEADER)?;
    for record in table {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the table to `path`, replacing any existing file.
///
/// With `gzip` the CSV is compressed and `.gz` is appended to the path if
/// not already present. Returns the path actually written.
pub fn write_table(path: &str, table: &AggregateTable, gzip: bool) -> Result<String> {
    let path = if gzip && !path.ends_with(".gz") {
        format!("{}.gz", path)
    } else {
        path.to_string()
    };
    create_parent(&path)?;

    let file = BufWriter::new(File::create(&path)?);
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_table_to(&mut encoder, table)?;
        encoder.finish()?.flush()?;
    } else {
        write_table_to(file, table)?;
    }

    info!(path = %path, rows = table.len(), gzip, "Macrodata written");
    Ok(path)
}

/// Serializes a pivot as CSV: `start_space` then one column per start time.
pub fn write_pivot_to<W: Write>(writer: W, pivot: &Pivot) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    let mut header = vec!["start_space".to_string()];
    header.extend(pivot.start_times.iter().map(|t| t.to_string()));
    writer.write_record(&header)?;

    for (space, row) in pivot.start_spaces.iter().zip(&pivot.values) {
        let mut fields = vec![space.to_string()];
        fields.extend(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        writer.write_record(&fields)?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_pivot(path: &str, pivot: &Pivot) -> Result<()> {
    create_parent(path)?;
    write_pivot_to(BufWriter::new(File::create(path)?), pivot)?;
    info!(
        path,
        metric = pivot.metric.name(),
        rows = pivot.start_spaces.len(),
        cols = pivot.start_times.len(),
        "Heatmap matrix written"
    );
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    create_parent(path)?;
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, value)?;
    debug!(path, "JSON written");
    Ok(())
}

fn create_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
