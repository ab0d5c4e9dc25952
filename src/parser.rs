//! Delimited-text decoder for trajectory samples.
//!
//! Accepts comma (or any single-byte) delimited text with an optional header
//! row, and whitespace-separated text. Gzip payloads are detected by their
//! magic bytes and decompressed first.

use crate::error::{GridError, Result};
use crate::trajectory::TrajectoryTable;
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Byte(u8),
    /// Runs of spaces or tabs.
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: Delimiter,
    pub has_header: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Byte(b','),
            has_header: true,
        }
    }
}

/// Decodes `bytes` into a rectangular numeric array.
///
/// Empty fields decode as NaN; the engine only rejects them if they sit in a
/// column it reads.
///
/// # Errors
///
/// Returns [`GridError::InvalidInput`] for a non-numeric field or ragged rows,
/// and [`GridError::Io`] / [`GridError::Csv`] if the payload cannot be read.
pub fn parse_trajectories(bytes: &[u8], options: &ParseOptions) -> Result<TrajectoryTable> {
    let text = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out)?;
        debug!(compressed = bytes.len(), decompressed = out.len(), "Gzip payload inflated");
        out
    } else {
        bytes.to_vec()
    };

    let rows = match options.delimiter {
        Delimiter::Byte(d) => parse_delimited(&text, d, options.has_header)?,
        Delimiter::Whitespace => parse_whitespace(&text, options.has_header)?,
    };
    debug!(rows = rows.len(), "Trajectory rows decoded");

    TrajectoryTable::from_rows(rows)
}

fn parse_delimited(text: &[u8], delimiter: u8, has_header: bool) -> Result<Vec<Vec<f64>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text);

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = record
            .iter()
            .enumerate()
            .map(|(col, field)| parse_field(field, i, col))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_whitespace(text: &[u8], has_header: bool) -> Result<Vec<Vec<f64>>> {
    let text = std::str::from_utf8(text)
        .map_err(|e| GridError::invalid(format!("input is not valid UTF-8: {}", e)))?;

    text.lines()
        .filter(|l| !l.trim().is_empty())
        .skip(usize::from(has_header))
        .enumerate()
        .map(|(i, line)| {
            line.split_whitespace()
                .enumerate()
                .map(|(col, field)| parse_field(field, i, col))
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn parse_field(field: &str, row: usize, col: usize) -> Result<f64> {
    if field.is_empty() {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| {
        GridError::invalid(format!(
            "non-numeric value {:?} at row {}, column {}",
            field, row, col
        ))
    })
}
