//! Loaders for delimited instrument export files.
//!
//! Indentation testers export tab-separated tables, usually UTF-16 encoded
//! with a byte order mark. This module decodes the raw bytes, parses the
//! header and data rows, and extracts (x, y, hardness) measurements using a
//! resolved column mapping.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::debug;
use thiserror::Error;

use super::columns::ColumnMapping;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("No parseable measurements in {0}")]
    NoMeasurements(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One observed measurement triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// X coordinate as read from the input.
    pub x: f64,
    /// Y coordinate as read from the input.
    pub y: f64,
    /// Hardness value at (x, y).
    pub hardness: f64,
}

/// Raw tabular content of one input file.
///
/// Rows are kept as strings so the "Original" worksheet can reproduce the
/// input verbatim.
#[derive(Debug, Clone)]
pub struct TableData {
    /// Ordered column labels from the header row.
    pub headers: Vec<String>,
    /// Data rows in input order.
    pub rows: Vec<Vec<String>>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl TableData {
    /// Returns the number of data rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Decode raw file bytes to a string, honoring UTF-16 byte order marks.
///
/// Recognizes UTF-16LE (`FF FE`) and UTF-16BE (`FE FF`) BOMs; anything else
/// is treated as UTF-8 (with an optional `EF BB BF` BOM stripped). Malformed
/// sequences are replaced rather than rejected.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        decode_utf16(&bytes[2..], true)
    } else if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        decode_utf16(&bytes[2..], false)
    } else if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        String::from_utf8_lossy(&bytes[3..]).into_owned()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn decode_utf16(bytes: &[u8], little_endian: bool) -> String {
    let units = bytes.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Load a delimited table from an instrument export file.
///
/// The first row is treated as the header; every following row becomes a
/// string record. Short or long rows are accepted as-is (the exports pad
/// trailing columns inconsistently).
///
/// # Arguments
///
/// * `path` - Path to the input file
/// * `delimiter` - Field delimiter byte (tab for the reference exports)
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains no data rows.
pub fn load_table<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<TableData> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let text = decode_text(&bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(text));

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(String::from).collect());
    }

    if rows.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(TableData {
        headers,
        rows,
        source_path: Some(path.to_path_buf()),
    })
}

/// Extract measurements from a loaded table using a resolved column mapping.
///
/// Rows whose mapped fields are missing or fail to parse as finite numbers
/// are skipped; row order is otherwise preserved. NaN and infinity are
/// rejected because the grid axes rely on well-ordered coordinates.
///
/// # Errors
///
/// Returns an error if no row yields a parseable measurement.
pub fn extract_measurements(table: &TableData, mapping: &ColumnMapping) -> Result<Vec<Measurement>> {
    let mut measurements = Vec::with_capacity(table.num_rows());

    for (row_idx, row) in table.rows.iter().enumerate() {
        let x = parse_field(row, mapping.x);
        let y = parse_field(row, mapping.y);
        let hardness = parse_field(row, mapping.hardness);

        match (x, y, hardness) {
            (Some(x), Some(y), Some(hardness)) => {
                measurements.push(Measurement { x, y, hardness });
            }
            _ => {
                debug!("skipping row {}: unparseable measurement fields", row_idx + 1);
            }
        }
    }

    if measurements.is_empty() {
        let path = table
            .source_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("<memory>"));
        return Err(LoaderError::NoMeasurements(path));
    }

    Ok(measurements)
}

/// Parse one mapped field as a finite number.
///
/// `"NaN"` and `"inf"` parse successfully as `f64` but have no place on a
/// coordinate axis, so they are treated like any other unparseable field.
fn parse_field(row: &[String], index: usize) -> Option<f64> {
    row.get(index)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
