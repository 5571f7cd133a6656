//! Spreadsheet export for built hardness grids.
//!
//! Writes an xlsx workbook with a "Map" sheet (y-axis header row, one row per
//! x value) and an optional "Original" sheet reproducing the raw input rows.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use super::grid::Grid;
use super::loaders::TableData;

/// Errors that can occur during workbook export.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Workbook construction or saving failed.
    #[error("failed to write workbook '{path}': {source}")]
    Workbook {
        path: String,
        #[source]
        source: XlsxError,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Coerce the output path to an `.xlsx` extension.
///
/// A different configured extension is a configuration error, not a fatal
/// one: it is reported and rewritten.
pub fn normalize_output_extension(path: &Path) -> PathBuf {
    let is_xlsx = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);

    if is_xlsx {
        path.to_path_buf()
    } else {
        warn!(
            "output '{}' does not use the .xlsx extension; coercing",
            path.display()
        );
        path.with_extension("xlsx")
    }
}

/// Write a hardness grid to an xlsx workbook.
///
/// The "Map" sheet starts with a blank corner cell followed by the y-axis
/// values; each subsequent row is one x-axis value followed by that row's
/// grid values (empty cells materialized as 0). When `original` is given, an
/// "Original" sheet reproduces the input header and rows verbatim, writing
/// numeric fields as numbers.
///
/// # Errors
///
/// Returns an error if parent directories cannot be created or the workbook
/// cannot be built or saved.
pub fn write_map_workbook(path: &Path, grid: &Grid, original: Option<&TableData>) -> Result<()> {
    ensure_parent_dirs(path)?;

    let path_str = path.display().to_string();
    let wrap = |e: XlsxError| WriteError::Workbook {
        path: path_str.clone(),
        source: e,
    };

    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Map").map_err(wrap)?;

        // Header row: blank leading cell, then the y-axis values.
        for (j, y) in grid.y_axis().iter().enumerate() {
            sheet.write_number(0, (j + 1) as u16, *y).map_err(wrap)?;
        }

        for (i, x) in grid.x_axis().iter().enumerate() {
            let row = (i + 1) as u32;
            sheet.write_number(row, 0, *x).map_err(wrap)?;
            for j in 0..grid.y_axis().len() {
                sheet
                    .write_number(row, (j + 1) as u16, grid.value_at(i, j))
                    .map_err(wrap)?;
            }
        }
    }

    if let Some(table) = original {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Original").map_err(wrap)?;

        for (j, label) in table.headers.iter().enumerate() {
            sheet.write_string(0, j as u16, label).map_err(wrap)?;
        }

        for (i, row) in table.rows.iter().enumerate() {
            for (j, field) in row.iter().enumerate() {
                let cell = ((i + 1) as u32, j as u16);
                match field.trim().parse::<f64>() {
                    Ok(value) => sheet.write_number(cell.0, cell.1, value).map_err(wrap)?,
                    Err(_) => sheet.write_string(cell.0, cell.1, field).map_err(wrap)?,
                };
            }
        }
    }

    workbook.save(path).map_err(wrap)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::Measurement;
    use tempfile::tempdir;

    fn test_grid() -> Grid {
        Grid::build(&[
            Measurement {
                x: 0.0,
                y: 0.0,
                hardness: 200.0,
            },
            Measurement {
                x: 0.0,
                y: 1.0,
                hardness: 210.0,
            },
            Measurement {
                x: 1.0,
                y: 0.0,
                hardness: 190.0,
            },
        ])
    }

    #[test]
    fn test_write_map_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.xlsx");

        write_map_workbook(&path, &test_grid(), None).unwrap();

        assert!(path.exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_map_workbook_with_original_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.xlsx");

        let table = TableData {
            headers: vec!["XAbs".into(), "YAbs".into(), "Hardness".into()],
            rows: vec![vec!["0".into(), "0".into(), "200".into()]],
            source_path: None,
        };

        write_map_workbook(&path, &test_grid(), Some(&table)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("map.xlsx");

        write_map_workbook(&path, &test_grid(), None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_normalize_output_extension() {
        assert_eq!(
            normalize_output_extension(Path::new("out/map.xlsx")),
            PathBuf::from("out/map.xlsx")
        );
        assert_eq!(
            normalize_output_extension(Path::new("out/map.xls")),
            PathBuf::from("out/map.xlsx")
        );
        assert_eq!(
            normalize_output_extension(Path::new("out/map")),
            PathBuf::from("out/map.xlsx")
        );
    }
}
