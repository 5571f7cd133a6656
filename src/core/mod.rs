//! Core data types and grid construction.

pub mod columns;
pub mod grid;
pub mod loaders;
pub mod writers;

pub use columns::{resolve_columns, ColumnMapping, ColumnRole, ResolutionError};
pub use grid::Grid;
pub use loaders::{extract_measurements, load_table, Measurement, TableData};
pub use writers::{normalize_output_extension, write_map_workbook, WriteError};
