//! Hardness map construction from indentation-test instrument exports.
//!
//! This crate provides tools for:
//! - Loading delimited instrument export files (UTF-8 or UTF-16)
//! - Resolving the x, y, and hardness columns from the header row
//! - Building dense hardness grids from scattered measurements
//! - Exporting grids as xlsx workbooks and heatmap PNGs
//! - Batch processing directories with per-file failure isolation
//!
//! # Example
//!
//! ```no_run
//! use hardness_map::config::MapConfig;
//! use hardness_map::pipeline::MapPipeline;
//!
//! let config = MapConfig::default();
//! let mut pipeline = MapPipeline::new("specimen.csv", &config, Some(200.0));
//! pipeline.extract().unwrap();
//! pipeline.build_grid();
//! pipeline.export(std::path::Path::new("specimen_map.xlsx")).unwrap();
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod visualization;

pub use config::{ColumnConfig, ExportConfig, InputConfig, MapConfig, RenderConfig};
pub use core::grid::Grid;
pub use core::loaders::{Measurement, TableData};
pub use pipeline::{MapPipeline, PipelineState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
