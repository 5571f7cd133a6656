//! Single-file map pipeline.
//!
//! Sequences column resolution, measurement extraction, grid construction,
//! and export/render for one input file, tracking an explicit lifecycle state
//! so steps invoked before their prerequisite become guarded no-ops with a
//! diagnostic instead of failures. Batch runs rely on that: one caller
//! mistake must not abort the whole run.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{validate_threshold, MapConfig};
use crate::core::columns::{resolve_columns, ResolutionError};
use crate::core::grid::Grid;
use crate::core::loaders::{extract_measurements, load_table, LoaderError, Measurement, TableData};
use crate::core::writers::{normalize_output_extension, write_map_workbook, WriteError};
use crate::visualization::{render_heatmap, RenderError};

/// Errors that can occur while driving a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Lifecycle state of a pipeline. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Created,
    DataExtracted,
    GridBuilt,
    Exported,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Created => write!(f, "created"),
            PipelineState::DataExtracted => write!(f, "data extracted"),
            PipelineState::GridBuilt => write!(f, "grid built"),
            PipelineState::Exported => write!(f, "exported"),
        }
    }
}

/// Outcome of a guarded pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran to completion.
    Completed,
    /// The step was skipped because a prerequisite state was not reached.
    NotReady { required: PipelineState },
}

impl StepOutcome {
    /// Returns true if the step actually ran.
    #[inline]
    pub fn completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

/// Pipeline for building and exporting one hardness map.
#[derive(Debug)]
pub struct MapPipeline {
    input: PathBuf,
    config: MapConfig,
    threshold: Option<f64>,
    state: PipelineState,
    table: Option<TableData>,
    measurements: Vec<Measurement>,
    grid: Option<Grid>,
}

impl MapPipeline {
    /// Create a pipeline for one input file.
    ///
    /// The raw threshold is validated here; an invalid value is reported and
    /// dropped rather than carried along.
    pub fn new<P: Into<PathBuf>>(input: P, config: &MapConfig, threshold: Option<f64>) -> Self {
        Self {
            input: input.into(),
            config: config.clone(),
            threshold: validate_threshold(threshold),
            state: PipelineState::Created,
            table: None,
            measurements: Vec::new(),
            grid: None,
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The validated threshold, if any.
    #[inline]
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// The built grid, if the pipeline has reached that state.
    #[inline]
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Extracted measurements in input row order.
    #[inline]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Load the input file, resolve columns, and extract measurements.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, contains no data, or any of the
    /// three column roles cannot be resolved. These are fatal for this input:
    /// without a complete mapping there is no value to extract.
    pub fn extract(&mut self) -> Result<()> {
        if self.state >= PipelineState::DataExtracted {
            debug!("{}: data already extracted", self.input.display());
            return Ok(());
        }

        let table = load_table(&self.input, self.config.input.delimiter_byte())?;
        let mapping = resolve_columns(&table.headers, &self.config.columns)?;
        let measurements = extract_measurements(&table, &mapping)?;

        info!(
            "{}: extracted {} measurements (columns x={}, y={}, hardness={})",
            self.input.display(),
            measurements.len(),
            mapping.x,
            mapping.y,
            mapping.hardness
        );

        self.table = Some(table);
        self.measurements = measurements;
        self.state = PipelineState::DataExtracted;
        Ok(())
    }

    /// Build the dense grid from the extracted measurements.
    ///
    /// A guarded no-op when extraction has not run yet.
    pub fn build_grid(&mut self) -> StepOutcome {
        if self.state < PipelineState::DataExtracted {
            warn!(
                "{}: cannot build grid before data extraction (state: {})",
                self.input.display(),
                self.state
            );
            return StepOutcome::NotReady {
                required: PipelineState::DataExtracted,
            };
        }

        let grid = Grid::build(&self.measurements);
        let (rows, cols) = grid.shape();
        info!("{}: built {}x{} grid", self.input.display(), rows, cols);

        self.grid = Some(grid);
        self.state = self.state.max(PipelineState::GridBuilt);
        StepOutcome::Completed
    }

    /// Export the (threshold-filtered) grid to an xlsx workbook.
    ///
    /// A guarded no-op when the grid has not been built. Repeatable.
    pub fn export(&mut self, output: &Path) -> Result<StepOutcome> {
        let Some(grid) = self.guarded_grid("export") else {
            return Ok(StepOutcome::NotReady {
                required: PipelineState::GridBuilt,
            });
        };

        let path = normalize_output_extension(output);
        let filtered = grid.filtered(self.threshold);
        let original = if self.config.export.include_original {
            self.table.as_ref()
        } else {
            None
        };

        write_map_workbook(&path, &filtered, original)?;
        info!("{}: wrote workbook {}", self.input.display(), path.display());

        self.state = PipelineState::Exported;
        Ok(StepOutcome::Completed)
    }

    /// Render the (threshold-filtered) grid as a heatmap PNG.
    ///
    /// A guarded no-op when the grid has not been built. Repeatable.
    pub fn render(&mut self, output: &Path) -> Result<StepOutcome> {
        let Some(grid) = self.guarded_grid("render") else {
            return Ok(StepOutcome::NotReady {
                required: PipelineState::GridBuilt,
            });
        };

        let filtered = grid.filtered(self.threshold);
        render_heatmap(output, &filtered, &self.config.render)?;
        info!("{}: wrote heatmap {}", self.input.display(), output.display());

        self.state = PipelineState::Exported;
        Ok(StepOutcome::Completed)
    }

    /// Shared transition guard for the grid-consuming steps.
    fn guarded_grid(&self, step: &str) -> Option<&Grid> {
        if self.state < PipelineState::GridBuilt {
            warn!(
                "{}: cannot {} before the grid is built (state: {})",
                self.input.display(),
                step,
                self.state
            );
            return None;
        }
        self.grid.as_ref()
    }
}
