//! Heatmap rendering for built hardness grids.
//!
//! Renders a grid as a PNG heatmap using the plotters library: one colored
//! rectangle per cell, x-axis values down the image rows and y-axis values
//! across the columns.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::RenderConfig;
use crate::core::grid::Grid;

/// Errors that can occur during rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    Plotting(String),

    #[error("Empty grid")]
    EmptyGrid,
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Map a normalized value in [0, 1] onto a blue-green-red heat gradient.
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        let s = t * 2.0;
        RGBColor(0, (255.0 * s) as u8, (255.0 * (1.0 - s)) as u8)
    } else {
        let s = (t - 0.5) * 2.0;
        RGBColor((255.0 * s) as u8, (255.0 * (1.0 - s)) as u8, 0)
    }
}

/// Color-scale bounds: the configured fixed range, or the observed hardness
/// range. Degenerate ranges are padded so the normalization stays finite.
fn value_bounds(grid: &Grid, config: &RenderConfig) -> (f64, f64) {
    let (mut min, mut max) = config
        .fixed_range()
        .or_else(|| grid.value_range())
        .unwrap_or((0.0, 1.0));

    if (max - min).abs() < f64::EPSILON {
        min -= 1.0;
        max += 1.0;
    }

    (min, max)
}

/// Render a hardness grid as a PNG heatmap.
///
/// Empty cells are drawn at the materialized value 0. Axis tick labels show
/// the coordinate values and are suppressed when the config says so.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `grid` - The grid to render
/// * `config` - Image size, value range, and label settings
pub fn render_heatmap(output_path: &Path, grid: &Grid, config: &RenderConfig) -> Result<()> {
    if grid.is_empty() {
        return Err(RenderError::EmptyGrid);
    }

    let (rows, cols) = grid.shape();
    let (min, max) = value_bounds(grid, config);
    let span = max - min;

    // One rectangle per cell; columns run horizontally, rows vertically.
    let mut cells: Vec<(i32, i32, RGBColor)> = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let t = (grid.value_at(i, j) - min) / span;
            cells.push((j as i32, i as i32, heat_color(t)));
        }
    }

    let root =
        BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| RenderError::Plotting(e.to_string()))?;

    let (x_label_area, y_label_area) = if config.show_axis_labels {
        (40, 60)
    } else {
        (0, 0)
    };

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(x_label_area)
        .y_label_area_size(y_label_area)
        .build_cartesian_2d(0..cols as i32, 0..rows as i32)
        .map_err(|e| RenderError::Plotting(e.to_string()))?;

    if config.show_axis_labels {
        // Horizontal ticks carry y-axis coordinates, vertical ticks x-axis
        // coordinates, matching the grid orientation.
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_label_formatter(&|idx: &i32| {
                grid.y_axis()
                    .get(*idx as usize)
                    .map(|v| format!("{}", v))
                    .unwrap_or_default()
            })
            .y_label_formatter(&|idx: &i32| {
                grid.x_axis()
                    .get(*idx as usize)
                    .map(|v| format!("{}", v))
                    .unwrap_or_default()
            })
            .draw()
            .map_err(|e| RenderError::Plotting(e.to_string()))?;
    }

    chart
        .draw_series(cells.iter().map(|(j, i, color)| {
            Rectangle::new([(*j, *i), (*j + 1, *i + 1)], color.filled())
        }))
        .map_err(|e| RenderError::Plotting(e.to_string()))?;

    root.present()
        .map_err(|e| RenderError::Plotting(e.to_string()))?;

    Ok(())
}
