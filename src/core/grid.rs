//! Dense grid construction from scattered measurements.
//!
//! Scattered (x, y, hardness) triples are mapped onto a dense matrix whose
//! rows and columns are the sorted, deduplicated x and y coordinate values.
//! Cells carry `Option<f64>` internally so a measured hardness of exactly 0
//! stays distinguishable from "no measurement here"; zeros are materialized
//! only at the export and render boundaries.

use std::collections::HashMap;

use super::loaders::Measurement;

/// Dense hardness grid over sorted coordinate axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    x_axis: Vec<f64>,
    y_axis: Vec<f64>,
    /// Row-major cells, shape |x_axis| x |y_axis|.
    cells: Vec<Option<f64>>,
}

/// Coordinate equality is exact floating-point equality, so axis lookups key
/// on the raw bit pattern. `-0.0` is folded into `0.0` to keep bit keying
/// consistent with `==`.
fn coord_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Build a sorted, strictly increasing axis from observed coordinate values.
fn build_axis(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut axis: Vec<f64> = values.collect();
    axis.sort_by(f64::total_cmp);
    axis.dedup_by(|a, b| a == b);
    axis
}

fn axis_index(axis: &[f64]) -> HashMap<u64, usize> {
    axis.iter()
        .enumerate()
        .map(|(i, &v)| (coord_key(v), i))
        .collect()
}

impl Grid {
    /// Build a grid from scattered measurements.
    ///
    /// Axes are the sorted unique x and y values; each measurement is placed
    /// at its exact axis position. When several measurements share the same
    /// (x, y) pair, the last one in input order wins. No tolerance is applied
    /// to coordinate comparison: values differing by floating-point noise
    /// become distinct axis entries.
    pub fn build(measurements: &[Measurement]) -> Self {
        let x_axis = build_axis(measurements.iter().map(|m| m.x));
        let y_axis = build_axis(measurements.iter().map(|m| m.y));

        let x_index = axis_index(&x_axis);
        let y_index = axis_index(&y_axis);

        let num_cols = y_axis.len();
        let mut cells = vec![None; x_axis.len() * num_cols];

        for m in measurements {
            // Lookups cannot miss: the axes were built from these values.
            if let (Some(&i), Some(&j)) =
                (x_index.get(&coord_key(m.x)), y_index.get(&coord_key(m.y)))
            {
                cells[i * num_cols + j] = Some(m.hardness);
            }
        }

        Self {
            x_axis,
            y_axis,
            cells,
        }
    }

    /// Sorted unique x coordinates (grid rows).
    #[inline]
    pub fn x_axis(&self) -> &[f64] {
        &self.x_axis
    }

    /// Sorted unique y coordinates (grid columns).
    #[inline]
    pub fn y_axis(&self) -> &[f64] {
        &self.y_axis
    }

    /// Grid shape as (rows, columns).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.x_axis.len(), self.y_axis.len())
    }

    /// Returns true if the grid holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Measured value at (row, column), or `None` if no measurement landed
    /// there.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.y_axis.len() + col]
    }

    /// Materialized value at (row, column): the measured hardness, or 0 for
    /// an empty cell.
    #[inline]
    pub fn value_at(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col).unwrap_or(0.0)
    }

    /// One grid row with empty cells materialized as zeros.
    pub fn row_values(&self, row: usize) -> Vec<f64> {
        (0..self.y_axis.len()).map(|j| self.value_at(row, j)).collect()
    }

    /// Observed (min, max) over measured cells, or `None` if nothing was
    /// measured.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for v in self.cells.iter().flatten() {
            range = Some(match range {
                None => (*v, *v),
                Some((min, max)) => (min.min(*v), max.max(*v)),
            });
        }
        range
    }

    /// Derive a threshold-filtered grid.
    ///
    /// With no threshold this is the identity. Otherwise cells strictly
    /// greater than the threshold are kept and everything else is suppressed
    /// (a cell exactly equal to the threshold is zeroed). The receiver is
    /// never mutated.
    pub fn filtered(&self, threshold: Option<f64>) -> Grid {
        let Some(t) = threshold else {
            return self.clone();
        };

        let cells = self
            .cells
            .iter()
            .map(|cell| cell.filter(|&v| v > t))
            .collect();

        Grid {
            x_axis: self.x_axis.clone(),
            y_axis: self.y_axis.clone(),
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(x: f64, y: f64, hardness: f64) -> Measurement {
        Measurement { x, y, hardness }
    }

    fn reference_grid() -> Grid {
        Grid::build(&[m(0.0, 0.0, 200.0), m(0.0, 1.0, 210.0), m(1.0, 0.0, 190.0)])
    }

    #[test]
    fn test_build_reference_scenario() {
        let grid = reference_grid();

        assert_eq!(grid.x_axis(), &[0.0, 1.0]);
        assert_eq!(grid.y_axis(), &[0.0, 1.0]);
        assert_eq!(grid.shape(), (2, 2));

        assert_eq!(grid.row_values(0), vec![200.0, 210.0]);
        assert_eq!(grid.row_values(1), vec![190.0, 0.0]);
    }

    #[test]
    fn test_axes_strictly_increasing_without_duplicates() {
        let grid = Grid::build(&[
            m(3.0, 7.0, 1.0),
            m(1.0, 5.0, 2.0),
            m(3.0, 5.0, 3.0),
            m(2.0, 7.0, 4.0),
        ]);

        for axis in [grid.x_axis(), grid.y_axis()] {
            for pair in axis.windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
        assert_eq!(grid.shape(), (3, 2));
    }

    #[test]
    fn test_missing_cells_distinguish_from_measured_zero() {
        let grid = Grid::build(&[m(0.0, 0.0, 0.0), m(1.0, 1.0, 5.0)]);

        // Measured zero at (0, 0), nothing at (0, 1).
        assert_eq!(grid.cell(0, 0), Some(0.0));
        assert_eq!(grid.cell(0, 1), None);

        // Both materialize as 0 at the export boundary.
        assert_eq!(grid.value_at(0, 0), 0.0);
        assert_eq!(grid.value_at(0, 1), 0.0);
    }

    #[test]
    fn test_duplicate_coordinates_last_write_wins() {
        let grid = Grid::build(&[m(0.0, 0.0, 100.0), m(0.0, 0.0, 250.0)]);
        assert_eq!(grid.cell(0, 0), Some(250.0));
    }

    #[test]
    fn test_negative_zero_coordinates_collapse() {
        let grid = Grid::build(&[m(-0.0, 0.0, 7.0), m(0.0, -0.0, 9.0)]);
        assert_eq!(grid.shape(), (1, 1));
        assert_eq!(grid.cell(0, 0), Some(9.0));
    }

    #[test]
    fn test_filter_none_is_identity() {
        let grid = reference_grid();
        assert_eq!(grid.filtered(None), grid);
    }

    #[test]
    fn test_filter_is_strictly_greater_than() {
        let grid = reference_grid();
        let filtered = grid.filtered(Some(200.0));

        // 200 is zeroed (not strictly greater), 210 survives.
        assert_eq!(filtered.row_values(0), vec![0.0, 210.0]);
        assert_eq!(filtered.row_values(1), vec![0.0, 0.0]);

        // The source grid is untouched.
        assert_eq!(grid.row_values(0), vec![200.0, 210.0]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let grid = reference_grid();
        let once = grid.filtered(Some(200.0));
        let twice = once.filtered(Some(200.0));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_value_range_over_measured_cells_only() {
        let grid = reference_grid();
        assert_eq!(grid.value_range(), Some((190.0, 210.0)));

        let empty = Grid::build(&[]);
        assert_eq!(empty.value_range(), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_cell_count_is_axis_product() {
        let grid = Grid::build(&[m(0.5, 2.0, 1.0), m(1.5, 2.0, 2.0), m(0.5, 4.0, 3.0)]);
        let (rows, cols) = grid.shape();
        assert_eq!(rows * cols, grid.cells.len());
    }
}
