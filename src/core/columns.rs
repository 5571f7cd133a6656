//! Column resolution for instrument export headers.
//!
//! The exports carry a fixed column layout in theory, but instrument firmware
//! revisions shuffle columns around. Resolution therefore probes the default
//! index for each role first and falls back to scanning the whole header for
//! the role's marker substring.

use std::fmt;

use log::{info, warn};
use thiserror::Error;

use crate::config::ColumnConfig;

/// Semantic role of a column in the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    X,
    Y,
    Hardness,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::X => write!(f, "x"),
            ColumnRole::Y => write!(f, "y"),
            ColumnRole::Hardness => write!(f, "hardness"),
        }
    }
}

/// Errors that can occur during column resolution.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// One or more roles matched no column label anywhere in the header.
    #[error("unresolved column role(s): {}", format_roles(.roles))]
    Unresolved { roles: Vec<ColumnRole> },
}

fn format_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolved column indices for the three measurement roles.
///
/// Indices are into the header's label sequence and are immutable after
/// resolution. The same index may back more than one role; that is legal but
/// unusual input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Index of the x-coordinate column.
    pub x: usize,
    /// Index of the y-coordinate column.
    pub y: usize,
    /// Index of the hardness value column.
    pub hardness: usize,
}

/// Resolve a single role: probe the default index, then scan for the first
/// label containing the marker. Matching is case-sensitive substring
/// containment; the earliest matching index wins.
fn resolve_role(
    headers: &[String],
    default_index: usize,
    marker: &str,
    role: ColumnRole,
) -> Option<usize> {
    if let Some(label) = headers.get(default_index) {
        if label.contains(marker) {
            return Some(default_index);
        }
    }

    match headers.iter().position(|label| label.contains(marker)) {
        Some(index) => {
            info!(
                "{} column not at default index {}; using column {} ('{}')",
                role, default_index, index, headers[index]
            );
            Some(index)
        }
        None => {
            warn!("no column label contains marker '{}' for role {}", marker, role);
            None
        }
    }
}

/// Resolve the x, y, and hardness columns from a header.
///
/// # Errors
///
/// Fails if any role matches no label; the error lists every unresolved role
/// so the diagnostic names the whole problem at once.
pub fn resolve_columns(
    headers: &[String],
    config: &ColumnConfig,
) -> Result<ColumnMapping, ResolutionError> {
    let x = resolve_role(headers, config.x_default, &config.x_marker, ColumnRole::X);
    let y = resolve_role(headers, config.y_default, &config.y_marker, ColumnRole::Y);
    let hardness = resolve_role(
        headers,
        config.hardness_default,
        &config.hardness_marker,
        ColumnRole::Hardness,
    );

    let mut unresolved = Vec::new();
    if x.is_none() {
        unresolved.push(ColumnRole::X);
    }
    if y.is_none() {
        unresolved.push(ColumnRole::Y);
    }
    if hardness.is_none() {
        unresolved.push(ColumnRole::Hardness);
    }

    match (x, y, hardness) {
        (Some(x), Some(y), Some(hardness)) => Ok(ColumnMapping { x, y, hardness }),
        _ => Err(ResolutionError::Unresolved { roles: unresolved }),
    }
}
