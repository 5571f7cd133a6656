//! Configuration types for the hardness map pipeline.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for resolving x, y, and hardness columns from a header row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Substring marker identifying the x-coordinate column
    #[serde(default = "default_x_marker")]
    pub x_marker: String,

    /// Substring marker identifying the y-coordinate column
    #[serde(default = "default_y_marker")]
    pub y_marker: String,

    /// Substring marker identifying the hardness value column
    #[serde(default = "default_hardness_marker")]
    pub hardness_marker: String,

    /// Default 0-based index of the x column
    #[serde(default = "default_x_index")]
    pub x_default: usize,

    /// Default 0-based index of the y column
    #[serde(default = "default_y_index")]
    pub y_default: usize,

    /// Default 0-based index of the hardness column
    #[serde(default = "default_hardness_index")]
    pub hardness_default: usize,
}

fn default_x_marker() -> String {
    "XAbs".to_string()
}

fn default_y_marker() -> String {
    "YAbs".to_string()
}

fn default_hardness_marker() -> String {
    "Hardness".to_string()
}

fn default_x_index() -> usize {
    5
}

fn default_y_index() -> usize {
    6
}

fn default_hardness_index() -> usize {
    9
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            x_marker: default_x_marker(),
            y_marker: default_y_marker(),
            hardness_marker: default_hardness_marker(),
            x_default: default_x_index(),
            y_default: default_y_index(),
            hardness_default: default_hardness_index(),
        }
    }
}

/// Configuration for reading instrument export files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter in the input files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// File extensions recognized as input files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_delimiter() -> char {
    '\t'
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string(), "txt".to_string()]
}

impl InputConfig {
    /// Returns the delimiter as a single byte for the CSV reader.
    ///
    /// The reader splits on bytes, so a non-ASCII delimiter cannot be
    /// honored; it is reported and replaced by the default tab.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            warn!(
                "delimiter {:?} is not a single-byte character; using tab",
                self.delimiter
            );
            b'\t'
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            extensions: default_extensions(),
        }
    }
}

/// Configuration for heatmap rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Fixed lower bound of the color scale (observed minimum if unset)
    #[serde(default)]
    pub value_min: Option<f64>,

    /// Fixed upper bound of the color scale (observed maximum if unset)
    #[serde(default)]
    pub value_max: Option<f64>,

    /// Draw axis tick labels with the coordinate values
    #[serde(default = "default_show_axis_labels")]
    pub show_axis_labels: bool,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    960
}

fn default_show_axis_labels() -> bool {
    true
}

impl RenderConfig {
    /// Returns the configured fixed value range if both bounds are set.
    pub fn fixed_range(&self) -> Option<(f64, f64)> {
        match (self.value_min, self.value_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            value_min: None,
            value_max: None,
            show_axis_labels: default_show_axis_labels(),
        }
    }
}

/// Configuration for output files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Default output directory name, resolved relative to the input
    /// directory's parent when no output directory is given
    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,

    /// Write the "Original" sheet with the raw input rows
    #[serde(default = "default_include_original")]
    pub include_original: bool,
}

fn default_output_dir_name() -> String {
    "hardness_maps".to_string()
}

fn default_include_original() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir_name: default_output_dir_name(),
            include_original: default_include_original(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub columns: ColumnConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl MapConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: MapConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Validate a threshold value, coercing invalid configuration to "no threshold".
///
/// A usable threshold must be a positive integer. Anything else is reported
/// as a warning and treated as if no threshold were configured.
pub fn validate_threshold(raw: Option<f64>) -> Option<f64> {
    match raw {
        None => None,
        Some(t) if t > 0.0 && t.fract() == 0.0 => Some(t),
        Some(t) => {
            warn!(
                "invalid threshold {} (must be a positive integer); ignoring",
                t
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_column_config() {
        let config = ColumnConfig::default();
        assert_eq!(config.x_marker, "XAbs");
        assert_eq!(config.y_marker, "YAbs");
        assert_eq!(config.hardness_marker, "Hardness");
        assert_eq!(config.x_default, 5);
        assert_eq!(config.y_default, 6);
        assert_eq!(config.hardness_default, 9);
    }

    #[test]
    fn test_default_map_config() {
        let config = MapConfig::default();
        assert_eq!(config.input.delimiter, '\t');
        assert_eq!(config.export.output_dir_name, "hardness_maps");
        assert!(config.render.fixed_range().is_none());
    }

    #[test]
    fn test_delimiter_byte_rejects_non_ascii() {
        let mut input = InputConfig::default();
        assert_eq!(input.delimiter_byte(), b'\t');

        input.delimiter = ';';
        assert_eq!(input.delimiter_byte(), b';');

        // '；' (fullwidth semicolon) would truncate to a wrong byte.
        input.delimiter = '\u{FF1B}';
        assert_eq!(input.delimiter_byte(), b'\t');
    }

    #[test]
    fn test_validate_threshold_accepts_positive_integer() {
        assert_eq!(validate_threshold(Some(200.0)), Some(200.0));
        assert_eq!(validate_threshold(Some(1.0)), Some(1.0));
    }

    #[test]
    fn test_validate_threshold_rejects_invalid() {
        assert_eq!(validate_threshold(None), None);
        assert_eq!(validate_threshold(Some(0.0)), None);
        assert_eq!(validate_threshold(Some(-5.0)), None);
        assert_eq!(validate_threshold(Some(12.5)), None);
    }

    #[test]
    fn test_fixed_range_requires_both_bounds() {
        let mut render = RenderConfig::default();
        render.value_min = Some(100.0);
        assert!(render.fixed_range().is_none());

        render.value_max = Some(400.0);
        assert_eq!(render.fixed_range(), Some((100.0, 400.0)));
    }
}
