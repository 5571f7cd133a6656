//! Batch orchestration over a directory of instrument exports.
//!
//! Validates the input and output directories up front (fail-fast at the
//! boundary), then drives one [`MapPipeline`] per eligible file. Files are
//! fully independent, so they are processed in parallel; a failure in one
//! file is reported and skipped without stopping the batch.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::MapConfig;
use crate::pipeline::MapPipeline;

/// Errors that abort a batch before any file is processed.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    #[error("No eligible input files in {0}")]
    NoEligibleFiles(PathBuf),

    #[error("Failed to read input directory '{path}': {source}")]
    ReadInputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Which outputs to produce per file.
#[derive(Debug, Clone, Copy)]
pub struct ExportFlags {
    /// Write the xlsx workbook.
    pub spreadsheet: bool,
    /// Render the heatmap PNG.
    pub image: bool,
}

impl Default for ExportFlags {
    fn default() -> Self {
        Self {
            spreadsheet: true,
            image: false,
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files whose pipeline completed.
    pub processed: Vec<PathBuf>,
    /// Files skipped after a per-file failure, with the reported cause.
    pub skipped: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Number of files whose pipeline completed.
    pub fn num_processed(&self) -> usize {
        self.processed.len()
    }

    /// Number of files skipped after a failure.
    pub fn num_skipped(&self) -> usize {
        self.skipped.len()
    }
}

/// Collect eligible input files in a directory, sorted by path.
///
/// Eligibility is by file extension, compared case-insensitively.
///
/// # Errors
///
/// Returns an error if the directory itself cannot be read, so permission
/// problems are not mistaken for an empty directory.
pub fn eligible_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| BatchError::ReadInputDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Resolve the output directory.
///
/// An absolute path is used as-is; a relative one is resolved against the
/// input directory's parent, so batch outputs land beside the input folder
/// rather than inside it.
pub fn resolve_output_dir(input_dir: &Path, output_dir: &Path) -> PathBuf {
    if output_dir.is_absolute() {
        output_dir.to_path_buf()
    } else {
        input_dir
            .parent()
            .unwrap_or(input_dir)
            .join(output_dir)
    }
}

/// Run one pipeline end to end for a single file.
fn process_file(
    input: &Path,
    output_dir: &Path,
    threshold: Option<f64>,
    flags: ExportFlags,
    config: &MapConfig,
) -> std::result::Result<(), String> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "map".to_string());

    let mut pipeline = MapPipeline::new(input, config, threshold);
    pipeline.extract().map_err(|e| e.to_string())?;
    pipeline.build_grid();

    if flags.spreadsheet {
        let path = output_dir.join(format!("{}_map.xlsx", stem));
        pipeline.export(&path).map_err(|e| e.to_string())?;
    }

    if flags.image {
        let path = output_dir.join(format!("{}_map.png", stem));
        pipeline.render(&path).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Process every eligible file in a directory.
///
/// Directory-level problems (missing input directory, no eligible files,
/// output directory creation failure) abort the batch before any file is
/// touched. Per-file failures are reported, recorded in the summary, and do
/// not stop the remaining files.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    threshold: Option<f64>,
    flags: ExportFlags,
    config: &MapConfig,
) -> Result<BatchSummary> {
    if !input_dir.is_dir() {
        return Err(BatchError::InputDirNotFound(input_dir.to_path_buf()));
    }

    let files = eligible_files(input_dir, &config.input.extensions)?;
    if files.is_empty() {
        return Err(BatchError::NoEligibleFiles(input_dir.to_path_buf()));
    }

    let resolved_output = resolve_output_dir(input_dir, output_dir);
    fs::create_dir_all(&resolved_output).map_err(|e| BatchError::CreateOutputDir {
        path: resolved_output.clone(),
        source: e,
    })?;

    info!(
        "processing {} file(s) from {} into {}",
        files.len(),
        input_dir.display(),
        resolved_output.display()
    );

    let results: Vec<(PathBuf, std::result::Result<(), String>)> = files
        .par_iter()
        .map(|path| {
            let result = process_file(path, &resolved_output, threshold, flags, config);
            (path.clone(), result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (path, result) in results {
        match result {
            Ok(()) => {
                info!("processed {}", path.display());
                summary.processed.push(path);
            }
            Err(cause) => {
                error!("skipping {}: {}", path.display(), cause);
                summary.skipped.push((path, cause));
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_valid_input(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            "Specimen\tRow\tTestPoint\tLens\tXAbs\tYAbs\tDx\tDy\tDiag\tHardness"
        )
        .unwrap();
        writeln!(file, "S1\t1\t1\t10x\t0\t0\t1\t1\t2\t200").unwrap();
        writeln!(file, "S1\t1\t2\t10x\t1\t0\t1\t1\t2\t190").unwrap();
        path
    }

    fn write_headerless_input(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        // No hardness-marker column anywhere.
        writeln!(file, "XAbs\tYAbs\tSomethingElse").unwrap();
        writeln!(file, "0\t0\t200").unwrap();
        path
    }

    #[test]
    fn test_run_batch_isolates_per_file_failures() {
        let root = TempDir::new().unwrap();
        let input_dir = root.path().join("input");
        fs::create_dir_all(&input_dir).unwrap();

        write_valid_input(&input_dir, "good.csv");
        write_headerless_input(&input_dir, "bad.csv");

        let config = MapConfig::default();
        let output_dir = root.path().join("output");
        let summary = run_batch(
            &input_dir,
            &output_dir,
            None,
            ExportFlags::default(),
            &config,
        )
        .unwrap();

        assert_eq!(summary.num_processed(), 1);
        assert_eq!(summary.num_skipped(), 1);
        assert!(summary.processed[0].ends_with("good.csv"));
        assert!(summary.skipped[0].0.ends_with("bad.csv"));
        assert!(output_dir.join("good_map.xlsx").exists());
        assert!(!output_dir.join("bad_map.xlsx").exists());
    }

    #[test]
    fn test_run_batch_missing_input_dir() {
        let root = TempDir::new().unwrap();
        let config = MapConfig::default();

        let result = run_batch(
            &root.path().join("nope"),
            &root.path().join("out"),
            None,
            ExportFlags::default(),
            &config,
        );

        assert!(matches!(result, Err(BatchError::InputDirNotFound(_))));
    }

    #[test]
    fn test_run_batch_no_eligible_files() {
        let root = TempDir::new().unwrap();
        let input_dir = root.path().join("input");
        fs::create_dir_all(&input_dir).unwrap();
        fs::write(input_dir.join("notes.dat"), "irrelevant").unwrap();

        let config = MapConfig::default();
        let result = run_batch(
            &input_dir,
            &root.path().join("out"),
            None,
            ExportFlags::default(),
            &config,
        );

        assert!(matches!(result, Err(BatchError::NoEligibleFiles(_))));
    }

    #[test]
    fn test_eligible_files_filters_by_extension() {
        let dir = TempDir::new().unwrap();
        write_valid_input(dir.path(), "b.csv");
        write_valid_input(dir.path(), "a.CSV");
        write_valid_input(dir.path(), "c.txt");
        fs::write(dir.path().join("skip.dat"), "x").unwrap();

        let extensions = vec!["csv".to_string(), "txt".to_string()];
        let files = eligible_files(dir.path(), &extensions).unwrap();

        assert_eq!(files.len(), 3);
        // Sorted by path.
        assert!(files[0].ends_with("a.CSV"));
    }

    #[test]
    fn test_eligible_files_reports_unreadable_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");

        let extensions = vec!["csv".to_string()];
        let result = eligible_files(&missing, &extensions);

        assert!(matches!(result, Err(BatchError::ReadInputDir { .. })));
    }

    #[test]
    fn test_resolve_output_dir() {
        let absolute = Path::new("/tmp/out");
        assert_eq!(
            resolve_output_dir(Path::new("/data/input"), absolute),
            PathBuf::from("/tmp/out")
        );

        // Relative paths land beside the input directory.
        assert_eq!(
            resolve_output_dir(Path::new("/data/input"), Path::new("hardness_maps")),
            PathBuf::from("/data/hardness_maps")
        );
    }

    #[test]
    fn test_run_batch_applies_threshold() {
        let root = TempDir::new().unwrap();
        let input_dir = root.path().join("input");
        fs::create_dir_all(&input_dir).unwrap();
        write_valid_input(&input_dir, "good.csv");

        let config = MapConfig::default();
        let output_dir = root.path().join("output");
        let summary = run_batch(
            &input_dir,
            &output_dir,
            Some(200.0),
            ExportFlags::default(),
            &config,
        )
        .unwrap();

        assert_eq!(summary.num_processed(), 1);
        assert!(output_dir.join("good_map.xlsx").exists());
    }
}
