//! Command-line interface for the hardness map pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::batch::{self, ExportFlags};
use crate::config::MapConfig;
use crate::pipeline::MapPipeline;

#[derive(Parser)]
#[command(name = "hardness-map")]
#[command(about = "Hardness map builder for indentation-test exports", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a hardness map from a single export file
    Map {
        /// Input export file
        input: PathBuf,
        /// Output directory (defaults to the input file's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Zero out grid cells at or below this value
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Write the xlsx workbook
        #[arg(long, default_value_t = true)]
        xlsx: bool,
        /// Render the heatmap PNG
        #[arg(long, default_value_t = false)]
        png: bool,
    },

    /// Build hardness maps for every export file in a directory
    Batch {
        /// Directory containing export files
        input_dir: PathBuf,
        /// Output directory (relative paths resolve against the input
        /// directory's parent; defaults to the configured directory name)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Zero out grid cells at or below this value
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Write the xlsx workbook per file
        #[arg(long, default_value_t = true)]
        xlsx: bool,
        /// Render the heatmap PNG per file
        #[arg(long, default_value_t = false)]
        png: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.len() > 39 {
            format!("{}...", &value[..36])
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match MapConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                MapConfig::default()
            }
        },
        None => MapConfig::default(),
    };

    match cli.command {
        Commands::Map {
            input,
            output_dir,
            threshold,
            xlsx,
            png,
        } => {
            cmd_map(&input, output_dir, threshold, xlsx, png, &config);
        }
        Commands::Batch {
            input_dir,
            output_dir,
            threshold,
            xlsx,
            png,
        } => {
            cmd_batch(&input_dir, output_dir, threshold, xlsx, png, &config);
        }
    }
}

fn cmd_map(
    input: &Path,
    output_dir: Option<PathBuf>,
    threshold: Option<f64>,
    xlsx: bool,
    png: bool,
    config: &MapConfig,
) {
    let start = Instant::now();

    let output_dir = output_dir.unwrap_or_else(|| {
        input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "map".to_string());

    println!("Building hardness map...");
    println!("Input: {}", input.display());
    println!("Output directory: {}", output_dir.display());

    let spinner = create_spinner("Extracting measurements...");

    let mut pipeline = MapPipeline::new(input, config, threshold);

    if let Err(e) = pipeline.extract() {
        spinner.finish_and_clear();
        error!("Extraction failed for {}: {}", input.display(), e);
        std::process::exit(1);
    }

    spinner.set_message("Building grid...");
    pipeline.build_grid();

    let (rows, cols) = pipeline
        .grid()
        .map(|g| g.shape())
        .unwrap_or((0, 0));

    let mut outputs: Vec<String> = Vec::new();

    if xlsx {
        let path = output_dir.join(format!("{}_map.xlsx", stem));
        spinner.set_message("Writing workbook...");
        match pipeline.export(&path) {
            Ok(_) => outputs.push(path.display().to_string()),
            Err(e) => {
                spinner.finish_and_clear();
                error!("Workbook export failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    if png {
        let path = output_dir.join(format!("{}_map.png", stem));
        spinner.set_message("Rendering heatmap...");
        match pipeline.render(&path) {
            Ok(_) => outputs.push(path.display().to_string()),
            Err(e) => {
                spinner.finish_and_clear();
                error!("Heatmap rendering failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    spinner.finish_and_clear();

    print_summary(
        "Hardness Map Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Measurements", pipeline.measurements().len().to_string()),
            ("Grid shape", format!("{} x {}", rows, cols)),
            (
                "Threshold",
                pipeline
                    .threshold()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            ("Outputs", outputs.join(", ")),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: Option<PathBuf>,
    threshold: Option<f64>,
    xlsx: bool,
    png: bool,
    config: &MapConfig,
) {
    let start = Instant::now();

    let output_dir =
        output_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_dir_name));
    let flags = ExportFlags {
        spreadsheet: xlsx,
        image: png,
    };

    println!("Processing export files in batch mode...");
    println!("Input directory: {}", input_dir.display());
    println!("Output directory: {}", output_dir.display());

    let spinner = create_spinner("Processing files...");

    match batch::run_batch(input_dir, &output_dir, threshold, flags, config) {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Batch Complete",
                &[
                    ("Input directory", input_dir.display().to_string()),
                    ("Output directory", output_dir.display().to_string()),
                    ("Files processed", summary.num_processed().to_string()),
                    ("Files skipped", summary.num_skipped().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Batch run failed: {}", e);
            std::process::exit(1);
        }
    }
}
