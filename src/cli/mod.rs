//! Command-line parsing for the `feets` binary.
//!
//! Argument parsing and command dispatch stay separate from the extraction
//! engine; `app` turns these structs into a `FeatureSpace` and runs it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Channel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "feets", version, about = "Feature extraction for astronomical light curves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered extractors with their data, features, dependencies and parameters.
    List(ListArgs),
    /// Extract features from CSV light curves (files or directories of `*.csv`).
    Extract(ExtractArgs),
    /// Run the period search on one light curve and plot it folded.
    Fold(FoldArgs),
    /// Generate synthetic periodic light curves and extract their features.
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Print descriptors as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Feature selection shared by `extract` and `demo`.
#[derive(Debug, Args, Clone, Default)]
pub struct SelectionArgs {
    /// Only compute these features (comma separated).
    #[arg(long, value_delimiter = ',', value_name = "FEATURE")]
    pub only: Vec<String>,

    /// Restrict to these extractors (comma separated).
    #[arg(long, value_delimiter = ',', value_name = "EXTRACTOR")]
    pub extractors: Vec<String>,

    /// Keep only extractors whose required channels are among these.
    #[arg(long, value_enum, value_delimiter = ',', value_name = "CHANNEL")]
    pub data: Vec<Channel>,

    /// JSON file with per-extractor parameter overrides.
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,
}

/// Execution and export options shared by `extract` and `demo`.
#[derive(Debug, Args, Clone, Default)]
pub struct RunArgs {
    /// Process light curves in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Worker threads for `--parallel` (default: rayon's global pool).
    #[arg(long, env = "FEETS_THREADS")]
    pub threads: Option<usize>,

    /// Export results to CSV (vector features flattened to `<name>_<i>`).
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export results to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Do not print the per-light-curve tables.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ExtractArgs {
    /// CSV files or directories.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Args, Clone)]
pub struct FoldArgs {
    /// CSV light curve with `time` and `magnitude` columns.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON file with parameter overrides (the `LombScargle` entry is used).
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,

    /// Also plot the periodogram.
    #[arg(long)]
    pub periodogram: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of synthetic light curves.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: usize,

    /// Observations per light curve.
    #[arg(long, default_value_t = 200)]
    pub points: usize,

    /// Observation window (days).
    #[arg(long, default_value_t = 100.0)]
    pub baseline: f64,

    /// Minimum true period (days).
    #[arg(long, default_value_t = 0.5)]
    pub period_min: f64,

    /// Maximum true period (days).
    #[arg(long, default_value_t = 20.0)]
    pub period_max: f64,

    /// Photometric noise (mag).
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_extract_selection() {
        let cli = Cli::parse_from([
            "feets",
            "extract",
            "a.csv",
            "dir",
            "--only",
            "PeriodLS,Psi_eta",
            "--data",
            "time,magnitude",
            "--parallel",
            "--threads",
            "4",
        ]);
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.inputs, vec![PathBuf::from("a.csv"), PathBuf::from("dir")]);
        assert_eq!(args.selection.only, vec!["PeriodLS", "Psi_eta"]);
        assert_eq!(args.selection.data, vec![Channel::Time, Channel::Magnitude]);
        assert!(args.run.parallel);
        assert_eq!(args.run.threads, Some(4));
    }

    #[test]
    fn demo_defaults() {
        let cli = Cli::parse_from(["feets", "demo"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.count, 5);
        assert!(args.selection.only.is_empty());
    }
}
