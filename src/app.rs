//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up the environment and logging; this module is the
//! "real main" that:
//! - parses CLI arguments
//! - loads or generates light curves
//! - builds the feature space and runs extraction
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DemoArgs, ExtractArgs, FoldArgs, ListArgs};
use crate::data::{SyntheticConfig, generate_periodic};
use crate::error::AppError;
use crate::registry::Registry;

pub mod pipeline;

/// Entry point for the `feets` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::List(args) => handle_list(args),
        Command::Extract(args) => handle_extract(args),
        Command::Fold(args) => handle_fold(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_list(args: ListArgs) -> Result<(), AppError> {
    let descriptors = Registry::with_builtins().descriptors();
    if args.json {
        let json = serde_json::to_string_pretty(&descriptors)
            .map_err(|e| AppError::new(2, format!("Failed to serialize descriptors: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", crate::report::format_descriptors(&descriptors));
    }
    Ok(())
}

fn handle_extract(args: ExtractArgs) -> Result<(), AppError> {
    // Configuration errors surface before any file is read.
    let space = pipeline::build_space(&args.selection, &args.run)?;
    let curves = crate::io::load_light_curves(&args.inputs)?;
    info!(count = curves.len(), "loaded light curves");

    let out = pipeline::run_batch(&space, &curves, &args.run)?;
    if !args.run.quiet {
        print!("{}", crate::report::format_batch(&out.ids, &out.batch));
    }
    Ok(())
}

fn handle_fold(args: FoldArgs) -> Result<(), AppError> {
    let overrides = pipeline::load_overrides(args.params.as_deref())?;
    let light_curve = crate::io::load_light_curve(&args.input)?;
    let out = pipeline::fold_light_curve(&light_curve, &overrides)?;

    let id = light_curve.id().unwrap_or("light curve");
    println!("{}", crate::report::format_fold_summary(id, &out.folded, &out.features));

    let phase: Vec<f64> = out.folded.order.iter().map(|&i| out.folded.phase[i]).collect();
    println!(
        "{}",
        crate::plot::render_folded_plot(&phase, &out.folded.folded, args.width, args.height)
    );
    if args.periodogram {
        println!(
            "{}",
            crate::plot::render_periodogram(&out.folded.periodogram, args.width, args.height)
        );
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let space = pipeline::build_space(&args.selection, &args.run)?;
    let config = SyntheticConfig {
        count: args.count,
        points: args.points,
        baseline: args.baseline,
        period_min: args.period_min,
        period_max: args.period_max,
        noise: args.noise,
        seed: args.seed,
        ..SyntheticConfig::default()
    };
    let synthetic = generate_periodic(&config)?;
    let curves: Vec<_> = synthetic.iter().map(|s| s.light_curve.clone()).collect();

    let out = pipeline::run_batch(&space, &curves, &args.run)?;
    if !args.run.quiet {
        print!("{}", crate::report::format_batch(&out.ids, &out.batch));
    }

    println!("True periods:");
    for (curve, id) in synthetic.iter().zip(&out.ids) {
        println!("  {id:<16} P={:.6} A={:.3}", curve.period, curve.amplitude);
    }
    Ok(())
}
