//! Shared extraction workflow used by the `extract`, `fold` and `demo` commands.
//!
//! selection args -> feature space -> batch extraction -> exports
//!
//! The command handlers only deal with where light curves come from and how
//! results are printed.

use std::path::Path;

use tracing::info;

use crate::cli::{RunArgs, SelectionArgs};
use crate::domain::{LightCurve, ParamOverrides};
use crate::error::{AppError, ConfigError};
use crate::extractors::lomb_scargle::{FoldedCurve, fold_features};
use crate::extractors::{Extractor, LombScargle};
use crate::io::{load_param_overrides, write_features_csv, write_features_json};
use crate::space::{BatchResult, ExecutionStrategy, FeatureResult, FeatureSpace};

/// Outputs of one batch run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub ids: Vec<String>,
    pub batch: BatchResult,
}

pub fn strategy_from(run: &RunArgs) -> ExecutionStrategy {
    if run.parallel {
        ExecutionStrategy::Parallel { threads: run.threads }
    } else {
        ExecutionStrategy::Sequential
    }
}

pub fn load_overrides(path: Option<&Path>) -> Result<ParamOverrides, AppError> {
    match path {
        Some(path) => load_param_overrides(path),
        None => Ok(ParamOverrides::new()),
    }
}

/// Build (and validate) the feature space described by the CLI flags.
pub fn build_space(selection: &SelectionArgs, run: &RunArgs) -> Result<FeatureSpace, AppError> {
    let mut builder = FeatureSpace::builder()
        .params(load_overrides(selection.params.as_deref())?)
        .strategy(strategy_from(run));
    if !selection.only.is_empty() {
        builder = builder.only(selection.only.iter().cloned());
    }
    if !selection.extractors.is_empty() {
        builder = builder.extractors(selection.extractors.iter().cloned());
    }
    if !selection.data.is_empty() {
        builder = builder.data(selection.data.iter().copied());
    }
    Ok(builder.build()?)
}

/// Extract every light curve and write the requested exports.
pub fn run_batch(space: &FeatureSpace, curves: &[LightCurve], run: &RunArgs) -> Result<BatchOutput, AppError> {
    let ids: Vec<String> = curves
        .iter()
        .enumerate()
        .map(|(i, lc)| lc.id().map(str::to_string).unwrap_or_else(|| format!("#{i}")))
        .collect();

    info!(
        light_curves = curves.len(),
        extractors = space.plan().len(),
        strategy = ?space.strategy(),
        "extracting"
    );
    let batch = space.extract(curves)?;

    if let Some(path) = &run.export_csv {
        write_features_csv(path, &ids, &batch)?;
        info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &run.export_json {
        write_features_json(path, &ids, &batch)?;
        info!(path = %path.display(), "wrote JSON export");
    }

    Ok(BatchOutput { ids, batch })
}

/// Outputs of the `fold` command.
#[derive(Debug, Clone)]
pub struct FoldOutput {
    pub folded: FoldedCurve,
    pub features: FeatureResult,
}

/// Period search plus the period/fold features for one light curve.
pub fn fold_light_curve(light_curve: &LightCurve, overrides: &ParamOverrides) -> Result<FoldOutput, AppError> {
    let extractor = LombScargle::new();
    let mut params = extractor.params();
    if let Some(custom) = overrides.get(extractor.id().as_str()) {
        for (name, value) in custom.iter() {
            if !params.contains(name) {
                return Err(ConfigError::UnknownParam {
                    extractor: extractor.id().to_string(),
                    param: name.to_string(),
                }
                .into());
            }
            params.insert(name, value.clone());
        }
    }
    extractor.validate_params(&params)?;

    let folded = extractor.search(light_curve, &params)?;
    let map = fold_features(&folded)?;
    let names: Vec<&'static str> = extractor.features().to_vec();
    let values = names.iter().filter_map(|n| map.get(n).cloned()).collect();
    Ok(FoldOutput {
        folded,
        features: FeatureResult { names, values },
    })
}
