//! The feature space: a validated selection of extractors plus the plan to run them.
//!
//! A `FeatureSpace` is built once (all configuration errors surface in
//! [`FeatureSpaceBuilder::build`]) and then applied to any number of light
//! curves. Within one light curve extractors run strictly in plan order and
//! each sees only the outputs of its declared dependencies. Across light
//! curves the work is independent, so the parallel strategy distributes
//! whole light curves over a rayon pool and collects results in input order.

pub mod builder;
pub mod result;

pub use builder::FeatureSpaceBuilder;
pub use result::{BatchResult, FeatureResult};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{ExtractorId, FeatureMap, FeatureValue, LightCurve};
use crate::error::{DataError, ExtractionError};
use crate::extractors::{FitInput, Upstream};
use crate::plan::{ExecutionPlan, PlanStep};
use crate::registry::Registry;

/// How a batch of light curves is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    /// Light curves on a rayon pool; `threads: None` uses the global pool.
    Parallel { threads: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputColumn {
    extractor: ExtractorId,
    feature: &'static str,
}

#[derive(Debug, Clone)]
pub struct FeatureSpace {
    plan: ExecutionPlan,
    columns: Vec<OutputColumn>,
    strategy: ExecutionStrategy,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl FeatureSpace {
    /// Builder over the built-in extractors.
    pub fn builder() -> FeatureSpaceBuilder {
        FeatureSpaceBuilder::new(Registry::with_builtins())
    }

    /// Builder over a caller-provided registry.
    pub fn builder_with(registry: Registry) -> FeatureSpaceBuilder {
        FeatureSpaceBuilder::new(registry)
    }

    /// Reported feature names, in output order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.feature).collect()
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Extract the features of a single light curve.
    ///
    /// Errors are labelled with the light curve's id, or `#0` when it has none.
    pub fn extract_one(&self, light_curve: &LightCurve) -> Result<FeatureResult, ExtractionError> {
        let values = self.run(light_curve, &label(light_curve, 0))?;
        Ok(FeatureResult {
            names: self.feature_names(),
            values,
        })
    }

    /// Extract every light curve; one row per input, in input order.
    ///
    /// Data errors stay in their row. A contract violation by any extractor
    /// aborts the batch.
    pub fn extract(&self, light_curves: &[LightCurve]) -> Result<BatchResult, ExtractionError> {
        let work = |(i, lc): (usize, &LightCurve)| self.run(lc, &label(lc, i));

        let rows: Vec<Result<Vec<FeatureValue>, ExtractionError>> = match self.strategy {
            ExecutionStrategy::Sequential => light_curves.iter().enumerate().map(work).collect(),
            ExecutionStrategy::Parallel { .. } => {
                let run_all = || light_curves.par_iter().enumerate().map(work).collect();
                match &self.pool {
                    Some(pool) => pool.install(run_all),
                    None => run_all(),
                }
            }
        };

        let mut failed = 0usize;
        for row in &rows {
            match row {
                Err(err @ ExtractionError::ContractViolation { .. }) => return Err(err.clone()),
                Err(err) => {
                    failed += 1;
                    warn!(error = %err, "light curve skipped");
                }
                Ok(_) => {}
            }
        }
        info!(
            total = rows.len(),
            failed,
            features = self.columns.len(),
            "batch extraction finished"
        );

        Ok(BatchResult {
            names: self.feature_names(),
            rows,
        })
    }

    fn run(&self, light_curve: &LightCurve, label: &str) -> Result<Vec<FeatureValue>, ExtractionError> {
        let mut outputs: BTreeMap<ExtractorId, FeatureMap> = BTreeMap::new();

        for step in self.plan.steps() {
            let extractor = &step.extractor;
            let data_error = |source: DataError| ExtractionError::Data {
                light_curve: label.to_string(),
                extractor: extractor.id(),
                source,
            };

            if let Some(&missing) = extractor
                .required_data()
                .iter()
                .find(|channel| !light_curve.has(**channel))
            {
                return Err(data_error(DataError::MissingData(missing)));
            }

            let features = {
                let upstream = Upstream::new(&outputs, extractor.dependencies());
                extractor
                    .fit(&FitInput::new(light_curve, upstream, &step.params))
                    .map_err(data_error)?
            };
            check_contract(step, &features)?;
            outputs.insert(extractor.id(), features);
        }

        self.columns
            .iter()
            .map(|col| {
                outputs
                    .get(&col.extractor)
                    .and_then(|features| features.get(col.feature))
                    .cloned()
                    .ok_or_else(|| ExtractionError::ContractViolation {
                        extractor: col.extractor,
                        expected: vec![col.feature.to_string()],
                        produced: Vec::new(),
                    })
            })
            .collect()
    }
}

fn label(light_curve: &LightCurve, index: usize) -> String {
    match light_curve.id() {
        Some(id) => id.to_string(),
        None => format!("#{index}"),
    }
}

/// The produced feature names must equal the declared ones.
fn check_contract(step: &PlanStep, features: &FeatureMap) -> Result<(), ExtractionError> {
    let declared: BTreeSet<&str> = step.extractor.features().iter().copied().collect();
    let produced: BTreeSet<&str> = features.keys().copied().collect();
    if declared == produced && declared.len() == step.extractor.features().len() {
        return Ok(());
    }
    Err(ExtractionError::ContractViolation {
        extractor: step.id(),
        expected: step.extractor.features().iter().map(|f| f.to_string()).collect(),
        produced: produced.iter().map(|f| f.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, ParamOverrides, ParamValue, Params};
    use crate::error::ConfigError;
    use crate::extractors::Extractor;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use std::f64::consts::TAU;

    fn periodic(seed: u64, n: usize, period: f64) -> LightCurve {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut time: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..60.0)).collect();
        time.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mag: Vec<f64> = time
            .iter()
            .map(|t| 12.0 + 0.4 * (TAU * t / period).sin() + rng.gen_range(-0.02..0.02))
            .collect();
        let err = vec![0.02; n];
        LightCurve::new([(Channel::Time, time), (Channel::Magnitude, mag), (Channel::Error, err)]).unwrap()
    }

    /// Test extractor with configurable id, features and dependencies.
    struct Stub {
        id: &'static str,
        features: &'static [&'static str],
        deps: &'static [ExtractorId],
        emit: &'static [&'static str],
    }

    impl Extractor for Stub {
        fn id(&self) -> ExtractorId {
            ExtractorId::new(self.id)
        }
        fn required_data(&self) -> &[Channel] {
            &[Channel::Magnitude]
        }
        fn features(&self) -> &[&'static str] {
            self.features
        }
        fn dependencies(&self) -> &[ExtractorId] {
            self.deps
        }
        fn fit(&self, _input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
            Ok(self.emit.iter().map(|f| (*f, FeatureValue::Scalar(1.0))).collect())
        }
    }

    fn stub(id: &'static str, features: &'static [&'static str], deps: &'static [ExtractorId]) -> Stub {
        Stub {
            id,
            features,
            deps,
            emit: features,
        }
    }

    #[test]
    fn default_space_reports_every_feature_in_registration_order() {
        let space = FeatureSpace::builder().build().unwrap();
        assert_eq!(
            space.feature_names(),
            vec![
                "Amplitude",
                "Mean",
                "Std",
                "Skew",
                "SmallKurtosis",
                "Rcs",
                "Meanvariance",
                "MaxSlope",
                "Eta_e",
                "Color",
                "PeriodLS",
                "Period_fit",
                "Psi_CS",
                "Psi_eta",
                "Freq1_harmonics_amplitude",
                "Freq1_harmonics_rel_phase",
            ]
        );
    }

    #[test]
    fn only_restricts_to_requested_features_in_declared_order() {
        let space = FeatureSpace::builder().only(["Psi_eta", "PeriodLS"]).build().unwrap();
        assert_eq!(space.feature_names(), vec!["PeriodLS", "Psi_eta"]);

        let result = space.extract_one(&periodic(1, 120, 5.0)).unwrap();
        assert_eq!(result.names, vec!["PeriodLS", "Psi_eta"]);
        let period = result.get("PeriodLS").and_then(FeatureValue::as_scalar).unwrap();
        assert!((period - 5.0).abs() < 0.2, "period {period}");
    }

    #[test]
    fn dependency_only_extractors_run_but_are_hidden() {
        let space = FeatureSpace::builder()
            .only(["Freq1_harmonics_amplitude"])
            .build()
            .unwrap();
        assert_eq!(space.feature_names(), vec!["Freq1_harmonics_amplitude"]);
        assert_eq!(
            space.plan().ids(),
            vec![ExtractorId::new("LombScargle"), ExtractorId::new("FourierComponents")]
        );

        let result = space.extract_one(&periodic(2, 150, 4.0)).unwrap();
        let amplitudes = result.values[0].as_slice();
        assert_eq!(amplitudes.len(), 4);
        assert!((amplitudes[0] - 0.4).abs() < 0.05);
    }

    #[test]
    fn unknown_feature_fails_at_construction() {
        let err = FeatureSpace::builder().only(["Nope"]).build().unwrap_err();
        assert_eq!(err, ConfigError::UnknownFeature("Nope".to_string()));
    }

    #[test]
    fn unknown_extractor_fails_at_construction() {
        let err = FeatureSpace::builder().extractors(["Nope"]).build().unwrap_err();
        assert_eq!(err, ConfigError::UnknownExtractor("Nope".to_string()));
    }

    #[test]
    fn ambiguous_feature_fails_at_construction() {
        let mut registry = Registry::new();
        registry.register(stub("A", &["x"], &[])).unwrap();
        registry.register(stub("B", &["x", "y"], &[])).unwrap();

        let err = FeatureSpace::builder_with(registry.clone()).only(["x"]).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::AmbiguousFeature {
                feature: "x".to_string(),
                extractors: vec![ExtractorId::new("A"), ExtractorId::new("B")],
            }
        );

        // Both active through the default selection.
        let err = FeatureSpace::builder_with(registry).build().unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousFeature { .. }));
    }

    #[test]
    fn dependency_cycle_fails_at_construction() {
        const ON_A: &[ExtractorId] = &[ExtractorId::new("A")];
        const ON_B: &[ExtractorId] = &[ExtractorId::new("B")];
        let mut registry = Registry::new();
        registry.register(stub("A", &["a"], ON_B)).unwrap();
        registry.register(stub("B", &["b"], ON_A)).unwrap();

        let err = FeatureSpace::builder_with(registry).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::DependencyCycle {
                cycle: vec![ExtractorId::new("A"), ExtractorId::new("B"), ExtractorId::new("A")],
            }
        );
    }

    #[test]
    fn data_filter_keeps_extractors_with_available_channels() {
        let space = FeatureSpace::builder().data([Channel::Magnitude]).build().unwrap();
        assert_eq!(
            space.feature_names(),
            vec!["Amplitude", "Mean", "Std", "Skew", "SmallKurtosis", "Rcs", "Meanvariance"]
        );

        let err = FeatureSpace::builder().data([Channel::Error]).build().unwrap_err();
        assert_eq!(err, ConfigError::EmptySelection);
    }

    #[test]
    fn missing_channel_aborts_the_light_curve() {
        let space = FeatureSpace::builder().only(["PeriodLS"]).build().unwrap();
        let lc = LightCurve::new([(Channel::Magnitude, vec![1.0, 2.0, 3.0])])
            .unwrap()
            .with_id("mag-only");

        let err = space.extract_one(&lc).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::Data {
                light_curve: "mag-only".to_string(),
                extractor: ExtractorId::new("LombScargle"),
                source: DataError::MissingData(Channel::Time),
            }
        );
    }

    #[test]
    fn batch_isolates_per_item_data_errors() {
        let space = FeatureSpace::builder()
            .extractors(["Mean", "LombScargle"])
            .build()
            .unwrap();
        let good_a = periodic(3, 80, 3.0);
        let good_b = periodic(4, 80, 6.0);
        let single = LightCurve::from_time_magnitude(vec![1.0], vec![12.0]).unwrap();

        let batch = space.extract(&[good_a.clone(), single, good_b.clone()]).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.successes().count(), 2);

        let (index, err) = batch.failures().next().unwrap();
        assert_eq!(index, 1);
        assert_eq!(
            *err,
            ExtractionError::Data {
                light_curve: "#1".to_string(),
                extractor: ExtractorId::new("LombScargle"),
                source: DataError::InsufficientData { required: 2, found: 1 },
            }
        );

        // Neighbours are unaffected by the failure.
        assert_eq!(batch.result(0).unwrap(), space.extract_one(&good_a).unwrap());
        assert_eq!(batch.result(2).unwrap(), space.extract_one(&good_b).unwrap());
    }

    #[test]
    fn parallel_matches_sequential() {
        let curves: Vec<LightCurve> = (0..8).map(|s| periodic(10 + s, 60, 2.0 + s as f64)).collect();
        let channels = [Channel::Time, Channel::Magnitude, Channel::Error];
        let sequential = FeatureSpace::builder().data(channels).build().unwrap().extract(&curves).unwrap();
        assert_eq!(sequential.successes().count(), curves.len());
        let global = FeatureSpace::builder()
            .data(channels)
            .strategy(ExecutionStrategy::Parallel { threads: None })
            .build()
            .unwrap()
            .extract(&curves)
            .unwrap();
        let pooled = FeatureSpace::builder()
            .data(channels)
            .strategy(ExecutionStrategy::Parallel { threads: Some(3) })
            .build()
            .unwrap()
            .extract(&curves)
            .unwrap();
        assert_eq!(sequential, global);
        assert_eq!(sequential, pooled);
    }

    #[test]
    fn param_overrides_reach_the_extractor() {
        let mut overrides = ParamOverrides::new();
        overrides.insert(
            "FourierComponents".to_string(),
            Params::new().with("nharmonics", ParamValue::Int(2)),
        );
        let space = FeatureSpace::builder()
            .only(["Freq1_harmonics_amplitude"])
            .params(overrides)
            .build()
            .unwrap();
        let result = space.extract_one(&periodic(5, 100, 4.0)).unwrap();
        assert_eq!(result.values[0].as_slice().len(), 2);

        let mut overrides = ParamOverrides::new();
        overrides.insert(
            "LombScargle".to_string(),
            Params::new().with("oversampling", ParamValue::Int(2)),
        );
        let err = FeatureSpace::builder().params(overrides).build().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownParam { .. }));
    }

    #[test]
    fn invalid_param_values_fail_at_construction() {
        let mut overrides = ParamOverrides::new();
        overrides.insert(
            "LombScargle".to_string(),
            Params::new().with("normalization", ParamValue::Text("bogus".into())),
        );
        let err = FeatureSpace::builder()
            .only(["PeriodLS"])
            .params(overrides.clone())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidParam {
                extractor: "LombScargle".to_string(),
                param: "normalization".to_string(),
                message: "unknown normalization 'bogus'".to_string(),
            }
        );

        // Dependency-only steps are validated too.
        let err = FeatureSpace::builder()
            .only(["Freq1_harmonics_amplitude"])
            .params(overrides)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParam { .. }));

        let mut overrides = ParamOverrides::new();
        overrides.insert(
            "FourierComponents".to_string(),
            Params::new().with("nharmonics", ParamValue::Int(0)),
        );
        let err = FeatureSpace::builder()
            .only(["Freq1_harmonics_rel_phase"])
            .params(overrides)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParam { ref param, .. } if param == "nharmonics"));
    }

    #[test]
    fn contract_violation_aborts_the_batch() {
        let mut registry = Registry::new();
        registry
            .register(Stub {
                id: "Liar",
                features: &["a", "b"],
                deps: &[],
                emit: &["a"],
            })
            .unwrap();
        let space = FeatureSpace::builder_with(registry).build().unwrap();
        let lc = LightCurve::new([(Channel::Magnitude, vec![1.0, 2.0])]).unwrap();

        let err = space.extract(&[lc.clone(), lc]).unwrap_err();
        assert_eq!(err.kind(), "contract_violation");
    }

    #[test]
    fn extraction_does_not_mutate_input() {
        let space = FeatureSpace::builder()
            .data([Channel::Time, Channel::Magnitude, Channel::Error])
            .build()
            .unwrap();
        let lc = periodic(6, 50, 3.5);
        let before = lc.clone();
        let first = space.extract_one(&lc).unwrap();
        let second = space.extract_one(&lc).unwrap();
        assert_eq!(lc, before);
        assert_eq!(first, second);
    }
}
