//! Period search and phase-folded dispersion statistics.
//!
//! Algorithm:
//!
//! 1. Compute a periodogram of `(time, magnitude[, error])`.
//! 2. Take the frequency of maximum power (ties -> lowest frequency);
//!    `PeriodLS = 1 / f_best`.
//! 3. Fold the timestamps modulo **twice** the period. A pure sinusoid then
//!    shows two cycles in phase, and a true period that the periodogram
//!    reported at half its value (a common harmonic confusion) still folds
//!    coherently.
//! 4. Order magnitudes by phase and compute `Psi_CS` (cumulative-sum range)
//!    and `Psi_eta` (von Neumann ratio) on that folded sequence.
//!
//! `Period_fit` is reported as the constant `1`.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::{Channel, ExtractorId, FeatureMap, FeatureValue, LightCurve, ParamValue, Params};
use crate::error::{ConfigError, DataError};
use crate::math::{cusum_range, ensure_finite, ensure_min_len, von_neumann_eta};
use crate::spectral::{
    LombScargle as LombScarglePeriodogram, ModelOptions, Normalization, Periodogram,
    SearchOptions, SpectralEstimator,
};

use super::{Extractor, FitInput};

pub const PERIOD_LS: &str = "PeriodLS";
pub const PERIOD_FIT: &str = "Period_fit";
pub const PSI_CS: &str = "Psi_CS";
pub const PSI_ETA: &str = "Psi_eta";

const FEATURES: &[&str] = &[PERIOD_LS, PERIOD_FIT, PSI_CS, PSI_ETA];

/// Result of the period search and fold for one light curve.
#[derive(Debug, Clone)]
pub struct FoldedCurve {
    pub periodogram: Periodogram,
    pub best_index: usize,
    pub best_period: f64,
    /// Phase in `[0, 1)` per observation, in original order.
    pub phase: Vec<f64>,
    /// Observation indices sorted by ascending phase.
    pub order: Vec<usize>,
    /// Magnitudes reordered by phase.
    pub folded: Vec<f64>,
}

/// Lomb–Scargle period extractor.
#[derive(Clone)]
pub struct LombScargle {
    estimator: Arc<dyn SpectralEstimator>,
}

impl LombScargle {
    pub fn new() -> Self {
        Self::with_estimator(Arc::new(LombScarglePeriodogram))
    }

    pub fn with_estimator(estimator: Arc<dyn SpectralEstimator>) -> Self {
        Self { estimator }
    }

    /// Run the period search and fold without computing the statistics.
    pub fn search(&self, light_curve: &LightCurve, params: &Params) -> Result<FoldedCurve, DataError> {
        let time = light_curve.channel(Channel::Time)?;
        let magnitude = light_curve.channel(Channel::Magnitude)?;
        let error = light_curve.get(Channel::Error);

        ensure_min_len(magnitude, 2)?;
        ensure_finite("time", time)?;
        ensure_finite("magnitude", magnitude)?;
        if let Some(err) = error {
            ensure_finite("error", err)?;
        }

        let (model, search) = options_from_params(params)?;
        let periodogram = self.estimator.estimate(time, magnitude, error, &model, &search)?;
        let best_index = periodogram
            .best_index()
            .ok_or_else(|| DataError::invalid("periodogram has no finite power values"))?;
        let best_period = 1.0 / periodogram.frequency[best_index];
        if !(best_period.is_finite() && best_period > 0.0) {
            return Err(DataError::invalid(format!("invalid best period {best_period}")));
        }

        let phase = fold_phase(time, best_period);
        let order = phase_order(&phase);
        let folded = order.iter().map(|&i| magnitude[i]).collect();

        Ok(FoldedCurve {
            periodogram,
            best_index,
            best_period,
            phase,
            order,
            folded,
        })
    }
}

impl Default for LombScargle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LombScargle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LombScargle").finish_non_exhaustive()
    }
}

impl Extractor for LombScargle {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("LombScargle")
    }

    fn required_data(&self) -> &[Channel] {
        &[Channel::Time, Channel::Magnitude]
    }

    fn features(&self) -> &[&'static str] {
        FEATURES
    }

    fn params(&self) -> Params {
        Params::new()
            .with("fit_mean", ParamValue::Bool(true))
            .with("center_data", ParamValue::Bool(true))
            .with("normalization", ParamValue::Text("standard".to_string()))
            .with("samples_per_peak", ParamValue::Float(5.0))
            .with("nyquist_factor", ParamValue::Float(5.0))
            .with("minimum_frequency", ParamValue::Null)
            .with("maximum_frequency", ParamValue::Null)
    }

    fn validate_params(&self, params: &Params) -> Result<(), ConfigError> {
        let invalid = |param: &str, err: DataError| ConfigError::invalid_param(self.id().as_str(), param, err);

        params.bool_or("fit_mean", true).map_err(|e| invalid("fit_mean", e))?;
        params.bool_or("center_data", true).map_err(|e| invalid("center_data", e))?;
        params
            .str_or("normalization", "standard")
            .and_then(|name| name.parse::<Normalization>())
            .map_err(|e| invalid("normalization", e))?;

        for name in ["samples_per_peak", "nyquist_factor"] {
            let value = params.f64_or(name, 5.0).map_err(|e| invalid(name, e))?;
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, DataError::invalid(format!("must be finite and > 0, got {value}"))));
            }
        }

        let mut bounds = [None, None];
        for (slot, name) in bounds.iter_mut().zip(["minimum_frequency", "maximum_frequency"]) {
            *slot = params.f64(name).map_err(|e| invalid(name, e))?;
            if let Some(value) = *slot {
                if !(value.is_finite() && value > 0.0) {
                    return Err(invalid(name, DataError::invalid(format!("must be finite and > 0, got {value}"))));
                }
            }
        }
        if let [Some(min), Some(max)] = bounds {
            if max < min {
                return Err(invalid(
                    "maximum_frequency",
                    DataError::invalid(format!("must be >= minimum_frequency ({min}), got {max}")),
                ));
            }
        }
        Ok(())
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let folded = self.search(input.light_curve, input.params)?;
        fold_features(&folded)
    }
}

/// The four period features of an already folded curve.
pub fn fold_features(folded: &FoldedCurve) -> Result<FeatureMap, DataError> {
    let psi_cs = cusum_range(&folded.folded)?;
    let psi_eta = von_neumann_eta(&folded.folded)?;

    Ok(FeatureMap::from([
        (PERIOD_LS, FeatureValue::Scalar(folded.best_period)),
        (PERIOD_FIT, FeatureValue::Scalar(1.0)),
        (PSI_CS, FeatureValue::Scalar(psi_cs)),
        (PSI_ETA, FeatureValue::Scalar(psi_eta)),
    ]))
}

fn options_from_params(params: &Params) -> Result<(ModelOptions, SearchOptions), DataError> {
    let defaults = SearchOptions::default();
    let model = ModelOptions {
        fit_mean: params.bool_or("fit_mean", true)?,
        center_data: params.bool_or("center_data", true)?,
        normalization: params.str_or("normalization", "standard")?.parse()?,
    };
    let search = SearchOptions {
        samples_per_peak: params.f64_or("samples_per_peak", defaults.samples_per_peak)?,
        nyquist_factor: params.f64_or("nyquist_factor", defaults.nyquist_factor)?,
        minimum_frequency: params.f64("minimum_frequency")?,
        maximum_frequency: params.f64("maximum_frequency")?,
    };
    Ok((model, search))
}

/// Phase of each timestamp folded on twice `period`, in `[0, 1)`.
pub fn fold_phase(time: &[f64], period: f64) -> Vec<f64> {
    let span = 2.0 * period;
    time.iter()
        .map(|t| {
            let phase = t.rem_euclid(span) / span;
            // rem_euclid may round up to `span` for tiny negative inputs.
            if phase >= 1.0 { 0.0 } else { phase }
        })
        .collect()
}

/// Indices sorted by ascending phase; equal phases keep their original order.
pub fn phase_order(phase: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..phase.len()).collect();
    order.sort_by(|&a, &b| phase[a].partial_cmp(&phase[b]).unwrap_or(Ordering::Equal));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::Upstream;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::TAU;

    /// Estimator returning a fixed periodogram, for isolating the fold logic.
    struct Fixed(Periodogram);

    impl SpectralEstimator for Fixed {
        fn estimate(
            &self,
            _time: &[f64],
            _magnitude: &[f64],
            _error: Option<&[f64]>,
            _model: &ModelOptions,
            _search: &SearchOptions,
        ) -> Result<Periodogram, DataError> {
            Ok(self.0.clone())
        }
    }

    fn fit(ext: &LombScargle, lc: &LightCurve) -> Result<FeatureMap, DataError> {
        let params = ext.params();
        ext.fit(&FitInput::new(lc, Upstream::empty(), &params))
    }

    fn scalar(out: &FeatureMap, name: &str) -> f64 {
        out[name].as_scalar().unwrap()
    }

    #[test]
    fn alternating_series_recovers_period_two() {
        let lc = LightCurve::from_time_magnitude(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0],
        )
        .unwrap();
        let out = fit(&LombScargle::new(), &lc).unwrap();

        assert_eq!(out.len(), 4);
        assert!((scalar(&out, PERIOD_LS) - 2.0).abs() < 0.1);
        assert_eq!(scalar(&out, PERIOD_FIT), 1.0);
        assert!(scalar(&out, PSI_CS).is_finite());
        assert!(scalar(&out, PSI_ETA).is_finite());
    }

    #[test]
    fn smooth_fold_has_small_eta_relative_to_cs() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut time: Vec<f64> = (0..200).map(|_| rng.gen_range(0.0..100.0)).collect();
        time.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mag: Vec<f64> = time.iter().map(|t| 15.0 + 0.5 * (TAU * t / 7.0).sin()).collect();
        let lc = LightCurve::from_time_magnitude(time, mag).unwrap();

        let out = fit(&LombScargle::new(), &lc).unwrap();
        assert!((scalar(&out, PERIOD_LS) - 7.0).abs() < 0.2);
        assert!(scalar(&out, PSI_ETA) < scalar(&out, PSI_CS));
    }

    #[test]
    fn single_observation_is_insufficient() {
        let lc = LightCurve::from_time_magnitude(vec![1.0], vec![12.0]).unwrap();
        let err = fit(&LombScargle::new(), &lc).unwrap_err();
        assert_eq!(err, DataError::InsufficientData { required: 2, found: 1 });
    }

    #[test]
    fn constant_magnitude_is_a_domain_error() {
        let lc = LightCurve::from_time_magnitude(vec![0.0, 1.3, 2.1, 4.0], vec![3.0; 4]).unwrap();
        assert!(matches!(fit(&LombScargle::new(), &lc), Err(DataError::InvalidData(_))));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let lc = LightCurve::from_time_magnitude(vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 2.0]).unwrap();
        assert!(matches!(fit(&LombScargle::new(), &lc), Err(DataError::InvalidData(_))));
    }

    #[test]
    fn fold_uses_twice_the_best_period() {
        // Period 2 from the injected periodogram -> fold span 4.
        let pg = Periodogram::new(vec![0.25, 0.5, 1.0], vec![0.1, 0.9, 0.9]).unwrap();
        let ext = LombScargle::with_estimator(Arc::new(Fixed(pg)));
        let lc = LightCurve::from_time_magnitude(
            vec![0.0, 1.0, 2.0, 3.0, 5.0],
            vec![10.0, 11.0, 12.0, 13.0, 14.0],
        )
        .unwrap();

        let folded = ext.search(&lc, &ext.params()).unwrap();
        assert_eq!(folded.best_index, 1);
        assert_eq!(folded.best_period, 2.0);
        assert_eq!(folded.phase, vec![0.0, 0.25, 0.5, 0.75, 0.25]);
        assert_eq!(folded.order, vec![0, 1, 4, 2, 3]);
        assert_eq!(folded.folded, vec![10.0, 11.0, 14.0, 12.0, 13.0]);
    }

    #[test]
    fn options_reject_bad_types() {
        let params = LombScargle::new().params().with("samples_per_peak", ParamValue::Bool(true));
        assert!(options_from_params(&params).is_err());
        let params = LombScargle::new().params().with("normalization", ParamValue::Text("x".into()));
        assert!(options_from_params(&params).is_err());
    }

    #[test]
    fn validate_params_names_the_offending_option() {
        let ls = LombScargle::new();
        assert!(ls.validate_params(&ls.params()).is_ok());

        let params = ls.params().with("normalization", ParamValue::Text("bogus".into()));
        let err = ls.validate_params(&params).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidParam {
                extractor: "LombScargle".to_string(),
                param: "normalization".to_string(),
                message: "unknown normalization 'bogus'".to_string(),
            }
        );

        let params = ls.params().with("nyquist_factor", ParamValue::Float(0.0));
        assert!(matches!(
            ls.validate_params(&params),
            Err(ConfigError::InvalidParam { param, .. }) if param == "nyquist_factor"
        ));

        let params = ls
            .params()
            .with("minimum_frequency", ParamValue::Float(2.0))
            .with("maximum_frequency", ParamValue::Float(1.0));
        assert!(matches!(
            ls.validate_params(&params),
            Err(ConfigError::InvalidParam { param, .. }) if param == "maximum_frequency"
        ));

        let params = ls.params().with("fit_mean", ParamValue::Int(1));
        assert!(ls.validate_params(&params).is_err());
    }

    proptest! {
        #[test]
        fn folded_phase_is_in_unit_interval_and_a_permutation(
            samples in proptest::collection::vec((-1e4f64..1e4, -50f64..50.0), 2..60),
            period in 1e-3f64..1e3,
        ) {
            let time: Vec<f64> = samples.iter().map(|s| s.0).collect();
            let mag: Vec<f64> = samples.iter().map(|s| s.1).collect();

            let phase = fold_phase(&time, period);
            prop_assert!(phase.iter().all(|p| (0.0..1.0).contains(p)));

            let order = phase_order(&phase);
            let mut seen = order.clone();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..time.len()).collect::<Vec<_>>());

            let mut folded: Vec<f64> = order.iter().map(|&i| mag[i]).collect();
            let mut original = mag.clone();
            folded.sort_by(|a, b| a.partial_cmp(b).unwrap());
            original.sort_by(|a, b| a.partial_cmp(b).unwrap());
            prop_assert_eq!(folded, original);
            prop_assert!(order.windows(2).all(|w| phase[w[0]] <= phase[w[1]]));
        }
    }
}
