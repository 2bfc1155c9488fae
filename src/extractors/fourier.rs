//! Harmonic decomposition at the detected period.
//!
//! Fits `y(t) = c + Σ_k [a_k·cos(kωt) + b_k·sin(kωt)]`, `ω = 2π / PeriodLS`,
//! for `k = 1..=nharmonics` by (weighted) least squares and reports per
//! harmonic the amplitude `sqrt(a_k² + b_k²)` and the phase relative to the
//! fundamental, `φ_k − k·φ_1`, wrapped to `(−π, π]`.

use std::f64::consts::{PI, TAU};

use crate::domain::{Channel, ExtractorId, FeatureMap, FeatureValue, ParamValue, Params};
use crate::error::{ConfigError, DataError};
use crate::math::{ensure_finite, solve_weighted_least_squares};

use super::lomb_scargle::PERIOD_LS;
use super::{Extractor, FitInput};

const DEFAULT_HARMONICS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct FourierComponents;

impl Extractor for FourierComponents {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("FourierComponents")
    }

    fn required_data(&self) -> &[Channel] {
        &[Channel::Time, Channel::Magnitude]
    }

    fn features(&self) -> &[&'static str] {
        &["Freq1_harmonics_amplitude", "Freq1_harmonics_rel_phase"]
    }

    fn dependencies(&self) -> &[ExtractorId] {
        const DEPS: &[ExtractorId] = &[ExtractorId::new("LombScargle")];
        DEPS
    }

    fn params(&self) -> Params {
        Params::new().with("nharmonics", ParamValue::Int(DEFAULT_HARMONICS as i64))
    }

    fn validate_params(&self, params: &Params) -> Result<(), ConfigError> {
        let invalid = |err| ConfigError::invalid_param(self.id().as_str(), "nharmonics", err);
        let nharmonics = params.usize_or("nharmonics", DEFAULT_HARMONICS).map_err(invalid)?;
        if nharmonics == 0 {
            return Err(invalid(DataError::invalid("nharmonics must be at least 1")));
        }
        Ok(())
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let time = input.channel(Channel::Time)?;
        let magnitude = input.channel(Channel::Magnitude)?;
        let nharmonics = input.params.usize_or("nharmonics", DEFAULT_HARMONICS)?;
        if nharmonics == 0 {
            return Err(DataError::invalid("nharmonics must be at least 1"));
        }

        let cols = 2 * nharmonics + 1;
        if magnitude.len() < cols {
            return Err(DataError::InsufficientData {
                required: cols,
                found: magnitude.len(),
            });
        }
        ensure_finite("time", time)?;
        ensure_finite("magnitude", magnitude)?;

        let period = input.upstream.scalar(PERIOD_LS)?;
        if !(period.is_finite() && period > 0.0) {
            return Err(DataError::invalid(format!("invalid period {period}")));
        }

        let weights = match input.light_curve.get(Channel::Error) {
            Some(err) if err.iter().all(|e| e.is_finite() && *e > 0.0) => {
                err.iter().map(|e| 1.0 / (e * e)).collect()
            }
            Some(_) => return Err(DataError::invalid("error values must be finite and > 0")),
            None => vec![1.0; magnitude.len()],
        };

        let omega = TAU / period;
        let mut design = Vec::with_capacity(magnitude.len() * cols);
        for &t in time {
            design.push(1.0);
            for k in 1..=nharmonics {
                let (sin, cos) = (k as f64 * omega * t).sin_cos();
                design.push(cos);
                design.push(sin);
            }
        }

        let beta = solve_weighted_least_squares(&design, cols, magnitude, &weights)
            .ok_or_else(|| DataError::invalid("harmonic fit is singular"))?;

        let (amplitude, phase): (Vec<f64>, Vec<f64>) = (0..nharmonics)
            .map(|k| {
                let (a, b) = (beta[1 + 2 * k], beta[2 + 2 * k]);
                (a.hypot(b), a.atan2(b))
            })
            .unzip();

        let rel_phase = phase
            .iter()
            .enumerate()
            .map(|(k, p)| wrap_phase(p - (k + 1) as f64 * phase[0]))
            .collect();

        Ok(FeatureMap::from([
            ("Freq1_harmonics_amplitude", FeatureValue::Vector(amplitude)),
            ("Freq1_harmonics_rel_phase", FeatureValue::Vector(rel_phase)),
        ]))
    }
}

/// Wrap an angle to `(−π, π]`.
fn wrap_phase(angle: f64) -> f64 {
    let r = angle.rem_euclid(TAU);
    if r > PI { r - TAU } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LightCurve;
    use crate::extractors::Upstream;
    use std::collections::BTreeMap;

    fn upstream_period(period: f64) -> BTreeMap<ExtractorId, FeatureMap> {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            ExtractorId::new("LombScargle"),
            FeatureMap::from([(PERIOD_LS, FeatureValue::Scalar(period))]),
        );
        outputs
    }

    #[test]
    fn recovers_harmonic_amplitudes_and_phase() {
        let period = 3.0;
        let omega = TAU / period;
        let time: Vec<f64> = (0..120)
            .map(|i| i as f64 * 0.41 + (i as f64 * 0.618_033_988_7).fract() * 0.2)
            .collect();
        let mag: Vec<f64> = time
            .iter()
            .map(|t| 10.0 + (omega * t).sin() + 0.5 * (2.0 * omega * t + 0.3).sin())
            .collect();
        let lc = LightCurve::from_time_magnitude(time, mag).unwrap();

        let outputs = upstream_period(period);
        let deps = [ExtractorId::new("LombScargle")];
        let params = FourierComponents.params();
        let out = FourierComponents
            .fit(&FitInput::new(&lc, Upstream::new(&outputs, &deps), &params))
            .unwrap();

        let amp = out["Freq1_harmonics_amplitude"].as_slice();
        let rel = out["Freq1_harmonics_rel_phase"].as_slice();
        assert_eq!(amp.len(), 4);
        assert!((amp[0] - 1.0).abs() < 1e-8);
        assert!((amp[1] - 0.5).abs() < 1e-8);
        assert!(amp[2].abs() < 1e-8 && amp[3].abs() < 1e-8);
        assert!(rel[0].abs() < 1e-8);
        assert!((rel[1] - 0.3).abs() < 1e-8);
    }

    #[test]
    fn too_few_points_for_the_harmonics() {
        let lc = LightCurve::from_time_magnitude(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 1.5]).unwrap();
        let outputs = upstream_period(2.0);
        let deps = [ExtractorId::new("LombScargle")];
        let params = FourierComponents.params();
        let err = FourierComponents
            .fit(&FitInput::new(&lc, Upstream::new(&outputs, &deps), &params))
            .unwrap_err();
        assert_eq!(err, DataError::InsufficientData { required: 9, found: 3 });
    }

    #[test]
    fn missing_period_is_invalid() {
        let time: Vec<f64> = (0..20).map(f64::from).collect();
        let mag: Vec<f64> = time.iter().map(|t| t.sin()).collect();
        let lc = LightCurve::from_time_magnitude(time, mag).unwrap();
        let params = Params::new().with("nharmonics", ParamValue::Int(1));
        let err = FourierComponents
            .fit(&FitInput::new(&lc, Upstream::empty(), &params))
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidData(_)));
    }

    #[test]
    fn nharmonics_is_validated_up_front() {
        let fc = FourierComponents;
        assert!(fc.validate_params(&fc.params()).is_ok());
        for bad in [ParamValue::Int(0), ParamValue::Int(-2), ParamValue::Text("four".into())] {
            let params = fc.params().with("nharmonics", bad);
            assert!(matches!(
                fc.validate_params(&params),
                Err(ConfigError::InvalidParam { param, .. }) if param == "nharmonics"
            ));
        }
    }

    #[test]
    fn phase_wrapping() {
        assert!((wrap_phase(2.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((wrap_phase(-0.5) + 0.5).abs() < 1e-12);
        assert!((wrap_phase(TAU + 0.25) - 0.25).abs() < 1e-12);
    }
}
