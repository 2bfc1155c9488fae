//! Synthetic periodic light curves.
//!
//! Each curve is a two-harmonic periodic signal sampled at uniformly random
//! epochs over the baseline, with Gaussian photometric noise:
//!
//! ```text
//! m(t) = m0 + A·sin(2πt/P + φ) + 0.3·A·sin(4πt/P + 2φ) + ε,   ε ~ N(0, σ)
//! ```
//!
//! A second band (`magnitude2`) shares the epochs and shape with a fixed colour
//! offset, so every built-in extractor has the data it needs.

use std::f64::consts::TAU;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Channel, LightCurve};
use crate::error::AppError;

/// Relative amplitude of the first overtone.
const OVERTONE: f64 = 0.3;
/// Colour offset of the second band.
const COLOR_OFFSET: f64 = 0.35;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub count: usize,
    pub points: usize,
    /// Observation window length (days).
    pub baseline: f64,
    pub period_min: f64,
    pub period_max: f64,
    pub amplitude_min: f64,
    pub amplitude_max: f64,
    pub base_magnitude: f64,
    /// Photometric noise standard deviation (mag).
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 5,
            points: 200,
            baseline: 100.0,
            period_min: 0.5,
            period_max: 20.0,
            amplitude_min: 0.1,
            amplitude_max: 1.0,
            base_magnitude: 15.0,
            noise: 0.02,
            seed: 42,
        }
    }
}

/// A generated light curve with its true parameters.
#[derive(Debug, Clone)]
pub struct SyntheticCurve {
    pub light_curve: LightCurve,
    pub period: f64,
    pub amplitude: f64,
}

pub fn generate_periodic(config: &SyntheticConfig) -> Result<Vec<SyntheticCurve>, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Synthetic curve count must be > 0."));
    }
    if config.points < 2 {
        return Err(AppError::new(2, "Synthetic curves need at least 2 points."));
    }
    if !(config.baseline.is_finite() && config.baseline > 0.0) {
        return Err(AppError::new(2, "Synthetic baseline must be > 0."));
    }
    if !(config.period_min > 0.0 && config.period_max >= config.period_min && config.period_max.is_finite()) {
        return Err(AppError::new(2, "Invalid synthetic period range."));
    }
    if !(config.amplitude_min >= 0.0 && config.amplitude_max >= config.amplitude_min && config.amplitude_max.is_finite())
    {
        return Err(AppError::new(2, "Invalid synthetic amplitude range."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let mut curves = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let period = rng.gen_range(config.period_min..=config.period_max);
        let amplitude = rng.gen_range(config.amplitude_min..=config.amplitude_max);
        let phase0 = rng.gen_range(0.0..TAU);

        let mut time: Vec<f64> = (0..config.points)
            .map(|_| rng.gen_range(0.0..config.baseline))
            .collect();
        time.sort_by(|a, b| a.total_cmp(b));

        let shape: Vec<f64> = time
            .iter()
            .map(|t| {
                let x = TAU * t / period + phase0;
                amplitude * (x.sin() + OVERTONE * (2.0 * x).sin())
            })
            .collect();
        let magnitude: Vec<f64> = shape
            .iter()
            .map(|s| config.base_magnitude + s + normal.sample(&mut rng))
            .collect();
        let magnitude2: Vec<f64> = shape
            .iter()
            .map(|s| config.base_magnitude + COLOR_OFFSET + s + normal.sample(&mut rng))
            .collect();
        let error = vec![config.noise.max(1e-6); config.points];

        let light_curve = LightCurve::new([
            (Channel::Time, time),
            (Channel::Magnitude, magnitude),
            (Channel::Error, error),
            (Channel::Magnitude2, magnitude2),
        ])
        .map_err(AppError::from)?
        .with_id(format!("synthetic-{:03}", i + 1));

        curves.push(SyntheticCurve {
            light_curve,
            period,
            amplitude,
        });
    }

    Ok(curves)
}
