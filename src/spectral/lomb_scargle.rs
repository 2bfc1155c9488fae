//! Generalized (floating-mean) Lomb–Scargle periodogram.
//!
//! For each trial frequency `f` we fit, by weighted least squares,
//!
//! ```text
//! y(t) ≈ c + a·cos(2πft) + b·sin(2πft)
//! ```
//!
//! and report how much of the reference chi-square the sinusoid explains.
//! Weights are `1/σ_i²` when per-point uncertainties are given, uniform
//! otherwise, and are normalized to sum to one.
//!
//! Numerical notes:
//! - The 2x2 normal equations are solved in closed form. When the design is
//!   rank deficient (e.g. integer timestamps at half-integer frequencies, where
//!   every `sin` term is ~0) the determinant is pure rounding noise, so we fall
//!   back to the single-column fit of the dominant column.
//! - Frequencies are independent and evaluated in parallel; the output keeps
//!   grid order.

use std::f64::consts::TAU;

use rayon::prelude::*;

use crate::error::DataError;
use crate::math::ensure_finite;

use super::{
    ModelOptions, Normalization, Periodogram, SearchOptions, SpectralEstimator, auto_frequency,
};

/// Relative determinant threshold below which the 2x2 design is treated as rank deficient.
const RANK_EPS: f64 = 1e-10;

/// The default spectral estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LombScargle;

impl SpectralEstimator for LombScargle {
    fn estimate(
        &self,
        time: &[f64],
        magnitude: &[f64],
        error: Option<&[f64]>,
        model: &ModelOptions,
        search: &SearchOptions,
    ) -> Result<Periodogram, DataError> {
        let frequency = auto_frequency(time, search)?;
        let power = power_at(time, magnitude, error, model, &frequency)?;
        Periodogram::new(frequency, power)
    }
}

/// Evaluate the periodogram at explicit frequencies.
pub fn power_at(
    time: &[f64],
    magnitude: &[f64],
    error: Option<&[f64]>,
    model: &ModelOptions,
    frequency: &[f64],
) -> Result<Vec<f64>, DataError> {
    let n = time.len();
    if magnitude.len() != n {
        return Err(DataError::invalid(format!(
            "time has {n} values but magnitude has {}",
            magnitude.len()
        )));
    }
    if n < 2 {
        return Err(DataError::InsufficientData { required: 2, found: n });
    }
    ensure_finite("time", time)?;
    ensure_finite("magnitude", magnitude)?;

    let raw_weights: Vec<f64> = match error {
        Some(err) => {
            if err.len() != n {
                return Err(DataError::invalid(format!(
                    "time has {n} values but error has {}",
                    err.len()
                )));
            }
            if err.iter().any(|e| !(e.is_finite() && *e > 0.0)) {
                return Err(DataError::invalid("error values must be finite and > 0"));
            }
            err.iter().map(|e| 1.0 / (e * e)).collect()
        }
        None => vec![1.0; n],
    };
    let w_total: f64 = raw_weights.iter().sum();
    let w: Vec<f64> = raw_weights.iter().map(|v| v / w_total).collect();

    let y_mean: f64 = w.iter().zip(magnitude).map(|(wi, yi)| wi * yi).sum();
    let y: Vec<f64> = if model.center_data || model.fit_mean {
        magnitude.iter().map(|v| v - y_mean).collect()
    } else {
        magnitude.to_vec()
    };

    let y_bar: f64 = if model.fit_mean {
        w.iter().zip(&y).map(|(wi, yi)| wi * yi).sum()
    } else {
        0.0
    };
    let yy = w.iter().zip(&y).map(|(wi, yi)| wi * yi * yi).sum::<f64>() - y_bar * y_bar;

    let power = frequency
        .par_iter()
        .map(|&f| {
            if !(yy > 0.0) {
                return 0.0;
            }
            let explained = explained_fraction(time, &y, &w, y_bar, model.fit_mean, f);
            normalize(explained, yy, w_total, model.normalization)
        })
        .collect();

    Ok(power)
}

/// Weighted chi-square reduction of the best sinusoid at frequency `f`.
fn explained_fraction(time: &[f64], y: &[f64], w: &[f64], y_bar: f64, fit_mean: bool, f: f64) -> f64 {
    let omega = TAU * f;

    let (mut c, mut s) = (0.0, 0.0);
    let (mut yc, mut ys) = (0.0, 0.0);
    let (mut cc, mut ss, mut cs) = (0.0, 0.0, 0.0);
    for i in 0..time.len() {
        let (sin, cos) = (omega * time[i]).sin_cos();
        let wi = w[i];
        c += wi * cos;
        s += wi * sin;
        yc += wi * y[i] * cos;
        ys += wi * y[i] * sin;
        cc += wi * cos * cos;
        ss += wi * sin * sin;
        cs += wi * cos * sin;
    }

    if fit_mean {
        yc -= y_bar * c;
        ys -= y_bar * s;
        cc -= c * c;
        ss -= s * s;
        cs -= c * s;
    }

    let scale = cc + ss;
    if !(scale > 0.0) {
        return 0.0;
    }
    let det = cc * ss - cs * cs;
    if det > RANK_EPS * scale * scale {
        (ss * yc * yc + cc * ys * ys - 2.0 * cs * yc * ys) / det
    } else if cc >= ss {
        yc * yc / cc
    } else {
        ys * ys / ss
    }
}

fn normalize(explained: f64, yy: f64, w_total: f64, normalization: Normalization) -> f64 {
    let explained = explained.clamp(0.0, yy);
    // Keep the residual strictly positive so ratio-based normalizations stay finite
    // on exact fits.
    let chi2 = (yy - explained).max(yy * f64::EPSILON);
    match normalization {
        Normalization::Standard => explained / yy,
        Normalization::Model => yy / chi2 - 1.0,
        Normalization::Log => -(chi2 / yy).ln(),
        Normalization::Psd => 0.5 * explained * w_total,
    }
}
