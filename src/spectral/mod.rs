//! Spectral estimation for irregularly sampled time series.
//!
//! The period search only depends on the [`SpectralEstimator`] trait: given
//! timestamps, values and optional uncertainties it returns a frequency grid
//! and matching power values. [`LombScargle`] is the default implementation.

pub mod grid;
pub mod lomb_scargle;

pub use grid::*;
pub use lomb_scargle::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// How raw chi-square reductions are turned into power values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// `1 - χ²/χ²_ref`, in `[0, 1]`.
    #[default]
    Standard,
    /// `χ²_ref/χ² - 1`.
    Model,
    /// `-ln(χ²/χ²_ref)`.
    Log,
    /// `(χ²_ref - χ²) / 2`.
    Psd,
}

impl FromStr for Normalization {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Normalization::Standard),
            "model" => Ok(Normalization::Model),
            "log" => Ok(Normalization::Log),
            "psd" => Ok(Normalization::Psd),
            other => Err(DataError::invalid(format!("unknown normalization '{other}'"))),
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Normalization::Standard => "standard",
            Normalization::Model => "model",
            Normalization::Log => "log",
            Normalization::Psd => "psd",
        };
        f.write_str(name)
    }
}

/// Options of the periodogram model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Fit a floating offset together with the sinusoid.
    pub fit_mean: bool,
    /// Subtract the weighted mean before fitting.
    pub center_data: bool,
    pub normalization: Normalization,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            fit_mean: true,
            center_data: true,
            normalization: Normalization::Standard,
        }
    }
}

/// Frequency grid options (see [`auto_frequency`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub samples_per_peak: f64,
    pub nyquist_factor: f64,
    pub minimum_frequency: Option<f64>,
    pub maximum_frequency: Option<f64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            samples_per_peak: 5.0,
            nyquist_factor: 5.0,
            minimum_frequency: None,
            maximum_frequency: None,
        }
    }
}

/// Relative margin a later power bin must exceed the running maximum by to
/// replace it in [`Periodogram::best_index`].
pub const POWER_TIE_TOLERANCE: f64 = 1e-9;

/// A frequency grid with matching power values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodogram {
    pub frequency: Vec<f64>,
    pub power: Vec<f64>,
}

impl Periodogram {
    pub fn new(frequency: Vec<f64>, power: Vec<f64>) -> Result<Self, DataError> {
        if frequency.len() != power.len() {
            return Err(DataError::invalid(format!(
                "periodogram has {} frequencies but {} power values",
                frequency.len(),
                power.len()
            )));
        }
        if frequency.is_empty() {
            return Err(DataError::invalid("periodogram is empty"));
        }
        if frequency.iter().any(|f| !(f.is_finite() && *f > 0.0)) {
            return Err(DataError::invalid("periodogram frequencies must be finite and positive"));
        }
        Ok(Self { frequency, power })
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Index of maximum power.
    ///
    /// Ties go to the lowest index (lowest frequency on an ascending grid).
    /// Near-ties within [`POWER_TIE_TOLERANCE`] (relative) count as ties, so
    /// exact aliases that differ only by rounding resolve deterministically.
    /// Non-finite power values are skipped.
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.power.iter().enumerate() {
            if !p.is_finite() {
                continue;
            }
            match best {
                None => best = Some((i, p)),
                Some((_, bp)) => {
                    let margin = POWER_TIE_TOLERANCE * bp.abs().max(f64::MIN_POSITIVE);
                    if p > bp + margin {
                        best = Some((i, p));
                    }
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Period of the maximum power bin.
    pub fn best_period(&self) -> Option<f64> {
        self.best_index().map(|i| 1.0 / self.frequency[i])
    }
}

/// A periodogram estimator treated as a pure function of its inputs.
pub trait SpectralEstimator: Send + Sync {
    fn estimate(
        &self,
        time: &[f64],
        magnitude: &[f64],
        error: Option<&[f64]>,
        model: &ModelOptions,
        search: &SearchOptions,
    ) -> Result<Periodogram, DataError>;
}
