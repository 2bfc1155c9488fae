//! Frequency grid generation.
//!
//! The period search evaluates the periodogram on a regular frequency grid
//! derived from the time baseline:
//!
//! - spacing `df = 1 / (baseline · samples_per_peak)`, so each peak of width
//!   `~1/baseline` is sampled `samples_per_peak` times
//! - lower edge `df / 2` unless given
//! - upper edge `nyquist_factor · N / (2 · baseline)` (a multiple of the
//!   average Nyquist frequency) unless given

use crate::error::DataError;

use super::SearchOptions;

/// Generate `steps` evenly spaced points starting at `start` with spacing `step`.
pub fn lin_space(start: f64, step: f64, steps: usize) -> Vec<f64> {
    (0..steps).map(|i| start + step * i as f64).collect()
}

/// Build the automatic frequency grid for the given timestamps.
pub fn auto_frequency(time: &[f64], opts: &SearchOptions) -> Result<Vec<f64>, DataError> {
    if time.len() < 2 {
        return Err(DataError::InsufficientData {
            required: 2,
            found: time.len(),
        });
    }
    if !(opts.samples_per_peak.is_finite() && opts.samples_per_peak > 0.0) {
        return Err(DataError::invalid(format!(
            "samples_per_peak must be finite and > 0, got {}",
            opts.samples_per_peak
        )));
    }
    if !(opts.nyquist_factor.is_finite() && opts.nyquist_factor > 0.0) {
        return Err(DataError::invalid(format!(
            "nyquist_factor must be finite and > 0, got {}",
            opts.nyquist_factor
        )));
    }

    let (t_min, t_max) = time
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
    let baseline = t_max - t_min;
    if !(baseline.is_finite() && baseline > 0.0) {
        return Err(DataError::invalid("time baseline is zero; cannot build a frequency grid"));
    }

    let df = 1.0 / (baseline * opts.samples_per_peak);
    let f_min = opts.minimum_frequency.unwrap_or(0.5 * df);
    let f_max = opts
        .maximum_frequency
        .unwrap_or(opts.nyquist_factor * 0.5 * time.len() as f64 / baseline);

    if !(f_min.is_finite() && f_max.is_finite() && f_min > 0.0 && f_max >= f_min) {
        return Err(DataError::invalid(format!(
            "invalid frequency range: min={f_min}, max={f_max} (must be finite, >0, and max>=min)"
        )));
    }

    let steps = 1 + ((f_max - f_min) / df).round() as usize;
    Ok(lin_space(f_min, df, steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_for_unit_sampling() {
        // baseline 5, N 6: df = 0.04, f_min = 0.02, f_max = 5 * 0.6 = 3.0
        let time = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let grid = auto_frequency(&time, &SearchOptions::default()).unwrap();
        assert!((grid[0] - 0.02).abs() < 1e-12);
        assert!((grid[1] - grid[0] - 0.04).abs() < 1e-12);
        let last = grid[grid.len() - 1];
        assert!((last - 3.0).abs() <= 0.04);
        assert!(grid.iter().any(|f| (f - 0.5).abs() < 1e-9));
    }

    #[test]
    fn explicit_bounds_are_respected() {
        let time = [0.0, 10.0, 20.0];
        let opts = SearchOptions {
            minimum_frequency: Some(0.1),
            maximum_frequency: Some(0.2),
            ..SearchOptions::default()
        };
        let grid = auto_frequency(&time, &opts).unwrap();
        assert!((grid[0] - 0.1).abs() < 1e-12);
        assert!((grid[grid.len() - 1] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn zero_baseline_is_invalid() {
        let err = auto_frequency(&[1.0, 1.0, 1.0], &SearchOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidData(_)));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let opts = SearchOptions {
            samples_per_peak: 0.0,
            ..SearchOptions::default()
        };
        assert!(auto_frequency(&[0.0, 1.0], &opts).is_err());
    }
}
