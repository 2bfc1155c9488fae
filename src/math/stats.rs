//! Descriptive statistics shared by the extractors.
//!
//! All variances are population variances (`/ N`) unless the name says
//! otherwise. Functions that divide by a spread return `DataError::InvalidData`
//! on zero variance instead of producing NaN/Inf.

use std::cmp::Ordering;

use crate::error::DataError;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance.
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Sample standard deviation (`ddof = 1`).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Median of an already sorted slice.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Sort a copy of `values` ascending (NaN-tolerant total order).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Reject empty input and non-finite values.
pub fn ensure_finite(name: &str, values: &[f64]) -> Result<(), DataError> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(DataError::invalid(format!(
            "{name} contains a non-finite value at index {i}"
        )));
    }
    Ok(())
}

pub fn ensure_min_len(values: &[f64], required: usize) -> Result<(), DataError> {
    if values.len() < required {
        return Err(DataError::InsufficientData {
            required,
            found: values.len(),
        });
    }
    Ok(())
}

fn nonzero_variance(name: &str, values: &[f64]) -> Result<(f64, f64), DataError> {
    let m = mean(values).ok_or(DataError::InsufficientData { required: 1, found: 0 })?;
    let var = variance(values).unwrap_or(0.0);
    if !(var > 0.0) || !var.is_finite() {
        return Err(DataError::invalid(format!("{name} has zero variance")));
    }
    Ok((m, var))
}

/// Range of the normalized cumulative sum.
///
/// `s_i = Σ_{k≤i} (x_k − mean) / (N·σ)`, result `max(s) − min(s)`.
pub fn cusum_range(values: &[f64]) -> Result<f64, DataError> {
    let (m, var) = nonzero_variance("magnitude", values)?;
    let scale = values.len() as f64 * var.sqrt();

    let mut acc = 0.0;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        acc += (v - m) / scale;
        lo = lo.min(acc);
        hi = hi.max(acc);
    }
    Ok(hi - lo)
}

/// Von Neumann ratio: `Σ (x_{i+1} − x_i)² / ((N − 1)·var)`.
pub fn von_neumann_eta(values: &[f64]) -> Result<f64, DataError> {
    ensure_min_len(values, 2)?;
    let (_, var) = nonzero_variance("magnitude", values)?;
    let ss: f64 = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    Ok(ss / ((values.len() - 1) as f64 * var))
}

/// Biased sample skewness `m3 / m2^1.5`.
pub fn skewness(values: &[f64]) -> Result<f64, DataError> {
    let (m, var) = nonzero_variance("magnitude", values)?;
    let n = values.len() as f64;
    let m3: f64 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    Ok(m3 / var.powf(1.5))
}
