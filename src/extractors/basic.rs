//! Basic descriptive extractors.
//!
//! Each of these reads the magnitude channel (and time or a second band where
//! noted) and produces one scalar feature.

use crate::domain::{Channel, ExtractorId, FeatureMap, FeatureValue};
use crate::error::DataError;
use crate::math::{
    cusum_range, ensure_finite, ensure_min_len, mean, median_sorted, sample_std_dev, skewness, sorted,
    std_dev, variance,
};

use super::{Extractor, FitInput};

const MAGNITUDE: &[Channel] = &[Channel::Magnitude];
const TIME_MAGNITUDE: &[Channel] = &[Channel::Time, Channel::Magnitude];

fn single(name: &'static str, value: f64) -> FeatureMap {
    FeatureMap::from([(name, FeatureValue::Scalar(value))])
}

fn magnitude<'a>(input: &FitInput<'a>, required: usize) -> Result<&'a [f64], DataError> {
    let mag = input.channel(Channel::Magnitude)?;
    ensure_min_len(mag, required)?;
    ensure_finite("magnitude", mag)?;
    Ok(mag)
}

fn time_magnitude<'a>(input: &FitInput<'a>, required: usize) -> Result<(&'a [f64], &'a [f64]), DataError> {
    let time = input.channel(Channel::Time)?;
    ensure_finite("time", time)?;
    Ok((time, magnitude(input, required)?))
}

/// Half the difference between the medians of the brightest and faintest 5%.
#[derive(Debug, Clone, Copy, Default)]
pub struct Amplitude;

impl Extractor for Amplitude {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Amplitude")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Amplitude"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let sorted = sorted(magnitude(input, 1)?);
        let tail = (0.05 * sorted.len() as f64).ceil() as usize;
        let low = median_sorted(&sorted[..tail]).unwrap_or(0.0);
        let high = median_sorted(&sorted[sorted.len() - tail..]).unwrap_or(0.0);
        Ok(single("Amplitude", (high - low) / 2.0))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Extractor for Mean {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Mean")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Mean"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let mag = magnitude(input, 1)?;
        Ok(single("Mean", mean(mag).unwrap_or(0.0)))
    }
}

/// Population standard deviation of the magnitudes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Std;

impl Extractor for Std {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Std")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Std"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let mag = magnitude(input, 1)?;
        Ok(single("Std", std_dev(mag).unwrap_or(0.0)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Skew;

impl Extractor for Skew {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Skew")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Skew"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let mag = magnitude(input, 2)?;
        Ok(single("Skew", skewness(mag)?))
    }
}

/// Small-sample (unbiased) excess kurtosis.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallKurtosis;

impl Extractor for SmallKurtosis {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("SmallKurtosis")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["SmallKurtosis"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let mag = magnitude(input, 4)?;
        let m = mean(mag).unwrap_or(0.0);
        let sigma = sample_std_dev(mag).unwrap_or(0.0);
        if !(sigma > 0.0) {
            return Err(DataError::invalid("magnitude has zero variance"));
        }

        let n = mag.len() as f64;
        let s: f64 = mag.iter().map(|v| ((v - m) / sigma).powi(4)).sum();
        let c1 = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
        let c2 = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
        Ok(single("SmallKurtosis", c1 * s - c2))
    }
}

/// Range of the cumulative sum, in time order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rcs;

impl Extractor for Rcs {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Rcs")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Rcs"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let mag = magnitude(input, 2)?;
        Ok(single("Rcs", cusum_range(mag)?))
    }
}

/// Variability index `Std / Mean`, computed from the `Mean` and `Std` extractors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Meanvariance;

impl Extractor for Meanvariance {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Meanvariance")
    }

    fn required_data(&self) -> &[Channel] {
        MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Meanvariance"]
    }

    fn dependencies(&self) -> &[ExtractorId] {
        const DEPS: &[ExtractorId] = &[ExtractorId::new("Mean"), ExtractorId::new("Std")];
        DEPS
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let m = input.upstream.scalar("Mean")?;
        let s = input.upstream.scalar("Std")?;
        if m == 0.0 {
            return Err(DataError::invalid("mean magnitude is zero"));
        }
        Ok(single("Meanvariance", s / m))
    }
}

/// Largest absolute slope between consecutive observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxSlope;

impl Extractor for MaxSlope {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("MaxSlope")
    }

    fn required_data(&self) -> &[Channel] {
        TIME_MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["MaxSlope"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let (time, mag) = time_magnitude(input, 2)?;

        let mut best = 0.0_f64;
        for i in 1..time.len() {
            let dt = (time[i] - time[i - 1]).abs();
            if dt == 0.0 {
                return Err(DataError::invalid(format!("duplicate timestamp at index {i}")));
            }
            best = best.max((mag[i] - mag[i - 1]).abs() / dt);
        }
        Ok(single("MaxSlope", best))
    }
}

/// Von Neumann ratio weighted by the sampling gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct EtaE;

impl Extractor for EtaE {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Eta_e")
    }

    fn required_data(&self) -> &[Channel] {
        TIME_MAGNITUDE
    }

    fn features(&self) -> &[&'static str] {
        &["Eta_e"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let (time, mag) = time_magnitude(input, 2)?;
        let var = variance(mag).unwrap_or(0.0);
        if !(var > 0.0) {
            return Err(DataError::invalid("magnitude has zero variance"));
        }

        let mut w = Vec::with_capacity(time.len() - 1);
        for i in 1..time.len() {
            let dt = time[i] - time[i - 1];
            if dt == 0.0 {
                return Err(DataError::invalid(format!("duplicate timestamp at index {i}")));
            }
            w.push(1.0 / (dt * dt));
        }

        let n = time.len() as f64;
        let w_mean = mean(&w).unwrap_or(0.0);
        let s1: f64 = w
            .iter()
            .zip(mag.windows(2))
            .map(|(wi, pair)| wi * (pair[1] - pair[0]).powi(2))
            .sum();
        let s2: f64 = w.iter().sum();
        let span = time[time.len() - 1] - time[0];

        Ok(single("Eta_e", w_mean * span * span * s1 / (var * s2 * n * n)))
    }
}

/// Mean colour between the two observed bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct Color;

impl Extractor for Color {
    fn id(&self) -> ExtractorId {
        ExtractorId::new("Color")
    }

    fn required_data(&self) -> &[Channel] {
        &[Channel::Magnitude, Channel::Magnitude2]
    }

    fn features(&self) -> &[&'static str] {
        &["Color"]
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        let mag = magnitude(input, 1)?;
        let mag2 = input.channel(Channel::Magnitude2)?;
        ensure_finite("magnitude2", mag2)?;
        let color = mean(mag).unwrap_or(0.0) - mean(mag2).unwrap_or(0.0);
        Ok(single("Color", color))
    }
}
