//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed through the extraction engine without copies of the raw data
//! - exported to JSON/CSV
//! - parsed from CLI flags and parameter files

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A named observation channel of a light curve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Time,
    Magnitude,
    Error,
    Magnitude2,
    Time2,
    Error2,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Time,
        Channel::Magnitude,
        Channel::Error,
        Channel::Magnitude2,
        Channel::Time2,
        Channel::Error2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Time => "time",
            Channel::Magnitude => "magnitude",
            Channel::Error => "error",
            Channel::Magnitude2 => "magnitude2",
            Channel::Time2 => "time2",
            Channel::Error2 => "error2",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown channel '{s}'"))
    }
}

/// Identity of an extractor (its registry key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ExtractorId(&'static str);

impl ExtractorId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ExtractorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An irregularly sampled light curve: named, equal-length numeric channels.
///
/// Index `i` of every channel is the same observation. The struct is immutable
/// once built; extractors only ever receive shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct LightCurve {
    id: Option<String>,
    channels: BTreeMap<Channel, Vec<f64>>,
    len: usize,
}

impl LightCurve {
    /// Build a light curve from `(channel, values)` pairs.
    ///
    /// Fails when no channel is given or when the channel lengths differ.
    pub fn new(
        channels: impl IntoIterator<Item = (Channel, Vec<f64>)>,
    ) -> Result<Self, DataError> {
        let channels: BTreeMap<Channel, Vec<f64>> = channels.into_iter().collect();
        let Some(len) = channels.values().next().map(Vec::len) else {
            return Err(DataError::invalid("light curve has no channels"));
        };
        if let Some((channel, values)) = channels.iter().find(|(_, v)| v.len() != len) {
            return Err(DataError::invalid(format!(
                "channel '{channel}' has {} values, expected {len}",
                values.len()
            )));
        }
        Ok(Self {
            id: None,
            channels,
            len,
        })
    }

    /// Convenience constructor for the common `(time, magnitude)` case.
    pub fn from_time_magnitude(time: Vec<f64>, magnitude: Vec<f64>) -> Result<Self, DataError> {
        Self::new([(Channel::Time, time), (Channel::Magnitude, magnitude)])
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn has(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn get(&self, channel: Channel) -> Option<&[f64]> {
        self.channels.get(&channel).map(Vec::as_slice)
    }

    /// Channel values, or `MissingData` if absent.
    pub fn channel(&self, channel: Channel) -> Result<&[f64], DataError> {
        self.get(channel).ok_or(DataError::MissingData(channel))
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.channels.keys().copied()
    }
}

/// A computed feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Scalar(f64),
    /// Small fixed-size arrays such as per-harmonic coefficients.
    Vector(Vec<f64>),
}

impl FeatureValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            FeatureValue::Scalar(v) => Some(*v),
            FeatureValue::Vector(_) => None,
        }
    }

    /// Values flattened in order (a scalar yields one element).
    pub fn as_slice(&self) -> &[f64] {
        match self {
            FeatureValue::Scalar(v) => std::slice::from_ref(v),
            FeatureValue::Vector(values) => values,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Scalar(value)
    }
}

impl From<Vec<f64>> for FeatureValue {
    fn from(values: Vec<f64>) -> Self {
        FeatureValue::Vector(values)
    }
}

/// Output of one extractor fit: feature name -> value.
pub type FeatureMap = BTreeMap<&'static str, FeatureValue>;

/// An extractor parameter value (JSON-compatible scalar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "\"{v}\""),
        }
    }
}

/// Resolved parameters of one extractor: declared defaults merged with overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric parameter. `null` or absent yields `None`.
    pub fn f64(&self, name: &str) -> Result<Option<f64>, DataError> {
        match self.0.get(name) {
            None | Some(ParamValue::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| DataError::invalid(format!("parameter '{name}' must be a number, got {v}"))),
        }
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, DataError> {
        Ok(self.f64(name)?.unwrap_or(default))
    }

    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize, DataError> {
        match self.0.get(name) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Int(v)) if *v >= 0 => Ok(*v as usize),
            Some(v) => Err(DataError::invalid(format!(
                "parameter '{name}' must be a non-negative integer, got {v}"
            ))),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, DataError> {
        match self.0.get(name) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(v) => Err(DataError::invalid(format!("parameter '{name}' must be a boolean, got {v}"))),
        }
    }

    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str, DataError> {
        match self.0.get(name) {
            None | Some(ParamValue::Null) => Ok(default),
            Some(ParamValue::Text(v)) => Ok(v),
            Some(v) => Err(DataError::invalid(format!("parameter '{name}' must be a string, got {v}"))),
        }
    }
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-extractor parameter overrides: extractor id -> option name -> value.
pub type ParamOverrides = BTreeMap<String, Params>;
