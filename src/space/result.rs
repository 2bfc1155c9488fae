//! Extraction results for single light curves and batches.

use serde::Serialize;

use crate::domain::FeatureValue;
use crate::error::ExtractionError;

/// Features of one light curve, in the feature space's output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureResult {
    pub names: Vec<&'static str>,
    pub values: Vec<FeatureValue>,
}

impl FeatureResult {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        self.names.iter().copied().zip(self.values.iter())
    }
}

/// One row per input light curve, in input order.
///
/// A row is either the feature values (aligned with `names`) or the data
/// error that stopped that light curve.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub names: Vec<&'static str>,
    pub rows: Vec<Result<Vec<FeatureValue>, ExtractionError>>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(index, values)` of every successful row.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &[FeatureValue])> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.as_ref().ok().map(|v| (i, v.as_slice())))
    }

    /// `(index, error)` of every failed row.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ExtractionError)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.as_ref().err().map(|e| (i, e)))
    }

    /// Row `index` as a [`FeatureResult`], if it succeeded.
    pub fn result(&self, index: usize) -> Option<FeatureResult> {
        let values = self.rows.get(index)?.as_ref().ok()?;
        Some(FeatureResult {
            names: self.names.clone(),
            values: values.clone(),
        })
    }
}
