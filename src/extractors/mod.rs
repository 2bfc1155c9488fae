//! Feature extractors.
//!
//! An extractor is a named unit of computation that declares:
//!
//! - the light-curve channels it reads (`required_data`)
//! - the features it produces (`features`, non-empty)
//! - its configurable options with defaults (`params`)
//! - the extractors whose outputs it consumes (`dependencies`)
//!
//! and exposes a single pure `fit` operation. The built-in extractors form a
//! closed set ([`ExtractorKind`]); custom extractors implement [`Extractor`]
//! directly and are registered explicitly on a `Registry`.

pub mod basic;
pub mod fourier;
pub mod lomb_scargle;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Channel, ExtractorId, FeatureMap, FeatureValue, LightCurve, Params};
use crate::error::{ConfigError, DataError};
use crate::spectral::{LombScargle as LombScarglePeriodogram, SpectralEstimator};

pub use basic::*;
pub use fourier::FourierComponents;
pub use lomb_scargle::{LombScargle, fold_phase};

/// Static metadata of an extractor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub id: ExtractorId,
    pub required_data: Vec<Channel>,
    pub features: Vec<&'static str>,
    pub params: Params,
    pub dependencies: Vec<ExtractorId>,
}

/// Features already computed for the current light curve, restricted to the
/// outputs of the declared dependencies.
#[derive(Debug, Clone, Copy)]
pub struct Upstream<'a> {
    outputs: Option<&'a BTreeMap<ExtractorId, FeatureMap>>,
    dependencies: &'a [ExtractorId],
}

impl<'a> Upstream<'a> {
    pub fn new(outputs: &'a BTreeMap<ExtractorId, FeatureMap>, dependencies: &'a [ExtractorId]) -> Self {
        Self {
            outputs: Some(outputs),
            dependencies,
        }
    }

    /// No upstream features (extractors without dependencies).
    pub fn empty() -> Self {
        Self {
            outputs: None,
            dependencies: &[],
        }
    }

    pub fn get(&self, feature: &str) -> Option<&'a FeatureValue> {
        let outputs = self.outputs?;
        self.dependencies
            .iter()
            .filter_map(|dep| outputs.get(dep))
            .find_map(|features| features.get(feature))
    }

    /// A scalar upstream feature, or `InvalidData` if it is absent or not a scalar.
    pub fn scalar(&self, feature: &str) -> Result<f64, DataError> {
        self.get(feature)
            .and_then(FeatureValue::as_scalar)
            .ok_or_else(|| DataError::invalid(format!("upstream feature '{feature}' is not available")))
    }
}

/// Everything an extractor may read while fitting one light curve.
#[derive(Debug, Clone, Copy)]
pub struct FitInput<'a> {
    pub light_curve: &'a LightCurve,
    pub upstream: Upstream<'a>,
    pub params: &'a Params,
}

impl<'a> FitInput<'a> {
    pub fn new(light_curve: &'a LightCurve, upstream: Upstream<'a>, params: &'a Params) -> Self {
        Self {
            light_curve,
            upstream,
            params,
        }
    }

    pub fn channel(&self, channel: Channel) -> Result<&'a [f64], DataError> {
        self.light_curve.channel(channel)
    }
}

/// The extractor contract.
pub trait Extractor: Send + Sync {
    fn id(&self) -> ExtractorId;

    fn required_data(&self) -> &[Channel];

    /// Produced feature names, in output order.
    fn features(&self) -> &[&'static str];

    fn dependencies(&self) -> &[ExtractorId] {
        &[]
    }

    /// Declared options with their defaults.
    fn params(&self) -> Params {
        Params::new()
    }

    /// Check option values once, before any light curve is processed.
    ///
    /// `params` are the effective options (defaults overlaid with overrides).
    fn validate_params(&self, _params: &Params) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Compute exactly the declared features.
    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError>;

    fn descriptor(&self) -> Descriptor {
        Descriptor {
            id: self.id(),
            required_data: self.required_data().to_vec(),
            features: self.features().to_vec(),
            params: self.params(),
            dependencies: self.dependencies().to_vec(),
        }
    }
}

/// The built-in extractors.
#[derive(Clone)]
pub enum ExtractorKind {
    Amplitude(Amplitude),
    Mean(Mean),
    Std(Std),
    Skew(Skew),
    SmallKurtosis(SmallKurtosis),
    Rcs(Rcs),
    Meanvariance(Meanvariance),
    MaxSlope(MaxSlope),
    EtaE(EtaE),
    Color(Color),
    LombScargle(LombScargle),
    FourierComponents(FourierComponents),
}

impl ExtractorKind {
    /// Every built-in extractor, in registration order.
    pub fn all() -> Vec<ExtractorKind> {
        Self::all_with_estimator(Arc::new(LombScarglePeriodogram))
    }

    /// Built-ins with a custom spectral estimator for the period search.
    pub fn all_with_estimator(estimator: Arc<dyn SpectralEstimator>) -> Vec<ExtractorKind> {
        vec![
            ExtractorKind::Amplitude(Amplitude),
            ExtractorKind::Mean(Mean),
            ExtractorKind::Std(Std),
            ExtractorKind::Skew(Skew),
            ExtractorKind::SmallKurtosis(SmallKurtosis),
            ExtractorKind::Rcs(Rcs),
            ExtractorKind::Meanvariance(Meanvariance),
            ExtractorKind::MaxSlope(MaxSlope),
            ExtractorKind::EtaE(EtaE),
            ExtractorKind::Color(Color),
            ExtractorKind::LombScargle(LombScargle::with_estimator(estimator)),
            ExtractorKind::FourierComponents(FourierComponents),
        ]
    }

    fn as_extractor(&self) -> &dyn Extractor {
        match self {
            ExtractorKind::Amplitude(e) => e,
            ExtractorKind::Mean(e) => e,
            ExtractorKind::Std(e) => e,
            ExtractorKind::Skew(e) => e,
            ExtractorKind::SmallKurtosis(e) => e,
            ExtractorKind::Rcs(e) => e,
            ExtractorKind::Meanvariance(e) => e,
            ExtractorKind::MaxSlope(e) => e,
            ExtractorKind::EtaE(e) => e,
            ExtractorKind::Color(e) => e,
            ExtractorKind::LombScargle(e) => e,
            ExtractorKind::FourierComponents(e) => e,
        }
    }
}

impl Extractor for ExtractorKind {
    fn id(&self) -> ExtractorId {
        self.as_extractor().id()
    }

    fn required_data(&self) -> &[Channel] {
        self.as_extractor().required_data()
    }

    fn features(&self) -> &[&'static str] {
        self.as_extractor().features()
    }

    fn dependencies(&self) -> &[ExtractorId] {
        self.as_extractor().dependencies()
    }

    fn params(&self) -> Params {
        self.as_extractor().params()
    }

    fn validate_params(&self, params: &Params) -> Result<(), ConfigError> {
        self.as_extractor().validate_params(params)
    }

    fn fit(&self, input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
        self.as_extractor().fit(input)
    }
}

impl std::fmt::Debug for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExtractorKind").field(&self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn builtin_features_are_unique_and_non_empty() {
        let mut seen = BTreeSet::new();
        for ext in ExtractorKind::all() {
            assert!(!ext.features().is_empty(), "{} declares no features", ext.id());
            for f in ext.features() {
                assert!(seen.insert(*f), "feature {f} declared twice");
            }
        }
    }

    #[test]
    fn upstream_only_exposes_declared_dependencies() {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            ExtractorId::new("Mean"),
            FeatureMap::from([("Mean", FeatureValue::Scalar(2.0))]),
        );
        outputs.insert(
            ExtractorId::new("Std"),
            FeatureMap::from([("Std", FeatureValue::Scalar(0.5))]),
        );

        let deps = [ExtractorId::new("Mean")];
        let upstream = Upstream::new(&outputs, &deps);
        assert_eq!(upstream.scalar("Mean").unwrap(), 2.0);
        assert!(upstream.get("Std").is_none());
        assert!(Upstream::empty().scalar("Mean").is_err());
    }

    #[test]
    fn descriptor_mirrors_declarations() {
        let d = Meanvariance.descriptor();
        assert_eq!(d.id.as_str(), "Meanvariance");
        assert_eq!(d.features, vec!["Meanvariance"]);
        assert_eq!(d.dependencies, vec![ExtractorId::new("Mean"), ExtractorId::new("Std")]);
        assert_eq!(d.required_data, vec![Channel::Magnitude]);
    }
}
