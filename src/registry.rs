//! Explicit extractor registry.
//!
//! Extractors are registered by value and kept in registration order, which
//! is also the tie-break order of the execution plan.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::ExtractorId;
use crate::error::ConfigError;
use crate::extractors::{Descriptor, Extractor, ExtractorKind};
use crate::spectral::SpectralEstimator;

#[derive(Clone, Default)]
pub struct Registry {
    extractors: Vec<Arc<dyn Extractor>>,
    index: BTreeMap<ExtractorId, usize>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every built-in extractor.
    pub fn with_builtins() -> Self {
        Self::from_kinds(ExtractorKind::all())
    }

    /// Built-ins with the period search backed by `estimator`.
    pub fn with_builtins_and_estimator(estimator: Arc<dyn SpectralEstimator>) -> Self {
        Self::from_kinds(ExtractorKind::all_with_estimator(estimator))
    }

    fn from_kinds(kinds: Vec<ExtractorKind>) -> Self {
        let mut registry = Self::new();
        for kind in kinds {
            // Built-in ids are distinct.
            let id = kind.id();
            registry.index.insert(id, registry.extractors.len());
            registry.extractors.push(Arc::new(kind));
        }
        registry
    }

    pub fn register(&mut self, extractor: impl Extractor + 'static) -> Result<(), ConfigError> {
        self.register_arc(Arc::new(extractor))
    }

    pub fn register_arc(&mut self, extractor: Arc<dyn Extractor>) -> Result<(), ConfigError> {
        let id = extractor.id();
        if self.index.contains_key(&id) {
            return Err(ConfigError::DuplicateExtractor(id));
        }
        self.index.insert(id, self.extractors.len());
        self.extractors.push(extractor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    pub fn get(&self, id: ExtractorId) -> Option<&Arc<dyn Extractor>> {
        self.index.get(&id).map(|&i| &self.extractors[i])
    }

    /// Look up an extractor by its textual id (e.g. from the command line).
    pub fn find(&self, id: &str) -> Option<&Arc<dyn Extractor>> {
        self.extractors.iter().find(|e| e.id().as_str() == id)
    }

    /// Registration position of `id`.
    pub fn position(&self, id: ExtractorId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Extractors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Extractor>> {
        self.extractors.iter()
    }

    /// Ids of every extractor declaring `feature`, in registration order.
    pub fn producers(&self, feature: &str) -> Vec<ExtractorId> {
        self.extractors
            .iter()
            .filter(|e| e.features().iter().any(|f| *f == feature))
            .map(|e| e.id())
            .collect()
    }

    pub fn descriptors(&self) -> Vec<Descriptor> {
        self.extractors.iter().map(|e| e.descriptor()).collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.extractors.iter().map(|e| e.id())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, FeatureMap};
    use crate::error::DataError;
    use crate::extractors::{FitInput, Mean};

    struct Custom;

    impl Extractor for Custom {
        fn id(&self) -> ExtractorId {
            ExtractorId::new("Custom")
        }
        fn required_data(&self) -> &[Channel] {
            &[Channel::Magnitude]
        }
        fn features(&self) -> &[&'static str] {
            &["Mean"]
        }
        fn fit(&self, _input: &FitInput<'_>) -> Result<FeatureMap, DataError> {
            Ok(FeatureMap::new())
        }
    }

    #[test]
    fn builtins_keep_registration_order() {
        let registry = Registry::with_builtins();
        let ids: Vec<&str> = registry.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids.first(), Some(&"Amplitude"));
        assert_eq!(ids.last(), Some(&"FourierComponents"));
        assert_eq!(registry.position(ExtractorId::new("Amplitude")), Some(0));
        assert!(registry.find("LombScargle").is_some());
        assert!(registry.find("Nope").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = Registry::new();
        registry.register(Mean).unwrap();
        let err = registry.register(Mean).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateExtractor(ExtractorId::new("Mean")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn producers_lists_every_declaring_extractor() {
        let mut registry = Registry::with_builtins();
        assert_eq!(registry.producers("PeriodLS"), vec![ExtractorId::new("LombScargle")]);
        registry.register(Custom).unwrap();
        assert_eq!(
            registry.producers("Mean"),
            vec![ExtractorId::new("Mean"), ExtractorId::new("Custom")]
        );
        assert!(registry.producers("Unknown").is_empty());
    }
}
