//! Feature space construction.
//!
//! Selection, dependency resolution, parameter checks and pool setup all
//! happen in `build`, so a built space never fails for configuration reasons.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Channel, ExtractorId, ParamOverrides};
use crate::error::ConfigError;
use crate::plan::ExecutionPlan;
use crate::registry::Registry;

use super::{ExecutionStrategy, FeatureSpace, OutputColumn};

/// Configures and validates a [`FeatureSpace`].
///
/// Selection rules:
///
/// - `extractors` restricts the candidates to the named extractor ids
/// - `data` restricts the candidates to extractors whose required channels
///   are all available
/// - `only` selects the candidates producing the named features; each must be
///   produced by exactly one candidate
///
/// Without `only`, every candidate is selected. Dependencies are always
/// pulled in, regardless of `data` and `extractors`.
#[derive(Debug, Clone)]
pub struct FeatureSpaceBuilder {
    registry: Registry,
    only: Option<Vec<String>>,
    extractors: Option<Vec<String>>,
    data: Option<Vec<Channel>>,
    params: ParamOverrides,
    strategy: ExecutionStrategy,
}

impl FeatureSpaceBuilder {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            only: None,
            extractors: None,
            data: None,
            params: ParamOverrides::new(),
            strategy: ExecutionStrategy::Sequential,
        }
    }

    pub fn only<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn extractors<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extractors = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn data(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.data = Some(channels.into_iter().collect());
        self
    }

    pub fn params(mut self, overrides: ParamOverrides) -> Self {
        self.params = overrides;
        self
    }

    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> Result<FeatureSpace, ConfigError> {
        let candidates = self.candidates()?;

        let selected: Vec<ExtractorId> = match &self.only {
            Some(features) => {
                let mut roots = Vec::new();
                for feature in features {
                    let producer = self.unique_producer(feature, &candidates)?;
                    if !roots.contains(&producer) {
                        roots.push(producer);
                    }
                }
                roots
            }
            None => candidates,
        };

        let plan = ExecutionPlan::build(&self.registry, &selected, &self.params)?;

        let requested: Option<BTreeSet<&str>> = self
            .only
            .as_ref()
            .map(|features| features.iter().map(String::as_str).collect());
        let columns: Vec<OutputColumn> = plan
            .steps()
            .iter()
            .filter(|step| step.selected)
            .flat_map(|step| {
                let id = step.id();
                step.extractor
                    .features()
                    .iter()
                    .map(move |&feature| OutputColumn { extractor: id, feature })
            })
            .filter(|col| requested.as_ref().is_none_or(|r| r.contains(col.feature)))
            .collect();

        let pool = match self.strategy {
            ExecutionStrategy::Parallel { threads: Some(n) } => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))?,
            )),
            _ => None,
        };

        debug!(
            extractors = plan.len(),
            features = columns.len(),
            strategy = ?self.strategy,
            "feature space ready"
        );

        Ok(FeatureSpace {
            plan,
            columns,
            strategy: self.strategy,
            pool,
        })
    }

    /// Registered extractors passing the `extractors` and `data` filters, in
    /// registration order.
    fn candidates(&self) -> Result<Vec<ExtractorId>, ConfigError> {
        let mut ids: Vec<ExtractorId> = match &self.extractors {
            Some(names) => {
                let mut ids = Vec::with_capacity(names.len());
                for name in names {
                    let id = self
                        .registry
                        .find(name)
                        .map(|e| e.id())
                        .ok_or_else(|| ConfigError::UnknownExtractor(name.clone()))?;
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ids.sort_by_key(|id| self.registry.position(*id));
                ids
            }
            None => self.registry.iter().map(|e| e.id()).collect(),
        };

        if let Some(channels) = &self.data {
            ids.retain(|id| {
                self.registry
                    .get(*id)
                    .is_some_and(|e| e.required_data().iter().all(|c| channels.contains(c)))
            });
        }

        if ids.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        Ok(ids)
    }

    fn unique_producer(&self, feature: &str, candidates: &[ExtractorId]) -> Result<ExtractorId, ConfigError> {
        let producers: Vec<ExtractorId> = self
            .registry
            .producers(feature)
            .into_iter()
            .filter(|id| candidates.contains(id))
            .collect();
        if producers.len() > 1 {
            return Err(ConfigError::AmbiguousFeature {
                feature: feature.to_string(),
                extractors: producers,
            });
        }
        producers
            .first()
            .copied()
            .ok_or_else(|| ConfigError::UnknownFeature(feature.to_string()))
    }
}
