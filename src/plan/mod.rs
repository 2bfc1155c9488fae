//! Execution planning.
//!
//! Turns a set of selected extractors into an ordered list of steps:
//! dependencies are pulled in transitively, ordered topologically (ties by
//! registration order), and each step carries its effective parameters
//! (declared defaults overlaid with user overrides), checked by the extractor
//! before any light curve is seen.

pub mod graph;

pub use graph::*;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::domain::{ExtractorId, ParamOverrides, Params};
use crate::error::ConfigError;
use crate::extractors::Extractor;
use crate::registry::Registry;

/// One extractor invocation in plan order.
#[derive(Clone)]
pub struct PlanStep {
    pub extractor: Arc<dyn Extractor>,
    pub params: Params,
    /// False for extractors that only run to feed a dependent.
    pub selected: bool,
}

impl PlanStep {
    pub fn id(&self) -> ExtractorId {
        self.extractor.id()
    }
}

impl std::fmt::Debug for PlanStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStep")
            .field("id", &self.id())
            .field("params", &self.params)
            .field("selected", &self.selected)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn build(
        registry: &Registry,
        selected: &[ExtractorId],
        overrides: &ParamOverrides,
    ) -> Result<Self, ConfigError> {
        if selected.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        validate_overrides(registry, overrides)?;

        let graph = resolve(registry, selected)?;
        let order = graph.topological_order()?;
        let selected: BTreeSet<ExtractorId> = selected.iter().copied().collect();

        let mut steps = Vec::with_capacity(order.len());
        for id in order {
            let extractor = registry
                .get(id)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownExtractor(id.to_string()))?;
            let params = effective_params(extractor.as_ref(), overrides.get(id.as_str()));
            extractor.validate_params(&params)?;
            steps.push(PlanStep {
                extractor,
                params,
                selected: selected.contains(&id),
            });
        }

        check_unique_features(&steps)?;

        debug!(
            plan = ?steps.iter().map(PlanStep::id).collect::<Vec<_>>(),
            "execution plan built"
        );
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn ids(&self) -> Vec<ExtractorId> {
        self.steps.iter().map(PlanStep::id).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Every override must name a registered extractor and one of its declared options.
fn validate_overrides(registry: &Registry, overrides: &ParamOverrides) -> Result<(), ConfigError> {
    for (name, params) in overrides {
        let extractor = registry
            .find(name)
            .ok_or_else(|| ConfigError::UnknownExtractor(name.clone()))?;
        let declared = extractor.params();
        if let Some((param, _)) = params.iter().find(|(param, _)| !declared.contains(param)) {
            return Err(ConfigError::UnknownParam {
                extractor: name.clone(),
                param: param.to_string(),
            });
        }
    }
    Ok(())
}

fn effective_params(extractor: &dyn Extractor, overrides: Option<&Params>) -> Params {
    let mut params = extractor.params();
    if let Some(overrides) = overrides {
        for (name, value) in overrides.iter() {
            params.insert(name, value.clone());
        }
    }
    params
}

/// Two active extractors may not declare the same feature.
fn check_unique_features(steps: &[PlanStep]) -> Result<(), ConfigError> {
    let mut producers: BTreeMap<&'static str, Vec<ExtractorId>> = BTreeMap::new();
    for step in steps {
        for &feature in step.extractor.features() {
            producers.entry(feature).or_default().push(step.id());
        }
    }
    match producers.into_iter().find(|(_, ids)| ids.len() > 1) {
        Some((feature, extractors)) => Err(ConfigError::AmbiguousFeature {
            feature: feature.to_string(),
            extractors,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamValue;

    #[test]
    fn dependency_only_steps_are_not_selected() {
        let registry = Registry::with_builtins();
        let plan = ExecutionPlan::build(
            &registry,
            &[ExtractorId::new("Meanvariance")],
            &ParamOverrides::new(),
        )
        .unwrap();

        assert_eq!(
            plan.ids(),
            vec![ExtractorId::new("Mean"), ExtractorId::new("Std"), ExtractorId::new("Meanvariance")]
        );
        let selected: Vec<bool> = plan.steps().iter().map(|s| s.selected).collect();
        assert_eq!(selected, vec![false, false, true]);
    }

    #[test]
    fn overrides_are_merged_over_defaults() {
        let registry = Registry::with_builtins();
        let mut overrides = ParamOverrides::new();
        overrides.insert(
            "LombScargle".to_string(),
            Params::new().with("samples_per_peak", ParamValue::Int(10)),
        );
        let plan = ExecutionPlan::build(&registry, &[ExtractorId::new("LombScargle")], &overrides).unwrap();

        let params = &plan.steps()[0].params;
        assert_eq!(params.get("samples_per_peak"), Some(&ParamValue::Int(10)));
        assert_eq!(params.get("nyquist_factor"), Some(&ParamValue::Float(5.0)));
    }

    #[test]
    fn unknown_override_targets_are_rejected() {
        let registry = Registry::with_builtins();
        let roots = [ExtractorId::new("Mean")];

        let mut overrides = ParamOverrides::new();
        overrides.insert("Mean".to_string(), Params::new().with("window", ParamValue::Int(3)));
        assert_eq!(
            ExecutionPlan::build(&registry, &roots, &overrides).unwrap_err(),
            ConfigError::UnknownParam {
                extractor: "Mean".to_string(),
                param: "window".to_string()
            }
        );

        let mut overrides = ParamOverrides::new();
        overrides.insert("Nope".to_string(), Params::new());
        assert_eq!(
            ExecutionPlan::build(&registry, &roots, &overrides).unwrap_err(),
            ConfigError::UnknownExtractor("Nope".to_string())
        );
    }

    #[test]
    fn empty_selection_is_rejected() {
        let registry = Registry::with_builtins();
        assert_eq!(
            ExecutionPlan::build(&registry, &[], &ParamOverrides::new()).unwrap_err(),
            ConfigError::EmptySelection
        );
    }
}
