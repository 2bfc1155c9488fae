//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - light curves and their channels (`LightCurve`, `Channel`)
//! - extractor identities and parameters (`ExtractorId`, `Params`, `ParamValue`)
//! - feature outputs (`FeatureValue`, `FeatureMap`)

pub mod types;

pub use types::*;
