//! `feets` library crate.
//!
//! Feature extraction for astronomical light curves. The binary (`feets`) is a
//! thin wrapper around this library so that:
//!
//! - the extraction engine is testable without spawning processes
//! - extractors and the orchestrator are reusable from other tools
//!
//! Entry points:
//!
//! - [`registry::Registry`]: the table of known extractors
//! - [`space::FeatureSpace`]: selection, execution plan, single and batch extraction
//! - [`spectral::SpectralEstimator`]: periodogram interface used by the period search

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod extractors;
pub mod io;
pub mod math;
pub mod plan;
pub mod plot;
pub mod registry;
pub mod report;
pub mod space;
pub mod spectral;

pub use domain::{Channel, FeatureValue, LightCurve};
pub use error::{ConfigError, DataError, ExtractionError};
pub use registry::Registry;
pub use space::{BatchResult, ExecutionStrategy, FeatureResult, FeatureSpace, FeatureSpaceBuilder};
