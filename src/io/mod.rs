//! Input/output helpers.
//!
//! - CSV light-curve ingest (`ingest`)
//! - parameter override files (`params`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;
pub mod params;

pub use export::*;
pub use ingest::*;
pub use params::*;
