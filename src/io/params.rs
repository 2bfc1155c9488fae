//! Extractor parameter override files.
//!
//! JSON object keyed by extractor id, each value an object of option values:
//!
//! ```json
//! { "LombScargle": { "samples_per_peak": 10, "normalization": "psd" } }
//! ```
//!
//! Nothing is validated here beyond the shape; `FeatureSpaceBuilder::build`
//! rejects unknown extractors, unknown options and invalid values.

use std::fs;
use std::path::Path;

use crate::domain::ParamOverrides;
use crate::error::AppError;

pub fn load_param_overrides(path: &Path) -> Result<ParamOverrides, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read parameter file '{}': {e}", path.display())))?;
    parse_param_overrides(&text).map_err(|e| AppError::new(2, format!("{}: {e}", path.display())))
}

pub fn parse_param_overrides(text: &str) -> Result<ParamOverrides, AppError> {
    serde_json::from_str(text).map_err(|e| AppError::new(2, format!("Invalid parameter JSON: {e}")))
}
