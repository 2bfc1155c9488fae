//! Error types.
//!
//! The library reports three families of errors:
//!
//! - [`ConfigError`]: raised once while building a `FeatureSpace`, before any data is read
//! - [`DataError`]: raised by an extractor for one light curve (missing channel, too few
//!   points, non-finite or degenerate values)
//! - [`ExtractionError`]: a [`DataError`] attributed to a light curve and extractor, or a
//!   contract violation by an extractor implementation
//!
//! The binary converts all of them into [`AppError`], which carries a process exit code.

use thiserror::Error;

use crate::domain::{Channel, ExtractorId};

/// Configuration errors surfaced at `FeatureSpace` construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Dependency cycle between extractors: {}", join_ids(.cycle))]
    DependencyCycle { cycle: Vec<ExtractorId> },

    #[error("Unknown feature '{0}': no registered extractor produces it")]
    UnknownFeature(String),

    #[error("Feature '{feature}' is declared by more than one extractor: {}", join_ids(.extractors))]
    AmbiguousFeature {
        feature: String,
        extractors: Vec<ExtractorId>,
    },

    #[error("Unknown extractor '{0}'")]
    UnknownExtractor(String),

    #[error("Extractor '{extractor}' has no parameter '{param}'")]
    UnknownParam { extractor: String, param: String },

    #[error("Invalid value for parameter '{param}' of extractor '{extractor}': {message}")]
    InvalidParam {
        extractor: String,
        param: String,
        message: String,
    },

    #[error("Extractor '{0}' is registered twice")]
    DuplicateExtractor(ExtractorId),

    #[error("Selection resolved to no extractors")]
    EmptySelection,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Per-light-curve data errors raised while fitting an extractor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("missing required channel '{0}'")]
    MissingData(Channel),

    #[error("insufficient data: need at least {required} observations, got {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl ConfigError {
    /// An `InvalidParam` carrying the message of the data error the value produced.
    pub fn invalid_param(extractor: impl Into<String>, param: impl Into<String>, source: DataError) -> Self {
        let message = match source {
            DataError::InvalidData(message) => message,
            other => other.to_string(),
        };
        ConfigError::InvalidParam {
            extractor: extractor.into(),
            param: param.into(),
            message,
        }
    }
}

impl DataError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DataError::InvalidData(message.into())
    }

    /// Short machine-friendly label of the error kind (used in reports/exports).
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::MissingData(_) => "missing_data",
            DataError::InsufficientData { .. } => "insufficient_data",
            DataError::InvalidData(_) => "invalid_data",
        }
    }
}

/// Failure of one light curve's extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("light curve {light_curve}: extractor {extractor}: {source}")]
    Data {
        light_curve: String,
        extractor: ExtractorId,
        #[source]
        source: DataError,
    },

    /// An extractor returned a feature set different from its declaration.
    ///
    /// This is a programming error in the extractor; batch extraction does not
    /// isolate it per item.
    #[error(
        "extractor {extractor} violated its contract: declared [{}], produced [{}]",
        .expected.join(", "),
        .produced.join(", ")
    )]
    ContractViolation {
        extractor: ExtractorId,
        expected: Vec<String>,
        produced: Vec<String>,
    },
}

impl ExtractionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Data { source, .. } => source.kind(),
            ExtractionError::ContractViolation { .. } => "contract_violation",
        }
    }

    /// The underlying data error, if this is a per-item data failure.
    pub fn data_error(&self) -> Option<&DataError> {
        match self {
            ExtractionError::Data { source, .. } => Some(source),
            ExtractionError::ContractViolation { .. } => None,
        }
    }
}

fn join_ids(ids: &[ExtractorId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(" -> ")
}

/// Error surfaced by the `feets` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, format!("Configuration error: {err}"))
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::new(3, format!("Data error: {err}"))
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        let code = match err {
            ExtractionError::Data { .. } => 3,
            ExtractionError::ContractViolation { .. } => 4,
        };
        AppError::new(code, format!("Extraction failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_extractors_in_order() {
        let err = ConfigError::DependencyCycle {
            cycle: vec![ExtractorId::new("A"), ExtractorId::new("B"), ExtractorId::new("A")],
        };
        assert_eq!(err.to_string(), "Dependency cycle between extractors: A -> B -> A");
    }

    #[test]
    fn extraction_error_keeps_data_kind() {
        let err = ExtractionError::Data {
            light_curve: "#3".to_string(),
            extractor: ExtractorId::new("LombScargle"),
            source: DataError::InsufficientData { required: 2, found: 1 },
        };
        assert_eq!(err.kind(), "insufficient_data");
        assert!(err.to_string().contains("#3"));
        assert_eq!(AppError::from(err).exit_code(), 3);
    }
}
