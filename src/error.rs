//! Error types for indicators and suites

use thiserror::Error;

/// Errors raised by a single indicator collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("non-finite {what} in derived state")]
    NonFinite { what: &'static str },
}

impl IndicatorError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a suite, one variant per failure class.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Bad thresholds; raised before any collaborator is built
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to create {indicator}: {source}")]
    Construction {
        indicator: &'static str,
        #[source]
        source: IndicatorError,
    },

    /// Shape or range violation, rejected before any mutation
    #[error("invalid input: {0}")]
    InvalidSample(String),

    #[error("failed to add sample to {indicator}: {source}")]
    Ingestion {
        indicator: &'static str,
        #[source]
        source: IndicatorError,
    },

    #[error("failed to query {indicator}: {source}")]
    Query {
        indicator: &'static str,
        #[source]
        source: IndicatorError,
    },
}

impl SuiteError {
    /// Collaborator the error originated from, if any
    pub fn indicator(&self) -> Option<&'static str> {
        match self {
            SuiteError::Construction { indicator, .. }
            | SuiteError::Ingestion { indicator, .. }
            | SuiteError::Query { indicator, .. } => Some(indicator),
            SuiteError::Config(_) | SuiteError::InvalidSample(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SuiteError>;
