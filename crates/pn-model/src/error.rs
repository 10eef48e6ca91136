//! Property resolution errors.

use pn_core::PnError;
use pn_network::NetworkError;
use thiserror::Error;

/// Result type for phase and provider operations.
pub type PhaseResult<T> = Result<T, PhaseError>;

/// Errors raised while storing or resolving properties.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    /// Neither the object nor one of its providers carries the key.
    #[error("Property '{key}' not found on {object}")]
    MissingProperty { key: String, object: String },

    /// Providers leave part of the index space uncovered and the gap
    /// policy forbids filling.
    #[error("Property '{key}' is undefined at {gaps} locations ({:.1}% of the domain)", .fraction * 100.0)]
    IncompleteCoverage {
        key: String,
        gaps: usize,
        fraction: f64,
    },

    /// The phase refuses to shadow a provider-owned property.
    #[error("Property '{key}' is already provided by '{provider}'")]
    PropertyConflict { key: String, provider: String },

    #[error("Provider '{name}' is already registered on {object}")]
    DuplicateProvider { name: String, object: String },

    #[error("Provider '{name}' is not registered on {object}")]
    UnknownProvider { name: String, object: String },

    #[error("Model for '{key}' failed: {what}")]
    Model { key: String, what: String },

    #[error(transparent)]
    Core(#[from] PnError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl From<PhaseError> for PnError {
    fn from(err: PhaseError) -> Self {
        match err {
            PhaseError::Core(inner) => inner,
            other => PnError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
