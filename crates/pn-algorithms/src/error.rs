//! Error types for transport algorithms.

use pn_core::PnError;
use pn_model::PhaseError;
use pn_network::NetworkError;
use thiserror::Error;

/// Errors that can occur while configuring or running a transport algorithm.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Invalid configuration: {what}")]
    InvalidConfiguration { what: String },

    #[error("Pore index {index} out of range (network has {len} pores)")]
    PoreIndex { index: usize, len: usize },

    #[error("Expected {expected} values for {what}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Singular system: {what}")]
    SingularMatrix { what: String },

    #[error("Boundary condition error: {what}")]
    BoundaryCondition { what: String },

    #[error("Phase error: {0}")]
    Phase(#[from] PhaseError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Core error: {0}")]
    Core(#[from] PnError),
}

pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        Self::InvalidConfiguration { what: what.into() }
    }

    pub(crate) fn bc(what: impl Into<String>) -> Self {
        Self::BoundaryCondition { what: what.into() }
    }

    pub(crate) fn singular(what: impl Into<String>) -> Self {
        Self::SingularMatrix { what: what.into() }
    }
}

impl From<TransportError> for PnError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Core(inner) => inner,
            TransportError::Phase(inner) => inner.into(),
            TransportError::Network(inner) => inner.into(),
            TransportError::PoreIndex { index, len } => PnError::IndexOob {
                what: "pore",
                index,
                len,
            },
            TransportError::LengthMismatch {
                what,
                expected,
                actual,
            } => PnError::LengthMismatch {
                what,
                expected,
                actual,
            },
            other => PnError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
