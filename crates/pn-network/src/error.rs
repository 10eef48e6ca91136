//! Network-specific error types.

use pn_core::PnError;
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Network construction and query errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A throat refers to a pore that doesn't exist.
    #[error("Throat {throat} refers to non-existent pore {pore} (network has {num_pores} pores)")]
    InvalidPoreRef {
        throat: usize,
        pore: usize,
        num_pores: usize,
    },

    #[error("Throat {throat} connects pore {pore} to itself")]
    SelfLoop { throat: usize, pore: usize },

    /// Two throats connect the same pair of pores.
    #[error("Throat {throat} duplicates the connection of throat {other}")]
    DuplicateThroat { throat: usize, other: usize },

    #[error("Label '{label}' not found on network")]
    UnknownLabel { label: String },

    /// Underlying property store rejected an operation.
    #[error("Store error: {0}")]
    Store(#[from] PnError),
}

impl From<NetworkError> for PnError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Store(inner) => inner,
            other => PnError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
