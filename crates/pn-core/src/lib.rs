//! pn-core: stable foundation for pnflow.
//!
//! Contains:
//! - numeric (Real + float helpers)
//! - store (domain-qualified property arrays and label masks)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod store;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PnError, PnResult};
pub use numeric::*;
pub use store::{Domain, PropKey, PropertyStore};
