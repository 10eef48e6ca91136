//! pn-model: hierarchical property resolution for pnflow.
//!
//! A `Phase` owns its own properties plus an ordered list of `Physics`
//! providers, each owning a subset of the network's pores and throats.
//! Properties missing on the phase are assembled on demand by scattering
//! the providers' partial arrays into a full-length array (see
//! [`resolver::interleave`]). `Geometry` providers play the same role for
//! network-level data through [`Subdomains`].

pub mod error;
pub mod geometry;
pub mod models;
pub mod phase;
pub mod physics;
pub mod provider;
pub mod resolver;

pub use error::{PhaseError, PhaseResult};
pub use geometry::{Geometry, Subdomains};
pub use models::{Constant, ModelContext, ModelSet, PropertyModel, Scaled, from_fn};
pub use phase::Phase;
pub use physics::{Physics, SharedPhysics};
pub use provider::{Locations, Provider};
pub use resolver::{GapPolicy, Resolved, interleave};
