//! pn-network: pore network topology for pnflow.
//!
//! Provides:
//! - The immutable `Network` (pores, throats, labels, adjacency)
//! - Incremental `NetworkBuilder` with validation
//! - Cluster detection for solver sanity checks
//!
//! # Example
//!
//! ```
//! use pn_network::NetworkBuilder;
//!
//! let mut builder = NetworkBuilder::new();
//! let p0 = builder.add_pore();
//! let p1 = builder.add_pore();
//! builder.add_throat(p0, p1);
//! builder.set_pore_label("inlet", &[p0]);
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.num_pores(), 2);
//! assert_eq!(network.num_throats(), 1);
//! assert_eq!(network.pores("inlet").unwrap(), vec![0]);
//! ```

pub mod builder;
pub mod error;
pub mod network;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::NetworkBuilder;
pub use error::{NetworkError, NetworkResult};
pub use network::Network;
