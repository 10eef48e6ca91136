//! pn-algorithms: steady linear transport on pore networks.
//!
//! Each algorithm binds a [`pn_model::Phase`], pulls its conductances
//! through the phase's resolver, applies boundary conditions and solves a
//! sparse linear system for one pore quantity.
//!
//! ```
//! use pn_algorithms::{FickianDiffusion, TransportAlgorithm, TransportSettings};
//! use pn_model::{Phase, Physics};
//! use pn_network::NetworkBuilder;
//!
//! let mut b = NetworkBuilder::new();
//! b.add_pores(3);
//! b.add_throat(0, 1);
//! b.add_throat(1, 2);
//! let net = b.build().unwrap();
//!
//! let mut phys = Physics::everywhere("phys", &net);
//! phys.fill("throat.diffusive_conductance", 1.0).unwrap();
//! let mut air = Phase::new("air", &net);
//! air.add_physics(phys).unwrap();
//!
//! let mut fd = FickianDiffusion::new("fd", &net);
//! fd.setup(&air, TransportSettings::fickian_diffusion()).unwrap();
//! fd.set_value_bc(&[0], 1.0).unwrap();
//! fd.set_value_bc(&[2], 0.0).unwrap();
//! fd.run().unwrap();
//! let x = fd.store().get("pore.mole_fraction").unwrap();
//! assert!((x[1] - 0.5).abs() < 1e-12);
//! ```

pub mod advection;
pub mod assembly;
pub mod bc;
pub mod error;
pub mod fickian;
mod krylov;
pub mod solve;
pub mod stokes;
pub mod transport;

pub use advection::{AdvectionDiffusion, AdvectionSettings, Dispersion, Scheme};
pub use assembly::{DirectedWeights, LinearSystem, SparseRows};
pub use bc::{BcKind, BcTable, BcValues, BoundaryCondition, ConflictPolicy};
pub use error::{TransportError, TransportResult};
pub use fickian::FickianDiffusion;
pub use solve::SolverKind;
pub use stokes::StokesFlow;
pub use transport::{
    AlgorithmState, EffectiveOptions, GenericTransport, RESERVED_KEYS, ResultsFilter,
    TransportAlgorithm, TransportSettings,
};
