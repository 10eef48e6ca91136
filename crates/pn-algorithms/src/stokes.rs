//! Stokes (viscous, creeping) flow.

use std::ops::{Deref, DerefMut};

use pn_core::Real;
use pn_network::Network;

use crate::error::TransportResult;
use crate::transport::{EffectiveOptions, GenericTransport, TransportAlgorithm};

/// Pressure field from `throat.hydraulic_conductance`; solves
/// `pore.pressure` by default.
#[derive(Debug, Clone)]
pub struct StokesFlow<'a> {
    base: GenericTransport<'a>,
}

impl<'a> StokesFlow<'a> {
    pub fn new(name: impl Into<String>, network: &'a Network) -> Self {
        Self {
            base: GenericTransport::new(name, network),
        }
    }

    /// Darcy permeability: the unscaled effective property times the mean
    /// `pore.viscosity` of the phase.
    pub fn calc_effective_permeability(&self) -> TransportResult<Real> {
        self.effective_property(&EffectiveOptions::default())
    }
}

impl<'a> TransportAlgorithm<'a> for StokesFlow<'a> {
    fn base(&self) -> &GenericTransport<'a> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericTransport<'a> {
        &mut self.base
    }

    fn effective_property(&self, options: &EffectiveOptions) -> TransportResult<Real> {
        let raw = self.base.calc_effective_property_with(options)?;
        Ok(raw * self.base.phase_mean("pore.viscosity")?)
    }
}

impl<'a> Deref for StokesFlow<'a> {
    type Target = GenericTransport<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for StokesFlow<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}
