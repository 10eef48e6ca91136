//! Ordinary (Fickian) diffusion.

use std::ops::{Deref, DerefMut};

use pn_core::Real;
use pn_network::Network;

use crate::error::TransportResult;
use crate::transport::{EffectiveOptions, GenericTransport, TransportAlgorithm};

/// Steady diffusion of `pore.mole_fraction` through
/// `throat.diffusive_conductance` by default.
#[derive(Debug, Clone)]
pub struct FickianDiffusion<'a> {
    base: GenericTransport<'a>,
}

impl<'a> FickianDiffusion<'a> {
    pub fn new(name: impl Into<String>, network: &'a Network) -> Self {
        Self {
            base: GenericTransport::new(name, network),
        }
    }

    /// Effective diffusivity: the unscaled effective property divided by
    /// the mean `pore.molar_density` of the phase.
    pub fn calc_effective_diffusivity(&self) -> TransportResult<Real> {
        self.effective_property(&EffectiveOptions::default())
    }
}

impl<'a> TransportAlgorithm<'a> for FickianDiffusion<'a> {
    fn base(&self) -> &GenericTransport<'a> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericTransport<'a> {
        &mut self.base
    }

    fn effective_property(&self, options: &EffectiveOptions) -> TransportResult<Real> {
        let raw = self.base.calc_effective_property_with(options)?;
        Ok(raw / self.base.phase_mean("pore.molar_density")?)
    }
}

impl<'a> Deref for FickianDiffusion<'a> {
    type Target = GenericTransport<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for FickianDiffusion<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}
