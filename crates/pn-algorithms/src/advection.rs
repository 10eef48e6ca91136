//! Advection-diffusion (dispersion) on a given pressure field.

use std::ops::{Deref, DerefMut};

use pn_core::{Domain, Real};
use pn_network::Network;

use crate::assembly::DirectedWeights;
use crate::error::{TransportError, TransportResult};
use crate::transport::{
    EffectiveOptions, GenericTransport, TransportAlgorithm, checked_key, checked_throat_values,
};

/// Smallest Péclet magnitude used when forming advective weights.
pub const PECLET_FLOOR: Real = 1e-10;

/// Discretization of the advective term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Scheme {
    #[default]
    Exponential,
    Upwind,
    Hybrid,
    Powerlaw,
}

impl Scheme {
    /// Directed weights `(w(i→j), w(j→i))` for one throat with diffusive
    /// conductance `gd` and flow `q` from `i` to `j`.
    ///
    /// Every scheme satisfies `w(j→i) - w(i→j) = q`.
    pub fn weights(self, gd: Real, q: Real) -> (Real, Real) {
        let mut pe = q / gd;
        // Vanishing diffusion, or a Péclet number past the float range.
        if gd == 0.0 || pe.is_infinite() {
            return ((-q).max(0.0), q.max(0.0));
        }
        if pe.abs() < PECLET_FLOOR {
            pe = PECLET_FLOOR.copysign(pe);
        }
        let q = pe * gd;

        match self {
            Self::Exponential => (q / pe.exp_m1(), -q / (-pe).exp_m1()),
            Self::Upwind => (gd + (-q).max(0.0), gd + q.max(0.0)),
            Self::Hybrid => (
                (-q).max(gd - q / 2.0).max(0.0),
                q.max(gd + q / 2.0).max(0.0),
            ),
            Self::Powerlaw => {
                let damped = gd * (1.0 - pe.abs() / 10.0).powi(5).max(0.0);
                (damped + (-q).max(0.0), damped + q.max(0.0))
            }
        }
    }
}

/// Keys of the advective field and the scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvectionSettings {
    pub hydraulic_conductance: String,
    pub pressure: String,
    pub scheme: Scheme,
}

impl Default for AdvectionSettings {
    fn default() -> Self {
        Self {
            hydraulic_conductance: "throat.hydraulic_conductance".to_string(),
            pressure: "pore.pressure".to_string(),
            scheme: Scheme::default(),
        }
    }
}

/// Transport of `pore.concentration` by diffusion plus advection along
/// the flow implied by the phase's pressure field.
///
/// The pressure field is read from the phase when the algorithm runs, so
/// a preceding flow solve must have been merged into the phase.
#[derive(Debug, Clone)]
pub struct AdvectionDiffusion<'a> {
    base: GenericTransport<'a>,
    advection: AdvectionSettings,
}

/// Alternative name used for dispersion studies.
pub type Dispersion<'a> = AdvectionDiffusion<'a>;

impl<'a> AdvectionDiffusion<'a> {
    pub fn new(name: impl Into<String>, network: &'a Network) -> Self {
        Self {
            base: GenericTransport::new(name, network).with_outflow(),
            advection: AdvectionSettings::default(),
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.advection.scheme = scheme;
        self
    }

    pub fn advection(&self) -> &AdvectionSettings {
        &self.advection
    }

    pub fn set_advection(&mut self, settings: AdvectionSettings) {
        self.advection = settings;
    }

    /// Flow through every throat, from its first pore to its second.
    pub fn throat_flows(&self) -> TransportResult<Vec<Real>> {
        let phase = self.base.phase()?;
        let gh_key = &self.advection.hydraulic_conductance;
        let p_key = &self.advection.pressure;
        checked_key(gh_key, Domain::Throat, "hydraulic conductance")?;
        checked_key(p_key, Domain::Pore, "pressure")?;

        let gh = checked_throat_values(&phase.get(gh_key)?, gh_key, true)?;
        let p = phase.get(p_key)?;
        if let Some(i) = p.iter().position(|v| !v.is_finite()) {
            return Err(TransportError::config(format!(
                "'{p_key}' at pore {i} is not finite"
            )));
        }

        Ok(self
            .base
            .network()
            .conns()
            .iter()
            .zip(&gh)
            .map(|(&[i, j], g)| g * (p[i] - p[j]))
            .collect())
    }

    pub fn calc_effective_dispersivity(&self) -> TransportResult<Real> {
        self.effective_property(&EffectiveOptions::default())
    }
}

impl<'a> TransportAlgorithm<'a> for AdvectionDiffusion<'a> {
    fn base(&self) -> &GenericTransport<'a> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericTransport<'a> {
        &mut self.base
    }

    fn weights(&self) -> TransportResult<DirectedWeights> {
        let gd = self.base.conductance()?;
        let q = self.throat_flows()?;
        let scheme = self.advection.scheme;
        let (forward, reverse): (Vec<Real>, Vec<Real>) = gd
            .iter()
            .zip(&q)
            .map(|(&gd, &q)| scheme.weights(gd, q))
            .unzip();
        Ok(DirectedWeights { forward, reverse })
    }

    fn advective_inflow(&self) -> TransportResult<Option<Vec<Real>>> {
        let q = self.throat_flows()?;
        let mut inflow = vec![0.0; self.base.network().num_pores()];
        for (&[i, j], q) in self.base.network().conns().iter().zip(q) {
            inflow[i] -= q;
            inflow[j] += q;
        }
        Ok(Some(inflow))
    }
}

impl<'a> Deref for AdvectionDiffusion<'a> {
    type Target = GenericTransport<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for AdvectionDiffusion<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exponential_limits() {
        // Strong flow i→j: pure upwind.
        let (wij, wji) = Scheme::Exponential.weights(1.0, 800.0);
        assert_eq!(wij, 0.0);
        assert!((wji - 800.0).abs() < 1e-9);

        // No flow: pure diffusion.
        let (wij, wji) = Scheme::Exponential.weights(2.0, 0.0);
        assert!((wij - 2.0).abs() < 1e-8);
        assert!((wji - 2.0).abs() < 1e-8);
    }

    #[test]
    fn zero_diffusion_is_upwind() {
        for scheme in [Scheme::Exponential, Scheme::Upwind, Scheme::Hybrid, Scheme::Powerlaw] {
            assert_eq!(scheme.weights(0.0, 3.0), (0.0, 3.0));
            assert_eq!(scheme.weights(0.0, -3.0), (3.0, 0.0));
        }
    }

    #[test]
    fn overflowing_peclet_falls_back_to_upwind() {
        let (gd, q): (Real, Real) = (1e-300, 1e10);
        assert!((q / gd).is_infinite());
        for scheme in [Scheme::Exponential, Scheme::Upwind, Scheme::Hybrid, Scheme::Powerlaw] {
            assert_eq!(scheme.weights(gd, q), (0.0, q));
            assert_eq!(scheme.weights(gd, -q), (q, 0.0));
        }
        // Large but finite: still exact.
        let (wij, wji) = Scheme::Exponential.weights(1e-300, 1.0);
        assert!(wij.is_finite() && wji.is_finite());
        assert!(((wji - wij) - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn weight_difference_is_the_flow(
            gd in 1e-3f64..10.0,
            q in -50.0f64..50.0,
        ) {
            for scheme in [Scheme::Exponential, Scheme::Upwind, Scheme::Hybrid, Scheme::Powerlaw] {
                let (wij, wji) = scheme.weights(gd, q);
                prop_assert!(wij >= 0.0 && wji >= 0.0);
                prop_assert!(((wji - wij) - q).abs() <= 1e-8 * (1.0 + q.abs()));
            }
        }
    }
}
