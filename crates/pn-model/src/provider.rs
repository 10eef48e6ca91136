//! Capability shared by every constituent provider.

use pn_core::{Domain, PnError, PropertyStore};
use pn_network::Network;

use crate::error::PhaseResult;

/// An object owning data for a subset of the network.
///
/// The provider's store is scoped to its subset: entry `k` of a pore array
/// belongs to network pore `locations(Domain::Pore)[k]`.
pub trait Provider {
    /// Provider name for diagnostics and registry lookups.
    fn name(&self) -> &str;

    /// The provider's own subset-length store.
    fn store(&self) -> &PropertyStore;

    /// Network indices owned in `domain`, ascending.
    fn locations(&self, domain: Domain) -> &[usize];
}

/// Pore and throat subsets owned by a provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Locations {
    pores: Vec<usize>,
    throats: Vec<usize>,
}

impl Locations {
    /// Validated subsets; indices are sorted and deduplicated.
    pub fn new(network: &Network, mut pores: Vec<usize>, mut throats: Vec<usize>) -> PhaseResult<Self> {
        pores.sort_unstable();
        pores.dedup();
        throats.sort_unstable();
        throats.dedup();

        check_range(&pores, network.num_pores(), "provider pore")?;
        check_range(&throats, network.num_throats(), "provider throat")?;

        Ok(Self { pores, throats })
    }

    /// Every pore and throat of the network.
    pub fn all(network: &Network) -> Self {
        Self {
            pores: (0..network.num_pores()).collect(),
            throats: (0..network.num_throats()).collect(),
        }
    }

    pub fn pores(&self) -> &[usize] {
        &self.pores
    }

    pub fn throats(&self) -> &[usize] {
        &self.throats
    }

    pub fn get(&self, domain: Domain) -> &[usize] {
        match domain {
            Domain::Pore => &self.pores,
            Domain::Throat => &self.throats,
        }
    }

    /// An empty store shaped for these subsets.
    pub fn empty_store(&self) -> PropertyStore {
        PropertyStore::new(self.pores.len(), self.throats.len())
    }
}

fn check_range(indices: &[usize], len: usize, what: &'static str) -> PhaseResult<()> {
    // Sorted, so the last entry is the largest.
    match indices.last() {
        Some(&index) if index >= len => Err(PnError::IndexOob { what, index, len }.into()),
        _ => Ok(()),
    }
}
