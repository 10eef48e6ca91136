//! Per-region physics providers.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pn_core::{Domain, PropertyStore, Real};
use pn_network::Network;

use crate::error::PhaseResult;
use crate::geometry::Geometry;
use crate::models::{ModelSet, PropertyModel};
use crate::phase::Phase;
use crate::provider::{Locations, Provider};

/// Pore-scale transport data for one region of the network, for one phase.
///
/// Arrays are subset-length: entry `k` of `throat.diffusive_conductance`
/// belongs to network throat `locations().throats()[k]`.
#[derive(Debug, Clone)]
pub struct Physics {
    name: String,
    locations: Locations,
    store: PropertyStore,
    models: ModelSet,
}

impl Physics {
    pub fn new(
        name: impl Into<String>,
        network: &Network,
        pores: Vec<usize>,
        throats: Vec<usize>,
    ) -> PhaseResult<Self> {
        let locations = Locations::new(network, pores, throats)?;
        Ok(Self::with_locations(name, locations))
    }

    /// Physics covering the whole network.
    pub fn everywhere(name: impl Into<String>, network: &Network) -> Self {
        Self::with_locations(name, Locations::all(network))
    }

    /// Physics covering the same region as a geometry.
    pub fn for_geometry(name: impl Into<String>, geometry: &Geometry) -> Self {
        Self::with_locations(name, geometry.locations().clone())
    }

    fn with_locations(name: impl Into<String>, locations: Locations) -> Self {
        Self {
            name: name.into(),
            store: locations.empty_store(),
            locations,
            models: ModelSet::default(),
        }
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    /// Store a subset-length array.
    pub fn set(&mut self, key: &str, values: Vec<Real>) -> PhaseResult<()> {
        Ok(self.store.set(key, values)?)
    }

    /// Broadcast a scalar over the owned subset.
    pub fn fill(&mut self, key: &str, value: Real) -> PhaseResult<()> {
        Ok(self.store.fill(key, value)?)
    }

    pub fn add_model(&mut self, key: &str, model: impl PropertyModel + 'static) -> PhaseResult<()> {
        self.models.add(key, model)
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn into_shared(self) -> SharedPhysics {
        SharedPhysics(Arc::new(RwLock::new(self)))
    }
}

impl Provider for Physics {
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn locations(&self, domain: Domain) -> &[usize] {
        self.locations.get(domain)
    }
}

/// A physics provider that can be registered on several phases.
///
/// Readers never block each other; regeneration takes the write lock and
/// must not overlap a solve that reads the same provider.
#[derive(Debug, Clone)]
pub struct SharedPhysics(Arc<RwLock<Physics>>);

impl SharedPhysics {
    pub fn read(&self) -> RwLockReadGuard<'_, Physics> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Physics> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Whether both handles point at the same provider.
    pub fn ptr_eq(&self, other: &SharedPhysics) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Re-evaluate the models against `phase` and store the results.
    ///
    /// Models run on a copy taken under the read lock, so they may resolve
    /// keys through a phase this provider is registered on. The write lock
    /// is held only to swap the new store in.
    pub fn regenerate(&self, phase: &Phase<'_>) -> PhaseResult<()> {
        let (models, locations, mut scratch) = {
            let guard = self.read();
            (
                guard.models.clone(),
                guard.locations.clone(),
                guard.store.clone(),
            )
        };
        models.apply(&mut scratch, phase.network(), &locations, Some(phase))?;
        self.write().store = scratch;
        Ok(())
    }
}

impl From<Physics> for SharedPhysics {
    fn from(physics: Physics) -> Self {
        physics.into_shared()
    }
}
