//! The composite phase object.

use std::borrow::Cow;

use pn_core::{PropKey, PropertyStore, Real};
use pn_network::Network;

use crate::error::{PhaseError, PhaseResult};
use crate::models::{ModelSet, PropertyModel};
use crate::physics::SharedPhysics;
use crate::provider::{Locations, Provider};
use crate::resolver::{GapPolicy, Resolved, interleave};

/// A fluid or material occupying the network.
///
/// Lookups check the phase's own store first. Keys the phase doesn't hold
/// are assembled from the registered physics providers on every call, so
/// a regenerated provider is visible immediately.
#[derive(Debug)]
pub struct Phase<'a> {
    name: String,
    network: &'a Network,
    store: PropertyStore,
    physics: Vec<SharedPhysics>,
    components: Vec<&'a Phase<'a>>,
    models: ModelSet,
    gap_policy: GapPolicy,
}

impl<'a> Phase<'a> {
    pub fn new(name: impl Into<String>, network: &'a Network) -> Self {
        Self {
            name: name.into(),
            network,
            store: PropertyStore::new(network.num_pores(), network.num_throats()),
            physics: Vec::new(),
            components: Vec::new(),
            models: ModelSet::default(),
            gap_policy: GapPolicy::default(),
        }
    }

    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn gap_policy(&self) -> GapPolicy {
        self.gap_policy
    }

    pub fn set_gap_policy(&mut self, policy: GapPolicy) {
        self.gap_policy = policy;
    }

    fn provider_of(&self, key: &PropKey) -> Option<String> {
        self.physics.iter().find_map(|p| {
            let guard = p.read();
            guard
                .store()
                .get_key(key)
                .is_some()
                .then(|| guard.name().to_string())
        })
    }

    /// Store a full-length array on the phase itself.
    ///
    /// Keys already supplied by a registered physics are rejected so that
    /// the phase never shadows provider data.
    pub fn set(&mut self, key: &str, values: Vec<Real>) -> PhaseResult<()> {
        let parsed = PropKey::parse(key)?;
        if let Some(provider) = self.provider_of(&parsed) {
            return Err(PhaseError::PropertyConflict {
                key: key.to_string(),
                provider,
            });
        }
        Ok(self.store.set_key(parsed, values)?)
    }

    /// Broadcast a scalar over the whole domain.
    pub fn fill(&mut self, key: &str, value: Real) -> PhaseResult<()> {
        let parsed = PropKey::parse(key)?;
        let n = self.network.count(parsed.domain());
        self.set(key, vec![value; n])
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Real>> {
        self.store.remove(key)
    }

    /// Merge arrays produced elsewhere (typically algorithm results).
    pub fn update(&mut self, results: &PropertyStore) -> PhaseResult<()> {
        for key in results.keys() {
            if let Some(values) = results.get_key(key) {
                self.set(&key.to_string(), values.to_vec())?;
            }
        }
        Ok(())
    }

    /// Register a physics provider. Order matters: later providers win
    /// where ownership overlaps.
    pub fn add_physics(&mut self, physics: impl Into<SharedPhysics>) -> PhaseResult<()> {
        let physics = physics.into();
        let name = physics.name();
        if self
            .physics
            .iter()
            .any(|p| p.ptr_eq(&physics) || p.name() == name)
        {
            return Err(PhaseError::DuplicateProvider {
                name,
                object: self.name.clone(),
            });
        }
        tracing::debug!(phase = %self.name, physics = %name, "physics registered");
        self.physics.push(physics);
        Ok(())
    }

    pub fn remove_physics(&mut self, name: &str) -> PhaseResult<SharedPhysics> {
        let pos = self
            .physics
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| PhaseError::UnknownProvider {
                name: name.to_string(),
                object: self.name.clone(),
            })?;
        Ok(self.physics.remove(pos))
    }

    pub fn physics(&self) -> &[SharedPhysics] {
        &self.physics
    }

    /// Assemble `key` from the physics providers, reporting coverage.
    ///
    /// Always goes to the providers, even when the phase holds `key`.
    pub fn resolve(&self, key: &str, policy: GapPolicy) -> PhaseResult<Resolved> {
        let parsed = PropKey::parse(key)?;
        let guards: Vec<_> = self.physics.iter().map(SharedPhysics::read).collect();
        let providers: Vec<&dyn Provider> = guards.iter().map(|g| &**g as &dyn Provider).collect();
        interleave(
            &providers,
            &parsed,
            self.network.count(parsed.domain()),
            policy,
            &self.name,
        )
    }

    /// Full-length values of `key`: the phase's own array if present,
    /// otherwise interleaved from physics under the phase's gap policy.
    pub fn get(&self, key: &str) -> PhaseResult<Cow<'_, [Real]>> {
        let parsed = PropKey::parse(key)?;
        if let Some(values) = self.store.get_key(&parsed) {
            return Ok(Cow::Borrowed(values));
        }

        tracing::debug!(phase = %self.name, key, "not on phase, interleaving from physics");
        let resolved = self.resolve(key, self.gap_policy)?;
        if resolved.gaps > 0 {
            tracing::warn!(
                phase = %self.name,
                key,
                gaps = resolved.gaps,
                fraction = resolved.gap_fraction,
                policy = ?self.gap_policy,
                "physics leave part of the network uncovered"
            );
        }
        Ok(Cow::Owned(resolved.values))
    }

    /// Pores carrying a network label.
    pub fn pores(&self, label: &str) -> PhaseResult<Vec<usize>> {
        Ok(self.network.pores(label)?)
    }

    /// Throats carrying a network label.
    pub fn throats(&self, label: &str) -> PhaseResult<Vec<usize>> {
        Ok(self.network.throats(label)?)
    }

    /// Add a pure-component phase to this mixture.
    pub fn add_component(&mut self, component: &'a Phase<'a>) -> PhaseResult<()> {
        if self.components.iter().any(|c| c.name == component.name) {
            return Err(PhaseError::DuplicateProvider {
                name: component.name.clone(),
                object: self.name.clone(),
            });
        }
        self.components.push(component);
        Ok(())
    }

    pub fn remove_component(&mut self, name: &str) -> PhaseResult<()> {
        let pos = self
            .components
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PhaseError::UnknownProvider {
                name: name.to_string(),
                object: self.name.clone(),
            })?;
        self.components.remove(pos);
        Ok(())
    }

    pub fn components(&self) -> impl Iterator<Item = &Phase<'a>> {
        self.components.iter().copied()
    }

    /// Per-pore sum of the components' `pore.mole_fraction`. Components
    /// without mole fractions are skipped; a healthy mixture sums to one.
    pub fn mixture_health(&self) -> Vec<Real> {
        let mut sum = vec![0.0; self.network.num_pores()];
        for component in &self.components {
            if let Ok(x) = component.get("pore.mole_fraction") {
                for (s, v) in sum.iter_mut().zip(x.iter()) {
                    *s += v;
                }
            }
        }
        sum
    }

    pub fn add_model(&mut self, key: &str, model: impl PropertyModel + 'static) -> PhaseResult<()> {
        self.models.add(key, model)
    }

    /// Re-evaluate phase models, then the models of every physics.
    ///
    /// Each owner's models run against a scratch copy of its store so that
    /// resolution through this phase keeps working while they evaluate.
    ///
    /// Component phases are borrowed and never regenerated here. Callers
    /// regenerate each component before adding it to a mixture.
    pub fn regenerate(&mut self) -> PhaseResult<()> {
        let mut scratch = self.store.clone();
        let all = Locations::all(self.network);
        self.models
            .apply(&mut scratch, self.network, &all, Some(&*self))?;
        self.store = scratch;

        for physics in &self.physics {
            physics.regenerate(self)?;
        }
        Ok(())
    }
}
