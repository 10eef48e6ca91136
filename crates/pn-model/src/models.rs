//! Property models and regeneration.
//!
//! The physical correlations that turn geometry into conductances live
//! outside this crate. A `PropertyModel` is the hook they plug into: it is
//! evaluated against a [`ModelContext`] and returns a subset-length array
//! for its target key.

use std::sync::Arc;

use pn_core::{PropKey, PropertyStore, Real};
use pn_network::Network;

use crate::error::{PhaseError, PhaseResult};
use crate::phase::Phase;
use crate::provider::Locations;

/// Everything a model may read while being evaluated.
pub struct ModelContext<'a> {
    pub network: &'a Network,
    pub locations: &'a Locations,
    /// The owner's store, including results of models evaluated earlier
    /// in the same regeneration pass.
    pub store: &'a PropertyStore,
    pub phase: Option<&'a Phase<'a>>,
    pub target: &'a PropKey,
}

impl<'a> ModelContext<'a> {
    /// Length the model's output must have.
    pub fn target_len(&self) -> usize {
        self.locations.get(self.target.domain()).len()
    }

    /// Values of `key` at the owner's locations: the owner's store first,
    /// then the phase (resolved and restricted to the owned subset).
    pub fn values(&self, key: &str) -> PhaseResult<Vec<Real>> {
        if let Some(own) = self.store.get(key) {
            return Ok(own.to_vec());
        }
        self.phase_values(key)
    }

    /// Phase values of `key` restricted to the owner's locations.
    pub fn phase_values(&self, key: &str) -> PhaseResult<Vec<Real>> {
        let parsed = PropKey::parse(key)?;
        let phase = self.phase.ok_or_else(|| PhaseError::MissingProperty {
            key: key.to_string(),
            object: "model context".to_string(),
        })?;
        let full = phase.get(key)?;
        Ok(self
            .locations
            .get(parsed.domain())
            .iter()
            .map(|&i| full[i])
            .collect())
    }

    /// Network-level values of `key` restricted to the owner's locations.
    pub fn network_values(&self, key: &str) -> PhaseResult<Vec<Real>> {
        let parsed = PropKey::parse(key)?;
        let full = self
            .network
            .store()
            .get_key(&parsed)
            .ok_or_else(|| PhaseError::MissingProperty {
                key: key.to_string(),
                object: "network".to_string(),
            })?;
        Ok(self
            .locations
            .get(parsed.domain())
            .iter()
            .map(|&i| full[i])
            .collect())
    }
}

/// A model computing one property for the locations of its owner.
pub trait PropertyModel: Send + Sync {
    fn evaluate(&self, ctx: &ModelContext<'_>) -> PhaseResult<Vec<Real>>;
}

impl<F> PropertyModel for F
where
    F: Fn(&ModelContext<'_>) -> PhaseResult<Vec<Real>> + Send + Sync,
{
    fn evaluate(&self, ctx: &ModelContext<'_>) -> PhaseResult<Vec<Real>> {
        self(ctx)
    }
}

/// Uniform value over the target domain.
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub Real);

impl PropertyModel for Constant {
    fn evaluate(&self, ctx: &ModelContext<'_>) -> PhaseResult<Vec<Real>> {
        Ok(vec![self.0; ctx.target_len()])
    }
}

/// Another property of the same domain multiplied by a factor.
#[derive(Debug, Clone)]
pub struct Scaled {
    pub source: String,
    pub factor: Real,
}

impl PropertyModel for Scaled {
    fn evaluate(&self, ctx: &ModelContext<'_>) -> PhaseResult<Vec<Real>> {
        let source = PropKey::parse(&self.source)?;
        if source.domain() != ctx.target.domain() {
            return Err(PhaseError::Model {
                key: ctx.target.to_string(),
                what: format!("source '{}' is in another domain", self.source),
            });
        }
        Ok(ctx
            .values(&self.source)?
            .into_iter()
            .map(|v| v * self.factor)
            .collect())
    }
}

/// Ordered registry of models keyed by target property.
#[derive(Clone, Default)]
pub struct ModelSet {
    entries: Vec<(PropKey, Arc<dyn PropertyModel>)>,
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(k, _)| k.to_string()))
            .finish()
    }
}

impl ModelSet {
    /// Register a model. Re-registering a key replaces the model in place
    /// and keeps its evaluation order.
    pub fn add(&mut self, key: &str, model: impl PropertyModel + 'static) -> PhaseResult<()> {
        let key = PropKey::parse(key)?;
        let model: Arc<dyn PropertyModel> = Arc::new(model);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = model,
            None => self.entries.push((key, model)),
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k.to_string() != key);
        before != self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluate every model in order, writing each result into `store`
    /// before the next model runs.
    pub fn apply(
        &self,
        store: &mut PropertyStore,
        network: &Network,
        locations: &Locations,
        phase: Option<&Phase<'_>>,
    ) -> PhaseResult<()> {
        for (key, model) in &self.entries {
            let values = {
                let ctx = ModelContext {
                    network,
                    locations,
                    store: &*store,
                    phase,
                    target: key,
                };
                model.evaluate(&ctx).map_err(|e| PhaseError::Model {
                    key: key.to_string(),
                    what: e.to_string(),
                })?
            };
            let expected = locations.get(key.domain()).len();
            if values.len() != expected {
                return Err(PhaseError::Model {
                    key: key.to_string(),
                    what: format!("returned {} values, expected {}", values.len(), expected),
                });
            }
            tracing::debug!(key = %key, "regenerated");
            store.set_key(key.clone(), values)?;
        }
        Ok(())
    }
}

/// Pins a closure's signature so it can be registered as a model.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&ModelContext<'_>) -> PhaseResult<Vec<Real>> + Send + Sync,
{
    f
}
