//! Geometric subdomains of the network.

use std::borrow::Cow;

use pn_core::{Domain, PropKey, PropertyStore, Real};
use pn_network::Network;

use crate::error::{PhaseError, PhaseResult};
use crate::models::{ModelSet, PropertyModel};
use crate::provider::{Locations, Provider};
use crate::resolver::{GapPolicy, interleave};

/// Geometric data (sizes, lengths, areas) for one region of the network.
#[derive(Debug, Clone)]
pub struct Geometry {
    name: String,
    locations: Locations,
    store: PropertyStore,
    models: ModelSet,
}

impl Geometry {
    pub fn new(
        name: impl Into<String>,
        network: &Network,
        pores: Vec<usize>,
        throats: Vec<usize>,
    ) -> PhaseResult<Self> {
        let locations = Locations::new(network, pores, throats)?;
        Ok(Self {
            name: name.into(),
            store: locations.empty_store(),
            locations,
            models: ModelSet::default(),
        })
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn set(&mut self, key: &str, values: Vec<Real>) -> PhaseResult<()> {
        Ok(self.store.set(key, values)?)
    }

    pub fn fill(&mut self, key: &str, value: Real) -> PhaseResult<()> {
        Ok(self.store.fill(key, value)?)
    }

    pub fn add_model(&mut self, key: &str, model: impl PropertyModel + 'static) -> PhaseResult<()> {
        self.models.add(key, model)
    }

    /// Re-evaluate the geometry's models in registration order.
    pub fn regenerate(&mut self, network: &Network) -> PhaseResult<()> {
        let mut scratch = self.store.clone();
        self.models
            .apply(&mut scratch, network, &self.locations, None)?;
        self.store = scratch;
        Ok(())
    }
}

impl Provider for Geometry {
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

/// The network seen through its geometries: network-level properties
/// first, then geometric properties interleaved from the subdomains.
#[derive(Debug)]
pub struct Subdomains<'a> {
    network: &'a Network,
    geometries: Vec<&'a Geometry>,
    gap_policy: GapPolicy,
}

impl<'a> Subdomains<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self {
            network,
            geometries: Vec::new(),
            gap_policy: GapPolicy::default(),
        }
    }

    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    pub fn add(&mut self, geometry: &'a Geometry) -> PhaseResult<()> {
        if self.geometries.iter().any(|g| g.name() == geometry.name()) {
            return Err(PhaseError::DuplicateProvider {
                name: geometry.name().to_string(),
                object: "network".to_string(),
            });
        }
        self.geometries.push(geometry);
        Ok(())
    }

    pub fn get(&self, key: &str) -> PhaseResult<Cow<'a, [Real]>> {
        let parsed = PropKey::parse(key)?;
        if let Some(values) = self.network.store().get_key(&parsed) {
            return Ok(Cow::Borrowed(values));
        }
        let providers: Vec<&dyn Provider> =
            self.geometries.iter().map(|g| *g as &dyn Provider).collect();
        let resolved = interleave(
            &providers,
            &parsed,
            self.network.count(parsed.domain()),
            self.gap_policy,
            "network",
        )?;
        if resolved.gaps > 0 {
            tracing::warn!(
                key,
                gaps = resolved.gaps,
                fraction = resolved.gap_fraction,
                "geometries leave part of the network uncovered"
            );
        }
        Ok(Cow::Owned(resolved.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Constant;
    use pn_network::NetworkBuilder;

    #[test]
    fn network_data_then_geometry_data() {
        let mut b = NetworkBuilder::new();
        b.add_pores(4);
        b.add_throat(0, 1);
        b.add_throat(1, 2);
        b.add_throat(2, 3);
        b.set_property("pore.coords_x", vec![0.0, 1.0, 2.0, 3.0]);
        let net = b.build().unwrap();

        let mut left = Geometry::new("left", &net, vec![0, 1], vec![0]).unwrap();
        left.add_model("pore.diameter", Constant(1.0)).unwrap();
        left.regenerate(&net).unwrap();
        let mut right = Geometry::new("right", &net, vec![2, 3], vec![1, 2]).unwrap();
        right.fill("pore.diameter", 3.0).unwrap();

        let mut sub = Subdomains::new(&net);
        sub.add(&left).unwrap();
        sub.add(&right).unwrap();
        assert!(sub.add(&left).is_err());

        assert_eq!(&*sub.get("pore.coords_x").unwrap(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(&*sub.get("pore.diameter").unwrap(), &[1.0, 1.0, 3.0, 3.0]);
        assert!(matches!(
            sub.get("throat.length"),
            Err(PhaseError::MissingProperty { .. })
        ));
    }
}
