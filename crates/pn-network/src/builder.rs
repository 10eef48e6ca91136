//! Incremental network builder.

use std::collections::BTreeMap;
use std::ops::Range;

use pn_core::{Domain, PropertyStore, Real};

use crate::error::NetworkResult;
use crate::network::{Network, qualify};
use crate::validate;

/// Builder for constructing a network incrementally.
///
/// Use `add_pore` and `add_throat` to build up the topology,
/// then call `build()` to validate and freeze it into an immutable `Network`.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    num_pores: usize,
    conns: Vec<[usize; 2]>,
    labels: BTreeMap<String, Vec<usize>>,
    properties: BTreeMap<String, Vec<Real>>,
}

impl NetworkBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pore and return its index.
    pub fn add_pore(&mut self) -> usize {
        let id = self.num_pores;
        self.num_pores += 1;
        id
    }

    /// Add `n` pores and return their index range.
    pub fn add_pores(&mut self, n: usize) -> Range<usize> {
        let start = self.num_pores;
        self.num_pores += n;
        start..self.num_pores
    }

    /// Add a throat between two pores and return its index.
    ///
    /// Endpoints are checked in `build()`.
    pub fn add_throat(&mut self, tail: usize, head: usize) -> usize {
        let id = self.conns.len();
        self.conns.push([tail, head]);
        id
    }

    /// Attach a pore label (`"inlet"` or `"pore.inlet"`). Repeated calls
    /// with the same name extend the label.
    pub fn set_pore_label(&mut self, label: &str, pores: &[usize]) {
        self.labels
            .entry(qualify(Domain::Pore, label))
            .or_default()
            .extend_from_slice(pores);
    }

    /// Attach a throat label.
    pub fn set_throat_label(&mut self, label: &str, throats: &[usize]) {
        self.labels
            .entry(qualify(Domain::Throat, label))
            .or_default()
            .extend_from_slice(throats);
    }

    /// Attach a network-level property (e.g. `pore.coords_x`).
    pub fn set_property(&mut self, key: impl Into<String>, values: Vec<Real>) {
        self.properties.insert(key.into(), values);
    }

    /// Build and validate the network, returning an immutable `Network`.
    ///
    /// This performs validation and constructs compact adjacency lists.
    pub fn build(self) -> NetworkResult<Network> {
        validate::validate_conns(self.num_pores, &self.conns)?;

        let (pore_throat_offsets, pore_throats) =
            Self::build_adjacency(self.num_pores, &self.conns);

        validate::validate_adjacency(&self.conns, &pore_throat_offsets, &pore_throats)?;

        let mut store = PropertyStore::new(self.num_pores, self.conns.len());
        for (label, indices) in &self.labels {
            store.set_label_indices(label, indices)?;
        }
        for (key, values) in self.properties {
            store.set(&key, values)?;
        }

        Ok(Network {
            conns: self.conns,
            store,
            pore_throat_offsets,
            pore_throats,
        })
    }

    /// Build compact adjacency lists: for each pore, collect its incident throats.
    fn build_adjacency(num_pores: usize, conns: &[[usize; 2]]) -> (Vec<usize>, Vec<usize>) {
        let mut degree = vec![0usize; num_pores];
        for &[a, b] in conns {
            degree[a] += 1;
            degree[b] += 1;
        }

        let mut offsets = Vec::with_capacity(num_pores + 1);
        offsets.push(0);
        for d in &degree {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + d);
        }

        // Throats are visited in index order, so each pore's slice is sorted.
        let mut cursor = offsets[..num_pores].to_vec();
        let mut flat = vec![0usize; offsets[num_pores]];
        for (t, &[a, b]) in conns.iter().enumerate() {
            flat[cursor[a]] = t;
            cursor[a] += 1;
            flat[cursor[b]] = t;
            cursor[b] += 1;
        }

        (offsets, flat)
    }
}
