//! Core network data structure.

use petgraph::unionfind::UnionFind;
use pn_core::{Domain, PropKey, PropertyStore};

use crate::error::{NetworkError, NetworkResult};

/// The pore network: a validated, immutable graph of pores joined by throats.
///
/// The network stores:
/// - Throat connectivity (`throat.conns`) as `[tail, head]` pairs.
/// - Labels and network-level properties in a `PropertyStore`.
/// - Compact adjacency: for each pore, which throats are incident.
///
/// Phases and algorithms borrow the network; it is never copied.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) conns: Vec<[usize; 2]>,
    pub(crate) store: PropertyStore,

    /// Offsets for pore->throat adjacency: pore i's throats are in
    /// pore_throats[pore_throat_offsets[i]..pore_throat_offsets[i+1]].
    pub(crate) pore_throat_offsets: Vec<usize>,

    /// Flat list of throat indices incident to pores (sorted per pore).
    pub(crate) pore_throats: Vec<usize>,
}

impl Network {
    /// Number of pores.
    pub fn num_pores(&self) -> usize {
        self.store.count(Domain::Pore)
    }

    /// Number of throats.
    pub fn num_throats(&self) -> usize {
        self.store.count(Domain::Throat)
    }

    /// Number of entries in the given domain.
    pub fn count(&self, domain: Domain) -> usize {
        self.store.count(domain)
    }

    /// All throat connections, indexed by throat.
    pub fn conns(&self) -> &[[usize; 2]] {
        &self.conns
    }

    /// The two pores joined by a throat (None if out of bounds).
    pub fn throat_conns(&self, throat: usize) -> Option<[usize; 2]> {
        self.conns.get(throat).copied()
    }

    /// Throats incident to a pore (empty if out of bounds).
    pub fn pore_throats(&self, pore: usize) -> &[usize] {
        if pore >= self.num_pores() {
            return &[];
        }
        let start = self.pore_throat_offsets[pore];
        let end = self.pore_throat_offsets[pore + 1];
        &self.pore_throats[start..end]
    }

    /// Pores sharing a throat with `pore`, ascending and deduplicated.
    pub fn neighbor_pores(&self, pore: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .pore_throats(pore)
            .iter()
            .map(|&t| {
                let [a, b] = self.conns[t];
                if a == pore { b } else { a }
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Network-level properties and labels.
    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    /// Mutable access for attaching network-level properties after build.
    pub fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    fn label_indices(&self, domain: Domain, label: &str) -> NetworkResult<Vec<usize>> {
        let key = qualify(domain, label);
        self.store
            .label_indices(&key)
            .ok_or(NetworkError::UnknownLabel { label: key })
    }

    /// Pores carrying a label (`"inlet"` or `"pore.inlet"`).
    pub fn pores(&self, label: &str) -> NetworkResult<Vec<usize>> {
        self.label_indices(Domain::Pore, label)
    }

    /// Throats carrying a label (`"internal"` or `"throat.internal"`).
    pub fn throats(&self, label: &str) -> NetworkResult<Vec<usize>> {
        self.label_indices(Domain::Throat, label)
    }

    /// Qualified label names of a domain, sorted.
    pub fn labels(&self, domain: Domain) -> Vec<String> {
        self.store
            .labels()
            .filter(|k| k.domain() == domain)
            .map(PropKey::to_string)
            .collect()
    }

    /// Connected components over the throats accepted by `include`.
    ///
    /// Returns one cluster id per pore; ids are dense and numbered in order
    /// of first appearance, so pore 0 is always in cluster 0.
    pub fn clusters<F>(&self, include: F) -> Vec<usize>
    where
        F: Fn(usize) -> bool,
    {
        let n = self.num_pores();
        let mut uf = UnionFind::<usize>::new(n);
        for (t, &[a, b]) in self.conns.iter().enumerate() {
            if include(t) {
                uf.union(a, b);
            }
        }

        let roots = uf.into_labeling();
        let mut dense = vec![usize::MAX; n];
        let mut next = 0;
        roots
            .iter()
            .map(|&root| {
                if dense[root] == usize::MAX {
                    dense[root] = next;
                    next += 1;
                }
                dense[root]
            })
            .collect()
    }
}

/// Prefix a bare label with its domain; qualified labels pass through.
pub(crate) fn qualify(domain: Domain, label: &str) -> String {
    match PropKey::parse(label) {
        Ok(key) if key.domain() == domain => label.to_string(),
        _ => format!("{}.{}", domain, label),
    }
}
