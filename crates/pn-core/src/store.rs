//! Domain-qualified property storage.
//!
//! Every object in a simulation (network, geometry, phase, physics,
//! algorithm) carries one `PropertyStore`. Keys are qualified as
//! `pore.<name>` or `throat.<name>`; every array under a domain has the
//! length the store was created with.

use core::fmt;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{PnError, PnResult};
use crate::numeric::Real;

/// Index space a property lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Domain {
    Pore,
    Throat,
}

impl Domain {
    pub fn prefix(self) -> &'static str {
        match self {
            Domain::Pore => "pore",
            Domain::Throat => "throat",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A parsed `domain.name` key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropKey {
    domain: Domain,
    name: String,
}

impl PropKey {
    pub fn new(domain: Domain, name: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
        }
    }

    /// Parse `pore.<name>` / `throat.<name>`.
    pub fn parse(key: &str) -> PnResult<Self> {
        let invalid = || PnError::InvalidKey {
            key: key.to_string(),
        };
        let (prefix, name) = key.split_once('.').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        let domain = match prefix {
            "pore" => Domain::Pore,
            "throat" => Domain::Throat,
            _ => return Err(invalid()),
        };
        Ok(Self::new(domain, name))
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The implicit all-true label of a domain.
    pub fn all(domain: Domain) -> Self {
        Self::new(domain, "all")
    }
}

impl FromStr for PropKey {
    type Err = PnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.name)
    }
}

/// Numeric arrays and boolean label masks for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyStore {
    pore_count: usize,
    throat_count: usize,
    values: BTreeMap<PropKey, Vec<Real>>,
    labels: BTreeMap<PropKey, Vec<bool>>,
}

impl PropertyStore {
    /// Create an empty store for the given index space. The `all` labels
    /// are created immediately.
    pub fn new(pore_count: usize, throat_count: usize) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(PropKey::all(Domain::Pore), vec![true; pore_count]);
        labels.insert(PropKey::all(Domain::Throat), vec![true; throat_count]);
        Self {
            pore_count,
            throat_count,
            values: BTreeMap::new(),
            labels,
        }
    }

    /// Number of entries every array of `domain` must have.
    pub fn count(&self, domain: Domain) -> usize {
        match domain {
            Domain::Pore => self.pore_count,
            Domain::Throat => self.throat_count,
        }
    }

    fn check_len(&self, key: &PropKey, len: usize) -> PnResult<()> {
        let expected = self.count(key.domain());
        if len != expected {
            return Err(PnError::LengthMismatch {
                what: key.to_string(),
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    /// Store a numeric array, replacing any previous value under `key`.
    pub fn set(&mut self, key: &str, values: Vec<Real>) -> PnResult<()> {
        let key = PropKey::parse(key)?;
        self.set_key(key, values)
    }

    pub fn set_key(&mut self, key: PropKey, values: Vec<Real>) -> PnResult<()> {
        if self.labels.contains_key(&key) {
            return Err(PnError::InvalidArg {
                what: format!("'{key}' is already a label"),
            });
        }
        self.check_len(&key, values.len())?;
        self.values.insert(key, values);
        Ok(())
    }

    /// Broadcast a scalar over the whole domain of `key`.
    pub fn fill(&mut self, key: &str, value: Real) -> PnResult<()> {
        let key = PropKey::parse(key)?;
        let n = self.count(key.domain());
        self.set_key(key, vec![value; n])
    }

    /// Look up a numeric array. Malformed keys are simply absent.
    pub fn get(&self, key: &str) -> Option<&[Real]> {
        let key = PropKey::parse(key).ok()?;
        self.get_key(&key)
    }

    pub fn get_key(&self, key: &PropKey) -> Option<&[Real]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Real>> {
        let key = PropKey::parse(key).ok()?;
        self.values.remove(&key)
    }

    /// Numeric keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &PropKey> {
        self.values.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store a boolean mask label.
    pub fn set_label(&mut self, key: &str, mask: Vec<bool>) -> PnResult<()> {
        let key = PropKey::parse(key)?;
        if key.name() == "all" {
            return Err(PnError::InvalidArg {
                what: format!("'{key}' is maintained by the store"),
            });
        }
        if self.values.contains_key(&key) {
            return Err(PnError::InvalidArg {
                what: format!("'{key}' is already a numeric property"),
            });
        }
        self.check_len(&key, mask.len())?;
        self.labels.insert(key, mask);
        Ok(())
    }

    /// Store a label given as a list of indices.
    pub fn set_label_indices(&mut self, key: &str, indices: &[usize]) -> PnResult<()> {
        let parsed = PropKey::parse(key)?;
        let n = self.count(parsed.domain());
        let mut mask = vec![false; n];
        for &i in indices {
            if i >= n {
                return Err(PnError::IndexOob {
                    what: "label index",
                    index: i,
                    len: n,
                });
            }
            mask[i] = true;
        }
        self.set_label(key, mask)
    }

    pub fn label(&self, key: &str) -> Option<&[bool]> {
        let key = PropKey::parse(key).ok()?;
        self.labels.get(&key).map(Vec::as_slice)
    }

    /// Indices where the label is set, ascending.
    pub fn label_indices(&self, key: &str) -> Option<Vec<usize>> {
        self.label(key).map(|mask| {
            mask.iter()
                .enumerate()
                .filter_map(|(i, &set)| set.then_some(i))
                .collect()
        })
    }

    /// Label keys in sorted order, including the `all` labels.
    pub fn labels(&self) -> impl Iterator<Item = &PropKey> {
        self.labels.keys()
    }

    /// Copy every numeric array and label of `other` into this store.
    pub fn merge(&mut self, other: &PropertyStore) -> PnResult<()> {
        if other.pore_count != self.pore_count || other.throat_count != self.throat_count {
            return Err(PnError::LengthMismatch {
                what: "merged store shape".to_string(),
                expected: self.pore_count + self.throat_count,
                actual: other.pore_count + other.throat_count,
            });
        }
        for (key, values) in &other.values {
            self.set_key(key.clone(), values.clone())?;
        }
        for (key, mask) in &other.labels {
            if key.name() != "all" {
                self.set_label(&key.to_string(), mask.clone())?;
            }
        }
        Ok(())
    }
}
