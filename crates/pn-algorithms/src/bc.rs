//! Boundary condition registry.

use std::fmt;

use pn_core::Real;

use crate::error::{TransportError, TransportResult};

/// A boundary condition attached to one pore.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// Fixed quantity (Dirichlet).
    Value(Real),
    /// Fixed net injection rate into the pore (Neumann).
    Rate(Real),
    /// The pore discharges by bulk flow whatever is advected into it.
    Outflow,
}

impl BoundaryCondition {
    pub fn kind(&self) -> BcKind {
        match self {
            Self::Value(_) => BcKind::Value,
            Self::Rate(_) => BcKind::Rate,
            Self::Outflow => BcKind::Outflow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BcKind {
    Value,
    Rate,
    Outflow,
}

impl fmt::Display for BcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Value => "value",
            Self::Rate => "rate",
            Self::Outflow => "outflow",
        })
    }
}

/// What happens when a BC is set on a pore that already carries one of
/// a different kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ConflictPolicy {
    /// Replace it and log a warning.
    #[default]
    Overwrite,
    /// Refuse the whole call.
    Reject,
}

/// BC values: one scalar for every pore, or one value per pore.
#[derive(Debug, Clone, PartialEq)]
pub enum BcValues {
    Scalar(Real),
    Array(Vec<Real>),
}

impl BcValues {
    /// Expand to one value per pore, checking length and finiteness.
    pub(crate) fn expand(&self, count: usize) -> TransportResult<Vec<Real>> {
        let values = match self {
            Self::Scalar(v) => vec![*v; count],
            Self::Array(values) => {
                if values.len() != count {
                    return Err(TransportError::LengthMismatch {
                        what: "boundary values".to_string(),
                        expected: count,
                        actual: values.len(),
                    });
                }
                values.clone()
            }
        };
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(TransportError::bc(format!(
                "boundary value {bad} is not finite"
            )));
        }
        Ok(values)
    }
}

impl From<Real> for BcValues {
    fn from(v: Real) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<Real>> for BcValues {
    fn from(v: Vec<Real>) -> Self {
        Self::Array(v)
    }
}

impl From<&[Real]> for BcValues {
    fn from(v: &[Real]) -> Self {
        Self::Array(v.to_vec())
    }
}

impl<const N: usize> From<[Real; N]> for BcValues {
    fn from(v: [Real; N]) -> Self {
        Self::Array(v.to_vec())
    }
}

/// At most one boundary condition per pore.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BcTable {
    slots: Vec<Option<BoundaryCondition>>,
}

impl BcTable {
    pub fn new(num_pores: usize) -> Self {
        Self {
            slots: vec![None; num_pores],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn get(&self, pore: usize) -> Option<BoundaryCondition> {
        self.slots.get(pore).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Pores with a BC, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, BoundaryCondition)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|bc| (i, bc)))
    }

    pub fn pores_of(&self, kind: BcKind) -> Vec<usize> {
        self.iter()
            .filter(|(_, bc)| bc.kind() == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Dirichlet values in pore order.
    pub fn values(&self) -> Vec<(usize, Real)> {
        self.iter()
            .filter_map(|(i, bc)| match bc {
                BoundaryCondition::Value(v) => Some((i, v)),
                _ => None,
            })
            .collect()
    }

    /// Full-length array of one kind's values, NaN where absent. Outflow
    /// pores are marked with 1.0.
    pub fn to_array(&self, kind: BcKind) -> Vec<Real> {
        self.slots
            .iter()
            .map(|s| match (kind, s) {
                (BcKind::Value, Some(BoundaryCondition::Value(v))) => *v,
                (BcKind::Rate, Some(BoundaryCondition::Rate(v))) => *v,
                (BcKind::Outflow, Some(BoundaryCondition::Outflow)) => 1.0,
                _ => Real::NAN,
            })
            .collect()
    }

    /// Check indices before anything is mutated.
    pub(crate) fn check_pores(&self, pores: &[usize]) -> TransportResult<()> {
        match pores.iter().find(|&&p| p >= self.slots.len()) {
            Some(&index) => Err(TransportError::PoreIndex {
                index,
                len: self.slots.len(),
            }),
            None => Ok(()),
        }
    }

    /// Assign `bcs` to `pores` under `policy`. All-or-nothing.
    pub(crate) fn assign(
        &mut self,
        pores: &[usize],
        bcs: &[BoundaryCondition],
        policy: ConflictPolicy,
    ) -> TransportResult<()> {
        self.check_pores(pores)?;

        let conflicts: Vec<(usize, BcKind, BcKind)> = pores
            .iter()
            .zip(bcs)
            .filter_map(|(&p, new)| match self.slots[p] {
                Some(old) if old.kind() != new.kind() => Some((p, old.kind(), new.kind())),
                _ => None,
            })
            .collect();

        if let Some(&(pore, old, new)) = conflicts.first() {
            match policy {
                ConflictPolicy::Reject => {
                    return Err(TransportError::bc(format!(
                        "pore {pore} already has a {old} condition, refusing {new}"
                    )));
                }
                ConflictPolicy::Overwrite => {
                    tracing::warn!(
                        pores = conflicts.len(),
                        first = pore,
                        from = %old,
                        to = %new,
                        "overwriting boundary conditions of a different kind"
                    );
                }
            }
        }

        for (&p, &bc) in pores.iter().zip(bcs) {
            self.slots[p] = Some(bc);
        }
        Ok(())
    }

    /// Clear BCs, optionally restricted to some pores and/or one kind.
    pub(crate) fn remove(
        &mut self,
        pores: Option<&[usize]>,
        kind: Option<BcKind>,
    ) -> TransportResult<usize> {
        let targets: Vec<usize> = match pores {
            Some(pores) => {
                self.check_pores(pores)?;
                pores.to_vec()
            }
            None => (0..self.slots.len()).collect(),
        };
        let mut removed = 0;
        for p in targets {
            let matches = match (self.slots[p], kind) {
                (Some(_), None) => true,
                (Some(bc), Some(k)) => bc.kind() == k,
                (None, _) => false,
            };
            if matches {
                self.slots[p] = None;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_broadcast_and_array_length() {
        assert_eq!(BcValues::from(2.0).expand(3).unwrap(), vec![2.0; 3]);
        assert_eq!(
            BcValues::from([1.0, 2.0]).expand(2).unwrap(),
            vec![1.0, 2.0]
        );
        assert!(matches!(
            BcValues::from(vec![1.0]).expand(2),
            Err(TransportError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(BcValues::from(Real::NAN).expand(1).is_err());
    }

    #[test]
    fn overwrite_and_reject() {
        let mut table = BcTable::new(4);
        table
            .assign(&[0, 1], &[BoundaryCondition::Value(1.0); 2], ConflictPolicy::Overwrite)
            .unwrap();
        table
            .assign(&[1], &[BoundaryCondition::Outflow], ConflictPolicy::Overwrite)
            .unwrap();
        assert_eq!(table.get(1), Some(BoundaryCondition::Outflow));

        let err = table
            .assign(&[0], &[BoundaryCondition::Rate(1.0)], ConflictPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, TransportError::BoundaryCondition { .. }));
        assert_eq!(table.get(0), Some(BoundaryCondition::Value(1.0)));

        // Same kind is always a plain update.
        table
            .assign(&[0], &[BoundaryCondition::Value(5.0)], ConflictPolicy::Reject)
            .unwrap();
        assert_eq!(table.values(), vec![(0, 5.0)]);
    }

    #[test]
    fn out_of_range_mutates_nothing() {
        let mut table = BcTable::new(2);
        let err = table
            .assign(&[0, 7], &[BoundaryCondition::Value(1.0); 2], ConflictPolicy::Overwrite)
            .unwrap_err();
        assert_eq!(err, TransportError::PoreIndex { index: 7, len: 2 });
        assert!(table.is_empty());
    }

    #[test]
    fn remove_by_kind_and_pores() {
        let mut table = BcTable::new(4);
        table
            .assign(
                &[0, 1, 2],
                &[
                    BoundaryCondition::Value(0.0),
                    BoundaryCondition::Rate(1.0),
                    BoundaryCondition::Value(1.0),
                ],
                ConflictPolicy::Overwrite,
            )
            .unwrap();
        assert_eq!(table.remove(None, Some(BcKind::Rate)).unwrap(), 1);
        assert_eq!(table.remove(Some(&[2, 3]), None).unwrap(), 1);
        assert_eq!(table.pores_of(BcKind::Value), vec![0]);
        let arr = table.to_array(BcKind::Value);
        assert_eq!(arr[0], 0.0);
        assert!(arr[1..].iter().all(|v| v.is_nan()));
    }
}
