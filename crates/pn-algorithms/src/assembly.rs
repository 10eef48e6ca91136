//! Sparse system assembly.
//!
//! The coefficient matrix is built row by row from directed throat weights.
//! For throat `t = (i, j)` with `a = w(i→j)` and `c = w(j→i)`:
//!
//! - `A[i,j] -= a`, `A[j,i] -= c`
//! - `A[i,i] += c`, `A[j,j] += a`
//!
//! so row `i` expresses the net rate leaving pore `i`. Symmetric weights
//! (`a = c = g`) give the weighted graph Laplacian.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use pn_core::Real;

use crate::bc::{BcTable, BoundaryCondition};

/// Directed coupling weights, one pair per throat.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedWeights {
    /// `w(i→j)` for throat `(i, j)`: enters `A[i,j]` and `A[j,j]`.
    pub forward: Vec<Real>,
    /// `w(j→i)`: enters `A[j,i]` and `A[i,i]`.
    pub reverse: Vec<Real>,
}

impl DirectedWeights {
    pub fn symmetric(g: Vec<Real>) -> Self {
        Self {
            reverse: g.clone(),
            forward: g,
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Whether throat `t` couples its pores at all.
    pub fn connects(&self, t: usize) -> bool {
        self.forward[t] != 0.0 || self.reverse[t] != 0.0
    }

    /// Rate from `i` to `j` through throat `t = (i, j)`.
    pub fn flux(&self, t: usize, xi: Real, xj: Real) -> Real {
        self.reverse[t] * xi - self.forward[t] * xj
    }
}

/// Square matrix stored as one ordered map per row.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRows {
    rows: Vec<BTreeMap<usize, Real>>,
}

impl SparseRows {
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![BTreeMap::new(); n],
        }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, i: usize, j: usize) -> Real {
        self.rows[i].get(&j).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, i: usize, j: usize, v: Real) {
        *self.rows[i].entry(j).or_insert(0.0) += v;
    }

    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, Real)> + '_ {
        self.rows[i].iter().map(|(&j, &v)| (j, v))
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Rows with no nonzero entry.
    pub fn empty_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.values().all(|&v| v == 0.0))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_symmetric(&self, tol: Real) -> bool {
        self.rows.iter().enumerate().all(|(i, row)| {
            row.iter().all(|(&j, &v)| {
                let w = self.get(j, i);
                (v - w).abs() <= tol * v.abs().max(w.abs()).max(Real::MIN_POSITIVE)
            })
        })
    }

    pub fn mul_vec(&self, x: &[Real], y: &mut [Real]) {
        for (yi, row) in y.iter_mut().zip(&self.rows) {
            *yi = row.iter().map(|(&j, &v)| v * x[j]).sum();
        }
    }

    pub fn diagonal(&self) -> Vec<Real> {
        (0..self.dim()).map(|i| self.get(i, i)).collect()
    }

    pub fn to_dense(&self) -> DMatrix<Real> {
        let n = self.dim();
        let mut m = DMatrix::zeros(n, n);
        for (i, row) in self.rows.iter().enumerate() {
            for (&j, &v) in row {
                m[(i, j)] = v;
            }
        }
        m
    }
}

/// A linear system `A x = b`.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub a: SparseRows,
    pub b: Vec<Real>,
}

impl LinearSystem {
    /// Stamp the directed weights of every throat.
    pub fn assemble(num_pores: usize, conns: &[[usize; 2]], w: &DirectedWeights) -> Self {
        let mut a = SparseRows::new(num_pores);
        for (t, &[i, j]) in conns.iter().enumerate() {
            let (fwd, rev) = (w.forward[t], w.reverse[t]);
            a.add(i, j, -fwd);
            a.add(j, i, -rev);
            a.add(i, i, rev);
            a.add(j, j, fwd);
        }
        Self {
            a,
            b: vec![0.0; num_pores],
        }
    }

    /// Fix pore `i` to `value` and eliminate its column from the other rows.
    pub fn apply_value(&mut self, i: usize, value: Real, fixed: &[bool]) {
        let neighbors: Vec<usize> = self.a.row(i).map(|(j, _)| j).filter(|&j| j != i).collect();
        for j in neighbors {
            if fixed[j] {
                continue;
            }
            if let Some(aji) = self.a.rows[j].remove(&i) {
                self.b[j] -= aji * value;
            }
        }
        self.a.rows[i].clear();
        self.a.rows[i].insert(i, 1.0);
        self.b[i] = value;
    }

    pub fn apply_rate(&mut self, i: usize, rate: Real) {
        self.b[i] += rate;
    }

    /// Let pore `i` discharge `inflow * x_i` by bulk flow.
    pub fn apply_outflow(&mut self, i: usize, inflow: Real) {
        self.a.add(i, i, inflow);
    }

    /// Apply every registered condition. Dirichlet rows are eliminated
    /// last so that no eliminated column is touched again.
    pub fn apply_bcs(&mut self, bcs: &BcTable, inflow: Option<&[Real]>) {
        let mut fixed = vec![false; self.b.len()];
        for (i, bc) in bcs.iter() {
            match bc {
                BoundaryCondition::Value(_) => fixed[i] = true,
                BoundaryCondition::Rate(r) => self.apply_rate(i, r),
                BoundaryCondition::Outflow => {
                    if let Some(q) = inflow {
                        self.apply_outflow(i, q[i]);
                    }
                }
            }
        }
        for (i, v) in bcs.values() {
            self.apply_value(i, v, &fixed);
        }
    }

    pub fn rhs(&self) -> DVector<Real> {
        DVector::from_column_slice(&self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bc::ConflictPolicy;

    fn chain3() -> Vec<[usize; 2]> {
        vec![[0, 1], [1, 2]]
    }

    #[test]
    fn symmetric_stamp_is_laplacian() {
        let sys = LinearSystem::assemble(3, &chain3(), &DirectedWeights::symmetric(vec![1.0, 2.0]));
        assert_eq!(sys.a.get(0, 0), 1.0);
        assert_eq!(sys.a.get(1, 1), 3.0);
        assert_eq!(sys.a.get(2, 2), 2.0);
        assert_eq!(sys.a.get(0, 1), -1.0);
        assert_eq!(sys.a.get(2, 1), -2.0);
        assert!(sys.a.is_symmetric(1e-12));
        for i in 0..3 {
            let row_sum: Real = sys.a.row(i).map(|(_, v)| v).sum();
            assert!(row_sum.abs() < 1e-12);
        }
    }

    #[test]
    fn directed_stamp_conserves_columns() {
        let w = DirectedWeights {
            forward: vec![0.5],
            reverse: vec![1.5],
        };
        let sys = LinearSystem::assemble(2, &[[0, 1]], &w);
        assert_eq!(sys.a.get(0, 0), 1.5);
        assert_eq!(sys.a.get(0, 1), -0.5);
        assert_eq!(sys.a.get(1, 0), -1.5);
        assert_eq!(sys.a.get(1, 1), 0.5);
        // Rate leaving 0 equals rate entering 1.
        assert_eq!(w.flux(0, 2.0, 1.0), 1.5 * 2.0 - 0.5 * 1.0);
        assert!(!sys.a.is_symmetric(1e-12));
    }

    #[test]
    fn dirichlet_elimination_keeps_symmetry() {
        let mut sys = LinearSystem::assemble(3, &chain3(), &DirectedWeights::symmetric(vec![1.0, 1.0]));
        let mut bcs = BcTable::new(3);
        bcs.assign(
            &[0, 2],
            &[BoundaryCondition::Value(1.0), BoundaryCondition::Value(3.0)],
            ConflictPolicy::Overwrite,
        )
        .unwrap();
        sys.apply_bcs(&bcs, None);

        assert_eq!(sys.a.get(0, 0), 1.0);
        assert_eq!(sys.a.get(0, 1), 0.0);
        assert_eq!(sys.a.get(1, 0), 0.0);
        assert_eq!(sys.b, vec![1.0, 4.0, 3.0]);
        assert!(sys.a.is_symmetric(1e-12));
        assert!(sys.a.empty_rows().is_empty());
    }

    #[test]
    fn isolated_pore_has_empty_row() {
        let sys = LinearSystem::assemble(3, &[[0, 1]], &DirectedWeights::symmetric(vec![1.0]));
        assert_eq!(sys.a.empty_rows(), vec![2]);
    }
}
