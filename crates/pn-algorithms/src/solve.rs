//! Linear solvers for assembled transport systems.

use pn_core::Real;

use crate::assembly::SparseRows;
use crate::error::{TransportError, TransportResult};
use crate::krylov::solve_gmres;

/// Which linear solver `run` uses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum SolverKind {
    /// ILU(0)-preconditioned restarted GMRES on the sparse rows. Handles
    /// the non-symmetric systems of advective transport.
    Gmres {
        rtol: Real,
        restart: usize,
        max_iter: usize,
    },
    /// Dense LU factorization. Cubic in the pore count, so only for small
    /// networks.
    #[cfg_attr(feature = "serde", serde(alias = "direct"))]
    DenseLu,
    /// Jacobi-preconditioned conjugate gradient on the sparse rows.
    /// Symmetric systems only.
    ConjugateGradient { rtol: Real, max_iter: usize },
}

impl Default for SolverKind {
    fn default() -> Self {
        Self::gmres()
    }
}

impl SolverKind {
    pub fn gmres() -> Self {
        Self::Gmres {
            rtol: 1e-14,
            restart: 50,
            max_iter: 10_000,
        }
    }

    pub fn conjugate_gradient() -> Self {
        Self::ConjugateGradient {
            rtol: 1e-12,
            max_iter: 10_000,
        }
    }
}

pub fn solve(a: &SparseRows, b: &[Real], kind: SolverKind) -> TransportResult<Vec<Real>> {
    if a.dim() != b.len() {
        return Err(TransportError::LengthMismatch {
            what: "right-hand side".to_string(),
            expected: a.dim(),
            actual: b.len(),
        });
    }
    let x = match kind {
        SolverKind::Gmres {
            rtol,
            restart,
            max_iter,
        } => solve_gmres(a, b, rtol, restart, max_iter)?,
        SolverKind::DenseLu => solve_dense(a, b)?,
        SolverKind::ConjugateGradient { rtol, max_iter } => {
            if !a.is_symmetric(1e-12) {
                return Err(TransportError::config(
                    "conjugate gradient requires a symmetric system",
                ));
            }
            solve_cg(a, b, rtol, max_iter)?
        }
    };
    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(TransportError::singular(format!(
            "non-finite solution at pore {i}"
        )));
    }
    Ok(x)
}

fn solve_dense(a: &SparseRows, b: &[Real]) -> TransportResult<Vec<Real>> {
    let rhs = nalgebra::DVector::from_column_slice(b);
    a.to_dense()
        .lu()
        .solve(&rhs)
        .map(|x| x.as_slice().to_vec())
        .ok_or_else(|| TransportError::singular("LU factorization failed"))
}

fn dot(x: &[Real], y: &[Real]) -> Real {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

fn solve_cg(a: &SparseRows, b: &[Real], rtol: Real, max_iter: usize) -> TransportResult<Vec<Real>> {
    let n = b.len();
    let inv_diag: Vec<Real> = a
        .diagonal()
        .into_iter()
        .map(|d| if d != 0.0 { 1.0 / d } else { 1.0 })
        .collect();

    let mut x = vec![0.0; n];
    let mut r = b.to_vec();
    let b_norm = dot(b, b).sqrt();
    if b_norm == 0.0 {
        return Ok(x);
    }
    let mut z: Vec<Real> = r.iter().zip(&inv_diag).map(|(r, m)| r * m).collect();
    let mut p = z.clone();
    let mut ap = vec![0.0; n];
    let mut rz = dot(&r, &z);

    for iter in 0..max_iter {
        a.mul_vec(&p, &mut ap);
        let pap = dot(&p, &ap);
        if pap == 0.0 || !pap.is_finite() {
            return Err(TransportError::singular(format!(
                "conjugate gradient breakdown at iteration {iter}"
            )));
        }
        let alpha = rz / pap;
        for k in 0..n {
            x[k] += alpha * p[k];
            r[k] -= alpha * ap[k];
        }

        let r_norm = dot(&r, &r).sqrt();
        if r_norm <= rtol * b_norm {
            tracing::debug!(iterations = iter + 1, residual = r_norm / b_norm, "cg converged");
            return Ok(x);
        }

        for k in 0..n {
            z[k] = r[k] * inv_diag[k];
        }
        let rz_new = dot(&r, &z);
        let beta = rz_new / rz;
        rz = rz_new;
        for k in 0..n {
            p[k] = z[k] + beta * p[k];
        }
    }

    Err(TransportError::singular(format!(
        "conjugate gradient did not converge in {max_iter} iterations"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{DirectedWeights, LinearSystem};
    use crate::bc::{BcTable, BoundaryCondition, ConflictPolicy};

    fn chain_system(n: usize) -> LinearSystem {
        let conns: Vec<[usize; 2]> = (1..n).map(|i| [i - 1, i]).collect();
        let mut sys = LinearSystem::assemble(n, &conns, &DirectedWeights::symmetric(vec![1.0; n - 1]));
        let mut bcs = BcTable::new(n);
        bcs.assign(
            &[0, n - 1],
            &[BoundaryCondition::Value(0.0), BoundaryCondition::Value(1.0)],
            ConflictPolicy::Overwrite,
        )
        .unwrap();
        sys.apply_bcs(&bcs, None);
        sys
    }

    #[test]
    fn solvers_agree_on_a_chain() {
        let sys = chain_system(6);
        let dense = solve(&sys.a, &sys.b, SolverKind::DenseLu).unwrap();
        let cg = solve(&sys.a, &sys.b, SolverKind::conjugate_gradient()).unwrap();
        let gmres = solve(&sys.a, &sys.b, SolverKind::default()).unwrap();
        for (i, d) in dense.iter().enumerate() {
            assert!((d - i as Real / 5.0).abs() < 1e-10);
            assert!((d - cg[i]).abs() < 1e-9);
            assert!((d - gmres[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn gmres_matches_dense_on_nonsymmetric_rows() {
        let n = 7;
        let conns: Vec<[usize; 2]> = (1..n).map(|i| [i - 1, i]).collect();
        let w = DirectedWeights {
            forward: vec![0.4; n - 1],
            reverse: vec![2.5; n - 1],
        };
        let mut sys = LinearSystem::assemble(n, &conns, &w);
        let mut bcs = BcTable::new(n);
        bcs.assign(
            &[0, 3],
            &[BoundaryCondition::Value(1.0), BoundaryCondition::Rate(0.3)],
            ConflictPolicy::Overwrite,
        )
        .unwrap();
        sys.apply_bcs(&bcs, None);
        assert!(!sys.a.is_symmetric(1e-12));

        let dense = solve(&sys.a, &sys.b, SolverKind::DenseLu).unwrap();
        let gmres = solve(&sys.a, &sys.b, SolverKind::default()).unwrap();
        for (d, g) in dense.iter().zip(&gmres) {
            assert!((d - g).abs() < 1e-10 * (1.0 + d.abs()), "{d} != {g}");
        }
    }

    #[test]
    fn singular_systems_are_reported() {
        let sys = LinearSystem::assemble(2, &[[0, 1]], &DirectedWeights::symmetric(vec![1.0]));
        for kind in [SolverKind::DenseLu, SolverKind::default()] {
            let err = solve(&sys.a, &sys.b, kind).unwrap_err();
            assert!(matches!(err, TransportError::SingularMatrix { .. }), "{kind:?}");
        }
    }

    #[test]
    fn cg_refuses_nonsymmetric() {
        let w = DirectedWeights {
            forward: vec![1.0],
            reverse: vec![2.0],
        };
        let sys = LinearSystem::assemble(2, &[[0, 1]], &w);
        let err = solve(&sys.a, &sys.b, SolverKind::conjugate_gradient()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfiguration { .. }));
    }
}
