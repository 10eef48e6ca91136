//! Sparse iterative solve: ILU(0)-preconditioned restarted GMRES.
//!
//! The system is first row-equilibrated so that every row has a unit
//! diagonal. Fixed-value rows (identity) and conductance rows (scaled by
//! the pore's total conductance) then share one residual scale, which keeps
//! the relative tolerance meaningful for every pore.

use pn_core::Real;

use crate::assembly::SparseRows;
use crate::error::{TransportError, TransportResult};

const PIVOT_FLOOR: Real = 1e-30;
const STAGNATION: Real = 1e-10;

/// Compressed sparse rows with the diagonal position of each row.
#[derive(Debug, Clone)]
struct Csr {
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<Real>,
    diag_idx: Vec<Option<usize>>,
}

impl Csr {
    fn from_rows(a: &SparseRows) -> Self {
        let n = a.dim();
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::with_capacity(a.nnz());
        let mut values = Vec::with_capacity(a.nnz());
        let mut diag_idx = vec![None; n];
        row_ptr.push(0);
        for (i, diag) in diag_idx.iter_mut().enumerate() {
            for (j, v) in a.row(i) {
                if j == i {
                    *diag = Some(col_idx.len());
                }
                col_idx.push(j);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            row_ptr,
            col_idx,
            values,
            diag_idx,
        }
    }

    fn dim(&self) -> usize {
        self.diag_idx.len()
    }

    fn mul_vec(&self, x: &[Real], y: &mut [Real]) {
        for (i, yi) in y.iter_mut().enumerate() {
            let range = self.row_ptr[i]..self.row_ptr[i + 1];
            *yi = self.col_idx[range.clone()]
                .iter()
                .zip(&self.values[range])
                .map(|(&j, &v)| v * x[j])
                .sum();
        }
    }

    /// Divide each row (and `b`) by its diagonal, or by its largest entry
    /// when the diagonal is missing.
    fn equilibrate(&mut self, b: &mut [Real]) {
        for (i, bi) in b.iter_mut().enumerate() {
            let range = self.row_ptr[i]..self.row_ptr[i + 1];
            let scale = match self.diag_idx[i].map(|p| self.values[p]) {
                Some(d) if d != 0.0 => d.abs(),
                _ => self.values[range.clone()]
                    .iter()
                    .fold(0.0, |m: Real, v| m.max(v.abs())),
            };
            if scale > 0.0 {
                for v in &mut self.values[range] {
                    *v /= scale;
                }
                *bi /= scale;
            }
        }
    }
}

/// Incomplete LU factorization with the sparsity pattern of `A`.
///
/// `L` (unit diagonal, not stored) and `U` share the pattern of the
/// original matrix.
#[derive(Debug, Clone)]
struct Ilu0 {
    lu: Csr,
    diag_idx: Vec<usize>,
}

impl Ilu0 {
    fn factor(a: &Csr) -> TransportResult<Self> {
        let n = a.dim();
        let diag_idx = a
            .diag_idx
            .iter()
            .enumerate()
            .map(|(i, d)| {
                d.ok_or_else(|| TransportError::singular(format!("no diagonal entry in row {i}")))
            })
            .collect::<TransportResult<Vec<_>>>()?;
        let mut lu = a.clone();

        for i in 1..n {
            let (start, end) = (lu.row_ptr[i], lu.row_ptr[i + 1]);
            for p in start..end {
                let k = lu.col_idx[p];
                if k >= i {
                    break;
                }
                let pivot = lu.values[diag_idx[k]];
                if pivot.abs() < PIVOT_FLOOR {
                    return Err(TransportError::singular(format!("zero pivot in row {k}")));
                }
                let lik = lu.values[p] / pivot;
                lu.values[p] = lik;

                let (k_start, k_end) = (diag_idx[k] + 1, lu.row_ptr[k + 1]);
                for q in (p + 1)..end {
                    let j = lu.col_idx[q];
                    if let Ok(offset) = lu.col_idx[k_start..k_end].binary_search(&j) {
                        let ukj = lu.values[k_start + offset];
                        lu.values[q] -= lik * ukj;
                    }
                }
            }
        }

        if let Some(i) = (0..n).find(|&i| lu.values[diag_idx[i]].abs() < PIVOT_FLOOR) {
            return Err(TransportError::singular(format!("zero pivot in row {i}")));
        }
        Ok(Self { lu, diag_idx })
    }

    /// `z = U⁻¹ L⁻¹ r`.
    fn apply(&self, r: &[Real], z: &mut [Real]) {
        let lu = &self.lu;
        let n = lu.dim();
        for i in 0..n {
            let mut sum = r[i];
            for p in lu.row_ptr[i]..self.diag_idx[i] {
                sum -= lu.values[p] * z[lu.col_idx[p]];
            }
            z[i] = sum;
        }
        for i in (0..n).rev() {
            let d = self.diag_idx[i];
            let mut sum = z[i];
            for p in (d + 1)..lu.row_ptr[i + 1] {
                sum -= lu.values[p] * z[lu.col_idx[p]];
            }
            z[i] = sum / lu.values[d];
        }
    }
}

fn norm(x: &[Real]) -> Real {
    x.iter().map(|v| v * v).sum::<Real>().sqrt()
}

/// Solve `A x = b` with right-preconditioned restarted GMRES.
///
/// `rtol` bounds the residual of the equilibrated system relative to its
/// right-hand side; `max_iter` counts Arnoldi steps across restarts.
pub(crate) fn solve_gmres(
    a: &SparseRows,
    b: &[Real],
    rtol: Real,
    restart: usize,
    max_iter: usize,
) -> TransportResult<Vec<Real>> {
    let n = a.dim();
    let mut csr = Csr::from_rows(a);
    let mut b = b.to_vec();
    csr.equilibrate(&mut b);
    let ilu = Ilu0::factor(&csr)?;

    let mut x = vec![0.0; n];
    let b_norm = norm(&b);
    if b_norm == 0.0 {
        return Ok(x);
    }

    let m = restart.clamp(1, n.max(1));
    let mut ax = vec![0.0; n];
    let mut z = vec![0.0; n];
    let mut w = vec![0.0; n];
    let mut total = 0;
    let mut previous = Real::INFINITY;

    while total < max_iter {
        csr.mul_vec(&x, &mut ax);
        let mut r: Vec<Real> = b.iter().zip(&ax).map(|(bi, ai)| bi - ai).collect();
        let r_norm = norm(&r);
        if r_norm <= rtol * b_norm {
            tracing::debug!(iterations = total, residual = r_norm / b_norm, "gmres converged");
            return Ok(x);
        }
        // A tolerance below rounding level can't be met; stop once a whole
        // cycle makes no progress there.
        if r_norm >= previous && r_norm <= STAGNATION * b_norm {
            tracing::debug!(iterations = total, residual = r_norm / b_norm, "gmres stagnated");
            return Ok(x);
        }
        previous = r_norm;

        for ri in &mut r {
            *ri /= r_norm;
        }
        let mut v: Vec<Vec<Real>> = Vec::with_capacity(m + 1);
        v.push(r);
        // h[k][j]: column k of the Hessenberg matrix.
        let mut h = vec![vec![0.0; m + 1]; m];
        let mut g = vec![0.0; m + 1];
        g[0] = r_norm;
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];

        let mut k = 0;
        while k < m && total < max_iter {
            total += 1;
            ilu.apply(&v[k], &mut z);
            csr.mul_vec(&z, &mut w);

            for j in 0..=k {
                let hjk: Real = v[j].iter().zip(&w).map(|(a, b)| a * b).sum();
                h[k][j] = hjk;
                for (wi, vi) in w.iter_mut().zip(&v[j]) {
                    *wi -= hjk * vi;
                }
            }
            let w_norm = norm(&w);
            h[k][k + 1] = w_norm;

            for j in 0..k {
                let temp = cs[j] * h[k][j] + sn[j] * h[k][j + 1];
                h[k][j + 1] = -sn[j] * h[k][j] + cs[j] * h[k][j + 1];
                h[k][j] = temp;
            }
            let (c, s) = givens(h[k][k], h[k][k + 1]);
            cs[k] = c;
            sn[k] = s;
            h[k][k] = c * h[k][k] + s * h[k][k + 1];
            h[k][k + 1] = 0.0;
            g[k + 1] = -s * g[k];
            g[k] *= c;

            k += 1;
            if w_norm < PIVOT_FLOOR || g[k].abs() <= rtol * b_norm {
                break;
            }
            v.push(w.iter().map(|wi| wi / w_norm).collect());
        }

        let mut y = vec![0.0; k];
        for i in (0..k).rev() {
            let mut sum = g[i];
            for j in (i + 1)..k {
                sum -= h[j][i] * y[j];
            }
            if h[i][i].abs() < PIVOT_FLOOR {
                return Err(TransportError::singular(
                    "gmres stagnated on a rank-deficient Krylov space",
                ));
            }
            y[i] = sum / h[i][i];
        }

        let mut update = vec![0.0; n];
        for (vi, yi) in v.iter().zip(&y) {
            for (u, vij) in update.iter_mut().zip(vi) {
                *u += yi * vij;
            }
        }
        ilu.apply(&update, &mut z);
        for (xi, zi) in x.iter_mut().zip(&z) {
            *xi += zi;
        }
    }

    csr.mul_vec(&x, &mut ax);
    let residual = norm(&b.iter().zip(&ax).map(|(bi, ai)| bi - ai).collect::<Vec<_>>()) / b_norm;
    if residual <= rtol.max(STAGNATION) {
        return Ok(x);
    }
    Err(TransportError::singular(format!(
        "gmres did not converge in {max_iter} iterations (relative residual {residual:.3e})"
    )))
}

fn givens(a: Real, b: Real) -> (Real, Real) {
    if b == 0.0 {
        return (1.0, 0.0);
    }
    let r = a.hypot(b);
    (a / r, b / r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tridiagonal(n: usize, lower: Real, diag: Real, upper: Real) -> SparseRows {
        let mut a = SparseRows::new(n);
        for i in 0..n {
            a.add(i, i, diag);
            if i > 0 {
                a.add(i, i - 1, lower);
            }
            if i + 1 < n {
                a.add(i, i + 1, upper);
            }
        }
        a
    }

    #[test]
    fn ilu_of_tridiagonal_is_exact() {
        let a = tridiagonal(8, -1.0, 3.0, -1.5);
        let csr = Csr::from_rows(&a);
        let ilu = Ilu0::factor(&csr).unwrap();
        let x: Vec<Real> = (0..8).map(|i| i as Real - 2.5).collect();
        let mut b = vec![0.0; 8];
        csr.mul_vec(&x, &mut b);
        let mut z = vec![0.0; 8];
        ilu.apply(&b, &mut z);
        for (zi, xi) in z.iter().zip(&x) {
            assert!((zi - xi).abs() < 1e-12, "{zi} != {xi}");
        }
    }

    #[test]
    fn zero_pivot_is_singular() {
        let a = tridiagonal(2, -1.0, 1.0, -1.0);
        let err = Ilu0::factor(&Csr::from_rows(&a)).unwrap_err();
        assert!(matches!(err, TransportError::SingularMatrix { .. }));
    }

    #[test]
    fn missing_diagonal_is_singular() {
        let mut a = SparseRows::new(2);
        a.add(0, 1, 1.0);
        a.add(1, 0, 1.0);
        let err = solve_gmres(&a, &[1.0, 1.0], 1e-12, 10, 100).unwrap_err();
        assert!(matches!(err, TransportError::SingularMatrix { .. }));
    }

    #[test]
    fn short_restarts_still_converge() {
        // Five-point convection-diffusion stencil; ILU(0) is not exact here.
        let (nx, ny) = (12, 9);
        let n = nx * ny;
        let mut a = SparseRows::new(n);
        for i in 0..nx {
            for j in 0..ny {
                let p = i * ny + j;
                a.add(p, p, 4.5);
                if i > 0 {
                    a.add(p, p - ny, -1.8);
                }
                if i + 1 < nx {
                    a.add(p, p + ny, -0.7);
                }
                if j > 0 {
                    a.add(p, p - 1, -1.0);
                }
                if j + 1 < ny {
                    a.add(p, p + 1, -1.0);
                }
            }
        }
        let b: Vec<Real> = (0..n).map(|p| ((p * 7) % 11) as Real).collect();
        let x = solve_gmres(&a, &b, 1e-12, 5, 5_000).unwrap();
        let mut ax = vec![0.0; n];
        a.mul_vec(&x, &mut ax);
        for (l, r) in ax.iter().zip(&b) {
            assert!((l - r).abs() < 1e-9, "{l} != {r}");
        }
    }
}
