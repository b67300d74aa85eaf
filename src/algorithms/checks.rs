//! Residual tests for bidiagonal reductions.
//!
//! Both measures are normalized so that a backward-stable computation yields a value of a
//! few units: they are expressed in multiples of [`EPS`].

use super::{EPS, one_norm};
use faer::{Accum, Mat, MatRef, linalg::matmul::matmul, prelude::*};

/// Which set of vectors of a matrix is expected to be orthonormal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orthogonality {
    /// The columns: checks `UᵗU = I`.
    Columns,
    /// The rows: checks `UUᵗ = I`.
    Rows,
}

/// Reconstruction residual `‖A - Q·B·Pᵗ‖₁ / (n · ‖A‖₁ · eps)`.
///
/// `a` is the original `m × n` matrix, `q` is `m × n`, `pt` is `n × n`, and `B` is the
/// upper bidiagonal matrix with diagonal `d` and superdiagonal `e`.
pub fn bdt01(
    a: MatRef<'_, f64>,
    q: MatRef<'_, f64>,
    d: &[f64],
    e: &[f64],
    pt: MatRef<'_, f64>,
    par: Par,
) -> f64 {
    let (m, n) = (a.nrows(), a.ncols());
    if m == 0 || n == 0 {
        return 0.0;
    }

    let mut qb = Mat::<f64>::zeros(m, n);
    for j in 0..n {
        for i in 0..m {
            let upper = if j > 0 { e[j - 1] * q[(i, j - 1)] } else { 0.0 };
            qb[(i, j)] = d[j] * q[(i, j)] + upper;
        }
    }

    let mut residual = a.to_owned();
    matmul(residual.as_mut(), Accum::Add, qb.as_ref(), pt, -1.0, par);

    let resid = one_norm(residual.as_ref());
    let anorm = one_norm(a);
    let nf = n as f64;

    if anorm <= 0.0 {
        if resid != 0.0 { 1.0 / EPS } else { 0.0 }
    } else if anorm >= resid {
        (resid / anorm) / (nf * EPS)
    } else if anorm < 1.0 {
        (resid.min(nf * anorm) / anorm) / (nf * EPS)
    } else {
        (resid / anorm).min(nf) / (nf * EPS)
    }
}

/// Orthogonality residual `‖I - UᵗU‖₁ / (m · eps)` for columns, or `‖I - UUᵗ‖₁ / (n · eps)`
/// for rows, where `U` is `m × n`.
pub fn ort01(kind: Orthogonality, u: MatRef<'_, f64>) -> f64 {
    let (gram, length) = match kind {
        Orthogonality::Columns => (u.transpose() * u, u.nrows()),
        Orthogonality::Rows => (u * u.transpose(), u.ncols()),
    };
    let k = gram.nrows();
    if k == 0 {
        return 0.0;
    }
    let identity = Mat::<f64>::identity(k, k);
    let deviation = &identity - &gram;
    one_norm(deviation.as_ref()) / (length.max(1) as f64 * EPS)
}
