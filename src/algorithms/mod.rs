//! Reference numerical routines.
//!
//! ** NOTE: Most callers want the high-level entry points in [`crate::eigen`],
//! [`crate::reduction`] and [`crate::verification`]. This module holds the building blocks
//! they are made of, exposed for fine-grained control and benchmarking.
//!
//! The routines follow the calling conventions of the reference dense linear-algebra
//! library they mirror: they operate in place on caller-owned buffers, report an integer
//! `info` status (0 = success, `-k` = argument `k` is illegal, `+k` = algorithmic failure),
//! and store orthogonal factors in packed Householder form.
//!
//! - [`bidiag`]: unblocked (`gebd2`) and blocked panel (`labrd`) bidiagonal reduction.
//! - [`orthogonal`]: explicit generation of `Q` and `Pᵗ` from packed reflectors (`orgbr`).
//! - [`tridiag`]: the symmetric tridiagonal eigensolver (`stedc`) and its eigenvalue-only
//!   kernel (`sterf`).
//! - [`checks`]: factorization and orthogonality residuals (`bdt01`, `ort01`).

pub mod bidiag;
pub mod checks;
pub mod orthogonal;
pub mod tridiag;

use faer::{Mat, MatMut, MatRef, prelude::*};

/// Relative machine precision used to scale every residual reported by the crate.
pub const EPS: f64 = f64::EPSILON;

/// Euclidean norm with scaling, immune to overflow for large entries.
pub(crate) fn nrm2(x: &[f64]) -> f64 {
    let mut scale = 0.0f64;
    let mut ssq = 1.0f64;
    for &value in x {
        if value != 0.0 {
            let abs = value.abs();
            if scale < abs {
                ssq = 1.0 + ssq * (scale / abs).powi(2);
                scale = abs;
            } else {
                ssq += (abs / scale).powi(2);
            }
        }
    }
    scale * ssq.sqrt()
}

/// Generates an elementary reflector `H = I - tau * v * vᵗ` such that
/// `H * [alpha; x] = [beta; 0]`, with `v = [1; x']`.
///
/// On return `x` holds `x'` and the pair `(beta, tau)` is returned. When `x` is already
/// zero, `tau = 0` and `H` is the identity.
pub(crate) fn householder(alpha: f64, x: &mut [f64]) -> (f64, f64) {
    let mut xnorm = nrm2(x);
    if xnorm == 0.0 {
        return (alpha, 0.0);
    }

    let mut alpha = alpha;
    let mut beta = -alpha.hypot(xnorm).copysign(alpha);
    let safmin = f64::MIN_POSITIVE / EPS;
    let mut rescalings = 0;

    // beta may be inaccurate when both alpha and x are tiny; rescale and recompute.
    if beta.abs() < safmin {
        let rsafmn = 1.0 / safmin;
        while beta.abs() < safmin && rescalings < 20 {
            rescalings += 1;
            x.iter_mut().for_each(|v| *v *= rsafmn);
            beta *= rsafmn;
            alpha *= rsafmn;
        }
        xnorm = nrm2(x);
        beta = -alpha.hypot(xnorm).copysign(alpha);
    }

    let tau = (beta - alpha) / beta;
    let inv = 1.0 / (alpha - beta);
    x.iter_mut().for_each(|v| *v *= inv);
    for _ in 0..rescalings {
        beta *= safmin;
    }
    (beta, tau)
}

/// Builds the reflector annihilating `a[(row + 1.., col)]`, storing `v` below the
/// diagonal entry and `beta` in it. Returns `(beta, tau)`.
pub(crate) fn reflect_column(mut a: MatMut<'_, f64>, row: usize, col: usize) -> (f64, f64) {
    let m = a.nrows();
    let mut x: Vec<f64> = (row + 1..m).map(|i| a[(i, col)]).collect();
    let (beta, tau) = householder(a[(row, col)], &mut x);
    for (k, value) in x.into_iter().enumerate() {
        a[(row + 1 + k, col)] = value;
    }
    a[(row, col)] = beta;
    (beta, tau)
}

/// Builds the reflector annihilating `a[(row, col + 1..)]`, storing `u` to the right of the
/// leading entry and `beta` in it. Returns `(beta, tau)`.
pub(crate) fn reflect_row(mut a: MatMut<'_, f64>, row: usize, col: usize) -> (f64, f64) {
    let n = a.ncols();
    let mut x: Vec<f64> = (col + 1..n).map(|j| a[(row, j)]).collect();
    let (beta, tau) = householder(a[(row, col)], &mut x);
    for (k, value) in x.into_iter().enumerate() {
        a[(row, col + 1 + k)] = value;
    }
    a[(row, col)] = beta;
    (beta, tau)
}

/// The reflector vector stored in column `col` starting at `row`, with its implicit
/// leading one made explicit.
pub(crate) fn column_reflector(a: MatRef<'_, f64>, row: usize, col: usize) -> Mat<f64> {
    Mat::from_fn(a.nrows() - row, 1, |k, _| {
        if k == 0 { 1.0 } else { a[(row + k, col)] }
    })
}

/// The reflector vector stored in row `row` starting at `col`, as a column, with its
/// implicit leading one made explicit.
pub(crate) fn row_reflector(a: MatRef<'_, f64>, row: usize, col: usize) -> Mat<f64> {
    Mat::from_fn(a.ncols() - col, 1, |k, _| {
        if k == 0 { 1.0 } else { a[(row, col + k)] }
    })
}

/// Applies `H = I - tau * v * vᵗ` from the left: `C := H * C`.
pub(crate) fn apply_left(c: MatMut<'_, f64>, v: MatRef<'_, f64>, tau: f64, par: Par) {
    if tau == 0.0 || c.ncols() == 0 {
        return;
    }
    let w = c.rb().transpose() * v;
    faer::linalg::matmul::matmul(c, faer::Accum::Add, v, w.as_ref().transpose(), -tau, par);
}

/// Applies `G = I - tau * u * uᵗ` from the right: `C := C * G`.
pub(crate) fn apply_right(c: MatMut<'_, f64>, u: MatRef<'_, f64>, tau: f64, par: Par) {
    if tau == 0.0 || c.nrows() == 0 {
        return;
    }
    let w = c.rb() * u;
    faer::linalg::matmul::matmul(c, faer::Accum::Add, w.as_ref(), u.transpose(), -tau, par);
}

/// Matrix 1-norm: the largest absolute column sum.
pub fn one_norm(a: MatRef<'_, f64>) -> f64 {
    (0..a.ncols())
        .map(|j| (0..a.nrows()).map(|i| a[(i, j)].abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nrm2_matches_naive_norm() {
        let x = [3.0, -4.0, 12.0];
        assert!((nrm2(&x) - 13.0).abs() < 1e-14);
        assert_eq!(nrm2(&[]), 0.0);
        assert!((nrm2(&[1e200, 1e200]) - 2f64.sqrt() * 1e200).abs() < 1e186);
    }

    #[test]
    fn test_householder_annihilates_tail() {
        let alpha = 2.0;
        let original = [1.0, -2.0, 0.5];
        let mut x = original;
        let (beta, tau) = householder(alpha, &mut x);

        // Apply H to [alpha; original] and check it yields [beta; 0].
        let v = [1.0, x[0], x[1], x[2]];
        let y = [alpha, original[0], original[1], original[2]];
        let dot: f64 = v.iter().zip(&y).map(|(a, b)| a * b).sum();
        let hy: Vec<f64> = y.iter().zip(&v).map(|(yi, vi)| yi - tau * dot * vi).collect();
        assert!((hy[0] - beta).abs() < 1e-14);
        for value in &hy[1..] {
            assert!(value.abs() < 1e-14);
        }
        assert!((beta.abs() - nrm2(&y)).abs() < 1e-14);
    }

    #[test]
    fn test_householder_on_zero_tail_is_identity() {
        let mut x = [0.0, 0.0];
        let (beta, tau) = householder(-5.0, &mut x);
        assert_eq!(beta, -5.0);
        assert_eq!(tau, 0.0);
    }

    #[test]
    fn test_one_norm() {
        let a = faer::mat![[1.0, -7.0], [-2.0, 3.0]];
        assert_eq!(one_norm(a.as_ref()), 10.0);
    }
}
