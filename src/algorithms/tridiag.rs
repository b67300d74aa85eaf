//! Symmetric tridiagonal eigensolver.
//!
//! [`stedc`] follows the contract of the reference divide-and-conquer driver: it checks its
//! arguments, including that the caller-provided scratch meets the sizes computed by
//! [`crate::workspace::plan_workspace`], then solves. The eigenvalue-only mode runs the
//! implicit QL iteration of [`sterf`] directly on the tridiagonal; the vector modes stage
//! the matrix in the real workspace and hand it to faer's dense self-adjoint solver, whose
//! tridiagonal stage is itself divide and conquer.

use crate::workspace::{EigenMode, plan_workspace};
use faer::{Accum, MatMut, Side, linalg::matmul::matmul, prelude::*};

/// Maximum number of QL sweeps, per eigenvalue on average.
const MAX_SWEEPS_PER_EIGENVALUE: usize = 30;

/// Computes all eigenvalues of the symmetric tridiagonal matrix with diagonal `d` and
/// off-diagonal `e`, using the implicit QL method with Wilkinson shifts.
///
/// On exit `d` holds the eigenvalues in ascending order and `e` is destroyed. Returns 0 on
/// success, or the number of off-diagonal entries that failed to converge.
pub fn sterf(d: &mut [f64], e: &mut [f64]) -> i32 {
    let n = d.len();
    if n <= 1 {
        return 0;
    }
    if e.len() < n - 1 {
        return -3;
    }

    // off[i] couples d[i] and d[i + 1]; off[n - 1] is a zero sentinel.
    let mut off = Vec::with_capacity(n);
    off.extend_from_slice(&e[..n - 1]);
    off.push(0.0);

    let max_sweeps = MAX_SWEEPS_PER_EIGENVALUE * n;
    let mut sweeps = 0;

    for l in 0..n {
        loop {
            let mut mm = l;
            while mm < n - 1 {
                let dd = d[mm].abs() + d[mm + 1].abs();
                if off[mm].abs() <= super::EPS * dd {
                    break;
                }
                mm += 1;
            }
            if mm == l {
                break;
            }

            sweeps += 1;
            if sweeps > max_sweeps {
                let unconverged = off[..n - 1].iter().filter(|v| **v != 0.0).count();
                e[..n - 1].copy_from_slice(&off[..n - 1]);
                return unconverged as i32;
            }

            let mut g = (d[l + 1] - d[l]) / (2.0 * off[l]);
            let mut r = g.hypot(1.0);
            g = d[mm] - d[l] + off[l] / (g + r.copysign(g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut deflated = false;

            let mut i = mm;
            while i > l {
                i -= 1;
                let f = s * off[i];
                let b = c * off[i];
                r = f.hypot(g);
                off[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    off[mm] = 0.0;
                    deflated = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;
            }
            if deflated {
                continue;
            }
            d[l] -= p;
            off[l] = g;
            off[mm] = 0.0;
        }
    }

    d.sort_by(|a, b| a.total_cmp(b));
    e[..n - 1].iter_mut().for_each(|v| *v = 0.0);
    0
}

/// Computes eigenvalues and, depending on `mode`, eigenvectors of the symmetric tridiagonal
/// matrix `T` with diagonal `d` (length `n`) and off-diagonal `e` (length `>= n - 1`).
///
/// - `NoVectors`: `z` is not referenced.
/// - `IdentityInitialized`: on exit `z` (`n × n`) holds the orthonormal eigenvectors of `T`.
/// - `EigenvectorsOnly`: on entry `z` holds the orthogonal matrix used to reduce the
///   original symmetric matrix to `T`; on exit it holds the eigenvectors of the original.
///
/// `work` and `iwork` must hold at least the lengths planned for `(mode, n)`. On exit `d`
/// holds the eigenvalues in ascending order. Returns the `info` status code: `-4` for a
/// short `e`, `-6` for a misshapen `z`, `-8` / `-10` for short workspaces, a positive value
/// if the solver failed to converge.
pub fn stedc(
    mode: EigenMode,
    d: &mut [f64],
    e: &mut [f64],
    mut z: MatMut<'_, f64>,
    work: &mut [f64],
    iwork: &mut [i32],
    par: Par,
) -> i32 {
    let n = d.len();
    if n > 0 && e.len() < n - 1 {
        return -4;
    }
    if mode.wants_vectors() && (z.nrows() != n || z.ncols() != n) {
        return -6;
    }
    let plan = plan_workspace(mode, n);
    if work.len() < plan.real_len {
        return -8;
    }
    if iwork.len() < plan.int_len {
        return -10;
    }

    if n == 0 {
        return 0;
    }
    if n == 1 {
        if mode == EigenMode::IdentityInitialized {
            z[(0, 0)] = 1.0;
        }
        return 0;
    }

    if mode == EigenMode::NoVectors {
        return sterf(d, &mut e[..n - 1]);
    }

    let (t_buf, rest) = work.split_at_mut(n * n);
    let mut t = MatMut::from_column_major_slice_mut(t_buf, n, n);
    for j in 0..n {
        for i in 0..n {
            t[(i, j)] = 0.0;
        }
        t[(j, j)] = d[j];
        if j + 1 < n {
            t[(j + 1, j)] = e[j];
            t[(j, j + 1)] = e[j];
        }
    }

    let evd = match t.rb().self_adjoint_eigen(Side::Lower) {
        Ok(evd) => evd,
        Err(err) => {
            log::debug!("Dense self-adjoint eigensolver failed: {err:?}");
            return 1;
        }
    };
    let values = evd.S().column_vector();
    let vectors = evd.U();

    // Ascending order of eigenvalues, kept in the integer workspace.
    let order = &mut iwork[..n];
    for (k, slot) in order.iter_mut().enumerate() {
        *slot = k as i32;
    }
    order.sort_by(|&a, &b| values[a as usize].total_cmp(&values[b as usize]));

    for (k, &src) in order.iter().enumerate() {
        d[k] = values[src as usize];
    }
    e[..n - 1].iter_mut().for_each(|v| *v = 0.0);

    match mode {
        EigenMode::IdentityInitialized => {
            for (k, &src) in order.iter().enumerate() {
                for i in 0..n {
                    z[(i, k)] = vectors[(i, src as usize)];
                }
            }
        }
        EigenMode::EigenvectorsOnly => {
            let mut product = MatMut::from_column_major_slice_mut(&mut rest[..n * n], n, n);
            matmul(product.rb_mut(), Accum::Replace, z.rb(), vectors, 1.0, par);
            for (k, &src) in order.iter().enumerate() {
                for i in 0..n {
                    z[(i, k)] = product[(i, src as usize)];
                }
            }
        }
        EigenMode::NoVectors => unreachable!("eigenvalue-only mode returns early"),
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    /// Eigenvalues of the tridiagonal matrix with 2 on the diagonal and -1 next to it are
    /// `2 - 2 cos(k π / (n + 1))`.
    fn laplacian_eigenvalues(n: usize) -> Vec<f64> {
        (1..=n)
            .map(|k| 2.0 - 2.0 * (k as f64 * std::f64::consts::PI / (n + 1) as f64).cos())
            .collect()
    }

    #[test]
    fn test_sterf_on_discrete_laplacian() {
        let n = 50;
        let mut d = vec![2.0; n];
        let mut e = vec![-1.0; n - 1];
        assert_eq!(sterf(&mut d, &mut e), 0);
        for (computed, exact) in d.iter().zip(laplacian_eigenvalues(n)) {
            assert!((computed - exact).abs() < 1e-12, "{computed} vs {exact}");
        }
    }

    #[test]
    fn test_sterf_on_diagonal_matrix_sorts() {
        let mut d = vec![3.0, -1.0, 2.0];
        let mut e = vec![0.0, 0.0];
        assert_eq!(sterf(&mut d, &mut e), 0);
        assert_eq!(d, vec![-1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_stedc_identity_mode_diagonalizes() {
        let n = 30;
        let mut d: Vec<f64> = (0..n).map(|i| (i as f64).sin() + 2.0).collect();
        let mut e: Vec<f64> = (0..n - 1).map(|i| 0.5 + 0.1 * (i as f64).cos()).collect();
        let t = Mat::from_fn(n, n, |i, j| {
            if i == j {
                d[i]
            } else if i + 1 == j {
                e[i]
            } else if j + 1 == i {
                e[j]
            } else {
                0.0
            }
        });

        let plan = plan_workspace(EigenMode::IdentityInitialized, n);
        let mut work = vec![0.0; plan.real_len];
        let mut iwork = vec![0; plan.int_len];
        let mut z = Mat::<f64>::zeros(n, n);
        let info = stedc(
            EigenMode::IdentityInitialized,
            &mut d,
            &mut e,
            z.as_mut(),
            &mut work,
            &mut iwork,
            Par::Seq,
        );
        assert_eq!(info, 0);
        assert!(d.windows(2).all(|w| w[0] <= w[1]));

        let lambda = Mat::from_fn(n, n, |i, j| if i == j { d[i] } else { 0.0 });
        let residual = (&t * &z - &z * &lambda).norm_l2();
        assert!(residual < 1e-12, "residual {residual}");
    }

    #[test]
    fn test_stedc_rejects_short_workspace() {
        let n = 8;
        let plan = plan_workspace(EigenMode::EigenvectorsOnly, n);
        let mut d = vec![1.0; n];
        let mut e = vec![0.5; n - 1];
        let mut z = Mat::<f64>::identity(n, n);
        let mut work = vec![0.0; plan.real_len - 1];
        let mut iwork = vec![0; plan.int_len];
        let info = stedc(
            EigenMode::EigenvectorsOnly,
            &mut d,
            &mut e,
            z.as_mut(),
            &mut work,
            &mut iwork,
            Par::Seq,
        );
        assert_eq!(info, -8);

        let mut work = vec![0.0; plan.real_len];
        let mut iwork = vec![0; plan.int_len - 1];
        let info = stedc(
            EigenMode::EigenvectorsOnly,
            &mut d,
            &mut e,
            z.as_mut(),
            &mut work,
            &mut iwork,
            Par::Seq,
        );
        assert_eq!(info, -10);
    }

    #[test]
    fn test_stedc_rejects_misshapen_z() {
        let n = 4;
        let plan = plan_workspace(EigenMode::IdentityInitialized, n);
        let mut d = vec![1.0; n];
        let mut e = vec![0.5; n - 1];
        let mut z = Mat::<f64>::zeros(n, n - 1);
        let mut work = vec![0.0; plan.real_len];
        let mut iwork = vec![0; plan.int_len];
        let info = stedc(
            EigenMode::IdentityInitialized,
            &mut d,
            &mut e,
            z.as_mut(),
            &mut work,
            &mut iwork,
            Par::Seq,
        );
        assert_eq!(info, -6);
    }
}
