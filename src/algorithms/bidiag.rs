//! Householder reduction of a general `m × n` matrix (`m >= n`) to upper bidiagonal form.
//!
//! On exit the matrix holds the packed representation shared by every path in this crate:
//! the diagonal and superdiagonal of `B`, the vectors of the left reflectors `H(i)` below
//! the diagonal, and the vectors of the right reflectors `G(i)` to the right of the
//! superdiagonal. Leading unit entries are implicit. With
//! `Q = H(0)···H(n-1)` and `P = G(0)···G(n-2)`, `A = Q · B · Pᵗ`.

use super::{apply_left, apply_right, column_reflector, reflect_column, reflect_row, row_reflector};
use faer::{Accum, Mat, MatMut, linalg::matmul::matmul, prelude::*};

/// Validates the arguments shared by the reduction routines. Returns 0 or `-position`.
pub(crate) fn check_args(
    m: usize,
    n: usize,
    d_len: usize,
    e_len: usize,
    tauq_len: usize,
    taup_len: usize,
) -> i32 {
    if n == 0 || n > m {
        -2
    } else if d_len < n {
        -5
    } else if e_len < n - 1 {
        -6
    } else if tauq_len < n {
        -7
    } else if taup_len < n {
        -8
    } else {
        0
    }
}

/// Unblocked reduction to bidiagonal form, one reflector pair per column.
///
/// `e` needs at least `n - 1` entries; when it has `n`, the last one is set to zero.
/// Returns the `info` status code.
pub fn gebd2(
    mut a: MatMut<'_, f64>,
    d: &mut [f64],
    e: &mut [f64],
    tauq: &mut [f64],
    taup: &mut [f64],
    par: Par,
) -> i32 {
    let (m, n) = (a.nrows(), a.ncols());
    let info = check_args(m, n, d.len(), e.len(), tauq.len(), taup.len());
    if info != 0 {
        return info;
    }

    for i in 0..n {
        // H(i) annihilates A(i+1.., i).
        let (beta, tau) = reflect_column(a.rb_mut(), i, i);
        d[i] = beta;
        tauq[i] = tau;

        if i + 1 < n {
            let v = column_reflector(a.rb(), i, i);
            apply_left(
                a.rb_mut().submatrix_mut(i, i + 1, m - i, n - i - 1),
                v.as_ref(),
                tau,
                par,
            );

            // G(i) annihilates A(i, i+2..).
            let (beta, tau) = reflect_row(a.rb_mut(), i, i + 1);
            e[i] = beta;
            taup[i] = tau;

            let u = row_reflector(a.rb(), i, i + 1);
            apply_right(
                a.rb_mut().submatrix_mut(i + 1, i + 1, m - i - 1, n - i - 1),
                u.as_ref(),
                tau,
                par,
            );
        } else {
            taup[i] = 0.0;
        }
    }

    if e.len() >= n {
        e[n - 1] = 0.0;
    }
    0
}

/// Reduces the first `nb` rows and columns of `a` and returns the matrices `X` and `Y`
/// needed to apply the transformation to the unreduced part: the trailing block is then
/// updated as `A := A - V·Yᵗ - X·U`.
///
/// Requires `m >= n > nb`. `x` is `m × nb`, `y` is `n × nb`. The leading unit entries of
/// the panel reflectors are left explicit in `a`; the caller restores `d` and `e`.
pub fn labrd(
    mut a: MatMut<'_, f64>,
    nb: usize,
    d: &mut [f64],
    e: &mut [f64],
    tauq: &mut [f64],
    taup: &mut [f64],
    mut x: MatMut<'_, f64>,
    mut y: MatMut<'_, f64>,
) {
    let (m, n) = (a.nrows(), a.ncols());
    debug_assert!(m >= n && n > nb);

    for i in 0..nb {
        // Bring column i up to date with the transformations of the panel so far.
        if i > 0 {
            let t = a.rb().submatrix(i, 0, m - i, i) * y.rb().submatrix(i, 0, 1, i).transpose();
            let s = x.rb().submatrix(i, 0, m - i, i) * a.rb().submatrix(0, i, i, 1);
            for r in 0..m - i {
                a[(i + r, i)] -= t[(r, 0)] + s[(r, 0)];
            }
        }

        let (beta, tau) = reflect_column(a.rb_mut(), i, i);
        d[i] = beta;
        tauq[i] = tau;
        a[(i, i)] = 1.0;
        let v = a.rb().submatrix(i, i, m - i, 1).to_owned();

        // Y(i+1.., i)
        let mut ycol = a.rb().submatrix(i, i + 1, m - i, n - i - 1).transpose() * &v;
        if i > 0 {
            let t = a.rb().submatrix(i, 0, m - i, i).transpose() * &v;
            ycol = ycol - y.rb().submatrix(i + 1, 0, n - i - 1, i) * &t;
            let t = x.rb().submatrix(i, 0, m - i, i).transpose() * &v;
            ycol = ycol - a.rb().submatrix(0, i + 1, i, n - i - 1).transpose() * &t;
        }
        for r in 0..n - i - 1 {
            y[(i + 1 + r, i)] = tau * ycol[(r, 0)];
        }

        // Bring row i up to date.
        let t = y.rb().submatrix(i + 1, 0, n - i - 1, i + 1)
            * a.rb().submatrix(i, 0, 1, i + 1).transpose();
        for c in 0..n - i - 1 {
            a[(i, i + 1 + c)] -= t[(c, 0)];
        }
        if i > 0 {
            let t = a.rb().submatrix(0, i + 1, i, n - i - 1).transpose()
                * x.rb().submatrix(i, 0, 1, i).transpose();
            for c in 0..n - i - 1 {
                a[(i, i + 1 + c)] -= t[(c, 0)];
            }
        }

        let (beta, tau) = reflect_row(a.rb_mut(), i, i + 1);
        e[i] = beta;
        taup[i] = tau;
        a[(i, i + 1)] = 1.0;
        let u = a.rb().submatrix(i, i + 1, 1, n - i - 1).transpose().to_owned();

        // X(i+1.., i)
        let mut xcol = a.rb().submatrix(i + 1, i + 1, m - i - 1, n - i - 1) * &u;
        let t = y.rb().submatrix(i + 1, 0, n - i - 1, i + 1).transpose() * &u;
        xcol = xcol - a.rb().submatrix(i + 1, 0, m - i - 1, i + 1) * &t;
        if i > 0 {
            let t = a.rb().submatrix(0, i + 1, i, n - i - 1) * &u;
            xcol = xcol - x.rb().submatrix(i + 1, 0, m - i - 1, i) * &t;
        }
        for r in 0..m - i - 1 {
            x[(i + 1 + r, i)] = tau * xcol[(r, 0)];
        }
    }
}

/// Blocked reduction: panels of `nb` columns through [`labrd`] with two rank-`nb` trailing
/// updates each, then [`gebd2`] once fewer than `crossover` columns remain.
///
/// `x` and `y` are caller-owned scratch of at least `m × nb` and `n × nb`.
/// Returns the `info` status code.
#[allow(clippy::too_many_arguments)]
pub fn gebrd_blocked(
    mut a: MatMut<'_, f64>,
    d: &mut [f64],
    e: &mut [f64],
    tauq: &mut [f64],
    taup: &mut [f64],
    nb: usize,
    crossover: usize,
    mut x: MatMut<'_, f64>,
    mut y: MatMut<'_, f64>,
    par: Par,
) -> i32 {
    let (m, n) = (a.nrows(), a.ncols());
    let info = check_args(m, n, d.len(), e.len(), tauq.len(), taup.len());
    if info != 0 {
        return info;
    }
    if nb == 0 || x.nrows() < m || y.nrows() < n || x.ncols() < nb || y.ncols() < nb {
        return -10;
    }

    let nx = crossover.max(nb);
    let mut i = 0;
    while n - i > nx {
        let (mm, nn) = (m - i, n - i);
        let mut panel = a.rb_mut().submatrix_mut(i, i, mm, nn);
        let mut xp = x.rb_mut().submatrix_mut(0, 0, mm, nb);
        let mut yp = y.rb_mut().submatrix_mut(0, 0, nn, nb);

        labrd(
            panel.rb_mut(),
            nb,
            &mut d[i..i + nb],
            &mut e[i..i + nb],
            &mut tauq[i..i + nb],
            &mut taup[i..i + nb],
            xp.rb_mut(),
            yp.rb_mut(),
        );

        let v: Mat<f64> = panel.rb().submatrix(nb, 0, mm - nb, nb).to_owned();
        let u: Mat<f64> = panel.rb().submatrix(0, nb, nb, nn - nb).to_owned();
        let mut trailing = panel.rb_mut().submatrix_mut(nb, nb, mm - nb, nn - nb);
        matmul(
            trailing.rb_mut(),
            Accum::Add,
            v.as_ref(),
            yp.rb().submatrix(nb, 0, nn - nb, nb).transpose(),
            -1.0,
            par,
        );
        matmul(
            trailing.rb_mut(),
            Accum::Add,
            xp.rb().submatrix(nb, 0, mm - nb, nb),
            u.as_ref(),
            -1.0,
            par,
        );

        for j in 0..nb {
            panel[(j, j)] = d[i + j];
            panel[(j, j + 1)] = e[i + j];
        }
        i += nb;
    }

    gebd2(
        a.rb_mut().submatrix_mut(i, i, m - i, n - i),
        &mut d[i..n],
        &mut e[i..],
        &mut tauq[i..n],
        &mut taup[i..n],
        par,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_matrix(m: usize, n: usize, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(m, n, |_, _| rng.random::<f64>())
    }

    #[test]
    fn test_gebd2_rejects_wide_matrices() {
        let mut a = Mat::<f64>::zeros(3, 4);
        let (mut d, mut e, mut tq, mut tp) =
            (vec![0.0; 4], vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]);
        let info = gebd2(a.as_mut(), &mut d, &mut e, &mut tq, &mut tp, Par::Seq);
        assert_eq!(info, -2);
    }

    #[test]
    fn test_gebd2_reports_short_buffers() {
        let mut a = random_matrix(5, 5, 1);
        let (mut d, mut e, mut tq, mut tp) =
            (vec![0.0; 5], vec![0.0; 3], vec![0.0; 5], vec![0.0; 5]);
        assert_eq!(gebd2(a.as_mut(), &mut d, &mut e, &mut tq, &mut tp, Par::Seq), -6);
        let mut short_d = vec![0.0; 4];
        let mut e = vec![0.0; 4];
        assert_eq!(gebd2(a.as_mut(), &mut short_d, &mut e, &mut tq, &mut tp, Par::Seq), -5);
    }

    #[test]
    fn test_gebd2_preserves_singular_values_norm() {
        // The Frobenius norm is invariant under orthogonal transformations.
        let a = random_matrix(9, 6, 7);
        let mut packed = a.clone();
        let (mut d, mut e, mut tq, mut tp) =
            (vec![0.0; 6], vec![0.0; 6], vec![0.0; 6], vec![0.0; 6]);
        assert_eq!(gebd2(packed.as_mut(), &mut d, &mut e, &mut tq, &mut tp, Par::Seq), 0);
        let b_norm: f64 = d.iter().chain(&e[..5]).map(|v| v * v).sum::<f64>().sqrt();
        assert!((b_norm - a.norm_l2()).abs() < 1e-12 * a.norm_l2());
        assert_eq!(e[5], 0.0);
        assert_eq!(tp[5], 0.0);
        for i in 0..6 {
            assert_eq!(packed[(i, i)], d[i]);
        }
    }

    #[test]
    fn test_blocked_matches_unblocked_bidiagonal() {
        let (m, n, nb) = (40, 33, 4);
        let a = random_matrix(m, n, 11);

        let mut reference = a.clone();
        let (mut d1, mut e1, mut q1, mut p1) =
            (vec![0.0; n], vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        let info = gebd2(
            reference.as_mut(),
            &mut d1,
            &mut e1,
            &mut q1,
            &mut p1,
            Par::Seq,
        );
        assert_eq!(info, 0);

        let mut blocked = a.clone();
        let (mut d2, mut e2, mut q2, mut p2) =
            (vec![0.0; n], vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        let mut x = Mat::<f64>::zeros(m, nb);
        let mut y = Mat::<f64>::zeros(n, nb);
        let info = gebrd_blocked(
            blocked.as_mut(),
            &mut d2,
            &mut e2,
            &mut q2,
            &mut p2,
            nb,
            8,
            x.as_mut(),
            y.as_mut(),
            Par::Seq,
        );
        assert_eq!(info, 0);

        // Both paths produce the same reflectors up to rounding.
        for i in 0..n {
            assert!((d1[i] - d2[i]).abs() < 1e-10, "d[{i}]: {} vs {}", d1[i], d2[i]);
            assert!((q1[i] - q2[i]).abs() < 1e-10, "tauq[{i}]");
        }
        for i in 0..n - 1 {
            assert!((e1[i] - e2[i]).abs() < 1e-10, "e[{i}]: {} vs {}", e1[i], e2[i]);
            assert!((p1[i] - p2[i]).abs() < 1e-10, "taup[{i}]");
        }
        assert!((reference.as_ref() - blocked.as_ref()).norm_l2() < 1e-9);
    }
}
