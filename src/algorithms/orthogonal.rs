//! Explicit generation of the orthogonal factors of a bidiagonal reduction.
//!
//! Both routines overwrite a working copy of the packed matrix, the way the reference
//! library's `orgbr` does, so the caller keeps the packed original untouched.

use super::{apply_left, column_reflector, row_reflector};
use faer::{Mat, MatMut, prelude::*};

/// Overwrites the packed `m × n` matrix `q` (`m >= n`) with the first `n` columns of
/// `Q = H(0)···H(n-1)`. Returns the `info` status code.
pub fn orgbr_q(mut q: MatMut<'_, f64>, tauq: &[f64], par: Par) -> i32 {
    let (m, n) = (q.nrows(), q.ncols());
    if n > m {
        return -2;
    }
    if tauq.len() < n {
        return -7;
    }

    for j in (0..n).rev() {
        let tau = tauq[j];
        if j + 1 < n {
            let v = column_reflector(q.rb(), j, j);
            apply_left(
                q.rb_mut().submatrix_mut(j, j + 1, m - j, n - j - 1),
                v.as_ref(),
                tau,
                par,
            );
        }
        for i in j + 1..m {
            q[(i, j)] *= -tau;
        }
        q[(j, j)] = 1.0 - tau;
        for i in 0..j {
            q[(i, j)] = 0.0;
        }
    }
    0
}

/// Overwrites the leading `n × n` block `pt` of the packed matrix with `Pᵗ`, where
/// `P = G(0)···G(n-2)`. Returns the `info` status code.
pub fn orgbr_pt(mut pt: MatMut<'_, f64>, taup: &[f64], par: Par) -> i32 {
    let n = pt.ncols();
    if pt.nrows() != n {
        return -2;
    }
    if taup.len() < n.saturating_sub(1) {
        return -7;
    }
    if n == 0 {
        return 0;
    }

    let reflectors: Vec<Mat<f64>> = (0..n - 1)
        .map(|i| row_reflector(pt.rb(), i, i + 1))
        .collect();

    let mut p = Mat::<f64>::identity(n, n);
    for (i, u) in reflectors.iter().enumerate().rev() {
        apply_left(
            p.as_mut().submatrix_mut(i + 1, i + 1, n - i - 1, n - i - 1),
            u.as_ref(),
            taup[i],
            par,
        );
    }
    pt.copy_from(p.as_ref().transpose());
    0
}
