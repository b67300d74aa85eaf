//! High-level entry point for the symmetric tridiagonal eigensolver.
//!
//! [`solve_tridiagonal_eigensystem`] sizes the scratch memory for the requested mode,
//! acquires it for the duration of the call, runs the divide-and-conquer solver and surfaces
//! its status. A non-zero status is not fatal: it is logged with its numeric code and
//! returned as [`Status::Warning`], and the caller decides whether to go on.

use crate::{
    algorithms::tridiag::stedc,
    error::{KernelError, Status},
    workspace::{EigenMode, Workspace, plan_workspace},
};
use faer::{MatMut, Par};

/// Computes the eigenvalues, and the eigenvectors if `mode` asks for them, of the symmetric
/// tridiagonal matrix with diagonal `d` and off-diagonal `e`.
///
/// # Arguments
/// * `mode`: Which part of the eigensystem to compute; see [`EigenMode`].
/// * `d`: The `n` diagonal entries. Overwritten with the eigenvalues in ascending order.
/// * `e`: The `n - 1` off-diagonal entries. Destroyed.
/// * `z`: The `n × n` eigenvector matrix; its column stride is the leading dimension. Not
///   referenced for [`EigenMode::NoVectors`].
/// * `par`: Parallelism for the dense products of the `EigenvectorsOnly` mode.
///
/// # Returns
/// The solver status, or a [`KernelError`] if the workspace could not be allocated.
pub fn solve_tridiagonal_eigensystem(
    mode: EigenMode,
    d: &mut [f64],
    e: &mut [f64],
    z: MatMut<'_, f64>,
    par: Par,
) -> Result<Status, KernelError> {
    let n = d.len();
    let plan = plan_workspace(mode, n);
    log::debug!(
        "stedc ({mode}, n = {n}): {} f64 + {} i32 workspace elements.",
        plan.real_len,
        plan.int_len
    );

    let mut workspace = Workspace::acquire(plan)?;
    let (work, iwork) = workspace.buffers_mut();
    let info = stedc(mode, d, e, z, work, iwork, par);
    Ok(Status::from_info("stedc", info))
}

/// Like [`solve_tridiagonal_eigensystem`], for a raw reference-library flag (`'V'`, `'I'`
/// or `'N'`).
///
/// An unrecognized flag fails with an `InvalidMode` error before anything is allocated or
/// written.
pub fn solve_tridiagonal_eigensystem_with_flag(
    flag: char,
    d: &mut [f64],
    e: &mut [f64],
    z: MatMut<'_, f64>,
    par: Par,
) -> Result<Status, KernelError> {
    let mode = EigenMode::try_from(flag)?;
    solve_tridiagonal_eigensystem(mode, d, e, z, par)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    #[test]
    fn test_no_vectors_returns_sorted_eigenvalues() {
        let mut d = vec![4.0, 1.0, 3.0, 2.0];
        let mut e = vec![0.0; 3];
        let mut z = Mat::<f64>::zeros(0, 0);
        let status = solve_tridiagonal_eigensystem(
            EigenMode::NoVectors,
            &mut d,
            &mut e,
            z.as_mut(),
            Par::Seq,
        )
        .unwrap();
        assert!(status.is_success());
        assert_eq!(d, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_invalid_flag_touches_nothing() {
        let mut d = vec![1.0, 2.0];
        let mut e = vec![0.5];
        let mut z = Mat::<f64>::from_fn(2, 2, |i, j| (i * 2 + j) as f64);
        let err =
            solve_tridiagonal_eigensystem_with_flag('Z', &mut d, &mut e, z.as_mut(), Par::Seq)
                .unwrap_err();
        assert!(err.is_invalid_mode());
        assert_eq!(d, vec![1.0, 2.0]);
        assert_eq!(e, vec![0.5]);
        assert_eq!(z[(1, 1)], 3.0);
    }

    #[test]
    fn test_bad_shape_is_a_warning_not_an_error() {
        let mut d = vec![1.0, 2.0, 3.0];
        let mut e = vec![0.5, 0.5];
        let mut z = Mat::<f64>::zeros(2, 2);
        let status = solve_tridiagonal_eigensystem(
            EigenMode::IdentityInitialized,
            &mut d,
            &mut e,
            z.as_mut(),
            Par::Seq,
        )
        .unwrap();
        match status {
            Status::Warning(w) => {
                assert_eq!(w.routine, "stedc");
                assert_eq!(w.illegal_argument(), Some(6));
            }
            Status::Success => panic!("expected a warning"),
        }
    }

    #[test]
    fn test_eigenvectors_only_applies_reduction_matrix() {
        // With Z = a permutation, the output must be that permutation times the
        // eigenvectors of T.
        let n = 3;
        let (d0, e0) = (vec![2.0, 2.0, 2.0], vec![-1.0, -1.0]);

        let (mut d1, mut e1) = (d0.clone(), e0.clone());
        let mut z1 = Mat::<f64>::zeros(n, n);
        solve_tridiagonal_eigensystem(
            EigenMode::IdentityInitialized,
            &mut d1,
            &mut e1,
            z1.as_mut(),
            Par::Seq,
        )
        .unwrap();

        let perm = faer::mat![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let (mut d2, mut e2) = (d0.clone(), e0.clone());
        let mut z2 = perm.clone();
        solve_tridiagonal_eigensystem(
            EigenMode::EigenvectorsOnly,
            &mut d2,
            &mut e2,
            z2.as_mut(),
            Par::Seq,
        )
        .unwrap();

        assert_eq!(d1, d2);
        let expected = &perm * &z1;
        assert!((&expected - &z2).norm_l2() < 1e-14);
    }
}
