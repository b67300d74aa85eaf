//! Residual checks for bidiagonal reductions and tridiagonal eigensystems.
//!
//! Every measure here is reported in units of machine epsilon, so a backward-stable
//! computation lands at O(1)–O(10) regardless of the problem size. Thresholds are the
//! caller's business: exceeding one is a failed assertion in a test, never a runtime error.

use crate::{
    algorithms::{
        EPS,
        checks::{Orthogonality, bdt01, ort01},
        one_norm,
        orthogonal::{orgbr_pt, orgbr_q},
    },
    error::{KernelError, KernelErrorKind, Status},
    reduction::BidiagonalReduction,
};
use faer::{Accum, Mat, MatRef, linalg::matmul::matmul, prelude::*};

/// The three residuals of a bidiagonal reduction, in units of eps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResidualTriple {
    /// `‖A - Q·B·Pᵗ‖ / (n·‖A‖·eps)`.
    pub decomposition: f64,
    /// `‖I - QᵗQ‖ / (m·eps)`.
    pub left_orthogonality: f64,
    /// `‖I - Pᵗ·P‖ / (n·eps)`.
    pub right_orthogonality: f64,
}

impl ResidualTriple {
    /// The same residuals without the eps scaling.
    pub fn relative(&self) -> Self {
        Self {
            decomposition: self.decomposition * EPS,
            left_orthogonality: self.left_orthogonality * EPS,
            right_orthogonality: self.right_orthogonality * EPS,
        }
    }

    /// The largest of the three.
    pub fn max(&self) -> f64 {
        self.decomposition
            .max(self.left_orthogonality)
            .max(self.right_orthogonality)
    }

    /// True if every residual is below `tolerance` (in eps units). NaN never passes.
    pub fn within(&self, tolerance: f64) -> bool {
        [
            self.decomposition,
            self.left_orthogonality,
            self.right_orthogonality,
        ]
        .iter()
        .all(|r| *r < tolerance)
    }
}

fn ensure_shape(
    name: &'static str,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<(), KernelError> {
    let (expected, actual) = if expected.0 != actual.0 {
        (expected.0, actual.0)
    } else {
        (expected.1, actual.1)
    };
    if expected != actual {
        return Err(KernelErrorKind::DimensionMismatch {
            name,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

fn ensure_len(name: &'static str, expected: usize, actual: usize) -> Result<(), KernelError> {
    if actual < expected {
        return Err(KernelErrorKind::DimensionMismatch {
            name,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

/// Turns a non-zero status of factor generation into a hard error.
fn generated(status: Status) -> Result<(), KernelError> {
    match status.into_result() {
        Ok(()) => Ok(()),
        Err(warning) => Err(KernelErrorKind::InputError(warning.to_string()).into()),
    }
}

/// Checks a reduction against the matrix it was computed from.
///
/// # Arguments
/// * `original`: The `m × n` input before reduction.
/// * `packed`: The same matrix after reduction, in packed reflector form. Left untouched: the
///   orthogonal factors are generated from two private copies.
/// * `reduction`: Diagonal, off-diagonal and reflector scalars of the reduction.
/// * `par`: Parallelism for the dense products.
///
/// # Errors
/// A `DimensionMismatch` if the shapes disagree or any of `e`, `tauq`, `taup` is shorter
/// than the reduction needs, and an `InputError` if the factors cannot be generated.
pub fn verify(
    original: MatRef<'_, f64>,
    packed: MatRef<'_, f64>,
    reduction: &BidiagonalReduction,
    par: Par,
) -> Result<ResidualTriple, KernelError> {
    let (m, n) = (original.nrows(), original.ncols());
    if m < n {
        return Err(KernelErrorKind::DimensionMismatch {
            name: "rows",
            expected: n,
            actual: m,
        }
        .into());
    }
    ensure_shape("packed", (m, n), (packed.nrows(), packed.ncols()))?;
    if reduction.order() != n {
        return Err(KernelErrorKind::DimensionMismatch {
            name: "diagonal",
            expected: n,
            actual: reduction.order(),
        }
        .into());
    }
    ensure_len("offdiagonal", n.saturating_sub(1), reduction.e.len())?;
    ensure_len("tauq", n, reduction.tauq.len())?;
    ensure_len("taup", n.saturating_sub(1), reduction.taup.len())?;

    let mut q = packed.to_owned();
    let info = orgbr_q(q.as_mut(), &reduction.tauq, par);
    generated(Status::from_info("orgbr", info))?;

    let mut pt = packed.submatrix(0, 0, n, n).to_owned();
    let info = orgbr_pt(pt.as_mut(), &reduction.taup, par);
    generated(Status::from_info("orgbr", info))?;

    Ok(ResidualTriple {
        decomposition: bdt01(
            original,
            q.as_ref(),
            &reduction.d,
            reduction.superdiagonal(),
            pt.as_ref(),
            par,
        ),
        left_orthogonality: ort01(Orthogonality::Columns, q.as_ref()),
        right_orthogonality: ort01(Orthogonality::Rows, pt.as_ref()),
    })
}

/// Residuals of a computed tridiagonal eigensystem, in units of eps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EigenResiduals {
    /// `‖T·Z - Z·Λ‖₁ / (n·‖T‖₁·eps)`.
    pub residual: f64,
    /// `‖I - ZᵗZ‖₁ / (n·eps)`.
    pub orthogonality: f64,
}

/// Checks eigenpairs of the symmetric tridiagonal matrix `T` with diagonal `d` and
/// off-diagonal `e`.
///
/// `d` and `e` must be the values before the solver overwrote them.
pub fn verify_eigensystem(
    d: &[f64],
    e: &[f64],
    eigenvalues: &[f64],
    z: MatRef<'_, f64>,
    par: Par,
) -> Result<EigenResiduals, KernelError> {
    let n = d.len();
    ensure_shape("eigenvectors", (n, n), (z.nrows(), z.ncols()))?;
    if eigenvalues.len() != n {
        return Err(KernelErrorKind::DimensionMismatch {
            name: "eigenvalues",
            expected: n,
            actual: eigenvalues.len(),
        }
        .into());
    }
    ensure_len("offdiagonal", n.saturating_sub(1), e.len())?;
    if n == 0 {
        return Ok(EigenResiduals::default());
    }

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

    // Z·Λ, then subtract T·Z.
    let mut residual = Mat::from_fn(n, n, |i, j| z[(i, j)] * eigenvalues[j]);
    matmul(residual.as_mut(), Accum::Add, t.as_ref(), z, -1.0, par);

    let tnorm = one_norm(t.as_ref());
    let nf = n as f64;
    let rnorm = one_norm(residual.as_ref());
    let scaled = if tnorm > 0.0 {
        rnorm / (nf * tnorm * EPS)
    } else if rnorm == 0.0 {
        0.0
    } else {
        1.0 / EPS
    };

    Ok(EigenResiduals {
        residual: scaled,
        orthogonality: ort01(Orthogonality::Columns, z),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduction::reduce_to_bidiagonal_reference;

    #[test]
    fn test_reference_reduction_passes() {
        let (m, n) = (24, 17);
        let a = Mat::from_fn(m, n, |i, j| ((i * 13 + j * 5) % 17) as f64 / 17.0 - 0.4);
        let mut packed = a.clone();
        let reduction = reduce_to_bidiagonal_reference(packed.as_mut()).unwrap();
        let residuals = verify(a.as_ref(), packed.as_ref(), &reduction, Par::Seq).unwrap();
        assert!(residuals.within(30.0), "{residuals:?}");
        assert!(residuals.relative().max() < 30.0 * EPS);
    }

    #[test]
    fn test_corrupted_reduction_fails() {
        let n = 10;
        let a = Mat::from_fn(n, n, |i, j| {
            1.0 / (i + j + 1) as f64 + if i == j { 1.0 } else { 0.0 }
        });
        let mut packed = a.clone();
        let mut reduction = reduce_to_bidiagonal_reference(packed.as_mut()).unwrap();
        reduction.d[3] *= 1.5;
        let residuals = verify(a.as_ref(), packed.as_ref(), &reduction, Par::Seq).unwrap();
        assert!(residuals.decomposition > 1e6);
        // The factors themselves are still orthogonal.
        assert!(residuals.left_orthogonality < 30.0);
        assert!(residuals.right_orthogonality < 30.0);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let a = Mat::<f64>::zeros(4, 3);
        let packed = Mat::<f64>::zeros(4, 2);
        let mut scratch = Mat::<f64>::identity(4, 2);
        let reduction = reduce_to_bidiagonal_reference(scratch.as_mut()).unwrap();
        let err = verify(a.as_ref(), packed.as_ref(), &reduction, Par::Seq).unwrap_err();
        assert!(matches!(
            err.kind(),
            KernelErrorKind::DimensionMismatch { name: "packed", .. }
        ));
    }

    #[test]
    fn test_truncated_reflector_scalars_are_rejected() {
        let n = 8;
        let a = Mat::from_fn(n, n, |i, j| {
            1.0 / (i + j + 1) as f64 + if i == j { 2.0 } else { 0.0 }
        });
        let mut packed = a.clone();
        let reduction = reduce_to_bidiagonal_reference(packed.as_mut()).unwrap();

        let mut short_tauq = reduction.clone();
        short_tauq.tauq.truncate(n - 1);
        let err = verify(a.as_ref(), packed.as_ref(), &short_tauq, Par::Seq).unwrap_err();
        assert_eq!(
            err.kind(),
            &KernelErrorKind::DimensionMismatch {
                name: "tauq",
                expected: n,
                actual: n - 1,
            }
        );

        let mut short_taup = reduction.clone();
        short_taup.taup.truncate(n - 2);
        let err = verify(a.as_ref(), packed.as_ref(), &short_taup, Par::Seq).unwrap_err();
        assert!(matches!(
            err.kind(),
            KernelErrorKind::DimensionMismatch { name: "taup", .. }
        ));

        // A short off-diagonal is reported, not indexed out of bounds.
        let mut short_e = reduction;
        short_e.e.truncate(n - 3);
        let err = verify(a.as_ref(), packed.as_ref(), &short_e, Par::Seq).unwrap_err();
        assert_eq!(
            err.kind(),
            &KernelErrorKind::DimensionMismatch {
                name: "offdiagonal",
                expected: n - 1,
                actual: n - 3,
            }
        );
    }

    #[test]
    fn test_failed_factor_generation_is_an_error() {
        assert!(generated(Status::Success).is_ok());
        let err = generated(Status::from_info("orgbr", -7)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input parameter: orgbr returned info = -7 (argument 7 had an illegal value)"
        );
    }

    #[test]
    fn test_short_offdiagonal_of_eigensystem_is_named() {
        let d = [1.0, 2.0, 3.0, 4.0];
        let e = [0.5];
        let z = Mat::<f64>::identity(4, 4);
        let err = verify_eigensystem(&d, &e, &d, z.as_ref(), Par::Seq).unwrap_err();
        assert_eq!(
            err.kind(),
            &KernelErrorKind::DimensionMismatch {
                name: "offdiagonal",
                expected: 3,
                actual: 1,
            }
        );

        let err = verify_eigensystem(&d, &[0.5; 3], &d[..3], z.as_ref(), Par::Seq).unwrap_err();
        assert!(matches!(
            err.kind(),
            KernelErrorKind::DimensionMismatch { name: "eigenvalues", .. }
        ));
    }

    #[test]
    fn test_eigensystem_of_diagonal_matrix() {
        let d = [1.0, 2.0, 3.0];
        let e = [0.0, 0.0];
        let z = Mat::<f64>::identity(3, 3);
        let residuals = verify_eigensystem(&d, &e, &d, z.as_ref(), Par::Seq).unwrap();
        assert_eq!(residuals, EigenResiduals::default());

        let wrong = [1.0, 2.0, 4.0];
        let residuals = verify_eigensystem(&d, &e, &wrong, z.as_ref(), Par::Seq).unwrap();
        assert!(residuals.residual > 1e10);
    }
}
