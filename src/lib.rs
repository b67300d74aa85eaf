//! Offloaded dense factorizations with a residual-based verification harness.
//!
//! This crate orchestrates two dense linear-algebra kernels and checks what they produce:
//!
//! **Tridiagonal eigensolver** ([`solve_tridiagonal_eigensystem`]): computes eigenvalues and,
//! optionally, eigenvectors of a symmetric tridiagonal matrix with a divide-and-conquer
//! solver. The scratch memory the solver needs is sized by [`plan_workspace`] from closed-form
//! formulas, acquired for the duration of the call and released on every exit path.
//!
//! **Bidiagonal reduction** ([`reduce_to_bidiagonal`]): reduces a general `m × n` matrix
//! (`m >= n`) to `Q·B·Pᵗ` with `B` upper bidiagonal, in place, on an [`AcceleratorContext`].
//! A CPU reference path with the same interface is available for comparison
//! ([`reduce_to_bidiagonal_reference`]). Both leave the matrix in the same packed
//! Householder layout.
//!
//! **Verification** ([`verify`]): regenerates `Q` and `Pᵗ` from the packed result and reports
//! the reconstruction and orthogonality residuals in units of machine epsilon.
//!
//! Status codes from the numerical routines are never fatal: they come back as a [`Status`]
//! and are logged. Hard errors ([`KernelError`]) are reserved for an unrecognized mode, a
//! failed allocation and malformed dimensions.
//!
//! ## Example Usage
//!
//! ```rust
//! use dense_offload::{
//!     AcceleratorContext, DeviceConfig, EigenMode, reduce_to_bidiagonal,
//!     solve_tridiagonal_eigensystem, verify,
//! };
//! use faer::{Mat, Par};
//!
//! // Eigenvalues of the 1-D discrete Laplacian.
//! let mut d = vec![2.0; 5];
//! let mut e = vec![-1.0; 4];
//! let mut z = Mat::<f64>::zeros(0, 0);
//! let status =
//!     solve_tridiagonal_eigensystem(EigenMode::NoVectors, &mut d, &mut e, z.as_mut(), Par::Seq)
//!         .unwrap();
//! assert!(status.is_success());
//! assert!(d.windows(2).all(|w| w[0] <= w[1]));
//!
//! // Bidiagonal reduction on the accelerator, then its residuals.
//! let context = AcceleratorContext::init(DeviceConfig::default()).unwrap();
//! let a = Mat::from_fn(16, 12, |i, j| 1.0 / (i + j + 1) as f64 + if i == j { 1.0 } else { 0.0 });
//! let mut packed = a.clone();
//! let reduction = reduce_to_bidiagonal(&context, packed.as_mut()).unwrap();
//! let residuals = verify(a.as_ref(), packed.as_ref(), &reduction, context.par()).unwrap();
//! assert!(residuals.within(30.0));
//! ```

pub mod algorithms;
pub mod device;
pub mod eigen;
pub mod error;
pub mod harness;
pub mod reduction;
pub mod utils;
pub mod verification;
pub mod workspace;

pub use device::{AcceleratorContext, DeviceConfig};
pub use eigen::{solve_tridiagonal_eigensystem, solve_tridiagonal_eigensystem_with_flag};
pub use error::{FactorizationWarning, KernelError, KernelErrorKind, Status};
pub use harness::{ExecutionPath, Harness, HarnessConfig};
pub use reduction::{BidiagonalReduction, reduce_to_bidiagonal, reduce_to_bidiagonal_reference};
pub use verification::{ResidualTriple, verify, verify_eigensystem};
pub use workspace::{EigenMode, Workspace, WorkspacePlan, plan_workspace};
