//! Workspace planning for the divide-and-conquer tridiagonal eigensolver.
//!
//! The reference solver requires caller-provided scratch memory whose minimum size depends
//! on how much of the eigensystem is requested. With `L = floor(log2(n)) + 1` the recursion
//! depth of the divide-and-conquer tree, the sizes are:
//!
//! | mode                  | real buffer                         | integer buffer            |
//! |-----------------------|-------------------------------------|---------------------------|
//! | `EigenvectorsOnly`    | `1 + 3n + 3nL + 4n² + 256n`         | `6 + 6n + 6nL + 256n`     |
//! | `IdentityInitialized` | `2n² + 256n + 1`                    | `256n`                    |
//! | `NoVectors`           | `256n + 1`                          | `256n`                    |
//!
//! The quadratic term is present only when eigenvectors have to be accumulated. Handing the
//! solver less than this is undefined behavior for the underlying routine, so the planner
//! reproduces the formulas exactly and [`Workspace`] allocates exactly what was planned.

use crate::error::{KernelError, KernelErrorKind};
use faer::dyn_stack::{PodBuffer, PodStack, StackReq};
use std::{fmt, str::FromStr};

/// Which part of the eigensystem of a symmetric tridiagonal matrix is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EigenMode {
    /// On entry the eigenvector matrix holds the orthogonal matrix that reduced the original
    /// symmetric matrix to tridiagonal form; on exit it holds the eigenvectors of the
    /// original matrix. Reference flag `'V'`.
    EigenvectorsOnly,
    /// The eigenvector matrix is initialized to the identity and receives the eigenvectors
    /// of the tridiagonal matrix itself. Reference flag `'I'`.
    IdentityInitialized,
    /// Eigenvalues only; the eigenvector matrix is not referenced. Reference flag `'N'`.
    NoVectors,
}

impl EigenMode {
    pub const ALL: [EigenMode; 3] = [
        EigenMode::EigenvectorsOnly,
        EigenMode::IdentityInitialized,
        EigenMode::NoVectors,
    ];

    /// The reference-library flag character for this mode.
    pub fn flag(self) -> char {
        match self {
            EigenMode::EigenvectorsOnly => 'V',
            EigenMode::IdentityInitialized => 'I',
            EigenMode::NoVectors => 'N',
        }
    }

    /// Whether the eigenvector matrix is written by the solver.
    pub fn wants_vectors(self) -> bool {
        !matches!(self, EigenMode::NoVectors)
    }
}

impl TryFrom<char> for EigenMode {
    type Error = KernelError;

    fn try_from(flag: char) -> Result<Self, Self::Error> {
        match flag.to_ascii_uppercase() {
            'V' => Ok(EigenMode::EigenvectorsOnly),
            'I' => Ok(EigenMode::IdentityInitialized),
            'N' => Ok(EigenMode::NoVectors),
            other => Err(KernelErrorKind::InvalidMode(other.to_string()).into()),
        }
    }
}

impl FromStr for EigenMode {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v" | "vectors" | "eigenvectors-only" => Ok(EigenMode::EigenvectorsOnly),
            "i" | "identity" | "identity-initialized" => Ok(EigenMode::IdentityInitialized),
            "n" | "none" | "no-vectors" => Ok(EigenMode::NoVectors),
            _ => Err(KernelErrorKind::InvalidMode(s.to_string()).into()),
        }
    }
}

impl fmt::Display for EigenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EigenMode::EigenvectorsOnly => "eigenvectors-only",
            EigenMode::IdentityInitialized => "identity-initialized",
            EigenMode::NoVectors => "no-vectors",
        };
        write!(f, "{name}")
    }
}

/// Minimum scratch lengths, in elements, for one solver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspacePlan {
    /// Length of the `f64` buffer.
    pub real_len: usize,
    /// Length of the `i32` buffer.
    pub int_len: usize,
}

/// Depth of the divide-and-conquer recursion, `floor(log2(n)) + 1`.
pub fn recursion_depth(n: usize) -> usize {
    if n == 0 { 0 } else { n.ilog2() as usize + 1 }
}

/// Computes the scratch lengths required by the tridiagonal solver for `mode` and order `n`.
///
/// This is a pure function of its inputs.
pub fn plan_workspace(mode: EigenMode, n: usize) -> WorkspacePlan {
    let l = recursion_depth(n);
    match mode {
        EigenMode::EigenvectorsOnly => WorkspacePlan {
            real_len: 1 + 3 * n + 3 * n * l + 4 * n * n + 256 * n,
            int_len: 6 + 6 * n + 6 * n * l + 256 * n,
        },
        EigenMode::IdentityInitialized => WorkspacePlan {
            real_len: 2 * n * n + 256 * n + 1,
            int_len: 256 * n,
        },
        EigenMode::NoVectors => WorkspacePlan {
            real_len: 256 * n + 1,
            int_len: 256 * n,
        },
    }
}

/// Like [`plan_workspace`], for a raw reference-library flag.
///
/// Fails with an `InvalidMode` error for any flag other than `'V'`, `'I'` or `'N'`.
pub fn plan_workspace_for_flag(flag: char, n: usize) -> Result<WorkspacePlan, KernelError> {
    let mode = EigenMode::try_from(flag)?;
    Ok(plan_workspace(mode, n))
}

/// Scratch memory sized exactly to a [`WorkspacePlan`].
///
/// Both buffers live in one [`PodBuffer`] owned by the call that acquired it, and are
/// released when the value is dropped, on every exit path.
pub struct Workspace {
    buffer: PodBuffer,
    plan: WorkspacePlan,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace").field("plan", &self.plan).finish()
    }
}

impl Workspace {
    /// Reserves both buffers in a single allocation.
    pub fn acquire(plan: WorkspacePlan) -> Result<Self, KernelError> {
        let req = StackReq::all_of(&[
            StackReq::new::<f64>(plan.real_len),
            StackReq::new::<i32>(plan.int_len),
        ]);
        let buffer = PodBuffer::try_new(req).map_err(|_| KernelErrorKind::Allocation {
            what: "eigensolver workspace",
            len: plan.real_len.saturating_add(plan.int_len),
        })?;
        log::debug!(
            "Acquired workspace: {} f64 + {} i32 elements.",
            plan.real_len,
            plan.int_len
        );
        Ok(Self { buffer, plan })
    }

    pub fn plan(&self) -> WorkspacePlan {
        self.plan
    }

    /// Zeroed views of the real and integer buffers.
    pub fn buffers_mut(&mut self) -> (&mut [f64], &mut [i32]) {
        let stack = PodStack::new(&mut self.buffer);
        let (real, stack) = stack.make_with(self.plan.real_len, |_| 0.0f64);
        let (int, _) = stack.make_with(self.plan.int_len, |_| 0i32);
        (real, int)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        log::trace!(
            "Releasing workspace: {} f64 + {} i32 elements.",
            self.plan.real_len,
            self.plan.int_len
        );
    }
}
