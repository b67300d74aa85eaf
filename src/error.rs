//! This module defines the error and status types for the library.
//!
//! Two classes of failure exist. Hard errors ([`KernelError`]) abort the call that raised
//! them: an unrecognized factorization mode, a scratch allocation that could not be
//! satisfied, malformed dimensions, or a context that failed to come up. Status codes
//! returned by the numerical routines are different: they are recoverable and travel as a
//! [`Status`], carrying a [`FactorizationWarning`] when the code is non-zero.
//!
//! Using the [`thiserror`] crate keeps the `Display` implementations next to the variants.
use thiserror::Error;

/// Represents all hard errors that can occur in the library.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct KernelError(#[from] KernelErrorKind);

impl KernelError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &KernelErrorKind {
        &self.0
    }

    /// Returns `true` if this error is an unrecognized factorization mode.
    pub fn is_invalid_mode(&self) -> bool {
        matches!(self.0, KernelErrorKind::InvalidMode(_))
    }

    /// Returns `true` if this error is a failed scratch or context allocation.
    pub fn is_allocation(&self) -> bool {
        matches!(self.0, KernelErrorKind::Allocation { .. })
    }
}

/// The distinct kinds of hard errors.
#[derive(Error, Debug, PartialEq)]
pub enum KernelErrorKind {
    /// The factorization mode flag is none of the recognized variants.
    #[error("Invalid factorization mode '{0}': expected one of V, I, N.")]
    InvalidMode(String),

    /// A scratch buffer could not be reserved.
    #[error("Allocation of {len} elements for {what} failed.")]
    Allocation { what: &'static str, len: usize },

    /// Operand shapes are incompatible with the requested operation.
    #[error("Dimension mismatch for {name}: expected {expected}, got {actual}.")]
    DimensionMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An input parameter violates a precondition.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// The accelerator context could not be initialized.
    #[error("Accelerator context initialization failed: {0}")]
    Context(String),
}

impl PartialEq for KernelError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// A non-zero status code returned by a reference or accelerated routine.
///
/// The convention is the one of the reference library: a negative `info` means the
/// argument at position `-info` had an illegal value, a positive `info` is an
/// algorithm-specific failure (for example, an iteration that did not converge).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{routine} returned info = {info}{}", describe_info(.info))]
pub struct FactorizationWarning {
    /// Name of the routine that produced the code.
    pub routine: &'static str,
    /// The raw status code. Never zero.
    pub info: i32,
}

fn describe_info(info: &i32) -> String {
    if *info < 0 {
        format!(" (argument {} had an illegal value)", -info)
    } else {
        " (algorithm failed to converge)".to_string()
    }
}

impl FactorizationWarning {
    /// The 1-based position of the offending argument, if the code is negative.
    pub fn illegal_argument(&self) -> Option<usize> {
        (self.info < 0).then(|| self.info.unsigned_abs() as usize)
    }
}

/// Outcome of a factorization call that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning(FactorizationWarning),
}

impl Status {
    /// Builds a status from a raw `info` code, logging every non-zero value.
    pub fn from_info(routine: &'static str, info: i32) -> Self {
        if info == 0 {
            Status::Success
        } else {
            let warning = FactorizationWarning { routine, info };
            log::warn!("{warning}");
            Status::Warning(warning)
        }
    }

    /// The raw status code, 0 on success.
    pub fn info(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Warning(w) => w.info,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    /// Converts into a `Result`, for callers that treat any warning as fatal.
    pub fn into_result(self) -> Result<(), FactorizationWarning> {
        match self {
            Status::Success => Ok(()),
            Status::Warning(w) => Err(w),
        }
    }
}
