//! Bidiagonal reduction drivers.
//!
//! Two interchangeable paths reduce a general `m × n` matrix (`m >= n > 0`) to upper
//! bidiagonal form in place:
//!
//! - [`ReferenceReducer`]: the unblocked CPU reference routine, sequential.
//! - [`AcceleratedReducer`]: a blocked panel reduction whose rank-`nb` trailing updates run
//!   on an [`AcceleratorContext`].
//!
//! Both leave the matrix in the same packed layout and return the same
//! [`BidiagonalReduction`], so downstream consumers (factor generation, verification) do not
//! care which path produced it. Results agree to rounding, not bit for bit.

use crate::{
    algorithms::bidiag::{gebd2, gebrd_blocked},
    device::AcceleratorContext,
    error::{KernelError, KernelErrorKind, Status},
};
use faer::{
    MatMut, Par,
    dyn_stack::{PodBuffer, PodStack, StackReq},
};

/// Outputs of a bidiagonal reduction besides the packed matrix itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BidiagonalReduction {
    /// Diagonal of `B`, length `n`.
    pub d: Vec<f64>,
    /// Superdiagonal of `B`, stored with length `n`; the last entry is zero.
    pub e: Vec<f64>,
    /// Scalars of the left reflectors, length `n`.
    pub tauq: Vec<f64>,
    /// Scalars of the right reflectors, length `n`; the last entry is zero.
    pub taup: Vec<f64>,
    /// Status reported by the routine.
    pub status: Status,
}

impl BidiagonalReduction {
    fn with_order(n: usize) -> Self {
        Self {
            d: vec![0.0; n],
            e: vec![0.0; n],
            tauq: vec![0.0; n],
            taup: vec![0.0; n],
            status: Status::Success,
        }
    }

    /// Order of the bidiagonal matrix.
    pub fn order(&self) -> usize {
        self.d.len()
    }

    /// The `n - 1` meaningful superdiagonal entries.
    pub fn superdiagonal(&self) -> &[f64] {
        &self.e[..self.order().saturating_sub(1)]
    }
}

/// A routine that reduces a matrix to bidiagonal form in place.
pub trait BidiagonalReducer {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Overwrites `a` with its packed bidiagonal form.
    ///
    /// Hard errors are limited to allocation failures; everything the routine itself
    /// detects is reported through [`BidiagonalReduction::status`].
    fn reduce(&self, a: MatMut<'_, f64>) -> Result<BidiagonalReduction, KernelError>;
}

/// The CPU reference reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceReducer;

impl BidiagonalReducer for ReferenceReducer {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn reduce(&self, a: MatMut<'_, f64>) -> Result<BidiagonalReduction, KernelError> {
        reduce_to_bidiagonal_reference(a)
    }
}

/// The offloaded reduction, bound to an initialized context.
#[derive(Debug, Clone, Copy)]
pub struct AcceleratedReducer<'ctx> {
    context: &'ctx AcceleratorContext,
}

impl<'ctx> AcceleratedReducer<'ctx> {
    pub fn new(context: &'ctx AcceleratorContext) -> Self {
        Self { context }
    }
}

impl BidiagonalReducer for AcceleratedReducer<'_> {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn reduce(&self, a: MatMut<'_, f64>) -> Result<BidiagonalReduction, KernelError> {
        reduce_to_bidiagonal(self.context, a)
    }
}

/// Scratch length of the accelerated path: an `m × nb` and an `n × nb` panel, that is
/// `2·n·nb` for a square matrix.
pub fn accelerated_workspace_len(m: usize, n: usize, nb: usize) -> usize {
    (m + n) * nb
}

/// Reduces `a` with the reference routine.
pub fn reduce_to_bidiagonal_reference(
    a: MatMut<'_, f64>,
) -> Result<BidiagonalReduction, KernelError> {
    let n = a.ncols();
    let mut out = BidiagonalReduction::with_order(n);
    let info = gebd2(
        a,
        &mut out.d,
        &mut out.e,
        &mut out.tauq,
        &mut out.taup,
        Par::Seq,
    );
    out.status = Status::from_info("gebrd", info);
    Ok(out)
}

/// Reduces `a` on the accelerator.
///
/// # Arguments
/// * `context`: The initialized accelerator; the call blocks until the work completes.
/// * `a`: The `m × n` matrix, `m >= n > 0`. Its column stride is the leading dimension.
///   Overwritten with the packed bidiagonal form.
///
/// # Returns
/// The diagonal, off-diagonal and reflector scalars with the routine's status, or an
/// allocation error for the `(m + n)·nb` panel scratch.
pub fn reduce_to_bidiagonal(
    context: &AcceleratorContext,
    a: MatMut<'_, f64>,
) -> Result<BidiagonalReduction, KernelError> {
    let (m, n) = (a.nrows(), a.ncols());
    let mut out = BidiagonalReduction::with_order(n);
    let nb = context.block_size(n).min(n.max(1));
    let crossover = context.crossover();

    let len = accelerated_workspace_len(m, n, nb);
    let mut scratch = PodBuffer::try_new(StackReq::new::<f64>(len)).map_err(|_| {
        KernelErrorKind::Allocation {
            what: "panel workspace",
            len,
        }
    })?;
    let stack = PodStack::new(&mut scratch);
    let (x_buf, stack) = stack.make_with(m * nb, |_| 0.0f64);
    let (y_buf, _) = stack.make_with(n * nb, |_| 0.0f64);
    let x = MatMut::from_column_major_slice_mut(x_buf, m, nb);
    let y = MatMut::from_column_major_slice_mut(y_buf, n, nb);

    log::debug!("gebrd on accelerator: {m} x {n}, nb = {nb}, crossover = {crossover}.");
    let BidiagonalReduction {
        d,
        e,
        tauq,
        taup,
        ..
    } = &mut out;
    let info = context.run(|par| {
        gebrd_blocked(a, d, e, tauq, taup, nb, crossover, x, y, par)
    });

    out.status = Status::from_info("gebrd", info);
    Ok(out)
}
