//! The process-wide accelerator context.
//!
//! Offloaded kernels run on a dedicated worker pool owned by an [`AcceleratorContext`].
//! The context is constructed once by the top-level driver, passed by reference to every
//! call that needs device access, and torn down when dropped. Calls are synchronous: the
//! caller blocks until the offloaded computation has completed.

use crate::error::{KernelError, KernelErrorKind};
use faer::Par;

/// Default number of columns per panel of the blocked reduction.
const DEFAULT_BLOCK_SIZE: usize = 32;
/// Panel width used for very large problems.
const LARGE_BLOCK_SIZE: usize = 64;
/// Order above which [`LARGE_BLOCK_SIZE`] is used.
const LARGE_PROBLEM_ORDER: usize = 4096;
/// Default number of trailing columns reduced unblocked.
const DEFAULT_CROSSOVER: usize = 128;

/// Settings for [`AcceleratorContext::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Number of worker threads. 0 uses every available core.
    pub threads: usize,
    /// Overrides the panel width chosen by [`AcceleratorContext::block_size`].
    pub block_size: Option<usize>,
    /// Once no more than this many columns remain, the reduction finishes unblocked.
    pub crossover: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            block_size: None,
            crossover: DEFAULT_CROSSOVER,
        }
    }
}

/// An initialized accelerator. Dropping it releases the worker pool.
#[derive(Debug)]
pub struct AcceleratorContext {
    pool: rayon::ThreadPool,
    config: DeviceConfig,
}

impl AcceleratorContext {
    /// Brings up the worker pool described by `config`.
    pub fn init(config: DeviceConfig) -> Result<Self, KernelError> {
        if config.block_size == Some(0) {
            return Err(KernelErrorKind::InputError(
                "block size must be positive".to_string(),
            )
            .into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("dense-offload-{i}"))
            .build()
            .map_err(|e| KernelErrorKind::Context(e.to_string()))?;

        let context = Self { pool, config };
        log::info!("{}", context.describe());
        Ok(context)
    }

    /// A one-line description of the device, suitable for a banner.
    pub fn describe(&self) -> String {
        let block = match self.config.block_size {
            Some(nb) => format!("{nb}"),
            None => "auto".to_string(),
        };
        format!(
            "Accelerator: {} worker threads, panel width {}, crossover {}.",
            self.threads(),
            block,
            self.config.crossover
        )
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Panel width for a reduction of order `n`.
    pub fn block_size(&self, n: usize) -> usize {
        self.config.block_size.unwrap_or(if n < LARGE_PROBLEM_ORDER {
            DEFAULT_BLOCK_SIZE
        } else {
            LARGE_BLOCK_SIZE
        })
    }

    pub fn crossover(&self) -> usize {
        self.config.crossover
    }

    /// Parallelism handed to faer kernels running inside [`Self::run`].
    pub fn par(&self) -> Par {
        Par::rayon(self.threads())
    }

    /// Runs `op` on the context's pool and blocks until it returns.
    pub fn run<R: Send>(&self, op: impl FnOnce(Par) -> R + Send) -> R {
        let par = self.par();
        self.pool.install(|| op(par))
    }
}

impl Drop for AcceleratorContext {
    fn drop(&mut self) {
        log::info!("Shutting down accelerator ({} worker threads).", self.threads());
    }
}
