//! Benchmark and verification harness for the bidiagonal reduction.
//!
//! For each problem size the harness generates a seeded random matrix, reduces a copy of it
//! on the configured [`ExecutionPath`], checks the result against the original and, for
//! comparison, times the CPU reference on another untouched copy. Cases run strictly one
//! after the other; each owns its matrices and scratch for its own duration only.

use crate::{
    device::AcceleratorContext,
    error::KernelError,
    reduction::{AcceleratedReducer, BidiagonalReducer, ReferenceReducer},
    utils::perf::{gebrd_flops, gflops, timed},
    verification::{ResidualTriple, verify},
};
use faer::Mat;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The ten square problem orders swept when no size is given.
pub const PRESET_SIZES: [usize; 10] = [1024, 2048, 3072, 4032, 5184, 6016, 7040, 8064, 9088, 10112];

/// When set, the measured reduction runs on the CPU reference path.
pub const USE_REFERENCE_ENV: &str = "DENSE_OFFLOAD_USE_REFERENCE";
/// When set, the raw status code of every measured reduction is printed.
pub const SHOW_INFO_ENV: &str = "DENSE_OFFLOAD_SHOW_INFO";

/// Seed of the problem generator. Every case of a run uses the same stream origin.
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Which implementation performs the measured reduction.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionPath {
    UseReference,
    UseAccelerated,
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPath::UseReference => write!(f, "reference"),
            ExecutionPath::UseAccelerated => write!(f, "accelerated"),
        }
    }
}

/// Settings of a [`Harness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub path: ExecutionPath,
    /// Print the status code of each measured reduction.
    pub show_info: bool,
    /// Verify each result and time the CPU reference alongside it.
    pub check: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            path: ExecutionPath::UseAccelerated,
            show_info: false,
            check: true,
        }
    }
}

impl HarnessConfig {
    /// Defaults, with the path and the status printing taken from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key).is_some())
    }

    fn from_lookup(is_set: impl Fn(&str) -> bool) -> Self {
        let path = if is_set(USE_REFERENCE_ENV) {
            ExecutionPath::UseReference
        } else {
            ExecutionPath::UseAccelerated
        };
        Self {
            path,
            show_info: is_set(SHOW_INFO_ENV),
            ..Self::default()
        }
    }
}

/// Results of one problem instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseReport {
    pub m: usize,
    pub n: usize,
    pub path: ExecutionPath,
    /// Throughput of the measured reduction.
    pub measured_gflops: f64,
    pub measured_seconds: f64,
    /// Throughput of the CPU reference on the same input, when checking.
    pub cpu_gflops: Option<f64>,
    pub cpu_seconds: Option<f64>,
    /// Status code of the CPU reference, when checking.
    pub cpu_info: Option<i32>,
    /// Residuals of the measured reduction in units of eps, when checking.
    pub residuals: Option<ResidualTriple>,
    /// Status code of the measured reduction.
    pub info: i32,
}

/// Uniform `(0, 1)` entries from a seeded generator.
pub fn random_matrix(m: usize, n: usize, seed: u64) -> Mat<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Mat::from_fn(m, n, |_, _| rng.random::<f64>())
}

/// Runs reductions and verifications against an initialized accelerator.
pub struct Harness<'ctx> {
    config: HarnessConfig,
    context: &'ctx AcceleratorContext,
    seed: u64,
}

impl<'ctx> Harness<'ctx> {
    pub fn new(config: HarnessConfig, context: &'ctx AcceleratorContext) -> Self {
        Self {
            config,
            context,
            seed: DEFAULT_SEED,
        }
    }

    /// Uses `seed` for the problem generator instead of [`DEFAULT_SEED`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn measured_reducer(&self) -> Box<dyn BidiagonalReducer + 'ctx> {
        match self.config.path {
            ExecutionPath::UseReference => Box::new(ReferenceReducer),
            ExecutionPath::UseAccelerated => Box::new(AcceleratedReducer::new(self.context)),
        }
    }

    /// Runs one `m × n` case (`m >= n > 0`).
    ///
    /// A non-zero status of the measured reduction is recorded in the report, not raised:
    /// a sweep goes on with the next size. Hard errors (allocation) are returned.
    pub fn run_case(&self, m: usize, n: usize) -> Result<CaseReport, KernelError> {
        let original = random_matrix(m, n, self.seed);
        let flops = gebrd_flops(m, n);
        let reducer = self.measured_reducer();

        let mut packed = original.clone();
        let (reduction, measured_seconds) = timed(|| reducer.reduce(packed.as_mut()));
        let reduction = reduction?;
        let info = reduction.status.info();
        if self.config.show_info {
            println!("{} gebrd {m} x {n}: info = {info}", reducer.name());
        }

        let mut report = CaseReport {
            m,
            n,
            path: self.config.path,
            measured_gflops: gflops(flops, measured_seconds),
            measured_seconds,
            cpu_gflops: None,
            cpu_seconds: None,
            cpu_info: None,
            residuals: None,
            info,
        };
        if !self.config.check {
            return Ok(report);
        }
        if !reduction.status.is_success() {
            log::warn!(
                "Skipping verification of the {m} x {n} case: reduction returned info = {info}."
            );
            return Ok(report);
        }

        let residuals = self.context.run(|par| {
            verify(original.as_ref(), packed.as_ref(), &reduction, par)
        })?;
        report.residuals = Some(residuals);

        let mut untouched = original.clone();
        let (cpu, cpu_seconds) = timed(|| ReferenceReducer.reduce(untouched.as_mut()));
        let cpu_info = cpu?.status.info();
        if self.config.show_info {
            println!("{} gebrd {m} x {n}: info = {cpu_info}", ReferenceReducer.name());
        }
        report.cpu_info = Some(cpu_info);
        report.cpu_gflops = Some(gflops(flops, cpu_seconds));
        report.cpu_seconds = Some(cpu_seconds);

        Ok(report)
    }
}

/// Header line of the results table.
pub fn table_header() -> String {
    format!(
        "{:>6} {:>6}   {:>22}   {:>22}   {:>14} {:>12} {:>12}",
        "M",
        "N",
        "CPU GFlop/s (sec)",
        "Measured GFlop/s (sec)",
        "|A-QBP'|/N|A|",
        "|I-QQ'|/N",
        "|I-PP'|/N"
    )
}

/// One row of the results table. Residuals are shown in units of eps; `---` when the case
/// was not checked.
pub fn table_row(report: &CaseReport) -> String {
    let cpu = match (report.cpu_gflops, report.cpu_seconds) {
        (Some(g), Some(s)) => format!("{g:7.2} ({s:7.2})"),
        _ => "---".to_string(),
    };
    let measured = format!(
        "{:7.2} ({:7.2})",
        report.measured_gflops, report.measured_seconds
    );
    let residuals = match report.residuals {
        Some(r) => format!(
            "{:>14.3e} {:>12.3e} {:>12.3e}",
            r.decomposition, r.left_orthogonality, r.right_orthogonality
        ),
        None => format!("{:>14} {:>12} {:>12}", "---", "---", "---"),
    };
    format!(
        "{:>6} {:>6}   {cpu:>22}   {measured:>22}   {residuals}",
        report.m, report.n
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceConfig;

    fn small_context() -> AcceleratorContext {
        AcceleratorContext::init(DeviceConfig {
            threads: 2,
            block_size: Some(4),
            crossover: 8,
        })
        .unwrap()
    }

    #[test]
    fn test_config_from_lookup() {
        let config = HarnessConfig::from_lookup(|_| false);
        assert_eq!(config, HarnessConfig::default());

        let config = HarnessConfig::from_lookup(|key| key == USE_REFERENCE_ENV);
        assert_eq!(config.path, ExecutionPath::UseReference);
        assert!(!config.show_info);

        let config = HarnessConfig::from_lookup(|key| key == SHOW_INFO_ENV);
        assert_eq!(config.path, ExecutionPath::UseAccelerated);
        assert!(config.show_info);
    }

    #[test]
    fn test_random_matrix_is_seeded_and_uniform() {
        let a = random_matrix(20, 10, 7);
        let b = random_matrix(20, 10, 7);
        assert_eq!(a, b);
        for j in 0..10 {
            for i in 0..20 {
                assert!((0.0..1.0).contains(&a[(i, j)]));
            }
        }
    }

    #[test]
    fn test_case_without_check_skips_comparison() {
        let context = small_context();
        let config = HarnessConfig {
            check: false,
            ..Default::default()
        };
        let report = Harness::new(config, &context).run_case(30, 20).unwrap();
        assert_eq!(report.info, 0);
        assert!(report.residuals.is_none());
        assert!(report.cpu_gflops.is_none());
        assert!(report.cpu_info.is_none());
        assert!(table_row(&report).contains("---"));
    }

    #[test]
    fn test_checked_case_on_both_paths() {
        let context = small_context();
        for path in [ExecutionPath::UseReference, ExecutionPath::UseAccelerated] {
            let config = HarnessConfig {
                path,
                ..Default::default()
            };
            let report = Harness::new(config, &context)
                .with_seed(3)
                .run_case(40, 40)
                .unwrap();
            let residuals = report.residuals.unwrap();
            assert!(residuals.within(30.0), "{path}: {residuals:?}");
            assert!(report.cpu_seconds.is_some());
            assert_eq!(report.cpu_info, Some(0));
            assert_eq!(report.path, path);
        }
    }

    #[test]
    fn test_invalid_shape_is_recorded() {
        let context = small_context();
        let config = HarnessConfig {
            check: false,
            ..Default::default()
        };
        let report = Harness::new(config, &context).run_case(3, 5).unwrap();
        assert_eq!(report.info, -2);
    }
}
