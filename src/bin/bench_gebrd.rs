//! Benchmark and verification driver for the bidiagonal reduction.
//!
//! For each problem size this executable generates a seeded random matrix, reduces it on
//! the selected execution path, verifies the packed result against the original and times
//! the CPU reference on an untouched copy. Without `-N` it sweeps the ten preset sizes.
//!
//! The path defaults to the accelerated one; `DENSE_OFFLOAD_USE_REFERENCE` selects the
//! reference path and `DENSE_OFFLOAD_SHOW_INFO` prints each status code. Command-line flags
//! take precedence over the environment.

use anyhow::{Context, Result, anyhow, ensure};
use clap::Parser;
use dense_offload::{
    AcceleratorContext, DeviceConfig, ExecutionPath, Harness, HarnessConfig,
    harness::{CaseReport, DEFAULT_SEED, PRESET_SIZES, table_header, table_row},
};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line arguments for the bidiagonal reduction benchmark.
#[derive(Parser, Debug)]
#[clap(
    name = "bench-gebrd",
    about = "Times and verifies the bidiagonal reduction on the accelerated and reference paths."
)]
struct GebrdArgs {
    /// Order of the square problem. Sweeps the preset sizes when absent.
    #[clap(short = 'N', long = "n")]
    n: Option<usize>,
    /// Number of rows, for a rectangular `m × n` problem (`m >= n`). Requires `-N`.
    #[clap(short = 'M', long = "m", requires = "n")]
    m: Option<usize>,
    /// Execution path of the measured reduction.
    #[clap(long, value_enum)]
    path: Option<ExecutionPath>,
    /// Print the status code of every measured reduction.
    #[clap(long)]
    show_info: bool,
    /// Skip verification and the CPU comparison; time only.
    #[clap(long)]
    no_check: bool,
    /// Worker threads of the accelerator. 0 uses every core.
    #[clap(long, default_value_t = 0)]
    threads: usize,
    /// Panel width of the blocked reduction. Chosen from the problem size when absent.
    #[clap(long)]
    block_size: Option<usize>,
    /// Columns left to the unblocked tail of the reduction.
    #[clap(long, default_value_t = DeviceConfig::default().crossover)]
    crossover: usize,
    /// Seed of the problem generator.
    #[clap(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Also write one CSV row per case to this file.
    #[clap(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// A single row of the output CSV.
#[derive(Debug, Serialize)]
struct GebrdRecord {
    m: usize,
    n: usize,
    path: ExecutionPath,
    info: i32,
    measured_gflops: f64,
    measured_s: f64,
    cpu_gflops: Option<f64>,
    cpu_s: Option<f64>,
    cpu_info: Option<i32>,
    decomposition_eps: Option<f64>,
    left_orthogonality_eps: Option<f64>,
    right_orthogonality_eps: Option<f64>,
}

impl From<&CaseReport> for GebrdRecord {
    fn from(report: &CaseReport) -> Self {
        Self {
            m: report.m,
            n: report.n,
            path: report.path,
            info: report.info,
            measured_gflops: report.measured_gflops,
            measured_s: report.measured_seconds,
            cpu_gflops: report.cpu_gflops,
            cpu_s: report.cpu_seconds,
            cpu_info: report.cpu_info,
            decomposition_eps: report.residuals.map(|r| r.decomposition),
            left_orthogonality_eps: report.residuals.map(|r| r.left_orthogonality),
            right_orthogonality_eps: report.residuals.map(|r| r.right_orthogonality),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = GebrdArgs::parse();

    let mut config = HarnessConfig::from_env();
    if let Some(path) = args.path {
        config.path = path;
    }
    config.show_info |= args.show_info;
    config.check = !args.no_check;

    let cases: Vec<(usize, usize)> = match args.n {
        Some(n) => {
            let m = args.m.unwrap_or(n);
            ensure!(n > 0, "The problem order must be positive.");
            ensure!(m >= n, "The reduction needs m >= n, got m = {m}, n = {n}.");
            vec![(m, n)]
        }
        None => PRESET_SIZES.iter().map(|&n| (n, n)).collect(),
    };

    let context = AcceleratorContext::init(DeviceConfig {
        threads: args.threads,
        block_size: args.block_size,
        crossover: args.crossover,
    })
    .context("Failed to initialize the accelerator")?;
    let harness = Harness::new(config, &context).with_seed(args.seed);
    log::info!(
        "Measured path: {}; verification {}.",
        config.path,
        if config.check { "on" } else { "off" }
    );

    let mut writer = match &args.output {
        Some(path) => Some(
            csv::Writer::from_path(path)
                .with_context(|| format!("Failed to create CSV writer for {path:?}"))?,
        ),
        None => None,
    };

    println!("{}", table_header());
    println!("{}", "=".repeat(table_header().len()));
    for (m, n) in cases {
        // Allocation failures are fatal: the sweep stops here.
        let report = harness
            .run_case(m, n)
            .with_context(|| format!("Case {m} x {n} failed"))?;
        println!("{}", table_row(&report));

        if let Some(writer) = writer.as_mut() {
            writer.serialize(GebrdRecord::from(&report))?;
            writer.flush()?;
        }
    }

    if let Some(path) = &args.output {
        log::info!("Results written to {path:?}.");
    }
    Ok(())
}
