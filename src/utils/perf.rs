//! Timing and throughput helpers for the benchmark harness.

use std::time::Instant;

/// Floating-point operation count of a real bidiagonal reduction of an `m × n` matrix,
/// `m >= n`: `4·m·n² - 4·n³/3`.
pub fn gebrd_flops(m: usize, n: usize) -> f64 {
    let (m, n) = (m as f64, n as f64);
    4.0 * m * n * n - 4.0 * n * n * n / 3.0
}

/// Throughput in GFlop/s. Returns 0 for a zero or negative elapsed time.
pub fn gflops(flops: f64, seconds: f64) -> f64 {
    if seconds > 0.0 { flops / seconds / 1e9 } else { 0.0 }
}

/// Runs `op` once and returns its result with the elapsed wall-clock time in seconds.
pub fn timed<R>(op: impl FnOnce() -> R) -> (R, f64) {
    let start = Instant::now();
    let result = op();
    (result, start.elapsed().as_secs_f64())
}
