//! Common utilities shared by the harness and the benchmark binaries.
//!
//! - **`perf`**: wall-clock timing, the FLOP count of a bidiagonal reduction and the
//!   conversion to GFlop/s.

pub mod perf;
