//! # adaptive-bench
//!
//! A micro-benchmark harness that sizes the number of repetitions of every
//! testee to a fixed time budget, measures with the calibrated CPU cycle
//! counter, and reports minimum, maximum and average time per call relative
//! to the fastest testee of each column.
//!
//! ```no_run
//! use std::time::Duration;
//! use adaptive_bench::Benchmark;
//!
//! let mut bench = Benchmark::new();
//! bench.set_columns(2);
//! bench.add("square", 0, |r, _| r.wrapping_mul(r));
//! bench.add("square", 1, |r, _| r.wrapping_pow(2));
//! let report = bench.run(Duration::from_millis(200), 500);
//! println!("seed was {}", report.seed);
//! ```

pub mod error;
pub mod registry;
pub mod suites;
pub mod utils;

pub use error::{BenchError, Result};
pub use registry::Benchmark;
pub use utils::tui;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{BenchError, Result};
    pub use crate::registry::{Benchmark, MAX_COLUMNS};
    pub use crate::utils::{Clock, Report, RunObserver, Statistic, TesteeTiming, TimingConfig};
}
