//! Measurement engine: clocks, the repetition estimator, statistics and
//! report output.

pub mod calibration;
pub mod clock;
pub mod cpu_affinity;
pub mod cycles;
pub mod format;
pub mod rng;
pub mod runner;
pub mod stats;
pub mod timer;
pub mod tui;

// Re-export commonly used items
pub use clock::{Clock, Timebase};
pub use cpu_affinity::CpuPinGuard;
pub use format::format_duration;
pub use rng::{time_seed, MinStdRand};
pub use runner::{Report, RunObserver, Silent};
pub use stats::Statistic;
pub use timer::{measure_testee, TesteeTiming, TimingConfig};
