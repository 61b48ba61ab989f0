//! Error types for adaptive-bench
//!
//! Configuration mistakes are programmer errors: the plain registration
//! methods panic with these messages, the `try_` variants return them.

use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Benchmark configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// Column count outside 1..=10
    #[error("column count must be within 1..={max}, got {requested}")]
    InvalidColumnCount { requested: usize, max: usize },

    /// Testee registered without a name
    #[error("testee name must not be empty")]
    EmptyName,

    /// Testee registered in a column that was not configured
    #[error("column {column} is out of range, {columns} column(s) configured")]
    ColumnOutOfRange { column: usize, columns: usize },

    /// Zero per-testee budget
    #[error("per-testee budget must be greater than zero")]
    ZeroBudget,

    /// Too few rough-stage samples to estimate anything
    #[error("at least {minimum} samples per testee are required, got {requested}")]
    TooFewSamples { minimum: u64, requested: u64 },

    /// Any other invalid timing setting
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
