//! Built-in comparison suites for the command line tool.
//!
//! Every suite registers its workloads as rows and its implementations as
//! columns, so each row compares the same work done different ways.

pub mod call_vs_inline;
pub mod dot_product;
pub mod match_vs_table;
pub mod rng_compare;

use crate::registry::Benchmark;

/// A named set of testees that can be registered into a [`Benchmark`].
pub trait Suite: Send + Sync {
    /// Name used to select the suite on the command line
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Category (e.g., "math", "control_flow")
    fn category(&self) -> &'static str;

    /// Column labels, in column order.
    fn columns(&self) -> &'static [&'static str];

    /// Register every testee. The session must have `columns().len()` columns.
    fn register(&self, bench: &mut Benchmark<'_>);

    /// Check that all implementations agree with the reference one.
    fn verify(&self) -> Result<(), String>;
}

/// Every built-in suite, in the order they run.
pub fn all_suites() -> Vec<Box<dyn Suite>> {
    vec![
        Box::new(call_vs_inline::CallVsInline),
        Box::new(match_vs_table::MatchVsTable),
        Box::new(rng_compare::RngCompare),
        Box::new(dot_product::DotProduct),
    ]
}

/// Find a suite by name
pub fn find_suite(name: &str) -> Option<Box<dyn Suite>> {
    all_suites().into_iter().find(|suite| suite.name() == name)
}
