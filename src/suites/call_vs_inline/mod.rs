//! Function call overhead: a three-step computation as separate
//! non-inlined calls versus written out inline.

pub mod code;
#[cfg(test)]
mod test;

use super::Suite;
use crate::registry::Benchmark;

/// Dependent steps per call in the chained workload.
pub const CHAIN_LENGTH: u32 = 4;

pub struct CallVsInline;

impl Suite for CallVsInline {
    fn name(&self) -> &'static str {
        "call-vs-inline"
    }

    fn description(&self) -> &'static str {
        "square(add_ten(double(x))) through calls versus inlined"
    }

    fn category(&self) -> &'static str {
        "control_flow"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["calls", "inline"]
    }

    fn register(&self, bench: &mut Benchmark<'_>) {
        bench.add("independent", 0, |random, _| code::process_with_calls(random));
        bench.add("independent", 1, |random, _| code::process_inline(random));
        bench.add("dependent chain", 0, |random, previous| {
            code::chain(code::process_with_calls, random ^ previous, CHAIN_LENGTH)
        });
        bench.add("dependent chain", 1, |random, previous| {
            code::chain(code::process_inline, random ^ previous, CHAIN_LENGTH)
        });
    }

    fn verify(&self) -> Result<(), String> {
        code::verify_all()
    }
}

