//! Opcode dispatch: a `match` the compiler lowers as it sees fit versus an
//! explicit multiplier lookup table.

pub mod code;
#[cfg(test)]
mod test;

use super::Suite;
use crate::registry::Benchmark;

pub struct MatchVsTable;

impl Suite for MatchVsTable {
    fn name(&self) -> &'static str {
        "match-vs-table"
    }

    fn description(&self) -> &'static str {
        "Opcode dispatch via match versus a lookup table"
    }

    fn category(&self) -> &'static str {
        "control_flow"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["match", "table"]
    }

    fn register(&self, bench: &mut Benchmark<'_>) {
        // Unpredictable opcodes defeat the branch predictor
        bench.add("random opcode", 0, |random, previous| {
            code::dispatch_match(code::opcode(random), previous | 1)
        });
        bench.add("random opcode", 1, |random, previous| {
            code::dispatch_table(code::opcode(random), previous | 1)
        });

        let mut cycle = 0u8;
        bench.add("cycling opcode", 0, move |random, _| {
            cycle = (cycle + 1) % code::OPCODES;
            code::dispatch_match(cycle, random)
        });
        let mut cycle = 0u8;
        bench.add("cycling opcode", 1, move |random, _| {
            cycle = (cycle + 1) % code::OPCODES;
            code::dispatch_table(cycle, random)
        });
    }

    fn verify(&self) -> Result<(), String> {
        code::verify_all()
    }
}
