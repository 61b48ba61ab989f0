//! Generator throughput: the harness's own minimal standard LCG against
//! xoroshiro128++ and the `rand` crate's standard generator.

pub mod code;
#[cfg(test)]
mod test;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::Suite;
use crate::registry::Benchmark;
use crate::utils::rng::MinStdRand;
use code::Xoroshiro128PlusPlus;

const SEED: u64 = 0x5eed;

pub struct RngCompare;

/// Register `rng` in `column`: raw words, then bounded integers.
fn register_generator<R>(bench: &mut Benchmark<'_>, column: usize, rng: R)
where
    R: RngCore + Clone + 'static,
{
    let mut words = rng.clone();
    bench.add("next u32", column, move |_, previous| words.next_u32() ^ (previous >> 31));
    let mut bounded = rng;
    bench.add("range 0..1000", column, move |_, previous| {
        bounded.random_range(0..1000u32) + (previous & 1)
    });
}

impl Suite for RngCompare {
    fn name(&self) -> &'static str {
        "rng"
    }

    fn description(&self) -> &'static str {
        "minstd LCG versus xoroshiro128++ versus rand's StdRng"
    }

    fn category(&self) -> &'static str {
        "random"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["minstd", "xoroshiro128++", "std"]
    }

    fn register(&self, bench: &mut Benchmark<'_>) {
        register_generator(bench, 0, MinStdRand::seed_from_u64(SEED));
        register_generator(bench, 1, Xoroshiro128PlusPlus::seed_from_u64(SEED));
        register_generator(bench, 2, StdRng::seed_from_u64(SEED));
    }

    fn verify(&self) -> Result<(), String> {
        code::verify_all()
    }
}
