//! Dot product of two `f32` vectors: iterator sum versus a 4x unrolled loop
//! with independent accumulators.

pub mod code;
#[cfg(test)]
mod test;

use std::hint::black_box;

use rand::{Rng, SeedableRng};

use super::Suite;
use crate::registry::Benchmark;
use crate::utils::rng::MinStdRand;

/// Vector lengths, one row each.
pub const SIZES: [usize; 3] = [16, 256, 4096];

pub struct DotProduct;

/// Two vectors of `len` values in `-1.0..1.0`.
pub fn random_vectors(len: usize, seed: u64) -> (Vec<f32>, Vec<f32>) {
    let mut rng = MinStdRand::seed_from_u64(seed);
    let a: Vec<f32> = (0..len).map(|_| rng.random_range(-1.0..1.0)).collect();
    let b: Vec<f32> = (0..len).map(|_| rng.random_range(-1.0..1.0)).collect();
    (a, b)
}

impl Suite for DotProduct {
    fn name(&self) -> &'static str {
        "dot-product"
    }

    fn description(&self) -> &'static str {
        "f32 dot product: iterator sum versus 4x unrolled"
    }

    fn category(&self) -> &'static str {
        "math"
    }

    fn columns(&self) -> &'static [&'static str] {
        &["iterator", "unrolled"]
    }

    fn register(&self, bench: &mut Benchmark<'_>) {
        let variants: [fn(&[f32], &[f32]) -> f32; 2] =
            [code::dot_product_original, code::dot_product_unrolled];
        for len in SIZES {
            let name = format!("{} elements", len);
            for (column, dot) in variants.into_iter().enumerate() {
                let (a, b) = random_vectors(len, len as u64);
                bench.add(&name, column, move |_, previous| {
                    dot(black_box(&a), black_box(&b)).to_bits() ^ (previous & 1)
                });
            }
        }
    }

    fn verify(&self) -> Result<(), String> {
        code::verify_all()
    }
}
