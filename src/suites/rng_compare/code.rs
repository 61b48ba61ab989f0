//! Xoroshiro128++ generator.

use rand::{RngCore, SeedableRng};

use crate::utils::rng::MinStdRand;

/// Substituted for the all-zero state, which never leaves zero.
const NONZERO_STATE: (u64, u64) = (0x9e37_79b9_7f4a_7c15, 0xbf58_476d_1ce4_e5b9);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Xoroshiro128PlusPlus {
    s0: u64,
    s1: u64,
}

impl Xoroshiro128PlusPlus {
    pub fn new(s0: u64, s1: u64) -> Self {
        if s0 == 0 && s1 == 0 {
            let (s0, s1) = NONZERO_STATE;
            return Self { s0, s1 };
        }
        Self { s0, s1 }
    }

    #[inline(always)]
    pub fn next(&mut self) -> u64 {
        let s0 = self.s0;
        let mut s1 = self.s1;
        let result = s0.wrapping_add(s1).rotate_left(17).wrapping_add(s0);

        s1 ^= s0;
        self.s0 = s0.rotate_left(49) ^ s1 ^ (s1 << 21); // a, b
        self.s1 = s1.rotate_left(28); // c

        result
    }
}

impl RngCore for Xoroshiro128PlusPlus {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.next()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Xoroshiro128PlusPlus {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let (lo, hi) = seed.split_at(8);
        let word = |bytes: &[u8]| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            u64::from_le_bytes(buf)
        };
        Self::new(word(lo), word(hi))
    }
}

/// Check both hand-written generators against known outputs.
pub fn verify_all() -> Result<(), String> {
    // rotl(1 + 0, 17) + 1
    let first = Xoroshiro128PlusPlus::new(1, 0).next();
    if first != 131_073 {
        return Err(format!("xoroshiro128++ from (1, 0): expected 131073, got {}", first));
    }

    let mut minstd = MinStdRand::new(1);
    let sequence = [minstd.next(), minstd.next(), minstd.next()];
    if sequence != [48_271, 182_605_794, 1_291_394_886] {
        return Err(format!("minstd from seed 1: unexpected sequence {:?}", sequence));
    }
    Ok(())
}
