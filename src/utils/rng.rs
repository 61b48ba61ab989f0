//! Seeded pseudo-random inputs for testees.
//!
//! Testees receive a fresh 32-bit value on every call so that the measured
//! work cannot be constant-folded. The generator is the "minimal standard"
//! Lehmer LCG: small, fast and reproducible given a seed.

use rand::{RngCore, SeedableRng};

/// Multiplier of the minimal standard generator.
const MULTIPLIER: u64 = 48_271;
/// Modulus: the Mersenne prime 2^31 - 1.
const MODULUS: u64 = 2_147_483_647;

/// Linear congruential generator `state = (48271 * state) mod (2^31 - 1)`.
///
/// A zero state would stay zero forever, so seeding maps every value into
/// `1..MODULUS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinStdRand {
    state: u32,
}

impl MinStdRand {
    pub fn new(seed: u32) -> Self {
        let mut rng = Self { state: 1 };
        rng.seed(seed);
        rng
    }

    /// Reset the generator to the sequence identified by `value`.
    pub fn seed(&mut self, value: u32) {
        let state = u64::from(value) % MODULUS;
        self.state = if state == 0 { 1 } else { state as u32 };
    }

    /// Generate the next value in `1..2^31 - 1`.
    #[inline(always)]
    pub fn next(&mut self) -> u32 {
        self.state = ((u64::from(self.state) * MULTIPLIER) % MODULUS) as u32;
        self.state
    }
}

impl Default for MinStdRand {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RngCore for MinStdRand {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    fn next_u64(&mut self) -> u64 {
        (u64::from(self.next()) << 32) | u64::from(self.next())
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for MinStdRand {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Get a seed from current time for randomization
pub fn time_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or(0x12345678)
}
