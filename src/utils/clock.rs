//! Coarse and fine monotonic time sources.
//!
//! The coarse source is the portable steady clock, used for budget
//! bookkeeping. The fine source is the cycle counter scaled by the calibrated
//! frequency of the core the measurement runs on; without a usable counter it
//! is the coarse source again.

use std::time::Instant;

use super::calibration::{calibrate, CalibrationConfig, FrequencyTable};
use super::cpu_affinity::get_current_cpu;
use super::cycles;

const NS_PER_S: u128 = 1_000_000_000;
const PS_PER_S: u128 = 1_000_000_000_000;

/// Time readings used by the estimator.
///
/// Fine readings are raw ticks; only differences are converted, so the
/// conversion never has to deal with the counter's absolute value.
pub trait Timebase {
    /// Steady clock in nanoseconds since an arbitrary fixed epoch.
    fn coarse_now_ns(&self) -> i64;

    /// Raw fine-grained counter reading.
    fn fine_ticks(&self) -> u64;

    /// Convert a fine tick difference to picoseconds.
    fn ticks_to_ps(&self, ticks: u64) -> i64;
}

impl<T: Timebase + ?Sized> Timebase for &T {
    #[inline(always)]
    fn coarse_now_ns(&self) -> i64 {
        (**self).coarse_now_ns()
    }

    #[inline(always)]
    fn fine_ticks(&self) -> u64 {
        (**self).fine_ticks()
    }

    #[inline(always)]
    fn ticks_to_ps(&self, ticks: u64) -> i64 {
        (**self).ticks_to_ps(ticks)
    }
}

/// Convert `ticks` at `hz` into `units_per_second` units without overflow.
///
/// Whole seconds and the remainder within the last second are scaled
/// separately, so the raw tick count is never multiplied by the unit scale.
fn scale_ticks(ticks: u64, hz: u64, units_per_second: u128) -> i64 {
    let whole = u128::from(ticks / hz);
    let rem = u128::from(ticks % hz);
    let units = whole * units_per_second + rem * units_per_second / u128::from(hz);
    i64::try_from(units).unwrap_or(i64::MAX)
}

/// Convert counter ticks to picoseconds.
pub fn ticks_to_ps(ticks: u64, hz: u64) -> i64 {
    scale_ticks(ticks, hz, PS_PER_S)
}

/// Convert counter ticks to nanoseconds.
pub fn ticks_to_ns(ticks: u64, hz: u64) -> i64 {
    scale_ticks(ticks, hz, NS_PER_S)
}

/// Process clock: steady epoch plus the calibrated frequency table.
#[derive(Debug)]
pub struct Clock {
    epoch: Instant,
    frequencies: FrequencyTable,
}

impl Clock {
    /// Calibrate the counter with default settings.
    pub fn new() -> Self {
        Self::with_calibration(&CalibrationConfig::default())
    }

    pub fn with_calibration(config: &CalibrationConfig) -> Self {
        Self::with_frequencies(calibrate(config))
    }

    /// Use an already computed frequency table.
    pub fn with_frequencies(frequencies: FrequencyTable) -> Self {
        Self {
            epoch: Instant::now(),
            frequencies,
        }
    }

    /// A clock whose fine readings are the steady clock.
    pub fn coarse() -> Self {
        Self::with_frequencies(FrequencyTable::Unavailable)
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    /// Whether fine readings use the cycle counter.
    pub fn is_fine(&self) -> bool {
        self.frequencies.is_available()
    }

    pub fn coarse_now_ns(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    /// Bind fine readings to the frequency of `core`.
    pub fn bind(&self, core: Option<usize>) -> BoundClock<'_> {
        BoundClock {
            clock: self,
            hz: self.frequencies.frequency_for(core),
        }
    }

    /// Bind to the core the calling thread is running on.
    ///
    /// Only meaningful while the thread stays there, so callers pin first.
    pub fn bind_current(&self) -> BoundClock<'_> {
        self.bind(get_current_cpu())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Clock`] bound to one core's counter frequency.
#[derive(Clone, Copy, Debug)]
pub struct BoundClock<'a> {
    clock: &'a Clock,
    hz: Option<u64>,
}

impl BoundClock<'_> {
    /// Counter frequency in use, `None` when fine readings are coarse.
    pub fn frequency(&self) -> Option<u64> {
        self.hz
    }

    /// Duration of one fine tick in picoseconds, rounded up.
    pub fn resolution_ps(&self) -> i64 {
        match self.hz {
            Some(hz) => {
                let hz = u128::from(hz);
                i64::try_from(PS_PER_S.div_ceil(hz)).unwrap_or(i64::MAX)
            }
            None => 1_000,
        }
    }
}

impl Timebase for BoundClock<'_> {
    #[inline(always)]
    fn coarse_now_ns(&self) -> i64 {
        self.clock.coarse_now_ns()
    }

    #[inline(always)]
    fn fine_ticks(&self) -> u64 {
        match self.hz {
            Some(_) => cycles::read_cycles(),
            None => self.clock.coarse_now_ns() as u64,
        }
    }

    #[inline(always)]
    fn ticks_to_ps(&self, ticks: u64) -> i64 {
        match self.hz {
            Some(hz) => ticks_to_ps(ticks, hz),
            None => i64::try_from(ticks).unwrap_or(i64::MAX).saturating_mul(1_000),
        }
    }
}
