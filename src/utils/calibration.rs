//! One-time calibration of the cycle counter frequency.
//!
//! The result is an immutable [`FrequencyTable`] that the [`Clock`] owns.
//! A hardware frequency register is used when the platform has one; otherwise
//! counter ticks are correlated against the steady clock over a short delay.
//! When counters are not synchronized across logical processors, each one is
//! calibrated on its own with the thread pinned to it.
//!
//! [`Clock`]: super::clock::Clock

use std::time::{Duration, Instant};

use super::cpu_affinity::{allowed_cpus, CpuPinGuard};
use super::cycles;

/// Calibrated counter frequencies, in ticks per second.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrequencyTable {
    /// No usable counter; fine readings fall back to the steady clock.
    Unavailable,
    /// Every logical processor shares one counter rate.
    Shared(u64),
    /// Indexed by logical processor. Cores that failed to calibrate hold the
    /// `fallback` rate.
    PerCore { frequencies: Vec<u64>, fallback: u64 },
}

impl FrequencyTable {
    /// Frequency to use on `core`, or `None` when the counter is unusable.
    pub fn frequency_for(&self, core: Option<usize>) -> Option<u64> {
        match self {
            FrequencyTable::Unavailable => None,
            FrequencyTable::Shared(hz) => Some(*hz),
            FrequencyTable::PerCore { frequencies, fallback } => Some(
                core.and_then(|c| frequencies.get(c).copied())
                    .unwrap_or(*fallback),
            ),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, FrequencyTable::Unavailable)
    }
}

/// How the correlation method samples the counter.
#[derive(Clone, Debug)]
pub struct CalibrationConfig {
    /// Delay between the two coarse/counter reading pairs.
    pub delay: Duration,
    /// Correlation rounds per logical processor; the median is kept.
    pub rounds: usize,
    /// Use the hardware frequency register when the platform has one.
    pub prefer_register: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2),
            rounds: 3,
            prefer_register: true,
        }
    }
}

/// Calibrate the cycle counter of this machine.
pub fn calibrate(config: &CalibrationConfig) -> FrequencyTable {
    if !cycles::counter_available() {
        log::debug!("cycle counter unavailable, using the steady clock");
        return FrequencyTable::Unavailable;
    }

    let synchronized = cycles::counters_synchronized();
    if synchronized && config.prefer_register {
        if let Some(hz) = cycles::counter_frequency() {
            log::debug!("counter frequency from hardware register: {} Hz", hz);
            return FrequencyTable::Shared(hz);
        }
    }

    if synchronized {
        return match correlate(config) {
            Some(hz) => {
                log::debug!("correlated counter frequency: {} Hz", hz);
                FrequencyTable::Shared(hz)
            }
            None => {
                log::debug!("counter calibration failed, using the steady clock");
                FrequencyTable::Unavailable
            }
        };
    }

    calibrate_per_core(config)
}

fn calibrate_per_core(config: &CalibrationConfig) -> FrequencyTable {
    per_core_table(
        &allowed_cpus(),
        |core| {
            let pin = CpuPinGuard::with_core(core);
            if pin.is_pinned() {
                correlate(config)
            } else {
                None
            }
        },
        || correlate(config),
    )
}

/// Build a per-core table from `measure` run on each of `cores`.
///
/// The table is indexed by CPU id, so ids missing from `cores` and cores that
/// failed both get the median of the successful ones. When no core could be
/// measured, `unpinned` decides between a shared rate and no counter at all.
fn per_core_table<M, U>(cores: &[usize], mut measure: M, unpinned: U) -> FrequencyTable
where
    M: FnMut(usize) -> Option<u64>,
    U: FnOnce() -> Option<u64>,
{
    let len = cores.iter().max().map_or(0, |&max| max + 1);
    let mut measured: Vec<Option<u64>> = vec![None; len];
    for &core in cores {
        let hz = measure(core);
        log::debug!("core {}: counter frequency {:?} Hz", core, hz);
        measured[core] = hz;
    }

    let Some(fallback) = median(measured.iter().flatten().copied().collect()) else {
        log::debug!("no core could be calibrated on its own");
        return match unpinned() {
            Some(hz) => FrequencyTable::Shared(hz),
            None => FrequencyTable::Unavailable,
        };
    };

    FrequencyTable::PerCore {
        frequencies: measured.into_iter().map(|hz| hz.unwrap_or(fallback)).collect(),
        fallback,
    }
}

/// Median of several correlation rounds on the current core.
fn correlate(config: &CalibrationConfig) -> Option<u64> {
    let samples = (0..config.rounds.max(1))
        .filter_map(|_| correlate_once(config.delay))
        .collect();
    median(samples)
}

fn correlate_once(delay: Duration) -> Option<u64> {
    let coarse_begin = Instant::now();
    let ticks_begin = cycles::read_cycles();
    std::thread::sleep(delay);
    let coarse_end = Instant::now();
    let ticks_end = cycles::read_cycles();

    let elapsed_ns = coarse_end.duration_since(coarse_begin).as_nanos();
    let ticks = ticks_end.checked_sub(ticks_begin)?;
    frequency_from_samples(ticks, elapsed_ns)
}

/// Ticks per second given `ticks` counted over `elapsed_ns` nanoseconds.
pub fn frequency_from_samples(ticks: u64, elapsed_ns: u128) -> Option<u64> {
    if ticks == 0 || elapsed_ns == 0 {
        return None;
    }
    let hz = u128::from(ticks) * 1_000_000_000 / elapsed_ns;
    u64::try_from(hz).ok().filter(|&hz| hz > 0)
}

fn median(mut values: Vec<u64>) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[values.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_from_samples() {
        // 3 million ticks in 1ms is 3 GHz
        assert_eq!(frequency_from_samples(3_000_000, 1_000_000), Some(3_000_000_000));
        // 24 MHz generic timer over 2ms
        assert_eq!(frequency_from_samples(48_000, 2_000_000), Some(24_000_000));
    }

    #[test]
    fn test_frequency_from_degenerate_samples() {
        assert_eq!(frequency_from_samples(0, 1_000_000), None);
        assert_eq!(frequency_from_samples(1_000, 0), None);
        // Fewer ticks than a full Hz over a long window
        assert_eq!(frequency_from_samples(1, 10_000_000_000), None);
    }

    #[test]
    fn test_frequency_table_lookup() {
        assert_eq!(FrequencyTable::Unavailable.frequency_for(Some(0)), None);
        assert_eq!(FrequencyTable::Shared(42).frequency_for(None), Some(42));
        assert_eq!(FrequencyTable::Shared(42).frequency_for(Some(7)), Some(42));

        let table = FrequencyTable::PerCore {
            frequencies: vec![100, 200],
            fallback: 150,
        };
        assert_eq!(table.frequency_for(Some(0)), Some(100));
        assert_eq!(table.frequency_for(Some(1)), Some(200));
        // Migrated to a core that did not exist at calibration time
        assert_eq!(table.frequency_for(Some(5)), Some(150));
        assert_eq!(table.frequency_for(None), Some(150));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![5]), Some(5));
        assert_eq!(median(vec![9, 1, 5]), Some(5));
    }

    #[test]
    fn test_per_core_table_from_every_core() {
        let table = per_core_table(&[0, 1, 2], |core| Some(100 * (core as u64 + 1)), || None);
        assert_eq!(
            table,
            FrequencyTable::PerCore {
                frequencies: vec![100, 200, 300],
                fallback: 200,
            }
        );
    }

    #[test]
    fn test_per_core_failed_core_takes_median() {
        let table = per_core_table(
            &[0, 1, 2, 3],
            |core| (core != 1).then_some(1_000 + core as u64),
            || panic!("unpinned correlation must not run"),
        );
        assert_eq!(
            table,
            FrequencyTable::PerCore {
                frequencies: vec![1_000, 1_002, 1_002, 1_003],
                fallback: 1_002,
            }
        );
    }

    #[test]
    fn test_per_core_sparse_cpu_ids() {
        // CPUs 1 and 2 are outside the allowed set
        let mut seen = Vec::new();
        let table = per_core_table(
            &[0, 3],
            |core| {
                seen.push(core);
                Some(if core == 0 { 10 } else { 30 })
            },
            || None,
        );
        assert_eq!(seen, [0, 3]);
        assert_eq!(
            table,
            FrequencyTable::PerCore {
                frequencies: vec![10, 30, 30, 30],
                fallback: 30,
            }
        );
        assert_eq!(table.frequency_for(Some(3)), Some(30));
    }

    #[test]
    fn test_per_core_without_pinning_falls_back() {
        assert_eq!(
            per_core_table(&[0, 1], |_| None, || Some(42)),
            FrequencyTable::Shared(42)
        );
        assert_eq!(
            per_core_table(&[0, 1], |_| None, || None),
            FrequencyTable::Unavailable
        );
        assert_eq!(per_core_table(&[], |_| Some(1), || Some(7)), FrequencyTable::Shared(7));
    }

    #[test]
    fn test_calibrate_per_core_on_this_machine() {
        if !cycles::counter_available() {
            return;
        }
        let cpus = allowed_cpus();
        let table = calibrate_per_core(&CalibrationConfig {
            delay: Duration::from_millis(1),
            rounds: 1,
            prefer_register: false,
        });
        match table {
            FrequencyTable::PerCore { frequencies, fallback } => {
                assert_eq!(frequencies.len(), cpus.iter().max().map_or(0, |&max| max + 1));
                assert!(fallback > 0);
                assert!(frequencies.iter().all(|&hz| hz > 0));
            }
            // Pinning refused everywhere
            FrequencyTable::Shared(hz) => assert!(hz > 0),
            FrequencyTable::Unavailable => {}
        }
    }

    #[test]
    fn test_calibrate_matches_availability() {
        let table = calibrate(&CalibrationConfig {
            delay: Duration::from_millis(1),
            rounds: 1,
            prefer_register: true,
        });
        if !cycles::counter_available() {
            assert_eq!(table, FrequencyTable::Unavailable);
        }
        if let Some(hz) = table.frequency_for(None) {
            assert!(hz >= 1_000_000, "implausible counter frequency {hz} Hz");
        }
    }
}
