//! Adaptive repetition estimator.
//!
//! Measures one testee so that it consumes roughly its time budget:
//!
//! 1. **Rough measurement**: a fixed number of individually timed calls gives
//!    a first per-call average.
//! 2. **Clarifying measurement**: when a single call is too short to time on
//!    its own, calls are batched into windows of at least
//!    [`TimingConfig::min_sample_time`] and the batch size is refined from the
//!    batched average (two passes by default). Skipped once the deadline has
//!    already passed.
//! 3. **Main measurement**: the remaining budget is divided by the estimated
//!    cost to pick the final repetition count.
//!
//! Samples at or below one clock tick cannot be told apart from zero and are
//! left out of the statistics.

use std::hint::black_box;
use std::time::Duration;

use super::clock::Timebase;
use super::format::PS_PER_NS;
use super::rng::MinStdRand;
use super::stats::Statistic;
use crate::error::{BenchError, Result};

/// Smallest accepted `minimum_repetitions`.
pub const MIN_REPETITIONS: u64 = 10;

/// Per-call averages are never estimated below this, so later stages never
/// divide by zero for calls faster than the clock can resolve.
pub const AVERAGE_FLOOR_PS: i64 = 100;

/// Random inputs pre-generated for batched windows; a power of two.
const INPUT_POOL: usize = 1024;

// ============================================================================
// Configuration
// ============================================================================

/// CPU pinning strategy during measurements
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinStrategy {
    /// Leave scheduling alone.
    Unpinned,
    /// Pin each testee to the core it starts on, so the calibrated frequency
    /// bound for it stays valid.
    #[default]
    PerTestee,
}

/// Bounded refinement of the batch size in the clarifying stage.
#[derive(Clone, Debug, PartialEq)]
pub struct ClarifyingPolicy {
    /// Upper bound on clarifying passes (default: 2).
    pub max_passes: u32,
    /// After the second pass, stop early once successive per-call averages
    /// differ by less than this fraction (default: 0.05).
    pub tolerance: f64,
}

impl Default for ClarifyingPolicy {
    fn default() -> Self {
        Self {
            max_passes: 2,
            tolerance: 0.05,
        }
    }
}

/// Configuration for timing measurements
#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    /// Wall-clock time allotted to each testee (default: 5s)
    pub budget: Duration,
    /// Individually timed calls in the rough stage (default: 500)
    pub minimum_repetitions: u64,
    /// Shortest timing window considered accurate; cheaper calls are batched
    /// (default: 5us)
    pub min_sample_time: Duration,
    /// Time spent per clarifying pass (default: 500us, about 100 windows)
    pub min_clarifying_time: Duration,
    /// Clarifying stage iteration bounds
    pub clarifying: ClarifyingPolicy,
    /// CPU pinning strategy (default: PerTestee)
    pub pin_strategy: PinStrategy,
    /// Seed for testee inputs; `None` seeds from the current time
    pub seed: Option<u32>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(5),
            minimum_repetitions: 500,
            min_sample_time: Duration::from_micros(5),
            min_clarifying_time: Duration::from_micros(500),
            clarifying: ClarifyingPolicy::default(),
            pin_strategy: PinStrategy::default(),
            seed: None,
        }
    }
}

impl TimingConfig {
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_minimum_repetitions(mut self, repetitions: u64) -> Self {
        self.minimum_repetitions = repetitions;
        self
    }

    pub fn with_min_sample_time(mut self, time: Duration) -> Self {
        self.min_sample_time = time;
        self
    }

    pub fn with_min_clarifying_time(mut self, time: Duration) -> Self {
        self.min_clarifying_time = time;
        self
    }

    pub fn with_clarifying(mut self, policy: ClarifyingPolicy) -> Self {
        self.clarifying = policy;
        self
    }

    pub fn with_pin_strategy(mut self, strategy: PinStrategy) -> Self {
        self.pin_strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget.is_zero() {
            return Err(BenchError::ZeroBudget);
        }
        if self.minimum_repetitions < MIN_REPETITIONS {
            return Err(BenchError::TooFewSamples {
                minimum: MIN_REPETITIONS,
                requested: self.minimum_repetitions,
            });
        }
        if self.min_sample_time.is_zero() {
            return Err(BenchError::InvalidConfig(
                "minimum sample time must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn budget_ns(&self) -> i64 {
        i64::try_from(self.budget.as_nanos()).unwrap_or(i64::MAX)
    }
}

fn duration_ps(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos())
        .unwrap_or(i64::MAX)
        .saturating_mul(PS_PER_NS)
}

// ============================================================================
// Results
// ============================================================================

/// Per-call timing of one testee, all durations in picoseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TesteeTiming {
    pub minimum_ps: i64,
    pub maximum_ps: i64,
    pub average_ps: i64,
    /// Testee invocations, including the rough and clarifying stages.
    pub calls: u64,
    /// Timing windows that went into the reported statistics.
    pub samples: u64,
    /// Calls per window in the main stage; 0 when calls were timed one by one.
    pub batch_size: u64,
    pub clarifying_passes: u32,
    /// Coarse wall time spent on this testee.
    pub elapsed_ns: i64,
    /// How many budgets the testee had used up before the main stage, when it
    /// had already passed its deadline.
    pub overrun: Option<u64>,
    /// Wrapping sum of the outputs observed at the end of every window.
    pub checksum: u32,
    /// Output of the final call, which every earlier output fed into.
    pub last_output: u32,
}

impl TesteeTiming {
    pub fn get(&self, statistic: Statistic) -> i64 {
        match statistic {
            Statistic::Minimum => self.minimum_ps,
            Statistic::Maximum => self.maximum_ps,
            Statistic::Average => self.average_ps,
        }
    }
}

/// Running sum, minimum and maximum of window durations.
#[derive(Clone, Copy, Debug)]
struct Accumulator {
    sum: i64,
    min: i64,
    max: i64,
    count: u64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: 0,
            min: i64::MAX,
            max: 0,
            count: 0,
        }
    }

    #[inline(always)]
    fn add(&mut self, ps: i64) {
        self.sum = self.sum.saturating_add(ps);
        self.min = self.min.min(ps);
        self.max = self.max.max(ps);
        self.count += 1;
    }

    fn per_call_average(&self, batch: u64) -> Option<i64> {
        let calls = self.count.checked_mul(batch)?;
        (calls > 0).then(|| self.sum / calls as i64)
    }
}

/// Drives a testee and times it, threading every output into the next call.
struct Sampler<'t, T: Timebase + ?Sized, F: FnMut(u32, u32) -> u32 + ?Sized> {
    timebase: &'t T,
    testee: &'t mut F,
    rng: &'t mut MinStdRand,
    pool: Vec<u32>,
    previous: u32,
    checksum: u32,
    calls: u64,
}

impl<'t, T, F> Sampler<'t, T, F>
where
    T: Timebase + ?Sized,
    F: FnMut(u32, u32) -> u32 + ?Sized,
{
    fn new(timebase: &'t T, testee: &'t mut F, rng: &'t mut MinStdRand) -> Self {
        let pool = (0..INPUT_POOL).map(|_| rng.next()).collect();
        Self {
            timebase,
            testee,
            rng,
            pool,
            previous: 0,
            checksum: 0,
            calls: 0,
        }
    }

    /// Time one call. `None` when the clock could not resolve it.
    #[inline(always)]
    fn single(&mut self) -> Option<i64> {
        let input = self.rng.next();
        let begin = self.timebase.fine_ticks();
        let output = (self.testee)(black_box(input), self.previous);
        let end = self.timebase.fine_ticks();
        self.observe(output, 1);
        self.resolve(begin, end)
    }

    /// Time `n` consecutive calls in one window. Inputs come from the pool,
    /// salted per window so consecutive windows see different values.
    #[inline(always)]
    fn batch(&mut self, n: u64) -> Option<i64> {
        let salt = self.rng.next();
        let pool = &self.pool;
        let mut previous = self.previous;
        let begin = self.timebase.fine_ticks();
        for i in 0..n {
            let input = pool[i as usize & (INPUT_POOL - 1)] ^ salt;
            previous = black_box((self.testee)(input, previous));
        }
        let end = self.timebase.fine_ticks();
        self.observe(previous, n);
        self.resolve(begin, end)
    }

    fn observe(&mut self, output: u32, calls: u64) {
        self.previous = black_box(output);
        self.checksum = self.checksum.wrapping_add(output);
        self.calls += calls;
    }

    fn resolve(&self, begin: u64, end: u64) -> Option<i64> {
        let ticks = end.wrapping_sub(begin);
        // One tick or less (or a counter that went backwards) is noise
        if ticks <= 1 || ticks > u64::MAX / 2 {
            return None;
        }
        Some(self.timebase.ticks_to_ps(ticks))
    }

    fn batches(&mut self, n: u64, repetitions: u64) -> Accumulator {
        let mut acc = Accumulator::new();
        for _ in 0..repetitions {
            if let Some(ps) = self.batch(n) {
                acc.add(ps);
            }
        }
        acc
    }
}

/// Overrun multiplier once `remaining_ns` has gone negative: how many budgets
/// the testee has used, rounded up.
pub fn overrun_multiplier(budget_ns: i64, remaining_ns: i64) -> u64 {
    let budget_ns = budget_ns.max(1);
    let used = budget_ns.saturating_sub(remaining_ns);
    (used.saturating_add(budget_ns - 1) / budget_ns) as u64
}

/// Batch size that makes one window last about `min_sample_ps`.
fn batch_size(min_sample_ps: i64, average_ps: i64) -> u64 {
    (min_sample_ps / average_ps.max(AVERAGE_FLOOR_PS)).max(1) as u64
}

fn converged(previous: i64, current: i64, tolerance: f64) -> bool {
    let base = previous.max(1) as f64;
    ((current - previous) as f64 / base).abs() < tolerance
}

/// Measure one testee until `deadline_ns` on the timebase's coarse clock.
///
/// `config.budget` is only used to express an overrun as a multiple of the
/// budget; the amount of work is driven by the deadline.
pub fn measure_testee<T, F>(
    timebase: &T,
    testee: &mut F,
    rng: &mut MinStdRand,
    config: &TimingConfig,
    deadline_ns: i64,
) -> TesteeTiming
where
    T: Timebase + ?Sized,
    F: FnMut(u32, u32) -> u32 + ?Sized,
{
    let begin_ns = timebase.coarse_now_ns();
    let min_sample_ps = duration_ps(config.min_sample_time).max(1);
    let min_clarifying_ps = duration_ps(config.min_clarifying_time);
    let rough_reps = config.minimum_repetitions.max(1);

    let mut sampler = Sampler::new(timebase, testee, rng);

    // Stage 1: rough measurement
    let mut rough = Accumulator::new();
    for _ in 0..rough_reps {
        if let Some(ps) = sampler.single() {
            rough.add(ps);
        }
    }
    let mut average = (rough.sum / rough_reps as i64).max(AVERAGE_FLOOR_PS);
    log::trace!("rough average {}ps over {} calls", average, rough_reps);

    let late = deadline_ns - timebase.coarse_now_ns() < 0;
    if late && average < min_sample_ps {
        log::debug!("deadline passed during the rough stage, skipping clarification");
    }

    // Stage 2: clarifying measurement
    let mut batch = 0u64;
    let mut passes = 0u32;
    let mut clarified: Option<(Accumulator, u64)> = None;
    if average < min_sample_ps && !late {
        let windows = (min_clarifying_ps / min_sample_ps).max(1) as u64;
        let max_passes = config.clarifying.max_passes.max(1);
        loop {
            batch = batch_size(min_sample_ps, average);
            let pass = sampler.batches(batch, windows);
            passes += 1;

            let previous = average;
            if let Some(per_call) = pass.per_call_average(batch) {
                average = per_call.max(AVERAGE_FLOOR_PS);
            }
            clarified = Some((pass, batch));
            log::trace!(
                "clarifying pass {}: {} windows of {} calls, average {}ps",
                passes,
                windows,
                batch,
                average
            );

            if passes >= max_passes
                || (passes >= 2 && converged(previous, average, config.clarifying.tolerance))
            {
                break;
            }
        }
    }

    // Stage 3: main measurement
    let remaining_ns = deadline_ns - timebase.coarse_now_ns();
    let overrun = (remaining_ns < 0).then(|| overrun_multiplier(config.budget_ns(), remaining_ns));
    let remaining_ps = remaining_ns.max(0).saturating_mul(PS_PER_NS);

    let (minimum, maximum, mean, samples) = if batch == 0 {
        let repetitions = (remaining_ps / average) as u64;
        log::debug!("main stage: {} single calls, ~{}ps each", repetitions, average);
        let mut acc = rough;
        for _ in 0..repetitions {
            if let Some(ps) = sampler.single() {
                acc.add(ps);
            }
        }
        // Rough samples are folded into the average
        let denominator = (rough_reps + repetitions) as i64;
        if acc.count == 0 {
            (0, 0, 0, 0)
        } else {
            let mean = (acc.sum / denominator).clamp(acc.min, acc.max);
            (acc.min, acc.max, mean, acc.count)
        }
    } else {
        batch = batch_size(min_sample_ps, average);
        let repetitions = (remaining_ps / average) as u64 / batch;
        log::debug!(
            "main stage: {} windows of {} calls, ~{}ps each",
            repetitions,
            batch,
            average
        );
        let mut acc = sampler.batches(batch, repetitions);
        let mut per_window = batch;
        if acc.count == 0 {
            // No time left for the main stage; report the last clarifying pass
            if let Some((pass, pass_batch)) = clarified {
                acc = pass;
                per_window = pass_batch;
            }
        }
        match acc.per_call_average(per_window) {
            Some(mean) => (
                acc.min / per_window as i64,
                acc.max / per_window as i64,
                mean,
                acc.count,
            ),
            None => (0, 0, 0, 0),
        }
    };

    let elapsed_ns = timebase.coarse_now_ns() - begin_ns;

    TesteeTiming {
        minimum_ps: minimum,
        maximum_ps: maximum,
        average_ps: mean,
        calls: sampler.calls,
        samples,
        batch_size: batch,
        clarifying_passes: passes,
        elapsed_ns,
        overrun,
        checksum: sampler.checksum,
        last_output: sampler.previous,
    }
}
