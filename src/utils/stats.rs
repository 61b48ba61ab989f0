//! Per-column aggregation of testee timings.
//!
//! Each column keeps the smallest minimum, maximum and average of all its
//! testees. Those minima are the 100% baselines that every other testee in the
//! column is compared against. Columns also remember the widest formatted
//! strings so the report can align them.

use super::format::{format_duration, format_percentage};
use super::timer::TesteeTiming;

const TIME_HEADER: &str = "Time";
const PERCENT_HEADER: &str = "%";

/// Which per-call statistic a table shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statistic {
    Minimum,
    Maximum,
    Average,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [Statistic::Minimum, Statistic::Maximum, Statistic::Average];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
            Statistic::Average => "Average",
        }
    }

    fn index(self) -> usize {
        match self {
            Statistic::Minimum => 0,
            Statistic::Maximum => 1,
            Statistic::Average => 2,
        }
    }
}

/// `value` relative to `baseline`, in percent with one decimal.
///
/// The baseline is clamped to 1ps. Results above 1000% are truncated to an
/// integer.
pub fn percentage(value: i64, baseline: i64) -> f64 {
    let baseline = baseline.max(1) as f64;
    let percent = (value as f64 / baseline * 1000.0).round() / 10.0;
    if percent > 1000.0 {
        percent.trunc()
    } else {
        percent
    }
}

/// Aggregates of one comparison column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStats {
    minimum: [i64; 3],
    time_width: [usize; 3],
    percent_width: [usize; 3],
    testees: usize,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            minimum: [i64::MAX; 3],
            time_width: [TIME_HEADER.len(); 3],
            percent_width: [PERCENT_HEADER.len(); 3],
            testees: 0,
        }
    }
}

impl ColumnStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one measured testee into the baselines and time widths.
    pub fn observe(&mut self, timing: &TesteeTiming) {
        for statistic in Statistic::ALL {
            let i = statistic.index();
            let value = timing.get(statistic);
            self.minimum[i] = self.minimum[i].min(value);
            self.time_width[i] = self.time_width[i].max(format_duration(value).len());
        }
        self.testees += 1;
    }

    /// Widen the percentage field for `timing`. Needs final baselines, so it
    /// runs after every testee of the column was observed.
    fn observe_percentages(&mut self, timing: &TesteeTiming) {
        for statistic in Statistic::ALL {
            if let Some(percent) = self.percentage(statistic, timing.get(statistic)) {
                let i = statistic.index();
                self.percent_width[i] = self.percent_width[i].max(format_percentage(percent).len());
            }
        }
    }

    /// Smallest value of `statistic` in this column, if anything was measured.
    pub fn baseline(&self, statistic: Statistic) -> Option<i64> {
        (self.testees > 0).then_some(self.minimum[statistic.index()])
    }

    pub fn percentage(&self, statistic: Statistic, value: i64) -> Option<f64> {
        self.baseline(statistic).map(|base| percentage(value, base))
    }

    pub fn time_width(&self, statistic: Statistic) -> usize {
        self.time_width[statistic.index()]
    }

    pub fn percent_width(&self, statistic: Statistic) -> usize {
        self.percent_width[statistic.index()]
    }

    /// Number of measured testees in this column.
    pub fn testees(&self) -> usize {
        self.testees
    }
}

/// Build the stats of `columns` columns from `(column, timing)` pairs.
///
/// Unset slots are simply absent from the input, so they never influence a
/// baseline or a width.
pub fn aggregate<'t, I>(columns: usize, timings: I) -> Vec<ColumnStats>
where
    I: IntoIterator<Item = (usize, &'t TesteeTiming)> + Clone,
{
    let mut stats = vec![ColumnStats::new(); columns];
    for (column, timing) in timings.clone() {
        if let Some(stats) = stats.get_mut(column) {
            stats.observe(timing);
        }
    }
    for (column, timing) in timings {
        if let Some(stats) = stats.get_mut(column) {
            stats.observe_percentages(timing);
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(minimum_ps: i64, average_ps: i64, maximum_ps: i64) -> TesteeTiming {
        TesteeTiming {
            minimum_ps,
            maximum_ps,
            average_ps,
            calls: 1,
            samples: 1,
            batch_size: 0,
            clarifying_passes: 0,
            elapsed_ns: 0,
            overrun: None,
            checksum: 0,
            last_output: 0,
        }
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(500, 500), 100.0);
        assert_eq!(percentage(1_000, 500), 200.0);
        assert_eq!(percentage(1_234, 1_000), 123.4);
        assert_eq!(percentage(1_235, 1_000), 123.5);
        // Rounded, not truncated
        assert_eq!(percentage(20_006, 10_000), 200.1);
    }

    #[test]
    fn test_percentage_zero_baseline() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 300.0);
    }

    #[test]
    fn test_percentage_extreme_outlier_truncated() {
        assert_eq!(percentage(12_345, 1_000), 1234.0);
        assert_eq!(percentage(10_000, 1_000), 1000.0);
    }

    #[test]
    fn test_aggregate_baselines() {
        let fast = timing(900, 1_000, 1_500);
        let slow = timing(1_900, 2_000, 2_500);
        let stats = aggregate(1, [(0, &slow), (0, &fast)]);

        assert_eq!(stats[0].baseline(Statistic::Minimum), Some(900));
        assert_eq!(stats[0].baseline(Statistic::Average), Some(1_000));
        assert_eq!(stats[0].baseline(Statistic::Maximum), Some(1_500));
        assert_eq!(stats[0].percentage(Statistic::Average, fast.average_ps), Some(100.0));
        assert_eq!(stats[0].percentage(Statistic::Average, slow.average_ps), Some(200.0));
    }

    #[test]
    fn test_empty_column_has_no_baseline() {
        let only = timing(1, 2, 3);
        let stats = aggregate(2, [(0, &only)]);
        assert_eq!(stats[1].baseline(Statistic::Minimum), None);
        assert_eq!(stats[1].testees(), 0);
        assert_eq!(stats[1].time_width(Statistic::Average), 4);
    }

    #[test]
    fn test_widths() {
        let a = timing(999, 1_500, 2_000_000);
        let b = timing(3_000, 3_000, 3_000);
        let stats = aggregate(1, [(0, &a), (0, &b)]);

        assert_eq!(stats[0].time_width(Statistic::Minimum), "3ns 000ps".len());
        assert_eq!(stats[0].time_width(Statistic::Maximum), "2us 000ns".len());
        // 100.0 and 200.0
        assert_eq!(stats[0].percent_width(Statistic::Average), 5);
        // 3000ps against 999ps: 300.3
        assert_eq!(stats[0].percent_width(Statistic::Minimum), 5);
    }

    #[test]
    fn test_out_of_range_column_ignored() {
        let a = timing(1, 1, 1);
        let stats = aggregate(1, [(3, &a)]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].testees(), 0);
    }
}
