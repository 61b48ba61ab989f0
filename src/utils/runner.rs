//! Session driver: measures every registered testee in order and collects
//! the results into a [`Report`].

use super::clock::Timebase;
use super::cpu_affinity::CpuPinGuard;
use super::rng::{time_seed, MinStdRand};
use super::stats::{aggregate, ColumnStats, Statistic};
use super::timer::{measure_testee, PinStrategy, TesteeTiming, TimingConfig};
use crate::error::Result;

/// A testee callable: `(random, previous output) -> output`.
pub type TesteeFn<'a> = Box<dyn FnMut(u32, u32) -> u32 + 'a>;

/// All variants registered under one name, one slot per column.
pub struct TesteeRow<'a> {
    pub name: String,
    pub slots: Vec<Option<TesteeFn<'a>>>,
}

impl<'a> TesteeRow<'a> {
    pub fn new(name: impl Into<String>, columns: usize) -> Self {
        let mut slots = Vec::with_capacity(columns);
        slots.resize_with(columns, || None);
        Self {
            name: name.into(),
            slots,
        }
    }
}

/// One slot of the session, as seen by a [`RunObserver`].
#[derive(Clone, Copy, Debug)]
pub struct Subject<'n> {
    /// Position in run order, counting no-op slots.
    pub index: usize,
    pub name: &'n str,
    pub column: usize,
}

/// Progress callbacks. Every method defaults to doing nothing.
pub trait RunObserver {
    fn started(&mut self, _subjects: usize) {}

    fn skipped(&mut self, _subject: &Subject<'_>) {}

    fn testee_started(&mut self, _subject: &Subject<'_>) {}

    fn testee_finished(&mut self, _subject: &Subject<'_>, _timing: &TesteeTiming) {}

    fn finished(&mut self, _report: &Report) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl RunObserver for Silent {}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub name: String,
    /// `None` for no-op slots.
    pub cells: Vec<Option<TesteeTiming>>,
}

/// Results of one benchmark session.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub columns: Vec<ColumnStats>,
    /// Wall time of the whole session on the coarse clock.
    pub elapsed_ns: i64,
    pub seed: u32,
    /// Length of the longest registered name, at least the header's.
    pub name_width: usize,
}

impl Report {
    pub fn timing(&self, name: &str, column: usize) -> Option<&TesteeTiming> {
        self.rows
            .iter()
            .find(|row| row.name == name)
            .and_then(|row| row.cells.get(column))
            .and_then(Option::as_ref)
    }

    /// `statistic` of `name` in `column` relative to the column's baseline.
    pub fn percentage(&self, name: &str, column: usize, statistic: Statistic) -> Option<f64> {
        let timing = self.timing(name, column)?;
        self.columns
            .get(column)?
            .percentage(statistic, timing.get(statistic))
    }

    /// Testees that ran past their deadline, with the overrun multiplier.
    pub fn overruns(&self) -> impl Iterator<Item = (&str, usize, u64)> + '_ {
        self.rows.iter().flat_map(|row| {
            row.cells.iter().enumerate().filter_map(move |(column, cell)| {
                cell.as_ref()
                    .and_then(|timing| timing.overrun)
                    .map(|times| (row.name.as_str(), column, times))
            })
        })
    }

    fn measured(&self) -> impl Iterator<Item = (usize, &TesteeTiming)> + Clone + '_ {
        self.rows.iter().flat_map(|row| {
            row.cells
                .iter()
                .enumerate()
                .filter_map(|(column, cell)| cell.as_ref().map(|timing| (column, timing)))
        })
    }
}

pub(crate) const NAME_HEADER: &str = "Name";

/// Measure every non-empty slot of `rows`, row by row and column by column.
///
/// `bind` is called once for the session clock and once per testee, after
/// the thread has been pinned, so it can pick up the current core's
/// counter frequency.
pub fn run_testees<T, B>(
    rows: &mut [TesteeRow<'_>],
    columns: usize,
    config: &TimingConfig,
    bind: B,
    observer: &mut dyn RunObserver,
) -> Result<Report>
where
    T: Timebase,
    B: Fn() -> T,
{
    config.validate()?;

    let seed = config.seed.unwrap_or_else(time_seed);
    let mut rng = MinStdRand::new(seed);
    log::debug!(
        "benchmark session: {} rows x {} columns, seed {}",
        rows.len(),
        columns,
        seed
    );

    let session = bind();
    let begin_ns = session.coarse_now_ns();
    let budget_ns = config.budget_ns();
    observer.started(rows.len() * columns);

    let mut index = 0;
    let mut report_rows = Vec::with_capacity(rows.len());
    for row in rows.iter_mut() {
        let mut cells = Vec::with_capacity(columns);
        for (column, slot) in row.slots.iter_mut().enumerate() {
            let subject = Subject {
                index,
                name: &row.name,
                column,
            };
            index += 1;

            let Some(testee) = slot.as_mut() else {
                observer.skipped(&subject);
                cells.push(None);
                continue;
            };

            observer.testee_started(&subject);
            let _pin = (config.pin_strategy == PinStrategy::PerTestee).then(CpuPinGuard::new);
            let timebase = bind();
            let deadline_ns = timebase.coarse_now_ns().saturating_add(budget_ns);
            let timing = measure_testee(&timebase, &mut **testee, &mut rng, config, deadline_ns);

            if let Some(times) = timing.overrun {
                log::warn!(
                    "{} (column {}) took ~{} times longer than expected",
                    row.name,
                    column,
                    times
                );
            }
            observer.testee_finished(&subject, &timing);
            cells.push(Some(timing));
        }
        report_rows.push(ReportRow {
            name: row.name.clone(),
            cells,
        });
    }

    let name_width = report_rows
        .iter()
        .map(|row| row.name.chars().count())
        .fold(NAME_HEADER.len(), usize::max);

    let mut report = Report {
        rows: report_rows,
        columns: Vec::new(),
        elapsed_ns: session.coarse_now_ns() - begin_ns,
        seed,
        name_width,
    };
    report.columns = aggregate(columns, report.measured());
    observer.finished(&report);
    Ok(report)
}
