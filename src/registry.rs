//! Benchmark session: testees registered by name and column, then measured
//! and reported together.
//!
//! Testees sharing a name form one row of the report; columns are the
//! variants being compared. Each column is normalized on its own fastest
//! testee.

use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::utils::clock::{Clock, Timebase};
use crate::utils::runner::{run_testees, Report, RunObserver, TesteeFn, TesteeRow};
use crate::utils::timer::TimingConfig;
use crate::utils::tui::{print_report, ConsoleProgress};

/// Most columns a session can compare.
pub const MAX_COLUMNS: usize = 10;

/// A set of testees to be measured in one session.
pub struct Benchmark<'a> {
    rows: Vec<TesteeRow<'a>>,
    columns: usize,
    seed: Option<u32>,
}

impl Default for Benchmark<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Benchmark<'a> {
    /// An empty session with one column.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            columns: 1,
            seed: None,
        }
    }

    /// Change the number of columns, resizing every registered row.
    ///
    /// Shrinking drops testees registered in the removed columns.
    pub fn try_set_columns(&mut self, columns: usize) -> Result<()> {
        if columns == 0 || columns > MAX_COLUMNS {
            return Err(BenchError::InvalidColumnCount {
                requested: columns,
                max: MAX_COLUMNS,
            });
        }
        for row in &mut self.rows {
            row.slots.resize_with(columns, || None);
        }
        self.columns = columns;
        Ok(())
    }

    /// # Panics
    /// Panics unless `1 <= columns <= MAX_COLUMNS`.
    pub fn set_columns(&mut self, columns: usize) {
        if let Err(err) = self.try_set_columns(columns) {
            panic!("{err}");
        }
    }

    /// Register `testee` under `name` in `column`.
    ///
    /// Registering the same slot twice replaces the earlier testee.
    pub fn try_add<F>(&mut self, name: &str, column: usize, testee: F) -> Result<()>
    where
        F: FnMut(u32, u32) -> u32 + 'a,
    {
        if name.is_empty() {
            return Err(BenchError::EmptyName);
        }
        if column >= self.columns {
            return Err(BenchError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }

        let index = match self.rows.iter().position(|row| row.name == name) {
            Some(index) => index,
            None => {
                self.rows.push(TesteeRow::new(name, self.columns));
                self.rows.len() - 1
            }
        };
        self.rows[index].slots[column] = Some(Box::new(testee) as TesteeFn<'a>);
        Ok(())
    }

    /// # Panics
    /// Panics on an empty name or a column outside the configured range.
    pub fn add<F>(&mut self, name: &str, column: usize, testee: F)
    where
        F: FnMut(u32, u32) -> u32 + 'a,
    {
        if let Err(err) = self.try_add(name, column, testee) {
            panic!("{err}");
        }
    }

    /// Fix the random seed instead of deriving one from the clock.
    pub fn set_seed(&mut self, seed: u32) {
        self.seed = Some(seed);
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.name.as_str())
    }

    pub fn is_registered(&self, name: &str, column: usize) -> bool {
        self.rows
            .iter()
            .find(|row| row.name == name)
            .and_then(|row| row.slots.get(column))
            .is_some_and(Option::is_some)
    }

    /// Calibrate the clock, measure everything with progress on stdout and
    /// print the tables.
    ///
    /// # Panics
    /// Panics if `budget` is zero or `minimum_samples` is below 10.
    pub fn run(&mut self, budget: Duration, minimum_samples: u64) -> Report {
        let config = TimingConfig::default()
            .with_budget(budget)
            .with_minimum_repetitions(minimum_samples);
        let clock = Clock::new();
        match self.run_with(&clock, &config, &mut ConsoleProgress) {
            Ok(report) => {
                print_report(&report);
                report
            }
            Err(err) => panic!("{err}"),
        }
    }

    /// Measure everything on `clock`, reporting progress to `observer`.
    ///
    /// Each testee binds the clock to the core it runs on.
    pub fn run_with(
        &mut self,
        clock: &Clock,
        config: &TimingConfig,
        observer: &mut dyn RunObserver,
    ) -> Result<Report> {
        self.run_with_timebase(|| clock.bind_current(), config, observer)
    }

    /// Like [`run_with`](Self::run_with), with an arbitrary time source.
    pub fn run_with_timebase<T, B>(
        &mut self,
        bind: B,
        config: &TimingConfig,
        observer: &mut dyn RunObserver,
    ) -> Result<Report>
    where
        T: Timebase,
        B: Fn() -> T,
    {
        let mut config = config.clone();
        if config.seed.is_none() {
            config.seed = self.seed;
        }
        run_testees(&mut self.rows, self.columns, &config, bind, observer)
    }
}
