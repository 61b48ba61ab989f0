//! Command line runner for the built-in comparison suites.
//!
//! Usage:
//!   adaptive-bench                   # Run every suite
//!   adaptive-bench --list            # List suites
//!   adaptive-bench dot-product       # Run one suite
//!   adaptive-bench --budget-ms 100   # Shorter budget per testee

use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use log::{LevelFilter, Log, Metadata, Record};

use adaptive_bench::error::Result;
use adaptive_bench::registry::Benchmark;
use adaptive_bench::suites::{all_suites, find_suite, Suite};
use adaptive_bench::utils::clock::Clock;
use adaptive_bench::utils::rng::time_seed;
use adaptive_bench::utils::timer::TimingConfig;
use adaptive_bench::utils::tui::{print_header, print_report, ConsoleProgress};

/// Adaptive micro-benchmarks: every testee runs for about the same budget.
#[derive(Parser)]
#[command(name = "adaptive-bench")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Suite to run (omit for all)
    #[arg(value_name = "SUITE")]
    suite: Option<String>,

    /// Time budget per testee, in milliseconds
    #[arg(long, default_value_t = 500)]
    budget_ms: u64,

    /// Single-call repetitions of the rough stage (at least 10)
    #[arg(long, default_value_t = 500)]
    min_samples: u64,

    /// Random seed for reproducible inputs (default: time-based)
    #[arg(long)]
    seed: Option<u32>,

    /// Use the steady clock instead of the cycle counter
    #[arg(long)]
    coarse: bool,

    /// List available suites
    #[arg(short, long)]
    list: bool,

    /// Log to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Minimal stderr logger; the level is set once from `-v`.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn print_suites() {
    println!("Available suites:");
    println!();
    for suite in all_suites() {
        println!(
            "  {:<16} [{}] - {} ({})",
            suite.name(),
            suite.category(),
            suite.description(),
            suite.columns().join(" | ")
        );
    }
}

fn run_suite(suite: &dyn Suite, clock: &Clock, config: &TimingConfig) -> Result<()> {
    if let Err(e) = suite.verify() {
        log::error!("suite '{}' failed verification, skipped: {}", suite.name(), e);
        return Ok(());
    }

    println!("{} [{}]: {}", suite.name(), suite.category(), suite.description());
    for (column, label) in suite.columns().iter().enumerate() {
        println!("  column {}: {}", column, label);
    }
    println!();

    let mut bench = Benchmark::new();
    bench.try_set_columns(suite.columns().len())?;
    suite.register(&mut bench);
    let report = bench.run_with(clock, config, &mut ConsoleProgress)?;
    print_report(&report);
    println!();
    Ok(())
}

fn run(cli: &Cli, suites: &[Box<dyn Suite>]) -> Result<()> {
    let seed = cli.seed.unwrap_or_else(time_seed);
    let config = TimingConfig::default()
        .with_budget(Duration::from_millis(cli.budget_ms))
        .with_minimum_repetitions(cli.min_samples)
        .with_seed(seed);
    config.validate()?;

    let clock = if cli.coarse { Clock::coarse() } else { Clock::new() };
    log::debug!("frequency table: {:?}", clock.frequencies());
    log::debug!("fine clock resolution: {}ps", clock.bind_current().resolution_ps());

    print_header(seed, clock.is_fine());
    for suite in suites {
        run_suite(suite.as_ref(), &clock, &config)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        print_suites();
        return ExitCode::SUCCESS;
    }

    let suites = match &cli.suite {
        Some(name) => match find_suite(name) {
            Some(suite) => vec![suite],
            None => {
                eprintln!("Suite '{}' not found.", name);
                let names: Vec<_> = all_suites().iter().map(|s| s.name()).collect();
                eprintln!("Available: {}", names.join(", "));
                return ExitCode::FAILURE;
            }
        },
        None => all_suites(),
    };

    match run(&cli, &suites) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
