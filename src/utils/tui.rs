//! Text User Interface (TUI) utilities.
//!
//! Progress lines while a session runs, and one markdown table per statistic
//! once it finished.

use std::fmt::Write as _;
use std::io::Write as _;

use terminal_size::{terminal_size, Width};

use super::format::{format_duration, format_duration_ns, format_percentage};
use super::runner::{Report, RunObserver, Subject, NAME_HEADER};
use super::stats::Statistic;
use super::timer::TesteeTiming;

const NOOP_CELL: &str = "-";

/// Get the current terminal width, if stdout is a terminal
fn get_term_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate string with ellipsis if it exceeds width (character-wise)
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut result: String = s.chars().take(width.saturating_sub(3)).collect();
        result.push_str("...");
        result
    }
}

/// Prints one progress line per testee to stdout.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn emit(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        // Progress is best effort; a closed stdout must not abort the session
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// Text printed after ` [i] name... ` once a testee finished.
pub fn outcome_line(timing: &TesteeTiming) -> String {
    match timing.overrun {
        Some(times) => format!("Warning: the test took ~{times} times longer than expected.\n"),
        None => "Done.\n".to_string(),
    }
}

impl RunObserver for ConsoleProgress {
    fn started(&mut self, subjects: usize) {
        self.emit(&format!("Benchmark is running for {subjects} subjects:\n"));
    }

    fn skipped(&mut self, subject: &Subject<'_>) {
        self.emit(&format!(" [{}] {}... Noop.\n", subject.index, subject.name));
    }

    fn testee_started(&mut self, subject: &Subject<'_>) {
        self.emit(&format!(" [{}] {}... ", subject.index, subject.name));
    }

    fn testee_finished(&mut self, _subject: &Subject<'_>, timing: &TesteeTiming) {
        self.emit(&outcome_line(timing));
    }
}

/// Width of everything right of the name column.
fn cells_width(report: &Report, statistic: Statistic) -> usize {
    report
        .columns
        .iter()
        .map(|column| column.time_width(statistic) + column.percent_width(statistic) + 6)
        .sum()
}

/// Name column width for a table, shrunk to fit `term_width` when given.
pub fn name_width(report: &Report, statistic: Statistic, term_width: Option<usize>) -> usize {
    let wanted = report.name_width;
    match term_width {
        Some(term) => {
            let available = term.saturating_sub(cells_width(report, statistic) + 4);
            // Below this the table is unreadable anyway, let the terminal wrap
            wanted.min(available.max(NAME_HEADER.len() + 4))
        }
        None => wanted,
    }
}

/// Render the markdown table of one statistic.
pub fn render_table(report: &Report, statistic: Statistic, name_width: usize) -> String {
    let mut out = String::new();

    let _ = write!(out, "| {:<name_width$} |", NAME_HEADER);
    for column in &report.columns {
        let _ = write!(
            out,
            " {:>tw$} | {:>pw$} |",
            "Time",
            "%",
            tw = column.time_width(statistic),
            pw = column.percent_width(statistic)
        );
    }
    out.push('\n');

    let _ = write!(out, "|:{}|", "-".repeat(name_width + 1));
    for column in &report.columns {
        let _ = write!(
            out,
            "{}:|{}:|",
            "-".repeat(column.time_width(statistic) + 1),
            "-".repeat(column.percent_width(statistic) + 1)
        );
    }
    out.push('\n');

    for row in &report.rows {
        let _ = write!(out, "| {:<name_width$} |", truncate(&row.name, name_width));
        for (cell, column) in row.cells.iter().zip(&report.columns) {
            let (time, percent) = match cell {
                Some(timing) => {
                    let value = timing.get(statistic);
                    let percent = column
                        .percentage(statistic, value)
                        .map_or_else(|| NOOP_CELL.to_string(), format_percentage);
                    (format_duration(value), percent)
                }
                None => (NOOP_CELL.to_string(), NOOP_CELL.to_string()),
            };
            let _ = write!(
                out,
                " {:>tw$} | {:>pw$} |",
                time,
                percent,
                tw = column.time_width(statistic),
                pw = column.percent_width(statistic)
            );
        }
        out.push('\n');
    }
    out
}

/// Closing line of a session.
pub fn finished_line(report: &Report) -> String {
    format!("Benchmark finished in {}", format_duration_ns(report.elapsed_ns))
}

/// Render all three tables and the closing line.
pub fn render_report(report: &Report, term_width: Option<usize>) -> String {
    let mut out = String::new();
    for statistic in Statistic::ALL {
        let width = name_width(report, statistic, term_width);
        let _ = writeln!(out, "\n{} time per call:\n", statistic.label());
        out.push_str(&render_table(report, statistic, width));
    }
    let _ = writeln!(out, "\n{}", finished_line(report));
    out
}

/// Print the report sized to the current terminal.
pub fn print_report(report: &Report) {
    print!("{}", render_report(report, get_term_width()));
}

/// Print the application header
pub fn print_header(seed: u32, fine_clock: bool) {
    let title = " Adaptive Micro-Benchmarks ";
    let width = get_term_width().unwrap_or(80).clamp(40, 80);
    let padding = width.saturating_sub(title.len()) / 2;
    let right_padding = width.saturating_sub(padding + title.len());

    println!("╔{}╗", "═".repeat(width));
    println!("║{}{}{}║", " ".repeat(padding), title, " ".repeat(right_padding));
    println!("╚{}╝", "═".repeat(width));
    println!(
        "  seed {}, {} clock",
        seed,
        if fine_clock { "cycle counter" } else { "steady" }
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::runner::ReportRow;
    use crate::utils::stats::aggregate;

    fn timing(average_ps: i64) -> TesteeTiming {
        TesteeTiming {
            minimum_ps: average_ps,
            maximum_ps: average_ps,
            average_ps,
            calls: 100,
            samples: 100,
            batch_size: 0,
            clarifying_passes: 0,
            elapsed_ns: 1_000,
            overrun: None,
            checksum: 0,
            last_output: 0,
        }
    }

    fn report() -> Report {
        let rows = vec![
            ReportRow {
                name: "lookup".to_string(),
                cells: vec![Some(timing(1_500)), None],
            },
            ReportRow {
                name: "branch".to_string(),
                cells: vec![Some(timing(3_000)), Some(timing(2_000))],
            },
        ];
        let columns = aggregate(
            2,
            rows.iter().flat_map(|row| {
                row.cells
                    .iter()
                    .enumerate()
                    .filter_map(|(column, cell)| cell.as_ref().map(|t| (column, t)))
            }),
        );
        Report {
            rows,
            columns,
            elapsed_ns: 1_500_000,
            seed: 1,
            name_width: 6,
        }
    }

    #[test]
    fn test_render_table_layout() {
        let table = render_table(&report(), Statistic::Average, 6);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| Name   |      Time |     % |      Time |     % |");
        assert_eq!(lines[1], "|:-------|----------:|------:|----------:|------:|");
        assert_eq!(lines[2], "| lookup | 1ns 500ps | 100.0 |         - |     - |");
        assert_eq!(lines[3], "| branch | 3ns 000ps | 200.0 | 2ns 000ps | 100.0 |");
    }

    #[test]
    fn test_rows_share_width() {
        let table = render_table(&report(), Statistic::Minimum, 6);
        let widths: Vec<usize> = table.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{widths:?}");
    }

    #[test]
    fn test_long_names_truncated_to_terminal() {
        let mut report = report();
        report.rows[0].name = "a_really_long_testee_name_that_wraps".to_string();
        report.name_width = report.rows[0].name.len();

        assert_eq!(name_width(&report, Statistic::Average, None), report.name_width);
        let narrow = name_width(&report, Statistic::Average, Some(60));
        assert!(narrow < report.name_width);
        let table = render_table(&report, Statistic::Average, narrow);
        assert!(table.contains("..."));
        assert!(table.lines().all(|l| l.chars().count() <= 60));
    }

    #[test]
    fn test_finished_line_uses_session_time() {
        // 1.5ms of nanoseconds, not picoseconds
        assert_eq!(finished_line(&report()), "Benchmark finished in 1ms 500us");
    }

    #[test]
    fn test_outcome_line() {
        let mut late = timing(1_000);
        assert_eq!(outcome_line(&late), "Done.\n");
        late.overrun = Some(3);
        assert_eq!(
            outcome_line(&late),
            "Warning: the test took ~3 times longer than expected.\n"
        );
    }

    #[test]
    fn test_render_report_has_all_tables() {
        let text = render_report(&report(), None);
        for statistic in Statistic::ALL {
            assert!(text.contains(&format!("{} time per call:", statistic.label())));
        }
        assert!(text.trim_end().ends_with("Benchmark finished in 1ms 500us"));
    }
}
