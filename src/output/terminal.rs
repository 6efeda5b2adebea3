//! Terminal output: progress lines, the run summary and errors.

use crate::error::Error;
use crate::models::{Counters, Outcome};
use crate::reconcile::{ItemRecord, RunMode, RunReport};
use colored::{ColoredString, Colorize};

/// Format a value as a right-aligned field of at least `width` characters.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    if value_str.len() >= width {
        value_str
    } else {
        format!("{value_str:>width$}")
    }
}

fn colored_outcome(outcome: &Outcome) -> ColoredString {
    let label = format!("{:<18}", outcome.label());
    match outcome {
        Outcome::Applied => label.green(),
        Outcome::Simulated => label.cyan(),
        Outcome::Failed(_) => label.red(),
        Outcome::UserSkipped => label.yellow(),
        Outcome::Excluded | Outcome::AlreadyConformant => label.dimmed(),
    }
}

/// One progress line per reconciled item.
pub fn print_progress(record: &ItemRecord) {
    let reason = match &record.outcome {
        Outcome::Failed(reason) => format!(" ({reason})"),
        _ => String::new(),
    };
    println!(
        "  {outcome} {region:<16} {item}{reason}",
        outcome = colored_outcome(&record.outcome),
        region = record.region,
        item = record.item(),
    );
}

/// Title line printed before a run.
pub fn print_banner(title: &str, subscription: &str, mode: RunMode) {
    let mode = match mode {
        RunMode::Preview => "WHAT-IF (no changes)".cyan(),
        RunMode::Forced => "FORCED".red(),
        RunMode::Interactive => "interactive".normal(),
    };
    println!(
        "{} {} on '{}' [{}]",
        "#".bold(),
        title.bold(),
        subscription,
        mode
    );
}

const HEADER: [(&str, usize); 9] = [
    ("vnets", 6),
    ("subnets", 8),
    ("processed", 10),
    ("succeeded", 10),
    ("failed", 7),
    ("skipped", 8),
    ("excluded", 9),
    ("conformant", 11),
    ("target", 0),
];

fn counters_row(label: &str, c: &Counters, target: &str) -> String {
    let values = [
        c.vnets,
        c.subnets,
        c.processed,
        c.succeeded,
        c.failed,
        c.skipped,
        c.excluded,
        c.already_conformant,
    ];
    let mut row = format!("{label:<18}");
    for (value, (_, width)) in values.iter().zip(HEADER.iter()) {
        row.push_str(&format_field(value, *width));
    }
    row.push_str("  ");
    row.push_str(target);
    row
}

/// Totals, per-region counters and unresolved regions.
pub fn print_summary(report: &RunReport) {
    let stats = &report.statistics;
    println!();
    println!(
        "{} {} summary{}",
        "#".bold(),
        report.title.bold(),
        if report.preview { " (what-if)".cyan() } else { "".normal() }
    );

    let mut header = format!("{:<18}", "region");
    for (name, width) in HEADER {
        if width == 0 {
            header.push_str("  ");
            header.push_str(name);
        } else {
            header.push_str(&format_field(name, width));
        }
    }
    println!("{}", header.bold());

    for (region, counters) in stats.regions() {
        let target = report
            .targets
            .get(region)
            .map(|t| t.name.as_str())
            .unwrap_or("-");
        println!("{}", counters_row(region, counters, target));
    }
    println!("{}", counters_row("TOTAL", stats.totals(), "").bold());

    let totals = stats.totals();
    if totals.failed > 0 {
        println!(
            "{} {} change(s) failed, see the log for details",
            "WARN".on_red(),
            totals.failed
        );
    }
    for region in &report.unresolved {
        println!(
            "{} region '{}' skipped: target could not be resolved",
            "WARN".on_yellow(),
            region
        );
    }
    if report.preview && totals.processed > 0 {
        println!(
            "{} {} change(s) reported, nothing was applied",
            "WHAT-IF".cyan(),
            totals.processed
        );
    }
}

/// Changes a snapshot run made in memory.
pub fn print_journal(journal: &[String]) {
    if journal.is_empty() {
        return;
    }
    println!();
    println!(
        "{} {} change(s) applied to the snapshot only:",
        "#".bold(),
        journal.len()
    );
    for line in journal {
        println!("  {line}");
    }
}

/// Print a fatal error and its causes to stderr.
pub fn print_error(err: &Error) {
    eprintln!("{} {}", "✗".red(), err);
    if let Error::TargetValidation(failures) = err {
        for failure in failures {
            eprintln!("  {} {}", "-".red(), failure);
        }
    }
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "      test");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 4), "test");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "long_value");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "    42");
    }

    #[test]
    fn test_counters_row_alignment() {
        let c = Counters {
            vnets: 1,
            subnets: 3,
            processed: 2,
            succeeded: 2,
            ..Default::default()
        };
        let row = counters_row("East US", &c, "nsg-a");
        assert!(row.starts_with("East US           "));
        assert!(row.ends_with("  nsg-a"));
        assert_eq!(row.len(), 18 + 6 + 8 + 10 + 10 + 7 + 8 + 9 + 11 + 2 + 5);
    }
}
