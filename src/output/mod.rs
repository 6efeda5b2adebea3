//! Output of run results.
//!
//! This module handles what a run shows and writes:
//! - [`csv`] - CSV export of per-region counters
//! - [`terminal`] - Terminal output with colors

mod csv;
mod terminal;

pub use self::csv::{default_export_path, export_report, should_export, write_report};
pub use terminal::{
    format_field, print_banner, print_error, print_journal, print_progress, print_summary,
};
