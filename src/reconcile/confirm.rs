//! Per-change confirmation.

use colored::Colorize;
use std::io::{BufRead, Write};

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Apply this change.
    Affirm,
    /// Apply this change and every remaining one without asking.
    AffirmAll,
    /// Leave this item alone.
    Decline,
}

/// A change waiting for confirmation.
#[derive(Debug, Clone, Copy)]
pub struct PendingChange<'a> {
    /// Item being changed, e.g. `vnet/subnet`.
    pub item: &'a str,
    /// What is there now, if anything.
    pub current: Option<&'a str>,
    /// What it will become.
    pub target: &'a str,
}

/// Something that can approve or refuse a [`PendingChange`].
pub trait Confirmer {
    fn confirm(&mut self, change: &PendingChange<'_>) -> Confirmation;
}

/// Approves everything; used for forced, preview and automated runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, _change: &PendingChange<'_>) -> Confirmation {
        Confirmation::Affirm
    }
}

/// Asks on a terminal: `[Y] Yes  [A] Yes to All  [N] No`.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        ConsolePrompt::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsolePrompt { input, output }
    }

    fn ask(&mut self, change: &PendingChange<'_>) -> std::io::Result<Confirmation> {
        let current = change.current.unwrap_or("none");
        loop {
            write!(
                self.output,
                "Apply {target} to {item} (current: {current})? [Y] Yes  [A] Yes to All  [N] No (default N): ",
                item = change.item.bold(),
                target = change.target.cyan(),
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Confirmation::Decline);
            }
            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please answer Y, A or N.")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> Confirmer for ConsolePrompt<R, W> {
    fn confirm(&mut self, change: &PendingChange<'_>) -> Confirmation {
        self.ask(change).unwrap_or_else(|e| {
            log::warn!("Prompt failed, skipping {}: {}", change.item, e);
            Confirmation::Decline
        })
    }
}

fn parse_answer(line: &str) -> Option<Confirmation> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Confirmation::Affirm),
        "a" | "all" => Some(Confirmation::AffirmAll),
        "n" | "no" | "" => Some(Confirmation::Decline),
        _ => None,
    }
}
