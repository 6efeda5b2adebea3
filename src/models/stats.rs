//! Run statistics.
//!
//! Counters only ever increment. Every record call updates the run totals and
//! the counters of one region together, so the totals always equal the sum of
//! the region counters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Final classification of one reconciled item (a subnet, or a network for
/// role grants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Excluded,
    AlreadyConformant,
    /// User declined the change at the prompt.
    UserSkipped,
    Applied,
    /// Preview mode: change reported, nothing called.
    Simulated,
    Failed(String),
}

impl Outcome {
    /// True for items that needed a change, whatever happened next.
    pub fn needed_change(&self) -> bool {
        !matches!(self, Outcome::Excluded | Outcome::AlreadyConformant)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Excluded => "excluded",
            Outcome::AlreadyConformant => "already-conformant",
            Outcome::UserSkipped => "skipped",
            Outcome::Applied => "applied",
            Outcome::Simulated => "what-if",
            Outcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// One set of counters, used for the run totals and for each region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub vnets: usize,
    pub subnets: usize,
    /// Items that needed a change (applied, simulated, failed or declined).
    pub processed: usize,
    pub skipped: usize,
    pub excluded: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub already_conformant: usize,
}

impl Counters {
    fn count(&mut self, outcome: &Outcome) {
        if outcome.needed_change() {
            self.processed += 1;
        }
        match outcome {
            Outcome::Excluded => self.excluded += 1,
            Outcome::AlreadyConformant => self.already_conformant += 1,
            Outcome::UserSkipped => self.skipped += 1,
            Outcome::Applied | Outcome::Simulated => self.succeeded += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, rhs: Counters) {
        self.vnets += rhs.vnets;
        self.subnets += rhs.subnets;
        self.processed += rhs.processed;
        self.skipped += rhs.skipped;
        self.excluded += rhs.excluded;
        self.succeeded += rhs.succeeded;
        self.failed += rhs.failed;
        self.already_conformant += rhs.already_conformant;
    }
}

/// Totals plus per-region counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    totals: Counters,
    regions: BTreeMap<String, Counters>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a region appear in the report even if nothing is recorded for it.
    pub fn touch_region(&mut self, region: &str) {
        self.regions.entry(region.to_string()).or_default();
    }

    pub fn record_network(&mut self, region: &str) {
        self.totals.vnets += 1;
        self.regions.entry(region.to_string()).or_default().vnets += 1;
    }

    /// Record one subnet and its outcome.
    pub fn record_subnet(&mut self, region: &str, outcome: &Outcome) {
        let entry = self.regions.entry(region.to_string()).or_default();
        entry.subnets += 1;
        entry.count(outcome);
        self.totals.subnets += 1;
        self.totals.count(outcome);
    }

    /// Record an outcome for an item that is not a subnet (a role grant on a network).
    pub fn record_outcome(&mut self, region: &str, outcome: &Outcome) {
        self.regions.entry(region.to_string()).or_default().count(outcome);
        self.totals.count(outcome);
    }

    pub fn totals(&self) -> &Counters {
        &self.totals
    }

    pub fn region(&self, region: &str) -> Option<&Counters> {
        self.regions.get(region)
    }

    /// Regions in name order.
    pub fn regions(&self) -> impl Iterator<Item = (&str, &Counters)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sum of the region counters; equal to [`Self::totals`].
    pub fn sum_of_regions(&self) -> Counters {
        let mut sum = Counters::default();
        for counters in self.regions.values() {
            sum += *counters;
        }
        sum
    }
}
