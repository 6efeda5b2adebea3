//! Command line arguments.
//!
//! Flags backed by an environment variable can also be set in a `.env` file.

use crate::config::{DEFAULT_EXCLUDED_SUBNETS, DEFAULT_LOG_CONFIG, DEFAULT_ROLE};
use crate::reconcile::{ExclusionSet, ReconcileOptions, RunMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bulk NSG associations and role grants for Azure virtual networks.
#[derive(Parser, Debug)]
#[command(name = "azure-nsg-reconcile")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// log4rs YAML configuration
    #[arg(
        long,
        global = true,
        env = "NSG_RECONCILE_LOG_CONFIG",
        default_value = DEFAULT_LOG_CONFIG
    )]
    pub log_config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Associate every subnet with its region's NSG
    #[command(name = "nsg")]
    Nsg(NsgArgs),

    /// Grant a role on every virtual network of the selected regions
    #[command(name = "role")]
    Role(RoleArgs),

    /// Record the live subscription to a snapshot file
    #[command(name = "snapshot")]
    Snapshot(SnapshotArgs),
}

/// Where to read from.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Subscription id
    #[arg(short, long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription: String,

    /// Run against a recorded snapshot instead of the live `az` CLI
    #[arg(long, env = "NSG_RECONCILE_SNAPSHOT", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

/// Flags shared by the reconciling commands.
#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Report what would change, change nothing
    #[arg(long)]
    pub what_if: bool,

    /// Apply without asking
    #[arg(short, long)]
    pub force: bool,

    /// Names never touched (comma separated or repeated)
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "NAME",
        value_delimiter = ',',
        default_values = DEFAULT_EXCLUDED_SUBNETS
    )]
    pub exclude: Vec<String>,

    /// Write per-region counters to CSV, optionally to FILE
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Time zone of the export timestamp, e.g. Europe/Amsterdam
    #[arg(long, default_value = "UTC")]
    pub timezone: String,
}

impl ApplyArgs {
    pub fn mode(&self) -> RunMode {
        RunMode::from_flags(self.what_if, self.force)
    }

    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            mode: self.mode(),
            exclusions: ExclusionSet::new(self.exclude.iter().map(|n| n.trim().to_string())),
        }
    }

    /// Explicit export path, if one was given.
    pub fn export_path(&self) -> Option<&PathBuf> {
        self.export.as_ref().and_then(Option::as_ref)
    }

    pub fn export_requested(&self) -> bool {
        self.export.is_some()
    }
}

#[derive(Args, Debug, Clone)]
pub struct NsgArgs {
    #[command(flatten)]
    pub apply: ApplyArgs,

    /// JSON file mapping regions to NSGs
    #[arg(short, long, env = "NSG_POLICY_FILE", value_name = "FILE")]
    pub policy: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RoleArgs {
    #[command(flatten)]
    pub apply: ApplyArgs,

    /// Principal object id or name
    #[arg(short, long)]
    pub assignee: String,

    /// Role definition name
    #[arg(short, long, default_value = DEFAULT_ROLE)]
    pub role: String,

    /// Regions to cover; all regions when omitted
    #[arg(long = "region", value_name = "REGION")]
    pub regions: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Snapshot file; defaults to `snapshot_<subscription>_<date>.json`
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
