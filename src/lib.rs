//! Azure NSG Reconcile
//!
//! Brings every subnet of a subscription onto the network security group its
//! region's policy names, and grants roles on virtual networks in bulk.
//!
//! # Modules
//!
//! - [`azure`] - Provider access: the `az` CLI and offline snapshots
//! - [`cli`] - Command line arguments
//! - [`config`] - Constants and the region policy file
//! - [`error`] - Error types
//! - [`logging`] - log4rs setup
//! - [`models`] - Data structures and run statistics
//! - [`output`] - Terminal output and CSV export
//! - [`reconcile`] - Decision, confirmation and apply loop

pub mod azure;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod reconcile;

use azure::{default_snapshot_path, AzCli, NetworkProvider, Snapshot, SnapshotProvider};
use chrono::Utc;
use chrono_tz::Tz;
use cli::{ApplyArgs, Cli, Command, NsgArgs, RoleArgs, SnapshotArgs, TargetArgs};
use config::{parse_timezone, Policy};
use error::Error;
use reconcile::{AutoConfirm, Confirmer, ConsolePrompt, GrantRequest, RunMode, RunReport};

/// Run one parsed command line.
pub fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Nsg(args) => run_nsg(&args),
        Command::Role(args) => run_role(&args),
        Command::Snapshot(args) => run_snapshot(&args),
    }
}

/// Call `f` with the snapshot provider when `--snapshot` is given, the live
/// `az` CLI otherwise.
pub fn with_provider<T, F>(target: &TargetArgs, f: F) -> Result<T, Error>
where
    F: FnOnce(&mut dyn NetworkProvider) -> Result<T, Error>,
{
    match &target.snapshot {
        Some(path) => {
            log::info!("Using snapshot {} instead of the live subscription", path.display());
            let mut provider = SnapshotProvider::load(path)?;
            let result = f(&mut provider);
            output::print_journal(provider.journal());
            result
        }
        None => f(&mut AzCli::new()),
    }
}

fn confirmer_for(mode: RunMode) -> Box<dyn Confirmer> {
    match mode {
        RunMode::Interactive => Box::new(ConsolePrompt::stdio()),
        RunMode::Forced | RunMode::Preview => Box::new(AutoConfirm),
    }
}

fn run_nsg(args: &NsgArgs) -> Result<(), Error> {
    let apply = &args.apply;
    let tz = parse_timezone(&apply.timezone)?;
    let policy = Policy::load(&args.policy)?;
    log::info!("Policy declares {} region(s)", policy.len());

    let options = apply.options();
    log::debug!("Excluded names: {:?}", options.exclusions.names());
    let report = with_provider(&apply.target, |provider| {
        let account = reconcile::connect(provider, &apply.target.subscription)?;
        output::print_banner("NSG association", &account.name, options.mode);
        let mut confirmer = confirmer_for(options.mode);
        reconcile::reconcile_security_groups(
            provider,
            &policy,
            &options,
            confirmer.as_mut(),
            &account,
        )
    })?;

    finish(&report, apply, "nsg_assignment", tz)
}

fn run_role(args: &RoleArgs) -> Result<(), Error> {
    let apply = &args.apply;
    let tz = parse_timezone(&apply.timezone)?;
    let request = GrantRequest {
        principal: args.assignee.clone(),
        role: args.role.clone(),
        regions: args.regions.clone(),
    };

    let options = apply.options();
    let report = with_provider(&apply.target, |provider| {
        let account = reconcile::connect(provider, &apply.target.subscription)?;
        output::print_banner("Role assignment", &account.name, options.mode);
        let mut confirmer = confirmer_for(options.mode);
        reconcile::reconcile_role_grants(provider, &request, &options, confirmer.as_mut())
    })?;

    finish(&report, apply, "role_assignment", tz)
}

/// Print the summary and write the export when asked for.
fn finish(report: &RunReport, apply: &ApplyArgs, prefix: &str, tz: Tz) -> Result<(), Error> {
    output::print_summary(report);

    if !output::should_export(report, apply.export_requested()) {
        if apply.export_requested() {
            log::info!("Nothing needed a change, no export written");
        }
        return Ok(());
    }
    let now = Utc::now().with_timezone(&tz);
    let path = apply
        .export_path()
        .cloned()
        .unwrap_or_else(|| output::default_export_path(prefix, &now));
    let rows = output::export_report(report, &path, &now)?;
    println!("Exported {} region(s) to {}", rows, path.display());
    Ok(())
}

fn run_snapshot(args: &SnapshotArgs) -> Result<(), Error> {
    let now = Utc::now();
    let subscription = &args.target.subscription;
    let snapshot = with_provider(&args.target, |provider| {
        Snapshot::record(provider, subscription, &now.to_rfc3339())
    })?;

    let path = args.output.clone().unwrap_or_else(|| {
        default_snapshot_path(subscription, &now.format("%Y-%m-%d").to_string())
    });
    snapshot.save(&path)?;
    println!(
        "Saved {} network(s) and {} NSG(s) to {}",
        snapshot.networks.len(),
        snapshot.security_groups.len(),
        path.display()
    );
    Ok(())
}
