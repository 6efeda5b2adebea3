//! Reconciliation of subnets (NSG associations) and networks (role grants).
//!
//! This module contains the run logic:
//! - [`confirm`] - Per-change confirmation prompt
//! - [`decision`] - Per-item decision and apply step, [`RunMode`]
//! - [`resolve`] - Target NSG resolution chain
//! - [`grant`] - Role grant reconciliation

mod confirm;
mod decision;
mod grant;
mod resolve;

pub use confirm::{AutoConfirm, Confirmation, Confirmer, ConsolePrompt, PendingChange};
pub use decision::{decide, decide_item, execute, Decision, ExclusionSet, RunMode};
pub use grant::{reconcile_role_grants, GrantRequest};
pub use resolve::{resolve, resolve_region, Lookup, Resolution, Strategy, STRATEGIES};

use crate::azure::NetworkProvider;
use crate::config::Policy;
use crate::error::{Error, TargetFailure};
use crate::models::{networks_by_region, normalize_region, Account, Outcome, RunStatistics};
use colored::Colorize;
use std::collections::BTreeMap;

/// Settings shared by both reconcilers.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub mode: RunMode,
    pub exclusions: ExclusionSet,
}

/// What a region was reconciled against, for the report and the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTarget {
    pub name: String,
    pub id: String,
}

/// One reconciled item and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub region: String,
    pub network: String,
    /// Subnet name; `None` when the network itself is the item.
    pub subnet: Option<String>,
    pub outcome: Outcome,
}

impl ItemRecord {
    /// `vnet/subnet` or just `vnet`.
    pub fn item(&self) -> String {
        match &self.subnet {
            Some(subnet) => format!("{}/{}", self.network, subnet),
            None => self.network.clone(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Short name of the operation, e.g. `NSG association`.
    pub title: String,
    /// Mode at the end of the run (an interactive run may end forced).
    pub mode: RunMode,
    /// True when the run started in preview mode.
    pub preview: bool,
    pub statistics: RunStatistics,
    pub records: Vec<ItemRecord>,
    pub targets: BTreeMap<String, RegionTarget>,
    /// Regions skipped because their target could not be resolved.
    pub unresolved: Vec<String>,
}

impl RunReport {
    pub fn new(title: &str, mode: RunMode) -> Self {
        RunReport {
            title: title.to_string(),
            mode,
            preview: mode == RunMode::Preview,
            statistics: RunStatistics::new(),
            records: Vec::new(),
            targets: BTreeMap::new(),
            unresolved: Vec::new(),
        }
    }

    /// True when at least one item needed a change.
    pub fn has_processed(&self) -> bool {
        self.statistics.totals().processed > 0
    }

    fn push(&mut self, record: ItemRecord) {
        crate::output::print_progress(&record);
        self.records.push(record);
    }
}

/// Check the session and switch to `subscription_id`.
pub fn connect(provider: &mut dyn NetworkProvider, subscription_id: &str) -> Result<Account, Error> {
    let session = provider.current_account().map_err(Error::Connectivity)?;
    if let Some(user) = &session.user {
        log::info!("Signed in as {} ({})", user.name.bold(), user.kind);
    }

    let subscription_error = |source| Error::Subscription {
        id: subscription_id.to_string(),
        source,
    };
    let subscription = provider
        .get_subscription(subscription_id)
        .map_err(subscription_error)?;
    if !subscription.is_enabled() {
        return Err(subscription_error(crate::error::AzureError::Rejected(
            format!(
                "subscription state is {}",
                subscription.state.as_deref().unwrap_or("unknown")
            ),
        )));
    }
    provider
        .set_subscription(subscription_id)
        .map_err(subscription_error)?;
    log::info!(
        "Using subscription '{}' ({})",
        subscription.name.bold(),
        subscription.id
    );
    Ok(subscription)
}

/// Resolve every declared target; any miss fails the whole run.
pub fn validate_targets(
    provider: &dyn NetworkProvider,
    policy: &Policy,
    subscription_id: &str,
) -> Result<BTreeMap<String, RegionTarget>, Error> {
    let mut targets = BTreeMap::new();
    let mut failures = Vec::new();

    for entry in policy.iter() {
        match resolve_region(provider, policy, &entry.region, subscription_id) {
            Resolution::Resolved(nsg) => {
                if !nsg.location.is_empty()
                    && normalize_region(&nsg.location) != normalize_region(&entry.region)
                {
                    log::warn!(
                        "{} region '{}': target {} is in {}, Azure will refuse to attach it",
                        "MISMATCH".on_yellow(),
                        entry.region,
                        nsg.name,
                        nsg.location
                    );
                }
                log::info!(
                    "{} region '{}' -> {} ({})",
                    "VALID".green(),
                    entry.region,
                    nsg.name,
                    nsg.resource_group
                );
                targets.insert(
                    entry.region.clone(),
                    RegionTarget {
                        name: nsg.name,
                        id: nsg.id,
                    },
                );
            }
            Resolution::Unmapped | Resolution::NotFound => {
                log::error!(
                    "{} region '{}': target {} not found",
                    "INVALID".on_red(),
                    entry.region,
                    entry.target
                );
                failures.push(TargetFailure {
                    region: entry.region.clone(),
                    target: entry.target.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(targets)
    } else {
        Err(Error::TargetValidation(failures))
    }
}

/// Bring every subnet in every policy region onto its region's NSG.
///
/// Targets are resolved once up front. Before a region is processed its
/// validated target is fetched again by id, a single lookup; when that misses
/// the target vanished during the run and the region is skipped.
pub fn reconcile_security_groups(
    provider: &mut dyn NetworkProvider,
    policy: &Policy,
    options: &ReconcileOptions,
    confirmer: &mut dyn Confirmer,
    subscription: &Account,
) -> Result<RunReport, Error> {
    let mut report = RunReport::new("NSG association", options.mode);
    let validated = validate_targets(&*provider, policy, &subscription.id)?;

    let networks = provider.list_networks()?;
    let by_region = networks_by_region(&networks);
    for (region, nets) in &by_region {
        if policy.target_for(region).is_none() {
            log::debug!("Skipping {} network(s) in unmapped region {region}", nets.len());
        }
    }

    let mut mode = options.mode;
    for entry in policy.iter() {
        let region = entry.region.as_str();
        report.statistics.touch_region(region);
        let Some(nets) = by_region.get(&normalize_region(region)) else {
            log::info!("No virtual networks in region '{region}'");
            continue;
        };

        let current = match validated.get(region) {
            Some(known) => provider.get_resource_by_id(&known.id).unwrap_or_else(|e| {
                log::debug!("re-check of {} failed: {e}", known.id);
                None
            }),
            None => None,
        };
        let Some(target) = current else {
            log::warn!(
                "{} region '{region}': target {} is no longer available, skipping {} network(s)",
                "UNRESOLVED".on_yellow(),
                entry.target,
                nets.len()
            );
            report.unresolved.push(region.to_string());
            continue;
        };
        log::info!(
            "Region '{}': {} network(s), target {}",
            region.bold(),
            nets.len(),
            target.name.cyan()
        );
        report.targets.insert(
            region.to_string(),
            RegionTarget {
                name: target.name.clone(),
                id: target.id.clone(),
            },
        );

        for network in nets {
            report.statistics.record_network(region);
            for subnet in &network.subnets {
                let outcome = match decide(subnet, &options.exclusions, &target) {
                    Decision::Excluded => Outcome::Excluded,
                    Decision::AlreadyConformant => Outcome::AlreadyConformant,
                    Decision::NeedsChange { replacing } => {
                        let item = format!("{}/{}", network.name, subnet.name);
                        log::debug!("{item} [{}] needs {}", subnet.address_range(), target.name);
                        if let Some(current) = &replacing {
                            log::info!(
                                "{} has {}, will be replaced",
                                item,
                                current.rsplit('/').next().unwrap_or(current)
                            );
                        }
                        let change = PendingChange {
                            item: &item,
                            current: replacing.as_deref(),
                            target: &target.name,
                        };
                        let (outcome, next) = execute(mode, confirmer, &change, || {
                            provider
                                .set_subnet_security_group(network, subnet, &target)
                                .map(|_| ())
                        });
                        mode = next;
                        outcome
                    }
                };
                report.statistics.record_subnet(region, &outcome);
                report.push(ItemRecord {
                    region: region.to_string(),
                    network: network.name.clone(),
                    subnet: Some(subnet.name.clone()),
                    outcome,
                });
            }
        }
    }

    report.mode = mode;
    Ok(report)
}
