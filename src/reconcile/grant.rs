//! Role grant reconciliation: one role for one principal on every virtual
//! network of the selected regions.

use super::{decide_item, execute, Confirmer, Decision, ItemRecord, PendingChange};
use super::{ReconcileOptions, RegionTarget, RunReport};
use crate::azure::NetworkProvider;
use crate::error::Error;
use crate::models::{normalize_region, Network, Outcome};
use colored::Colorize;
use itertools::Itertools;

/// Who gets which role, and where.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    /// Object id or principal name passed to `--assignee`.
    pub principal: String,
    pub role: String,
    /// Regions to cover; empty means every region.
    pub regions: Vec<String>,
}

impl GrantRequest {
    fn covers(&self, network: &Network) -> bool {
        self.regions.is_empty()
            || self
                .regions
                .iter()
                .any(|r| normalize_region(r) == network.region())
    }
}

/// Grant `request.role` to `request.principal` on every selected network.
pub fn reconcile_role_grants(
    provider: &mut dyn NetworkProvider,
    request: &GrantRequest,
    options: &ReconcileOptions,
    confirmer: &mut dyn Confirmer,
) -> Result<RunReport, Error> {
    if request.principal.trim().is_empty() {
        return Err(Error::Argument("assignee must not be empty".to_string()));
    }
    if request.role.trim().is_empty() {
        return Err(Error::Argument("role must not be empty".to_string()));
    }

    let mut report = RunReport::new("Role assignment", options.mode);
    let networks: Vec<Network> = provider
        .list_networks()?
        .into_iter()
        .filter(|n| request.covers(n))
        .sorted_by_key(|n| (n.region(), n.name.clone()))
        .collect();
    log::info!(
        "Granting '{}' to {} on {} network(s)",
        request.role.bold(),
        request.principal.bold(),
        networks.len()
    );

    let mut mode = options.mode;
    for network in &networks {
        let region = network.location.as_str();
        report.statistics.record_network(region);
        report
            .targets
            .entry(region.to_string())
            .or_insert_with(|| RegionTarget {
                name: request.role.clone(),
                id: request.principal.clone(),
            });

        let outcome = if options.exclusions.contains(&network.name) {
            Outcome::Excluded
        } else {
            match provider.list_role_assignments(&network.id, &request.principal, &request.role) {
                Err(e) => {
                    log::error!(
                        "{} listing role assignments on {}: {}",
                        "FAILED".on_red(),
                        network.name,
                        e
                    );
                    Outcome::Failed(e.to_string())
                }
                Ok(existing) => {
                    let conformant = existing
                        .iter()
                        .any(|ra| ra.grants(&network.id, &request.principal, &request.role));
                    match decide_item(&network.name, &options.exclusions, conformant, None) {
                        Decision::Excluded => Outcome::Excluded,
                        Decision::AlreadyConformant => Outcome::AlreadyConformant,
                        Decision::NeedsChange { .. } => {
                            let change = PendingChange {
                                item: &network.name,
                                current: None,
                                target: &request.role,
                            };
                            let (outcome, next) = execute(mode, confirmer, &change, || {
                                provider
                                    .create_role_assignment(
                                        &network.id,
                                        &request.principal,
                                        &request.role,
                                    )
                                    .map(|_| ())
                            });
                            mode = next;
                            outcome
                        }
                    }
                }
            }
        };

        report.statistics.record_outcome(region, &outcome);
        report.push(ItemRecord {
            region: region.to_string(),
            network: network.name.clone(),
            subnet: None,
            outcome,
        });
    }

    report.mode = mode;
    Ok(report)
}
