//! What to do with one item, and doing it.

use super::confirm::{Confirmation, Confirmer, PendingChange};
use crate::error::AzureError;
use crate::models::{Outcome, SecurityGroup, Subnet};
use colored::Colorize;

/// How changes are carried out for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Ask before every change.
    Interactive,
    /// Apply without asking.
    Forced,
    /// Report changes, apply nothing.
    Preview,
}

impl RunMode {
    /// Preview wins over force.
    pub fn from_flags(what_if: bool, force: bool) -> Self {
        match (what_if, force) {
            (true, _) => RunMode::Preview,
            (false, true) => RunMode::Forced,
            (false, false) => RunMode::Interactive,
        }
    }
}

/// Names never touched, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExclusionSet {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Result of comparing an item with its desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Excluded,
    AlreadyConformant,
    /// `replacing` holds the association being overwritten, if any.
    NeedsChange { replacing: Option<String> },
}

/// Decide for any named item given whether it already conforms.
pub fn decide_item(
    name: &str,
    exclusions: &ExclusionSet,
    conformant: bool,
    current: Option<&str>,
) -> Decision {
    if exclusions.contains(name) {
        Decision::Excluded
    } else if conformant {
        Decision::AlreadyConformant
    } else {
        Decision::NeedsChange {
            replacing: current.map(str::to_string),
        }
    }
}

/// Decide for a subnet against the region's target NSG.
pub fn decide(subnet: &Subnet, exclusions: &ExclusionSet, target: &SecurityGroup) -> Decision {
    decide_item(
        &subnet.name,
        exclusions,
        subnet.is_associated_with(&target.id),
        subnet.nsg_id(),
    )
}

/// Confirm (when interactive) and apply one change.
///
/// Returns the outcome and the mode to use for the next item; `AffirmAll`
/// turns an interactive run into a forced one.
pub fn execute<F>(
    mode: RunMode,
    confirmer: &mut dyn Confirmer,
    change: &PendingChange<'_>,
    apply: F,
) -> (Outcome, RunMode)
where
    F: FnOnce() -> Result<(), AzureError>,
{
    let mode = match mode {
        RunMode::Interactive => match confirmer.confirm(change) {
            Confirmation::Affirm => RunMode::Interactive,
            Confirmation::AffirmAll => {
                log::info!("Yes to All: applying remaining changes without asking");
                RunMode::Forced
            }
            Confirmation::Decline => {
                log::info!("{} {}", "SKIP".yellow(), change.item);
                return (Outcome::UserSkipped, RunMode::Interactive);
            }
        },
        other => other,
    };

    if mode == RunMode::Preview {
        log::info!(
            "{} would set {} -> {}",
            "WHAT-IF".cyan(),
            change.item,
            change.target
        );
        return (Outcome::Simulated, mode);
    }

    match apply() {
        Ok(()) => {
            log::info!("{} {} -> {}", "OK".green(), change.item, change.target);
            (Outcome::Applied, mode)
        }
        Err(e) => {
            log::error!("{} {}: {}", "FAILED".on_red(), change.item, e);
            (Outcome::Failed(e.to_string()), mode)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceId;
    use std::cell::Cell;

    fn nsg(id: &str) -> SecurityGroup {
        SecurityGroup {
            id: id.to_string(),
            name: id.rsplit('/').next().unwrap_or_default().to_string(),
            location: "eastus".to_string(),
            resource_group: "rg".to_string(),
            kind: None,
        }
    }

    fn subnet(name: &str, nsg_id: Option<&str>) -> Subnet {
        Subnet {
            id: format!("/v/subnets/{name}"),
            name: name.to_string(),
            address_prefix: Some("10.0.0.0/24".to_string()),
            address_prefixes: None,
            network_security_group: nsg_id.map(|id| ResourceId { id: id.to_string() }),
        }
    }

    struct Scripted(Vec<Confirmation>);

    impl Confirmer for Scripted {
        fn confirm(&mut self, _change: &PendingChange<'_>) -> Confirmation {
            self.0.remove(0)
        }
    }

    const CHANGE: PendingChange<'static> = PendingChange {
        item: "v/web",
        current: None,
        target: "nsg-a",
    };

    #[test]
    fn test_run_mode_from_flags() {
        assert_eq!(RunMode::from_flags(true, true), RunMode::Preview);
        assert_eq!(RunMode::from_flags(false, true), RunMode::Forced);
        assert_eq!(RunMode::from_flags(false, false), RunMode::Interactive);
    }

    #[test]
    fn test_decide_excluded_before_conformance() {
        let exclusions = ExclusionSet::new(["GatewaySubnet"]);
        let target = nsg("/n/nsg-a");
        let s = subnet("gatewaysubnet", Some("/n/nsg-a"));
        assert_eq!(decide(&s, &exclusions, &target), Decision::Excluded);
    }

    #[test]
    fn test_decide_conformant_and_replacing() {
        let exclusions = ExclusionSet::default();
        let target = nsg("/n/nsg-a");
        assert_eq!(
            decide(&subnet("web", Some("/N/NSG-A")), &exclusions, &target),
            Decision::AlreadyConformant
        );
        assert_eq!(
            decide(&subnet("web", None), &exclusions, &target),
            Decision::NeedsChange { replacing: None }
        );
        assert_eq!(
            decide(&subnet("app", Some("/n/nsg-old")), &exclusions, &target),
            Decision::NeedsChange {
                replacing: Some("/n/nsg-old".to_string())
            }
        );
    }

    #[test]
    fn test_execute_preview_never_applies() {
        let called = Cell::new(false);
        let (outcome, mode) = execute(RunMode::Preview, &mut Scripted(vec![]), &CHANGE, || {
            called.set(true);
            Ok(())
        });
        assert_eq!(outcome, Outcome::Simulated);
        assert_eq!(mode, RunMode::Preview);
        assert!(!called.get());
    }

    #[test]
    fn test_execute_affirm_all_switches_to_forced() {
        let mut confirmer = Scripted(vec![Confirmation::AffirmAll]);
        let (outcome, mode) = execute(RunMode::Interactive, &mut confirmer, &CHANGE, || Ok(()));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(mode, RunMode::Forced);
        // forced runs never ask again
        let (outcome, mode) = execute(mode, &mut confirmer, &CHANGE, || Ok(()));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(mode, RunMode::Forced);
    }

    #[test]
    fn test_execute_decline_skips() {
        let called = Cell::new(false);
        let mut confirmer = Scripted(vec![Confirmation::Decline]);
        let (outcome, mode) = execute(RunMode::Interactive, &mut confirmer, &CHANGE, || {
            called.set(true);
            Ok(())
        });
        assert_eq!(outcome, Outcome::UserSkipped);
        assert_eq!(mode, RunMode::Interactive);
        assert!(!called.get());
    }

    #[test]
    fn test_execute_failure_is_an_outcome() {
        let (outcome, mode) = execute(RunMode::Forced, &mut Scripted(vec![]), &CHANGE, || {
            Err(AzureError::Rejected("denied".to_string()))
        });
        assert_eq!(outcome, Outcome::Failed("request rejected: denied".to_string()));
        assert_eq!(mode, RunMode::Forced);
    }
}
