//! Finding the NSG a region should use.
//!
//! Lookups are tried in order and the first hit wins: the obvious scoped
//! lookup can miss right after creation or under narrow RBAC scopes while the
//! id lookup or a subscription scan still succeed.

use crate::azure::NetworkProvider;
use crate::config::Policy;
use crate::models::{normalize_region, ResourceRef, SecurityGroup};
use itertools::Itertools;

/// Everything a strategy may use to find a target.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub reference: &'a ResourceRef,
    pub subscription_id: &'a str,
    pub region: &'a str,
}

/// One way of finding the target; a provider error counts as a miss.
pub type Strategy = fn(&dyn NetworkProvider, &Lookup<'_>) -> Option<SecurityGroup>;

/// Strategies in the order they are tried.
pub const STRATEGIES: [(&str, Strategy); 3] = [
    ("scoped", scoped_lookup as Strategy),
    ("global-id", global_id_lookup as Strategy),
    ("subscription-scan", scan_lookup as Strategy),
];

/// Outcome of resolving a region's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(SecurityGroup),
    /// The region has no policy entry.
    Unmapped,
    /// Every strategy missed.
    NotFound,
}

fn scoped_lookup(provider: &dyn NetworkProvider, lookup: &Lookup<'_>) -> Option<SecurityGroup> {
    let reference = lookup.reference;
    let (rg, name) = (reference.resource_group.as_deref()?, reference.name.as_deref()?);
    provider
        .get_security_group(rg, name)
        .map_err(|e| log::debug!("scoped lookup of {rg}/{name} failed: {e}"))
        .ok()
        .flatten()
}

fn global_id_lookup(
    provider: &dyn NetworkProvider,
    lookup: &Lookup<'_>,
) -> Option<SecurityGroup> {
    let id = lookup.reference.global_id(lookup.subscription_id)?;
    provider
        .get_resource_by_id(&id)
        .map_err(|e| log::debug!("id lookup of {id} failed: {e}"))
        .ok()
        .flatten()
        .filter(SecurityGroup::is_security_group)
}

fn scan_lookup(provider: &dyn NetworkProvider, lookup: &Lookup<'_>) -> Option<SecurityGroup> {
    let name = lookup.reference.lookup_name()?;
    let candidates: Vec<SecurityGroup> = provider
        .list_security_groups()
        .map_err(|e| log::debug!("subscription scan for {name} failed: {e}"))
        .ok()?
        .into_iter()
        .filter(|n| n.name.eq_ignore_ascii_case(name))
        .filter(|n| match &lookup.reference.resource_group {
            Some(rg) => n.resource_group.eq_ignore_ascii_case(rg),
            None => true,
        })
        .collect();

    // an NSG can only be attached to subnets in its own region
    let region = normalize_region(lookup.region);
    let found = candidates
        .iter()
        .find(|n| normalize_region(&n.location) == region)
        .cloned();
    if found.is_none() && !candidates.is_empty() {
        log::warn!(
            "{} exists only outside region {}: {}",
            name,
            lookup.region,
            candidates.iter().map(|n| n.location.as_str()).join(", ")
        );
    }
    found
}

/// Run the strategies in order and return the first hit.
pub fn resolve(provider: &dyn NetworkProvider, lookup: &Lookup<'_>) -> Option<SecurityGroup> {
    for (label, strategy) in STRATEGIES {
        if let Some(found) = strategy(provider, lookup) {
            log::debug!(
                "resolved {} for {} via {label}: {}",
                lookup.reference,
                lookup.region,
                found.id
            );
            return Some(found);
        }
        log::debug!("{label} lookup missed {}", lookup.reference);
    }
    None
}

/// Resolve the target declared for `region`.
pub fn resolve_region(
    provider: &dyn NetworkProvider,
    policy: &Policy,
    region: &str,
    subscription_id: &str,
) -> Resolution {
    let Some(entry) = policy.target_for(region) else {
        return Resolution::Unmapped;
    };
    let lookup = Lookup {
        reference: &entry.target,
        subscription_id,
        region: &entry.region,
    };
    match resolve(provider, &lookup) {
        Some(nsg) => Resolution::Resolved(nsg),
        None => Resolution::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{Snapshot, SnapshotProvider};

    const SUB: &str = "00000000-1111-2222-3333-444444444444";

    fn nsg(rg: &str, name: &str, location: &str) -> SecurityGroup {
        SecurityGroup {
            id: format!(
                "/subscriptions/{SUB}/resourceGroups/{rg}/providers/Microsoft.Network/networkSecurityGroups/{name}"
            ),
            name: name.to_string(),
            location: location.to_string(),
            resource_group: rg.to_string(),
            kind: None,
        }
    }

    fn provider(nsgs: Vec<SecurityGroup>) -> SnapshotProvider {
        SnapshotProvider::new(Snapshot {
            security_groups: nsgs,
            ..Default::default()
        })
    }

    #[test]
    fn test_scoped_hit() {
        let p = provider(vec![nsg("rg-sec", "nsg-a", "eastus")]);
        let reference = ResourceRef::named("rg-sec", "nsg-a");
        let lookup = Lookup {
            reference: &reference,
            subscription_id: SUB,
            region: "eastus",
        };
        assert_eq!(scoped_lookup(&p, &lookup).map(|n| n.name), Some("nsg-a".to_string()));
    }

    #[test]
    fn test_id_reference_skips_scoped_and_hits_global_id() {
        let target = nsg("rg-sec", "nsg-a", "eastus");
        let p = provider(vec![target.clone()]);
        let reference = ResourceRef::by_id(&target.id);
        let lookup = Lookup {
            reference: &reference,
            subscription_id: SUB,
            region: "eastus",
        };
        assert!(scoped_lookup(&p, &lookup).is_none());
        assert_eq!(resolve(&p, &lookup), Some(target));
    }

    #[test]
    fn test_scan_prefers_region() {
        let p = provider(vec![
            nsg("rg-weu", "nsg-shared", "westeurope"),
            nsg("rg-eus", "nsg-shared", "eastus"),
        ]);
        let reference = ResourceRef {
            name: Some("NSG-SHARED".to_string()),
            ..Default::default()
        };
        let lookup = Lookup {
            reference: &reference,
            subscription_id: SUB,
            region: "East US",
        };
        assert_eq!(resolve(&p, &lookup).map(|n| n.resource_group), Some("rg-eus".to_string()));
    }

    #[test]
    fn test_scan_ignores_other_regions() {
        let p = provider(vec![nsg("rg-weu", "nsg-shared", "westeurope")]);
        let reference = ResourceRef {
            name: Some("nsg-shared".to_string()),
            ..Default::default()
        };
        let lookup = Lookup {
            reference: &reference,
            subscription_id: SUB,
            region: "eastus",
        };
        assert!(scan_lookup(&p, &lookup).is_none());
        assert!(resolve(&p, &lookup).is_none());
    }

    #[test]
    fn test_resolve_region_unmapped_and_missing() {
        let p = provider(vec![nsg("rg-sec", "nsg-a", "eastus")]);
        let policy = Policy::from_regions(
            [("eastus".to_string(), ResourceRef::named("rg-sec", "nsg-gone"))],
            "test",
        )
        .expect("policy");
        assert_eq!(resolve_region(&p, &policy, "westus", SUB), Resolution::Unmapped);
        assert_eq!(resolve_region(&p, &policy, "East US", SUB), Resolution::NotFound);
    }
}
