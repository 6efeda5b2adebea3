//! Constants and the region policy file.

use crate::error::Error;
use crate::models::{normalize_region, ResourceRef};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Executable used for all provider calls.
pub const AZ_BINARY: &str = "az";

/// Largest accepted `az` stdout; `vnet list` on big subscriptions runs to megabytes.
pub const MAX_RESPONSE_BYTES: usize = 32 * 1024 * 1024;

/// Default log4rs configuration file.
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

/// Role granted by `role` when none is given.
pub const DEFAULT_ROLE: &str = "Network Contributor";

/// Subnets Azure reserves for platform services; they never get an NSG from us.
pub const DEFAULT_EXCLUDED_SUBNETS: [&str; 5] = [
    "GatewaySubnet",
    "AzureFirewallSubnet",
    "AzureFirewallManagementSubnet",
    "AzureBastionSubnet",
    "RouteServerSubnet",
];

/// Parse an IANA timezone name used for export timestamps.
pub fn parse_timezone(name: &str) -> Result<chrono_tz::Tz, Error> {
    name.parse::<chrono_tz::Tz>()
        .map_err(|_| Error::Argument(format!("unknown timezone '{name}'")))
}

/// One region and the NSG every subnet in it should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPolicy {
    /// Region as written in the policy file, used for display and reporting.
    pub region: String,
    pub target: ResourceRef,
}

#[derive(Deserialize, Debug)]
struct PolicyFile {
    #[serde(deserialize_with = "region_entries")]
    regions: Vec<(String, ResourceRef)>,
}

/// Keep every `regions` entry in file order, repeated keys included, so
/// duplicates reach the validation in [`Policy::from_regions`].
fn region_entries<'de, D>(deserializer: D) -> Result<Vec<(String, ResourceRef)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, ResourceRef)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of region names to NSG references")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

/// Region to NSG mapping, one target per region.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    regions: Vec<RegionPolicy>,
}

impl Policy {
    /// Read and validate a JSON policy file.
    pub fn load(path: &Path) -> Result<Policy, Error> {
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| Error::Policy {
            path: display.clone(),
            message: e.to_string(),
        })?;
        log::info!("Reading policy file: {display}");
        Policy::from_json(&json, &display)
    }

    /// Parse policy JSON; `source` names the input in error messages.
    pub fn from_json(json: &str, source: &str) -> Result<Policy, Error> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let file: PolicyFile =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::Policy {
                path: source.to_string(),
                message: format!("path={} error={}", e.path(), e.inner()),
            })?;
        Policy::from_regions(file.regions, source)
    }

    /// Build a policy from (region, target) pairs.
    pub fn from_regions<I>(regions: I, source: &str) -> Result<Policy, Error>
    where
        I: IntoIterator<Item = (String, ResourceRef)>,
    {
        let invalid = |message: String| Error::Policy {
            path: source.to_string(),
            message,
        };
        let mut seen: BTreeMap<String, String> = BTreeMap::new();
        let mut policy = Policy::default();

        for (region, target) in regions {
            let key = normalize_region(&region);
            if key.is_empty() {
                return Err(invalid("empty region name".to_string()));
            }
            if let Some(first) = seen.insert(key, region.clone()) {
                return Err(invalid(format!(
                    "region '{region}' is declared twice (also as '{first}')"
                )));
            }
            if target.lookup_name().is_none() {
                return Err(invalid(format!(
                    "region '{region}' needs a target name or id"
                )));
            }
            policy.regions.push(RegionPolicy { region, target });
        }

        if policy.regions.is_empty() {
            return Err(invalid("no regions declared".to_string()));
        }
        policy
            .regions
            .sort_by_key(|p| normalize_region(&p.region));
        Ok(policy)
    }

    /// Policy entry for a region, compared after normalisation.
    pub fn target_for(&self, region: &str) -> Option<&RegionPolicy> {
        let key = normalize_region(region);
        self.regions
            .iter()
            .find(|p| normalize_region(&p.region) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionPolicy> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
