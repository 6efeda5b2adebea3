//! Offline snapshots of a subscription.
//!
//! A [`Snapshot`] is recorded from the live provider and saved as JSON. Loaded
//! back as a [`SnapshotProvider`] it answers the same calls in memory, so a
//! policy can be rehearsed without touching Azure. Mutations only change the
//! in-memory copy and are journaled.

use super::NetworkProvider;
use crate::error::{AzureError, Error};
use crate::models::{
    same_resource_id, Account, Network, RoleAssignment, SecurityGroup, Subnet,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recorded provider state.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Signed-in account; `None` behaves like a missing `az login`.
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default)]
    pub subscriptions: Vec<Account>,
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroup>,
    #[serde(default)]
    pub role_assignments: Vec<RoleAssignment>,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

impl Snapshot {
    /// Record the state of `subscription_id` from a provider.
    pub fn record(
        provider: &mut dyn NetworkProvider,
        subscription_id: &str,
        recorded_at: &str,
    ) -> Result<Snapshot, Error> {
        let account = provider.current_account().map_err(Error::Connectivity)?;
        let subscription =
            provider
                .get_subscription(subscription_id)
                .map_err(|source| Error::Subscription {
                    id: subscription_id.to_string(),
                    source,
                })?;
        provider
            .set_subscription(subscription_id)
            .map_err(|source| Error::Subscription {
                id: subscription_id.to_string(),
                source,
            })?;

        let networks = provider.list_networks()?;
        let security_groups = provider.list_security_groups()?;
        log::info!(
            "Recorded {} networks and {} NSGs from subscription '{}'",
            networks.len(),
            security_groups.len(),
            subscription.name
        );

        Ok(Snapshot {
            account: Some(account),
            subscriptions: vec![subscription],
            networks,
            security_groups,
            role_assignments: Vec::new(),
            recorded_at: Some(recorded_at.to_string()),
        })
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Snapshot, Error> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(Error::Snapshot {
                path: display,
                message: "file does not exist".to_string(),
            });
        }
        log::info!("Using snapshot file: {display}");
        let json = std::fs::read_to_string(path).map_err(|e| Error::Snapshot {
            path: display.clone(),
            message: e.to_string(),
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&json);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::Snapshot {
            path: display,
            message: format!("path={} error={}", e.path(), e.inner()),
        })
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let display = path.display().to_string();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Snapshot {
            path: display.clone(),
            message: format!("Error serializing JSON: {e}"),
        })?;
        log::warn!("Writing snapshot file: {display}");
        std::fs::write(path, json).map_err(|e| Error::Snapshot {
            path: display,
            message: e.to_string(),
        })
    }
}

/// Default snapshot file name, e.g. `snapshot_<sub>_2024-05-01.json`.
pub fn default_snapshot_path(subscription_id: &str, date: &str) -> PathBuf {
    PathBuf::from(format!("snapshot_{subscription_id}_{date}.json"))
}

/// In-memory [`NetworkProvider`] over a [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotProvider {
    snapshot: Snapshot,
    active_subscription: Option<String>,
    journal: Vec<String>,
}

impl SnapshotProvider {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotProvider {
            snapshot,
            active_subscription: None,
            journal: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        Ok(SnapshotProvider::new(Snapshot::load(path)?))
    }

    /// Mutations applied so far, in order.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    /// Current in-memory state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn find_subscription(&self, subscription_id: &str) -> Option<&Account> {
        self.snapshot
            .subscriptions
            .iter()
            .chain(self.snapshot.account.iter())
            .find(|a| a.id.eq_ignore_ascii_case(subscription_id))
    }
}

impl NetworkProvider for SnapshotProvider {
    fn current_account(&self) -> Result<Account, AzureError> {
        self.snapshot.account.clone().ok_or_else(|| {
            AzureError::Rejected("Please run 'az login' to setup account.".to_string())
        })
    }

    fn get_subscription(&self, subscription_id: &str) -> Result<Account, AzureError> {
        self.find_subscription(subscription_id)
            .cloned()
            .ok_or_else(|| {
                AzureError::Rejected(format!(
                    "Subscription '{subscription_id}' not found. Check the spelling and casing and try again."
                ))
            })
    }

    fn set_subscription(&mut self, subscription_id: &str) -> Result<(), AzureError> {
        let id = self.get_subscription(subscription_id)?.id;
        self.active_subscription = Some(id);
        Ok(())
    }

    fn list_networks(&self) -> Result<Vec<Network>, AzureError> {
        Ok(self.snapshot.networks.clone())
    }

    fn get_security_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<SecurityGroup>, AzureError> {
        Ok(self
            .snapshot
            .security_groups
            .iter()
            .find(|n| {
                n.resource_group.eq_ignore_ascii_case(resource_group)
                    && n.name.eq_ignore_ascii_case(name)
            })
            .cloned())
    }

    fn get_resource_by_id(&self, id: &str) -> Result<Option<SecurityGroup>, AzureError> {
        Ok(self
            .snapshot
            .security_groups
            .iter()
            .find(|n| same_resource_id(&n.id, id))
            .cloned())
    }

    fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, AzureError> {
        Ok(self.snapshot.security_groups.clone())
    }

    fn set_subnet_security_group(
        &mut self,
        network: &Network,
        subnet: &Subnet,
        nsg: &SecurityGroup,
    ) -> Result<Subnet, AzureError> {
        let stored_nsg = self
            .get_resource_by_id(&nsg.id)?
            .ok_or_else(|| AzureError::Rejected(format!("NSG {} not found", nsg.id)))?;
        let vnet = self
            .snapshot
            .networks
            .iter_mut()
            .find(|n| same_resource_id(&n.id, &network.id))
            .ok_or_else(|| {
                AzureError::Rejected(format!("virtual network {} not found", network.name))
            })?;
        if !stored_nsg.location.is_empty()
            && !stored_nsg.location.eq_ignore_ascii_case(&vnet.location)
        {
            return Err(AzureError::Rejected(format!(
                "NSG '{}' in {} cannot be attached to subnet '{}' in {}",
                stored_nsg.name, stored_nsg.location, subnet.name, vnet.location
            )));
        }

        let updated = subnet.with_security_group(&stored_nsg.id);
        if !vnet.replace_subnet(updated.clone()) {
            return Err(AzureError::Rejected(format!(
                "subnet '{}' not found in {}",
                subnet.name, vnet.name
            )));
        }
        self.journal.push(format!(
            "subnet {}/{} -> nsg {}",
            vnet.name, subnet.name, stored_nsg.name
        ));
        Ok(updated)
    }

    fn list_role_assignments(
        &self,
        scope: &str,
        principal: &str,
        role: &str,
    ) -> Result<Vec<RoleAssignment>, AzureError> {
        Ok(self
            .snapshot
            .role_assignments
            .iter()
            .filter(|ra| ra.grants(scope, principal, role))
            .cloned()
            .collect())
    }

    fn create_role_assignment(
        &mut self,
        scope: &str,
        principal: &str,
        role: &str,
    ) -> Result<RoleAssignment, AzureError> {
        if !self
            .snapshot
            .networks
            .iter()
            .any(|n| same_resource_id(&n.id, scope))
        {
            return Err(AzureError::Rejected(format!("scope {scope} not found")));
        }
        let assignment = RoleAssignment {
            id: Some(format!(
                "{scope}/providers/Microsoft.Authorization/roleAssignments/{}",
                self.snapshot.role_assignments.len() + 1
            )),
            principal_id: principal.to_string(),
            principal_name: None,
            role_definition_name: role.to_string(),
            role_definition_id: None,
            scope: scope.to_string(),
        };
        self.snapshot.role_assignments.push(assignment.clone());
        self.journal
            .push(format!("role '{role}' -> {principal} at {scope}"));
        Ok(assignment)
    }
}
