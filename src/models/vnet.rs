//! Azure Virtual Network (VNet) data model.

use super::{normalize_region, Subnet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// `addressSpace` block of a VNet.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

/// Represents an Azure Virtual Network with its subnets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Full ARM id of the virtual network.
    pub id: String,
    /// Name of the virtual network.
    pub name: String,
    /// Azure region location, e.g. `eastus`.
    pub location: String,
    /// Resource group holding the network.
    pub resource_group: String,
    /// CIDR blocks of the virtual network.
    #[serde(default)]
    pub address_space: AddressSpace,
    /// Subnets in provider order.
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

impl Network {
    /// Replace the subnet with the same name as `subnet` by `subnet`.
    ///
    /// Returns false when no subnet of that name exists.
    pub fn replace_subnet(&mut self, subnet: Subnet) -> bool {
        match self.subnets.iter_mut().find(|s| s.name == subnet.name) {
            Some(slot) => {
                *slot = subnet;
                true
            }
            None => false,
        }
    }

    /// Normalised region key.
    pub fn region(&self) -> String {
        normalize_region(&self.location)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} subnets, {})",
            self.name,
            self.address_space.address_prefixes.join(", "),
            self.subnets.len(),
            self.location
        )
    }
}

/// Group networks by normalised region, keeping discovery order inside a group.
pub fn networks_by_region(networks: &[Network]) -> HashMap<String, Vec<&Network>> {
    networks.iter().into_group_map_by(|n| n.region())
}
