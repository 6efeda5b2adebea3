//! Azure subnet data model.

use super::same_resource_id;
use serde::{Deserialize, Serialize};

/// `{ "id": ... }` reference as embedded by `az` in a parent resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub id: String,
}

/// Represents an Azure subnet as returned inside `az network vnet list`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    /// Full ARM id of the subnet.
    pub id: String,
    /// Name of the subnet.
    pub name: String,
    /// Single address prefix (most subnets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    /// Multiple address prefixes (dual-stack subnets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefixes: Option<Vec<String>>,
    /// Network Security Group currently attached, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<ResourceId>,
}

impl Subnet {
    /// Id of the attached NSG.
    pub fn nsg_id(&self) -> Option<&str> {
        self.network_security_group.as_ref().map(|r| r.id.as_str())
    }

    /// True when the subnet is bound to exactly `nsg_id`.
    pub fn is_associated_with(&self, nsg_id: &str) -> bool {
        self.nsg_id()
            .map(|current| same_resource_id(current, nsg_id))
            .unwrap_or(false)
    }

    /// Address range for display, `"none"` when the subnet has no prefix.
    pub fn address_range(&self) -> String {
        match (&self.address_prefix, &self.address_prefixes) {
            (Some(prefix), _) => prefix.clone(),
            (None, Some(prefixes)) if !prefixes.is_empty() => prefixes.join(","),
            _ => "none".to_string(),
        }
    }

    /// Copy of this subnet bound to `nsg_id`.
    pub fn with_security_group(&self, nsg_id: &str) -> Subnet {
        Subnet {
            network_security_group: Some(ResourceId {
                id: nsg_id.to_string(),
            }),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(nsg: Option<&str>) -> Subnet {
        Subnet {
            id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/v/subnets/web".to_string(),
            name: "web".to_string(),
            address_prefix: Some("10.0.1.0/24".to_string()),
            address_prefixes: None,
            network_security_group: nsg.map(|id| ResourceId { id: id.to_string() }),
        }
    }

    #[test]
    fn test_is_associated_ignores_case() {
        let s = subnet(Some("/subscriptions/S/resourceGroups/RG/providers/Microsoft.Network/networkSecurityGroups/NSG-A"));
        assert!(s.is_associated_with(
            "/subscriptions/s/resourcegroups/rg/providers/microsoft.network/networksecuritygroups/nsg-a"
        ));
        assert!(!s.is_associated_with(
            "/subscriptions/s/resourcegroups/rg/providers/microsoft.network/networksecuritygroups/nsg-b"
        ));
    }

    #[test]
    fn test_unassociated_subnet() {
        let s = subnet(None);
        assert_eq!(s.nsg_id(), None);
        assert!(!s.is_associated_with("anything"));
    }

    #[test]
    fn test_with_security_group_keeps_other_fields() {
        let s = subnet(None).with_security_group("nsg-id");
        assert_eq!(s.nsg_id(), Some("nsg-id"));
        assert_eq!(s.name, "web");
        assert_eq!(s.address_range(), "10.0.1.0/24");
    }

    #[test]
    fn test_address_range_fallbacks() {
        let mut s = subnet(None);
        s.address_prefix = None;
        assert_eq!(s.address_range(), "none");
        s.address_prefixes = Some(vec!["10.0.2.0/24".to_string(), "fd00::/64".to_string()]);
        assert_eq!(s.address_range(), "10.0.2.0/24,fd00::/64");
    }
}
