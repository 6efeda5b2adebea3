//! Provider resources other than networks: NSGs, role assignments, accounts,
//! and the declared reference used to find an NSG.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ARM type of a Network Security Group.
pub const NSG_RESOURCE_TYPE: &str = "Microsoft.Network/networkSecurityGroups";

/// Normalise a region so `East US`, `eastus` and `EASTUS` compare equal.
pub fn normalize_region(region: &str) -> String {
    region
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// ARM ids are case-insensitive.
pub fn same_resource_id(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}

/// Declared reference to an NSG, as written in the policy file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ResourceRef {
    /// Reference by resource group and name.
    pub fn named(resource_group: &str, name: &str) -> Self {
        ResourceRef {
            name: Some(name.to_string()),
            resource_group: Some(resource_group.to_string()),
            id: None,
        }
    }

    /// Reference by full ARM id.
    pub fn by_id(id: &str) -> Self {
        ResourceRef {
            name: None,
            resource_group: None,
            id: Some(id.to_string()),
        }
    }

    /// Name to search for, falling back to the last segment of the id.
    pub fn lookup_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.id.as_deref().and_then(|id| id.rsplit('/').next()))
            .filter(|n| !n.is_empty())
    }

    /// Explicit id, or one composed from subscription, resource group and name.
    pub fn global_id(&self, subscription_id: &str) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        match (&self.resource_group, &self.name) {
            (Some(rg), Some(name)) => Some(format!(
                "/subscriptions/{subscription_id}/resourceGroups/{rg}/providers/{NSG_RESOURCE_TYPE}/{name}"
            )),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.resource_group, &self.name, &self.id) {
            (Some(rg), Some(name), _) => write!(f, "'{rg}/{name}'"),
            (None, Some(name), _) => write!(f, "'{name}'"),
            (_, None, Some(id)) => write!(f, "'{id}'"),
            _ => write!(f, "'<empty>'"),
        }
    }
}

/// A resolved Network Security Group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub resource_group: String,
    /// ARM type; only present on generic `az resource show` output.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl SecurityGroup {
    /// False only when the resource declares a type that is not an NSG.
    pub fn is_security_group(&self) -> bool {
        self.kind
            .as_deref()
            .map(|k| k.eq_ignore_ascii_case(NSG_RESOURCE_TYPE))
            .unwrap_or(true)
    }
}

/// A role assignment as listed or created by `az role assignment`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    #[serde(default)]
    pub id: Option<String>,
    pub principal_id: String,
    /// UPN or display name; `az` fills it when listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    /// Filled by `az role assignment list` only; `create` returns the id instead.
    #[serde(default)]
    pub role_definition_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_definition_id: Option<String>,
    pub scope: String,
}

impl RoleAssignment {
    /// True when this assignment grants `role` to `principal` at exactly `scope`.
    ///
    /// `principal` may be the object id or the principal name.
    pub fn grants(&self, scope: &str, principal: &str, role: &str) -> bool {
        let principal_matches = self.principal_id.eq_ignore_ascii_case(principal)
            || self
                .principal_name
                .as_deref()
                .map(|n| n.eq_ignore_ascii_case(principal))
                .unwrap_or(false);
        same_resource_id(&self.scope, scope)
            && principal_matches
            && self.role_definition_name.eq_ignore_ascii_case(role)
    }
}

/// Signed-in user from `az account show`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountUser {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Subscription context from `az account show`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Subscription id.
    pub id: String,
    /// Subscription display name.
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user: Option<AccountUser>,
}

impl Account {
    /// Disabled or warned subscriptions cannot be written to.
    pub fn is_enabled(&self) -> bool {
        self.state
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("Enabled"))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_region() {
        assert_eq!(normalize_region("East US"), "eastus");
        assert_eq!(normalize_region(" West Europe "), "westeurope");
        assert_eq!(normalize_region("eastus2"), "eastus2");
    }

    #[test]
    fn test_same_resource_id() {
        assert!(same_resource_id("/subscriptions/A/x", "/subscriptions/a/X/"));
        assert!(!same_resource_id("/subscriptions/a/x", "/subscriptions/a/y"));
    }

    #[test]
    fn test_global_id_composed_from_name() {
        let r = ResourceRef::named("rg-sec", "nsg-east");
        assert_eq!(
            r.global_id("sub-1").as_deref(),
            Some("/subscriptions/sub-1/resourceGroups/rg-sec/providers/Microsoft.Network/networkSecurityGroups/nsg-east")
        );
        assert_eq!(ResourceRef { name: Some("x".into()), ..Default::default() }.global_id("s"), None);
    }

    #[test]
    fn test_lookup_name_from_id() {
        let r = ResourceRef::by_id("/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkSecurityGroups/nsg-west");
        assert_eq!(r.lookup_name(), Some("nsg-west"));
        assert_eq!(ResourceRef::default().lookup_name(), None);
    }

    #[test]
    fn test_role_assignment_grants() {
        let ra = RoleAssignment {
            id: None,
            principal_id: "ABC".to_string(),
            principal_name: Some("ops@contoso.com".to_string()),
            role_definition_name: "Network Contributor".to_string(),
            role_definition_id: None,
            scope: "/subscriptions/s/resourceGroups/rg".to_string(),
        };
        assert!(ra.grants("/subscriptions/S/resourceGroups/RG", "abc", "network contributor"));
        assert!(ra.grants("/subscriptions/s/resourceGroups/rg", "OPS@contoso.com", "Network Contributor"));
        assert!(!ra.grants("/subscriptions/s/resourceGroups/rg", "abc", "Reader"));
    }

    #[test]
    fn test_account_state() {
        let json = r#"{"id":"s","name":"prod","state":"Disabled","tenantId":"t","user":{"name":"me@x","type":"user"}}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert!(!account.is_enabled());
        assert_eq!(account.user.unwrap().name, "me@x");
    }
}
