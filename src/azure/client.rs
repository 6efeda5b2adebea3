//! [`NetworkProvider`] backed by the `az` CLI.
//!
//! Relies on an already signed-in `az login` session.

use super::cli::{self, quote};
use super::NetworkProvider;
use crate::error::AzureError;
use crate::models::{Account, Network, RoleAssignment, SecurityGroup, Subnet};

/// Live provider; every call shells out to `az`.
#[derive(Debug, Default)]
pub struct AzCli;

impl AzCli {
    pub fn new() -> Self {
        AzCli
    }
}

/// Map a not-found failure to `Ok(None)`.
fn optional<T>(result: Result<T, AzureError>) -> Result<Option<T>, AzureError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if cli::is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

impl NetworkProvider for AzCli {
    fn current_account(&self) -> Result<Account, AzureError> {
        cli::run_json("account show", "account")
    }

    fn get_subscription(&self, subscription_id: &str) -> Result<Account, AzureError> {
        cli::run_json(
            &format!("account show --subscription {}", quote(subscription_id)),
            "subscription",
        )
    }

    fn set_subscription(&mut self, subscription_id: &str) -> Result<(), AzureError> {
        cli::run(&format!("account set --subscription {}", quote(subscription_id)))?;
        Ok(())
    }

    fn list_networks(&self) -> Result<Vec<Network>, AzureError> {
        let networks: Vec<Network> = cli::run_json("network vnet list", "vnet list")?;
        log::info!("Got {} virtual networks from az network vnet list", networks.len());
        Ok(networks)
    }

    fn get_security_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<SecurityGroup>, AzureError> {
        optional(cli::run_json(
            &format!(
                "network nsg show --resource-group {} --name {}",
                quote(resource_group),
                quote(name)
            ),
            "nsg",
        ))
    }

    fn get_resource_by_id(&self, id: &str) -> Result<Option<SecurityGroup>, AzureError> {
        optional(cli::run_json(
            &format!("resource show --ids {}", quote(id)),
            "resource",
        ))
    }

    fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, AzureError> {
        cli::run_json("network nsg list", "nsg list")
    }

    fn set_subnet_security_group(
        &mut self,
        _network: &Network,
        subnet: &Subnet,
        nsg: &SecurityGroup,
    ) -> Result<Subnet, AzureError> {
        cli::run_json(
            &format!(
                "network vnet subnet update --ids {} --network-security-group {}",
                quote(&subnet.id),
                quote(&nsg.id)
            ),
            "subnet update",
        )
    }

    fn list_role_assignments(
        &self,
        scope: &str,
        principal: &str,
        role: &str,
    ) -> Result<Vec<RoleAssignment>, AzureError> {
        cli::run_json(
            &format!(
                "role assignment list --scope {} --assignee {} --role {}",
                quote(scope),
                quote(principal),
                quote(role)
            ),
            "role assignment list",
        )
    }

    fn create_role_assignment(
        &mut self,
        scope: &str,
        principal: &str,
        role: &str,
    ) -> Result<RoleAssignment, AzureError> {
        cli::run_json(
            &format!(
                "role assignment create --scope {} --assignee {} --role {}",
                quote(scope),
                quote(principal),
                quote(role)
            ),
            "role assignment",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_fixture(name: &str) -> String {
        std::fs::read_to_string(format!("src/tests/test_data/{name}"))
            .expect("Error reading test data")
    }

    #[test]
    fn test_parse_vnet_list_01() {
        let networks: Vec<Network> =
            cli::parse_json(&read_fixture("vnet_list_01.json"), "vnet list").expect("parse");
        assert_eq!(networks.len(), 2);
        let hub = &networks[0];
        assert_eq!(hub.name, "z-hub-vnet-eus");
        assert_eq!(hub.location, "eastus");
        assert_eq!(hub.resource_group, "rg-network-eus");
        assert_eq!(hub.subnets.len(), 3);
        assert_eq!(hub.subnets[0].name, "GatewaySubnet");
        assert_eq!(hub.subnets[1].nsg_id(), None);
        assert!(hub.subnets[2]
            .nsg_id()
            .expect("app subnet has an nsg")
            .ends_with("/nsg-legacy"));
        assert_eq!(networks[1].subnets[0].address_range(), "10.20.1.0/24,fd00:db8::/64");
    }

    #[test]
    fn test_parse_nsg_list_01() {
        let nsgs: Vec<SecurityGroup> =
            cli::parse_json(&read_fixture("nsg_list_01.json"), "nsg list").expect("parse");
        assert_eq!(nsgs.len(), 3);
        assert_eq!(nsgs[0].name, "nsg-baseline-eus");
        assert_eq!(nsgs[0].resource_group, "rg-security");
        assert!(nsgs.iter().all(|n| n.is_security_group()));
    }

    #[test]
    fn test_parse_resource_show_of_wrong_type() {
        let json = r#"{"id":"/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/routeTables/rt","name":"rt","location":"eastus","resourceGroup":"rg","type":"Microsoft.Network/routeTables"}"#;
        let resource: SecurityGroup = cli::parse_json(json, "resource").expect("parse");
        assert!(!resource.is_security_group());
    }

    #[test]
    fn test_parse_role_assignment_list() {
        let json = r#"[{"id":"/ra/1","principalId":"1111","principalName":"ops@contoso.com","roleDefinitionName":"Network Contributor","scope":"/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/v"}]"#;
        let list: Vec<RoleAssignment> = cli::parse_json(json, "role list").expect("parse");
        assert!(list[0].grants(
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/v",
            "1111",
            "Network Contributor"
        ));
    }

    #[test]
    fn test_parse_role_assignment_create_01() {
        let created: RoleAssignment = cli::parse_json(
            &read_fixture("role_assignment_create_01.json"),
            "role assignment",
        )
        .expect("create output parses without roleDefinitionName");
        assert_eq!(created.principal_id, "9b2d7e40-5c1a-4f3e-8a6b-0d4c2e1f7a88");
        assert!(created.role_definition_name.is_empty());
        assert!(created
            .role_definition_id
            .as_deref()
            .expect("role definition id")
            .ends_with("/4d97b98b-1d4f-4787-a291-c67834d212e7"));
        assert!(created.scope.ends_with("/virtualNetworks/z-hub-vnet-eus"));
    }

    #[test]
    fn test_optional_maps_not_found() {
        let not_found: Result<u8, AzureError> = Err(AzureError::Command {
            cmd: "az network nsg show".to_string(),
            code: Some(3),
            stderr: "(ResourceNotFound) nope".to_string(),
        });
        assert!(optional(not_found).expect("not an error").is_none());
        let denied: Result<u8, AzureError> = Err(AzureError::Command {
            cmd: "az network nsg show".to_string(),
            code: Some(1),
            stderr: "(AuthorizationFailed) nope".to_string(),
        });
        assert!(optional(denied).is_err());
    }
}
