//! The provider seam: every call the reconcilers make against Azure.

use crate::error::AzureError;
use crate::models::{Account, Network, RoleAssignment, SecurityGroup, Subnet};

/// Operations consumed from the cloud provider.
///
/// Reads take `&self`; calls that change provider state take `&mut self`.
/// `get_*` lookups return `Ok(None)` when the resource does not exist.
pub trait NetworkProvider {
    /// Account of the signed-in session.
    fn current_account(&self) -> Result<Account, AzureError>;

    /// Look up a subscription by id.
    fn get_subscription(&self, subscription_id: &str) -> Result<Account, AzureError>;

    /// Make `subscription_id` the active subscription for later calls.
    fn set_subscription(&mut self, subscription_id: &str) -> Result<(), AzureError>;

    /// All virtual networks of the active subscription, subnets embedded.
    fn list_networks(&self) -> Result<Vec<Network>, AzureError>;

    fn get_security_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<SecurityGroup>, AzureError>;

    fn get_resource_by_id(&self, id: &str) -> Result<Option<SecurityGroup>, AzureError>;

    fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, AzureError>;

    /// Replace the subnet configuration so it carries `nsg`; returns the subnet
    /// as stored by the provider.
    fn set_subnet_security_group(
        &mut self,
        network: &Network,
        subnet: &Subnet,
        nsg: &SecurityGroup,
    ) -> Result<Subnet, AzureError>;

    fn list_role_assignments(
        &self,
        scope: &str,
        principal: &str,
        role: &str,
    ) -> Result<Vec<RoleAssignment>, AzureError>;

    fn create_role_assignment(
        &mut self,
        scope: &str,
        principal: &str,
        role: &str,
    ) -> Result<RoleAssignment, AzureError>;
}
