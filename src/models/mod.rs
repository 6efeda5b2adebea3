//! Domain models for NSG and role reconciliation.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Subnet`] - Azure subnet and its NSG association
//! - [`Network`] - Virtual network with its embedded subnets
//! - [`ResourceRef`], [`SecurityGroup`], [`RoleAssignment`], [`Account`] - provider resources
//! - [`RunStatistics`] - per-run counters, totals and per-region

mod resource;
mod stats;
mod subnet;
mod vnet;

// Re-export public types
pub use resource::{
    normalize_region, same_resource_id, Account, AccountUser, ResourceRef, RoleAssignment,
    SecurityGroup, NSG_RESOURCE_TYPE,
};
pub use stats::{Counters, Outcome, RunStatistics};
pub use subnet::{ResourceId, Subnet};
pub use vnet::{networks_by_region, AddressSpace, Network};
