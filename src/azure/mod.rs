//! Azure provider access.
//!
//! This module handles all Azure-related operations:
//! - [`provider`] - The [`NetworkProvider`] trait the reconcilers call through
//! - [`cli`] - Command execution for the Azure CLI
//! - [`client`] - [`AzCli`], the live provider
//! - [`snapshot`] - Recorded snapshots and the offline [`SnapshotProvider`]

pub mod cli;
mod client;
mod provider;
mod snapshot;

// Re-export public types and functions
pub use client::AzCli;
pub use provider::NetworkProvider;
pub use snapshot::{default_snapshot_path, Snapshot, SnapshotProvider};
