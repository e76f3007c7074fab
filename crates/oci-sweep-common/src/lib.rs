//! oci-sweep-common - Shared types and utilities
//!
//! This crate provides the types shared by the orchestrator and its test
//! helpers, without any transport dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`lifecycle`]: Provider lifecycle-state constants used for discovery filtering
//! - [`priority`]: Static deletion-priority table
//! - [`provider`]: The outbound provider surface (`ServiceClient`, `Provider`, `ProviderError`)
//! - [`registry`]: Per-kind deletion contracts (the Type Registry)
//! - [`resource`]: Resources produced by discovery

pub mod defaults;
pub mod lifecycle;
pub mod priority;
pub mod provider;
pub mod registry;
pub mod resource;

// Re-export commonly used types
pub use provider::{Provider, ProviderError, ServiceClient};
pub use registry::{
    DiscoverySource, OperationRef, ParentLookup, ResourceTypeDescriptor, SpecialHandling,
    TypeRegistry, WaitContract,
};
pub use resource::DiscoveredResource;
