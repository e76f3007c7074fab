//! Provider service wrappers
//!
//! This module provides thin typed wrappers over the opaque
//! [`ServiceClient`](oci_sweep_common::ServiceClient) capability:
//! - context: Shared client cache keyed by client reference and region
//! - error: Classification of provider errors into the teardown taxonomy
//! - http: `Provider` implementation backed by a JSON provider gateway
//! - pagination: Draining `opcNextPage` listings
//! - search: Structured search over a scope
//! - object_storage, kms, logging, network, identity: per-service helpers

pub mod context;
pub mod error;
pub mod http;
pub mod identity;
pub mod kms;
pub mod logging;
pub mod network;
pub mod object_storage;
pub mod pagination;
pub mod search;

pub use context::OciContext;
pub use error::{ErrorClass, classify_provider_error, ignore_not_found};
pub use http::HttpProvider;
pub use pagination::list_all;

/// Client references used outside the registry table
pub mod clients {
    pub const SEARCH: &str = "resource_search.ResourceSearchClient";
    pub const OBJECT_STORAGE: &str = "object_storage.ObjectStorageClient";
    pub const NETWORK: &str = "core.VirtualNetworkClient";
    pub const IDENTITY: &str = "identity.IdentityClient";
    pub const LOGGING: &str = "logging.LoggingManagementClient";
}

use oci_sweep_common::ProviderError;
use serde_json::Value;

/// Read a required string field from an operation result
pub(crate) fn str_field<'a>(
    value: &'a Value,
    field: &str,
    operation: &str,
) -> Result<&'a str, ProviderError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Decode {
            operation: operation.to_string(),
            message: format!("missing string field `{field}`"),
        })
}
