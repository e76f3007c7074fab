//! Outbound provider surface
//!
//! The orchestrator never talks to a provider SDK directly. Everything goes
//! through two small traits:
//!
//! - [`Provider`] builds a [`ServiceClient`] bound to one client reference
//!   (e.g. `core.VirtualNetworkClient`) and one region.
//! - [`ServiceClient::invoke`] runs one named operation with JSON parameters
//!   and returns the JSON result or a typed [`ProviderError`].
//!
//! ## Wire conventions
//!
//! Parameters and results use the provider's camelCase model names. List
//! operations return `{"items": [...], "opcNextPage": "..."}`; a missing or
//! null `opcNextPage` means the listing is complete.

use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// Result field carrying the continuation token of a paginated listing
pub const NEXT_PAGE_FIELD: &str = "opcNextPage";

/// Result field carrying the items of a paginated listing
pub const ITEMS_FIELD: &str = "items";

/// Typed provider failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The resource does not exist (HTTP 404)
    #[error("Not found: {message}")]
    NotFound {
        code: Option<String>,
        message: String,
    },

    /// The resource is in a state that conflicts with the request (HTTP 409)
    #[error("Conflict: {message}")]
    Conflict {
        code: Option<String>,
        message: String,
    },

    /// The request was rejected as invalid (HTTP 400)
    #[error("Bad request: {message}")]
    BadRequest {
        code: Option<String>,
        message: String,
    },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Any other provider-side status
    #[error("Provider error {status}: {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a provider response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with something the caller could not interpret
    #[error("Unexpected response from {operation}: {message}")]
    Decode { operation: String, message: String },
}

impl ProviderError {
    /// Build a typed error from an HTTP-style status, error code and message.
    pub fn from_status(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => ProviderError::NotFound { code, message },
            409 => ProviderError::Conflict { code, message },
            400 => ProviderError::BadRequest { code, message },
            429 => ProviderError::Throttled { message },
            _ => ProviderError::Service {
                status,
                code,
                message,
            },
        }
    }

    /// Shorthand for a 404 with just a message
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(404, None, message)
    }

    /// Shorthand for a 409 with just a message
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::from_status(409, None, message)
    }

    /// Shorthand for a 400 with just a message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_status(400, None, message)
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Check if this is a conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, ProviderError::Conflict { .. })
    }

    /// HTTP-style status, if the error came from a provider response
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::NotFound { .. } => Some(404),
            ProviderError::Conflict { .. } => Some(409),
            ProviderError::BadRequest { .. } => Some(400),
            ProviderError::Throttled { .. } => Some(429),
            ProviderError::Service { status, .. } => Some(*status),
            ProviderError::Transport(_) | ProviderError::Decode { .. } => None,
        }
    }

    /// Provider message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            ProviderError::NotFound { message, .. }
            | ProviderError::Conflict { message, .. }
            | ProviderError::BadRequest { message, .. }
            | ProviderError::Throttled { message }
            | ProviderError::Service { message, .. }
            | ProviderError::Decode { message, .. } => message,
            ProviderError::Transport(message) => message,
        }
    }
}

/// A client bound to one provider service and one region.
///
/// Implementations must be cheap to share behind an `Arc`; the orchestrator
/// builds one per `(client_ref, region)` and reuses it for the whole run.
pub trait ServiceClient: Send + Sync {
    /// Invoke `operation` with JSON `params`.
    fn invoke(
        &self,
        operation: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send;
}

/// Factory for region-bound service clients.
pub trait Provider: Send + Sync {
    /// Concrete client type produced by this provider
    type Client: ServiceClient + 'static;

    /// Build a client for `client_ref` (e.g. `object_storage.ObjectStorageClient`) in `region`.
    fn connect(&self, client_ref: &str, region: &str) -> Result<Self::Client, ProviderError>;

    /// Region used when a resource does not report its own
    fn home_region(&self) -> &str;
}
