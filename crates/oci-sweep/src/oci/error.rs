//! Provider error classification
//!
//! Maps a typed [`ProviderError`] onto the teardown taxonomy using the HTTP
//! status plus a few constant message-pattern tables. Matching is
//! case-insensitive on the provider message.

use oci_sweep_common::ProviderError;
use serde_json::Value;

/// What a provider error means for a deletion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Resource does not exist
    AlreadyGone,
    /// Default or protected resource removed together with its parent
    ManagedByParent,
    /// Primary attachment address, removed with its parent
    PrimaryAttachment,
    /// Still attached to a parent that is itself terminating
    ParentTerminating,
    /// Any other conflict (ordering lag, propagation delay)
    Conflict,
    /// Anything else, including throttling
    Fatal,
}

impl ErrorClass {
    /// Logically achieved: nothing left to delete
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ErrorClass::AlreadyGone | ErrorClass::ManagedByParent | ErrorClass::PrimaryAttachment
        )
    }

    /// Worth another attempt in a later round
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::ParentTerminating | ErrorClass::Conflict)
    }
}

/// Conflicts meaning "this is a default/protected resource its parent owns"
const MANAGED_BY_PARENT_PATTERNS: &[&str] = &[
    "deleted with its vcn",
    "deleted with the vcn",
    "deleted along with the vcn",
    "default security list",
    "default route table",
    "default dhcp options",
    "cannot delete default",
    "auto-deleted with",
    "automatically deleted with",
    "protected and will be deleted",
    "protected view",
];

/// Conflicts meaning "wait for the parent to finish going away"
const PARENT_TERMINATING_PATTERNS: &[&str] = &[
    "parent is terminating",
    "parent resource is being deleted",
    "is being terminated",
    "still attached to a terminating",
];

/// Bad requests meaning "this is the primary address of an attachment"
const PRIMARY_ATTACHMENT_PATTERNS: &[&str] = &[
    "primary private ip",
    "primary ip",
    "primary vnic",
];

fn matches_any(message: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| message.contains(p))
}

/// Classify a provider error for the deletion executor.
pub fn classify_provider_error(error: &ProviderError) -> ErrorClass {
    let message = error.message().to_ascii_lowercase();

    match error {
        ProviderError::NotFound { .. } => ErrorClass::AlreadyGone,
        ProviderError::Conflict { .. } if matches_any(&message, MANAGED_BY_PARENT_PATTERNS) => {
            ErrorClass::ManagedByParent
        }
        ProviderError::Conflict { .. } if matches_any(&message, PARENT_TERMINATING_PATTERNS) => {
            ErrorClass::ParentTerminating
        }
        ProviderError::Conflict { .. } => ErrorClass::Conflict,
        ProviderError::BadRequest { .. } if matches_any(&message, PRIMARY_ATTACHMENT_PATTERNS) => {
            ErrorClass::PrimaryAttachment
        }
        _ => ErrorClass::Fatal,
    }
}

/// Treat not-found as success.
///
/// Used where the goal is "make sure this is gone" and a concurrent
/// deletion may have won the race.
pub fn ignore_not_found(result: Result<Value, ProviderError>) -> Result<(), ProviderError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}
