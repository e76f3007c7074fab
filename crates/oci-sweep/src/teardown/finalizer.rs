//! Scope Finalizer
//!
//! Deletes the scope container itself once a run has emptied it.

use super::confirm::Confirmer;
use super::report::FinalizeOutcome;
use oci_sweep_common::ProviderError;
use oci_sweep_common::lifecycle::is_terminal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Operations on the scope container that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ScopeOperations: Send + Sync {
    /// Current lifecycle state of the scope
    async fn lifecycle_state(&self, scope: &str) -> Result<String, ProviderError>;

    /// Request deletion of the scope
    async fn delete_scope(&self, scope: &str) -> Result<(), ProviderError>;
}

/// Deletes the scope after a clean run
pub struct ScopeFinalizer<S> {
    ops: S,
    confirmer: Option<Arc<dyn Confirmer>>,
}

impl<S: ScopeOperations> ScopeFinalizer<S> {
    pub fn new(ops: S) -> Self {
        Self {
            ops,
            confirmer: None,
        }
    }

    /// Ask `confirmer` before deleting.
    pub fn with_confirmation(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn finalize(&self, scope: &str, failed_count: usize) -> FinalizeOutcome {
        if failed_count > 0 {
            warn!(
                failed = failed_count,
                "Not deleting scope, some resources could not be deleted"
            );
            return FinalizeOutcome::Skipped(format!(
                "{failed_count} resource(s) failed to delete"
            ));
        }

        match self.ops.lifecycle_state(scope).await {
            Ok(state) if is_terminal(&state) => {
                info!(state = %state, "Scope is already going away");
                return FinalizeOutcome::AlreadyGone;
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                info!("Scope no longer exists");
                return FinalizeOutcome::AlreadyGone;
            }
            Err(e) => {
                warn!(error = %e, "Could not read scope state");
                return FinalizeOutcome::Failed(e.to_string());
            }
        }

        if let Some(confirmer) = &self.confirmer
            && !confirmer.confirm_scope_deletion(scope)
        {
            info!("Scope deletion declined");
            return FinalizeOutcome::Skipped("declined".to_string());
        }

        match self.ops.delete_scope(scope).await {
            Ok(()) => {
                info!("Scope deletion initiated");
                FinalizeOutcome::Deleted
            }
            Err(e) if e.is_not_found() => FinalizeOutcome::AlreadyGone,
            Err(e) if e.is_conflict() => {
                warn!(error = %e, "Scope is not empty");
                FinalizeOutcome::Failed(format!(
                    "scope still holds resources or nested scopes: {}",
                    e.message()
                ))
            }
            Err(e) => {
                warn!(error = %e, "Scope deletion failed");
                FinalizeOutcome::Failed(e.to_string())
            }
        }
    }
}
