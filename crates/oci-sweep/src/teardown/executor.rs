//! Deletion Executor
//!
//! Attempts to delete exactly one resource once. Every provider interaction
//! for a single attempt happens here: client resolution, the per-kind
//! special cases, the optional long-running wait, and classification of the
//! result. [`DeletionExecutor::attempt`] never fails; errors become
//! outcomes.

use super::progress::{ProgressTracker, ResourceState};
use super::report::{DeletionAttempt, DeletionOutcome};
use crate::config::RetryConfig;
use crate::oci::object_storage::ObjectStorage;
use crate::oci::{OciContext, classify_provider_error, clients, kms, logging};
use crate::wait::{WaitConfig, WaitError, poll_until};
use chrono::Utc;
use oci_sweep_common::defaults::SCHEDULED_DELETION_DAYS;
use oci_sweep_common::{
    DiscoveredResource, ParentLookup, Provider, ProviderError, ResourceTypeDescriptor,
    ServiceClient, SpecialHandling, WaitContract,
};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Successful end of a delete path
#[derive(Debug)]
enum Removal {
    Deleted,
    Skipped(String),
}

#[derive(Debug, Error)]
enum DeleteError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("{0}")]
    Unresolved(String),
}

/// Deletes single resources and records each attempt in the tracker
pub struct DeletionExecutor<P: Provider> {
    ctx: Arc<OciContext<P>>,
    progress: Arc<ProgressTracker>,
    scope: String,
    max_retries: u32,
    wait: WaitConfig,
}

impl<P: Provider> DeletionExecutor<P> {
    pub fn new(
        ctx: Arc<OciContext<P>>,
        progress: Arc<ProgressTracker>,
        scope: &str,
        retry: &RetryConfig,
        wait: WaitConfig,
    ) -> Self {
        Self {
            ctx,
            progress,
            scope: scope.to_string(),
            max_retries: retry.max_retries,
            wait,
        }
    }

    /// Attempt to delete `resource` once, in retry round `round`.
    #[instrument(skip_all, fields(kind = %resource.kind, resource_id = %resource.id, round))]
    pub async fn attempt(
        &self,
        resource: &DiscoveredResource,
        descriptor: &ResourceTypeDescriptor,
        round: u32,
    ) -> DeletionAttempt {
        self.progress.record_attempt(&resource.id);
        if round == 0 {
            self.mark(resource, ResourceState::Deleting, None);
        }

        info!(name = %resource.display_name, "Deleting");

        let (outcome, error_detail) = match self.delete(resource, descriptor).await {
            Ok(Removal::Deleted) => {
                info!(name = %resource.display_name, "Deleted");
                (DeletionOutcome::Deleted, None)
            }
            Ok(Removal::Skipped(reason)) => {
                info!(name = %resource.display_name, reason = %reason, "Nothing to delete");
                (DeletionOutcome::Skipped, Some(reason))
            }
            Err(DeleteError::Provider(e)) => self.classify(&e, round),
            Err(e) => {
                error!(error = %e, "Deletion failed");
                (DeletionOutcome::TerminalFailure, Some(e.to_string()))
            }
        };

        match outcome {
            DeletionOutcome::Deleted | DeletionOutcome::Skipped => {
                self.mark(resource, ResourceState::Deleted, None)
            }
            DeletionOutcome::RetryableFailure => {
                self.mark(resource, ResourceState::Deleting, error_detail.clone())
            }
            DeletionOutcome::TerminalFailure => {
                self.mark(resource, ResourceState::Failed, error_detail.clone())
            }
        }

        DeletionAttempt {
            resource_id: resource.id.clone(),
            attempt_number: round,
            outcome,
            error_detail,
        }
    }

    fn mark(&self, resource: &DiscoveredResource, state: ResourceState, error: Option<String>) {
        self.progress.update(
            &resource.id,
            &resource.display_name,
            &resource.kind,
            state,
            error,
        );
    }

    fn classify(&self, err: &ProviderError, round: u32) -> (DeletionOutcome, Option<String>) {
        let class = classify_provider_error(err);
        let detail = Some(err.message().to_string());

        if class.is_skip() {
            debug!(class = ?class, error = %err, "Treating as already deleted");
            return (DeletionOutcome::Skipped, detail);
        }

        if class.is_retryable() {
            if round < self.max_retries {
                warn!(class = ?class, error = %err, "Conflict, will retry");
                return (DeletionOutcome::RetryableFailure, detail);
            }
            error!(
                retries = self.max_retries,
                error = %err,
                "Still conflicting after all retries"
            );
            return (DeletionOutcome::TerminalFailure, detail);
        }

        error!(error = %err, "Deletion failed");
        (DeletionOutcome::TerminalFailure, detail)
    }

    async fn delete(
        &self,
        resource: &DiscoveredResource,
        descriptor: &ResourceTypeDescriptor,
    ) -> Result<Removal, DeleteError> {
        let client = self
            .ctx
            .client(descriptor.delete_op.client, &resource.region)?;
        let key = resource.key_for(descriptor.id_field);

        match descriptor.special {
            SpecialHandling::None => {
                client
                    .invoke(descriptor.delete_op.operation, json!({ "id": key }))
                    .await?;
                if let Some(wait) = &descriptor.wait {
                    self.wait_for(resource, key, wait).await?;
                }
                Ok(Removal::Deleted)
            }
            SpecialHandling::Bucket => {
                let storage = ObjectStorage::new(client);
                let namespace = storage.namespace().await?;
                storage.delete_bucket(&namespace, key).await?;
                Ok(Removal::Deleted)
            }
            SpecialHandling::ScheduledDeletion { parent } => {
                self.schedule_deletion(client.as_ref(), resource, descriptor, key, parent.as_ref())
                    .await
            }
            SpecialHandling::LogEntry => {
                let Some(group) = logging::find_log_group(client.as_ref(), &self.scope, key).await?
                else {
                    return Err(DeleteError::Unresolved(format!(
                        "no log group in scope contains log {key}"
                    )));
                };
                client
                    .invoke(
                        descriptor.delete_op.operation,
                        json!({ "logGroupId": group, "logId": key }),
                    )
                    .await?;
                Ok(Removal::Deleted)
            }
            SpecialHandling::Namespaced => {
                let storage = ObjectStorage::new(
                    self.ctx.client(clients::OBJECT_STORAGE, &resource.region)?,
                );
                let namespace = storage.namespace().await?;
                client
                    .invoke(
                        descriptor.delete_op.operation,
                        json!({ "namespaceName": namespace, "id": key }),
                    )
                    .await?;
                Ok(Removal::Deleted)
            }
        }
    }

    async fn schedule_deletion(
        &self,
        client: &P::Client,
        resource: &DiscoveredResource,
        descriptor: &ResourceTypeDescriptor,
        key: &str,
        parent: Option<&ParentLookup>,
    ) -> Result<Removal, DeleteError> {
        let time_of_deletion = Utc::now() + chrono::Duration::days(SCHEDULED_DELETION_DAYS);
        let mut params = json!({
            "id": key,
            "timeOfDeletion": time_of_deletion.to_rfc3339(),
        });

        if let Some(lookup) = parent {
            let parent_client = self.ctx.client(lookup.list.client, &resource.region)?;
            match kms::find_parent(parent_client.as_ref(), lookup, &self.scope, key).await? {
                Some(found) => {
                    debug!(parent_id = %found.parent_id, "Resolved parent endpoint");
                    params[lookup.endpoint_field] = Value::String(found.endpoint);
                }
                None => {
                    return Ok(Removal::Skipped(
                        "no live parent found, it is likely already scheduled for deletion"
                            .to_string(),
                    ));
                }
            }
        }

        client
            .invoke(descriptor.delete_op.operation, params)
            .await?;
        info!(
            name = %resource.display_name,
            time_of_deletion = %time_of_deletion.to_rfc3339(),
            "Deletion scheduled"
        );
        Ok(Removal::Deleted)
    }

    async fn wait_for(
        &self,
        resource: &DiscoveredResource,
        key: &str,
        wait: &WaitContract,
    ) -> Result<(), DeleteError> {
        let client = self.ctx.client(wait.op.client, &resource.region)?;
        let client: &P::Client = client.as_ref();
        let operation = wait.op.operation;
        let states = wait.states;

        poll_until(
            &self.wait,
            move || async move {
                match client.invoke(operation, json!({ "id": key })).await {
                    Ok(current) => Ok(current
                        .get("lifecycleState")
                        .and_then(Value::as_str)
                        .is_some_and(|s| states.iter().any(|w| w.eq_ignore_ascii_case(s)))),
                    Err(e) if e.is_not_found() => Ok(true),
                    Err(e) => Err(e),
                }
            },
            &resource.id,
        )
        .await?;
        Ok(())
    }
}
