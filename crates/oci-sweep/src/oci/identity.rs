//! Identity operations on the scope (compartment) itself

use super::str_field;
use crate::teardown::finalizer::ScopeOperations;
use oci_sweep_common::{ProviderError, ServiceClient};
use serde_json::json;
use std::sync::Arc;

/// Compartment operations backed by the identity service
pub struct IdentityScope<C> {
    client: Arc<C>,
}

impl<C: ServiceClient> IdentityScope<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C: ServiceClient> ScopeOperations for IdentityScope<C> {
    async fn lifecycle_state(&self, scope: &str) -> Result<String, ProviderError> {
        let compartment = self
            .client
            .invoke("get_compartment", json!({ "id": scope }))
            .await?;
        str_field(&compartment, "lifecycleState", "get_compartment").map(str::to_string)
    }

    async fn delete_scope(&self, scope: &str) -> Result<(), ProviderError> {
        self.client
            .invoke("delete_compartment", json!({ "id": scope }))
            .await?;
        Ok(())
    }
}
