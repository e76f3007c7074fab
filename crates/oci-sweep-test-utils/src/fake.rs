//! Scripted in-memory provider
//!
//! `FakeProvider` stands in for a real provider in unit and integration
//! tests. Each operation can be scripted with a handler that receives the
//! request parameters and the zero-based index of the call (per operation),
//! so a test can say "conflict on the first three attempts, then not found".
//!
//! Unscripted operations behave like an empty account: `get_*` calls return
//! not-found, everything else succeeds with an empty object.
//!
//! All clients produced by one `FakeProvider` share the same handlers and
//! the same call log, regardless of client reference or region.
//!
//! # Example
//!
//! ```
//! use oci_sweep_test_utils::FakeProvider;
//! use oci_sweep_common::{Provider, ProviderError, ServiceClient};
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let provider = FakeProvider::new("us-ashburn-1");
//! provider.on("delete_volume", |_, call| {
//!     if call < 2 {
//!         Err(ProviderError::conflict("still attached"))
//!     } else {
//!         Ok(json!({}))
//!     }
//! });
//!
//! let client = provider.connect("core.BlockstorageClient", "us-ashburn-1").unwrap();
//! assert!(client.invoke("delete_volume", json!({})).await.is_err());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use oci_sweep_common::{Provider, ProviderError, ServiceClient};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

/// Scripted response: `(params, call_index) -> result`
pub type Handler = Arc<dyn Fn(&Value, usize) -> Result<Value, ProviderError> + Send + Sync>;

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub client: String,
    pub region: String,
    pub operation: String,
    pub params: Value,
    /// Tokio clock at invocation time (advances instantly under `start_paused`)
    pub at: Instant,
}

#[derive(Default)]
struct Inner {
    handlers: Mutex<HashMap<String, Handler>>,
    counters: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<Call>>,
    connects: Mutex<Vec<(String, String)>>,
    refuse_connect: Mutex<HashSet<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory provider driven by per-operation handlers
#[derive(Clone)]
pub struct FakeProvider {
    inner: Arc<Inner>,
    home_region: String,
}

impl FakeProvider {
    pub fn new(home_region: &str) -> Self {
        Self {
            inner: Arc::default(),
            home_region: home_region.to_string(),
        }
    }

    /// Script `operation` on every client.
    pub fn on<F>(&self, operation: &str, handler: F) -> &Self
    where
        F: Fn(&Value, usize) -> Result<Value, ProviderError> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).insert(operation.to_string(), Arc::new(handler));
        self
    }

    /// Script `operation` on one client only. Takes precedence over [`FakeProvider::on`].
    pub fn on_client<F>(&self, client: &str, operation: &str, handler: F) -> &Self
    where
        F: Fn(&Value, usize) -> Result<Value, ProviderError> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).insert(format!("{client}/{operation}"), Arc::new(handler));
        self
    }

    /// Script `operation` to always return `value`.
    pub fn respond(&self, operation: &str, value: Value) -> &Self {
        self.on(operation, move |_, _| Ok(value.clone()))
    }

    /// Script `operation` to always fail with `error`.
    pub fn fail(&self, operation: &str, error: ProviderError) -> &Self {
        self.on(operation, move |_, _| Err(error.clone()))
    }

    /// Make `connect` fail for `client_ref`.
    pub fn refuse_client(&self, client_ref: &str) -> &Self {
        lock(&self.inner.refuse_connect).insert(client_ref.to_string());
        self
    }

    /// Every invocation so far, in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.inner.calls).clone()
    }

    /// Invocations of `operation`, in order
    pub fn calls_for(&self, operation: &str) -> Vec<Call> {
        lock(&self.inner.calls)
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of invocations of `operation`
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.inner.calls)
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Every successful `connect`, as `(client_ref, region)`
    pub fn connects(&self) -> Vec<(String, String)> {
        lock(&self.inner.connects).clone()
    }

    fn dispatch(&self, client: &str, region: &str, operation: &str, params: Value) -> Result<Value, ProviderError> {
        let handler = {
            let handlers = lock(&self.inner.handlers);
            handlers
                .get(&format!("{client}/{operation}"))
                .or_else(|| handlers.get(operation))
                .cloned()
        };

        let index = {
            let mut counters = lock(&self.inner.counters);
            let counter = counters.entry(operation.to_string()).or_default();
            let index = *counter;
            *counter += 1;
            index
        };

        lock(&self.inner.calls).push(Call {
            client: client.to_string(),
            region: region.to_string(),
            operation: operation.to_string(),
            params: params.clone(),
            at: Instant::now(),
        });

        match handler {
            Some(handler) => handler(&params, index),
            None if operation.starts_with("get_") => {
                Err(ProviderError::not_found(format!("{operation}: no such resource")))
            }
            None => Ok(json!({})),
        }
    }
}

impl Provider for FakeProvider {
    type Client = FakeClient;

    fn connect(&self, client_ref: &str, region: &str) -> Result<FakeClient, ProviderError> {
        if lock(&self.inner.refuse_connect).contains(client_ref) {
            return Err(ProviderError::Transport(format!(
                "cannot build {client_ref} in {region}"
            )));
        }
        lock(&self.inner.connects).push((client_ref.to_string(), region.to_string()));
        Ok(FakeClient {
            provider: self.clone(),
            client: client_ref.to_string(),
            region: region.to_string(),
        })
    }

    fn home_region(&self) -> &str {
        &self.home_region
    }
}

/// Client handle produced by [`FakeProvider`]
pub struct FakeClient {
    provider: FakeProvider,
    client: String,
    region: String,
}

impl ServiceClient for FakeClient {
    fn invoke(
        &self,
        operation: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send {
        let result = self
            .provider
            .dispatch(&self.client, &self.region, operation, params);
        async move {
            // Yield once so concurrent attempts interleave like real I/O
            tokio::task::yield_now().await;
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_handler_sees_call_index() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.on("delete_vcn", |_, call| {
            if call == 0 {
                Err(ProviderError::conflict("busy"))
            } else {
                Ok(json!({"ok": true}))
            }
        });

        let client = provider.connect("core.VirtualNetworkClient", "us-ashburn-1").unwrap();
        assert!(client.invoke("delete_vcn", json!({})).await.is_err());
        assert_eq!(
            client.invoke("delete_vcn", json!({})).await.unwrap(),
            json!({"ok": true})
        );
        assert_eq!(provider.call_count("delete_vcn"), 2);
    }

    #[tokio::test]
    async fn unscripted_defaults() {
        let provider = FakeProvider::new("us-ashburn-1");
        let client = provider.connect("core.ComputeClient", "us-phoenix-1").unwrap();

        let err = client.invoke("get_instance", json!({})).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(client.invoke("terminate_instance", json!({})).await.unwrap(), json!({}));

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].region, "us-phoenix-1");
        assert_eq!(calls[0].client, "core.ComputeClient");
    }

    #[tokio::test]
    async fn client_specific_handler_wins() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.respond("delete_project", json!({"from": "any"}));
        provider.on_client("devops.DevopsClient", "delete_project", |_, _| {
            Ok(json!({"from": "devops"}))
        });

        let devops = provider.connect("devops.DevopsClient", "r").unwrap();
        let ds = provider.connect("data_science.DataScienceClient", "r").unwrap();
        assert_eq!(
            devops.invoke("delete_project", json!({})).await.unwrap()["from"],
            "devops"
        );
        assert_eq!(
            ds.invoke("delete_project", json!({})).await.unwrap()["from"],
            "any"
        );
    }

    #[test]
    fn refused_client() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.refuse_client("dns.DnsClient");
        assert!(provider.connect("dns.DnsClient", "r").is_err());
        assert!(provider.connect("core.ComputeClient", "r").is_ok());
        assert_eq!(provider.connects().len(), 1);
    }
}
