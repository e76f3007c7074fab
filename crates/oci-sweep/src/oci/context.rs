//! Shared provider context
//!
//! Provides `OciContext` for building each region-bound service client once
//! and sharing it for the rest of the run.

use oci_sweep_common::{Provider, ProviderError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type ClientKey = (String, String);

/// Provider plus a build-once cache of its clients.
///
/// Read-mostly: after the first request for a `(client_ref, region)` pair
/// every later request only takes the read lock.
///
/// # Example
/// ```ignore
/// let ctx = OciContext::new(HttpProvider::new(&config)?);
///
/// let network = ctx.client("core.VirtualNetworkClient", "us-ashburn-1")?;
/// let same = ctx.client("core.VirtualNetworkClient", "us-ashburn-1")?;
/// assert!(Arc::ptr_eq(&network, &same));
/// ```
pub struct OciContext<P: Provider> {
    provider: P,
    clients: RwLock<HashMap<ClientKey, Arc<P::Client>>>,
}

impl<P: Provider> OciContext<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Client for `client_ref` in `region`, built on first use
    pub fn client(&self, client_ref: &str, region: &str) -> Result<Arc<P::Client>, ProviderError> {
        let key = (client_ref.to_string(), region.to_string());

        {
            let clients = self.clients.read().unwrap_or_else(|e| e.into_inner());
            if let Some(client) = clients.get(&key) {
                return Ok(client.clone());
            }
        }

        let mut clients = self.clients.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have built it between the two locks
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        debug!(client = %client_ref, region = %region, "Creating service client");
        let client = Arc::new(self.provider.connect(client_ref, region)?);
        clients.insert(key, client.clone());
        Ok(client)
    }

    /// Region used when a resource does not report its own
    pub fn home_region(&self) -> &str {
        self.provider.home_region()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of cached clients
    pub fn cached_clients(&self) -> usize {
        self.clients.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<P: Provider> std::fmt::Debug for OciContext<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OciContext")
            .field("home_region", &self.home_region())
            .field("cached_clients", &self.cached_clients())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_sweep_test_utils::FakeProvider;

    #[test]
    fn builds_each_client_once() {
        let provider = FakeProvider::new("us-ashburn-1");
        let ctx = OciContext::new(provider.clone());

        let a = ctx.client("core.ComputeClient", "us-ashburn-1").unwrap();
        let b = ctx.client("core.ComputeClient", "us-ashburn-1").unwrap();
        let c = ctx.client("core.ComputeClient", "us-phoenix-1").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(provider.connects().len(), 2);
        assert_eq!(ctx.cached_clients(), 2);
    }

    #[test]
    fn connect_failure_is_not_cached() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.refuse_client("dns.DnsClient");
        let ctx = OciContext::new(provider);

        assert!(ctx.client("dns.DnsClient", "us-ashburn-1").is_err());
        assert_eq!(ctx.cached_clients(), 0);
        assert_eq!(ctx.home_region(), "us-ashburn-1");
    }
}
