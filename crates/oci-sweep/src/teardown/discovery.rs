//! Discovery Engine
//!
//! Enumerates every live resource in a scope:
//!
//! - The primary path asks the search capability for everything in the
//!   scope that is not already terminal. A failure here aborts discovery
//!   and yields an empty result, since a partial view would drive a partial
//!   teardown.
//! - The secondary path lists the kinds search does not index, once per
//!   configured region. A failing listing only loses that kind.
//!
//! Auto-managed kinds are dropped from both paths.

use crate::oci::search::{resource_from_listing, resource_from_summary, search_scope};
use crate::oci::{OciContext, clients, list_all};
use futures::future::join_all;
use oci_sweep_common::lifecycle::is_terminal;
use oci_sweep_common::{DiscoveredResource, OperationRef, Provider, TypeRegistry};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Live resources in a scope, grouped by kind
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Discovered(BTreeMap<String, Vec<DiscoveredResource>>);

impl Discovered {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one resource under its kind
    pub fn insert(&mut self, resource: DiscoveredResource) {
        self.0
            .entry(resource.kind.clone())
            .or_default()
            .push(resource);
    }

    /// Total resources across all kinds
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Kinds present, sorted by name
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, kind: &str) -> Option<&[DiscoveredResource]> {
        self.0.get(kind).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DiscoveredResource])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every resource, grouped by kind
    pub fn resources(&self) -> impl Iterator<Item = &DiscoveredResource> {
        self.0.values().flatten()
    }
}

impl FromIterator<DiscoveredResource> for Discovered {
    fn from_iter<I: IntoIterator<Item = DiscoveredResource>>(iter: I) -> Self {
        let mut discovered = Discovered::new();
        for resource in iter {
            discovered.insert(resource);
        }
        discovered
    }
}

/// Runs both discovery paths against one scope
pub struct DiscoveryEngine<P: Provider> {
    ctx: Arc<OciContext<P>>,
    registry: Arc<TypeRegistry>,
    regions: Vec<String>,
}

impl<P: Provider> DiscoveryEngine<P> {
    /// `regions` are the regions listed on the secondary path. The home
    /// region is used when empty.
    pub fn new(ctx: Arc<OciContext<P>>, registry: Arc<TypeRegistry>, regions: Vec<String>) -> Self {
        let regions = if regions.is_empty() {
            vec![ctx.home_region().to_string()]
        } else {
            regions
        };
        Self {
            ctx,
            registry,
            regions,
        }
    }

    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn discover(&self, scope: &str) -> Discovered {
        let Some(found) = self.search(scope).await else {
            return Discovered::new();
        };
        let listed = self.list(scope).await;

        let mut seen = HashSet::new();
        let discovered: Discovered = found
            .into_iter()
            .chain(listed)
            .filter(|r| seen.insert(r.id.clone()))
            .collect();

        info!(
            total = discovered.total(),
            kinds = discovered.kinds().count(),
            "Discovery complete"
        );
        discovered
    }

    /// Primary path. `None` means the search itself failed.
    async fn search(&self, scope: &str) -> Option<Vec<DiscoveredResource>> {
        let home = self.ctx.home_region();
        let client = match self.ctx.client(clients::SEARCH, home) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Cannot reach resource search, discovery aborted");
                return None;
            }
        };

        let items = match search_scope(client.as_ref(), scope).await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Resource search failed, discovery aborted");
                return None;
            }
        };

        let mut found = Vec::with_capacity(items.len());
        for item in &items {
            let Some(resource) = resource_from_summary(item, home) else {
                debug!(item = %item, "Ignoring malformed search result");
                continue;
            };
            if self.keep(&resource) {
                found.push(resource);
            }
        }
        debug!(returned = items.len(), kept = found.len(), "Search complete");
        Some(found)
    }

    /// Secondary path: every listed kind in every region, concurrently
    async fn list(&self, scope: &str) -> Vec<DiscoveredResource> {
        let listings = self
            .registry
            .listed_kinds()
            .flat_map(|(kind, op)| self.regions.iter().map(move |region| (kind, op, region)))
            .map(|(kind, op, region)| self.list_kind(scope, kind, op, region));

        join_all(listings).await.into_iter().flatten().collect()
    }

    async fn list_kind(
        &self,
        scope: &str,
        kind: &str,
        op: OperationRef,
        region: &str,
    ) -> Vec<DiscoveredResource> {
        let items = match self.ctx.client(op.client, region) {
            Ok(client) => {
                list_all(client.as_ref(), op.operation, json!({ "compartmentId": scope })).await
            }
            Err(e) => Err(e),
        };

        match items {
            Ok(items) => {
                let found: Vec<_> = items
                    .iter()
                    .filter_map(|item| resource_from_listing(item, kind, region))
                    .filter(|r| self.keep(r))
                    .collect();
                debug!(kind, region, count = found.len(), "Listed");
                found
            }
            Err(e) => {
                warn!(kind, region, listing = %op, error = %e, "Listing failed, kind skipped");
                Vec::new()
            }
        }
    }

    fn keep(&self, resource: &DiscoveredResource) -> bool {
        if self.registry.is_auto_managed(&resource.kind) {
            debug!(kind = %resource.kind, resource_id = %resource.id, "Skipping auto-managed resource");
            return false;
        }
        !resource
            .lifecycle_state
            .as_deref()
            .is_some_and(is_terminal)
    }
}
