//! Structured resource search over a scope

use super::pagination::list_all;
use oci_sweep_common::defaults::SEARCH_PAGE_LIMIT;
use oci_sweep_common::lifecycle::SEARCH_EXCLUDED_STATES;
use oci_sweep_common::{DiscoveredResource, ProviderError, ServiceClient};
use serde_json::{Value, json};

pub const SEARCH_OPERATION: &str = "search_resources";

/// Structured query for every live resource directly inside `scope`
pub fn scope_query(scope: &str) -> String {
    let mut query = format!("query all resources where compartmentId = '{scope}'");
    for state in SEARCH_EXCLUDED_STATES {
        query.push_str(&format!(" && lifecycleState != '{state}'"));
    }
    query
}

/// Every live resource in `scope`, as raw search summaries
pub async fn search_scope<C: ServiceClient>(
    client: &C,
    scope: &str,
) -> Result<Vec<Value>, ProviderError> {
    let params = json!({
        "searchDetails": {
            "type": "Structured",
            "query": scope_query(scope),
        },
        "limit": SEARCH_PAGE_LIMIT,
    });
    list_all(client, SEARCH_OPERATION, params).await
}

/// Convert a search summary into a resource.
///
/// Returns `None` when the summary lacks an identifier or a type.
pub fn resource_from_summary(item: &Value, fallback_region: &str) -> Option<DiscoveredResource> {
    let id = item.get("identifier").and_then(Value::as_str)?;
    let kind = item.get("resourceType").and_then(Value::as_str)?;
    let name = item
        .get("displayName")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or(id);
    let region = item
        .get("region")
        .and_then(Value::as_str)
        .unwrap_or(fallback_region);

    let mut resource = DiscoveredResource::new(id, name, kind, region);
    resource.lifecycle_state = item
        .get("lifecycleState")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(resource)
}

/// Convert a direct-listing item of `kind` into a resource.
pub fn resource_from_listing(item: &Value, kind: &str, region: &str) -> Option<DiscoveredResource> {
    let id = item.get("id").and_then(Value::as_str)?;
    let name = item
        .get("displayName")
        .or_else(|| item.get("name"))
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or(id);

    let mut resource = DiscoveredResource::new(id, name, kind, region);
    resource.lifecycle_state = item
        .get("lifecycleState")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(resource)
}
