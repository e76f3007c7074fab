//! Vault lookup for key deletion
//!
//! Scheduling a key deletion has to go through the management endpoint of
//! the vault that owns the key, and the key's summary does not name its
//! vault. The owner is guessed from the key OCID: its fifth dot-separated
//! segment is the vault's endpoint prefix. This is a best-effort
//! correlation, not an authoritative lookup.

use super::pagination::list_all;
use oci_sweep_common::lifecycle::is_terminal;
use oci_sweep_common::{ParentLookup, ProviderError, ServiceClient};
use serde_json::{Value, json};
use tracing::warn;

/// Segment of a key OCID shared with its vault's endpoint host
pub fn vault_hint(key_id: &str) -> Option<&str> {
    key_id.split('.').nth(4).filter(|s| !s.is_empty())
}

/// Resolved parent of a child resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentEndpoint {
    pub parent_id: String,
    pub endpoint: String,
}

/// Pick the parent of `child_id` among listed candidates.
///
/// Candidates already on their way out are ignored. When several match, the
/// first in listing order wins and a warning names the ambiguity.
pub fn correlate_parent(
    child_id: &str,
    candidates: &[Value],
    endpoint_field: &str,
) -> Option<ParentEndpoint> {
    let hint = vault_hint(child_id)?;

    let matches: Vec<ParentEndpoint> = candidates
        .iter()
        .filter(|c| {
            c.get("lifecycleState")
                .and_then(Value::as_str)
                .is_none_or(|s| !is_terminal(s))
        })
        .filter_map(|c| {
            let endpoint = c.get(endpoint_field).and_then(Value::as_str)?;
            let id = c.get("id").and_then(Value::as_str).unwrap_or_default();
            endpoint.contains(hint).then(|| ParentEndpoint {
                parent_id: id.to_string(),
                endpoint: endpoint.to_string(),
            })
        })
        .collect();

    if matches.len() > 1 {
        warn!(
            resource_id = %child_id,
            candidates = matches.len(),
            chosen = %matches[0].parent_id,
            "Several parents match, using the first"
        );
    }
    matches.into_iter().next()
}

/// List parent candidates in `scope` and correlate `child_id` against them.
pub async fn find_parent<C: ServiceClient>(
    client: &C,
    lookup: &ParentLookup,
    scope: &str,
    child_id: &str,
) -> Result<Option<ParentEndpoint>, ProviderError> {
    let candidates = list_all(
        client,
        lookup.list.operation,
        json!({ "compartmentId": scope }),
    )
    .await?;
    Ok(correlate_parent(child_id, &candidates, lookup.endpoint_field))
}
