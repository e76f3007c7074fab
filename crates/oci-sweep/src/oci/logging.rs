//! Log-group lookup for log deletion
//!
//! Logs are addressed by `(logGroupId, logId)`, but search only reports the
//! log id. The owning group is found by scanning the groups in the scope.

use super::pagination::list_all;
use oci_sweep_common::{ProviderError, ServiceClient};
use serde_json::{Value, json};
use tracing::debug;

/// Id of the log group in `scope` that contains `log_id`, if any
pub async fn find_log_group<C: ServiceClient>(
    client: &C,
    scope: &str,
    log_id: &str,
) -> Result<Option<String>, ProviderError> {
    let groups = list_all(client, "list_log_groups", json!({ "compartmentId": scope })).await?;

    for group in &groups {
        let Some(group_id) = group.get("id").and_then(Value::as_str) else {
            continue;
        };
        let logs = list_all(client, "list_logs", json!({ "logGroupId": group_id })).await?;
        if logs
            .iter()
            .any(|l| l.get("id").and_then(Value::as_str) == Some(log_id))
        {
            debug!(log_id = %log_id, log_group_id = %group_id, "Found owning log group");
            return Ok(Some(group_id.to_string()));
        }
    }

    Ok(None)
}
