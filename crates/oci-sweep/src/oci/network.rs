//! Virtual network helpers

use oci_sweep_common::{ProviderError, ServiceClient};
use serde_json::{Value, json};
use tracing::debug;

/// Remove every route rule from a route table.
///
/// Returns how many rules were cleared; `0` means the table was already
/// clear and no update was sent.
pub async fn clear_route_rules<C: ServiceClient>(
    client: &C,
    route_table_id: &str,
) -> Result<usize, ProviderError> {
    let table = client
        .invoke("get_route_table", json!({ "id": route_table_id }))
        .await?;

    let rules = table
        .get("routeRules")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if rules == 0 {
        debug!(route_table_id = %route_table_id, "Route table has no rules");
        return Ok(0);
    }

    client
        .invoke(
            "update_route_table",
            json!({
                "id": route_table_id,
                "updateRouteTableDetails": { "routeRules": [] },
            }),
        )
        .await?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_sweep_common::Provider;
    use oci_sweep_test_utils::FakeProvider;

    #[tokio::test]
    async fn clears_rules() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.respond(
            "get_route_table",
            json!({"id": "rt", "routeRules": [{"networkEntityId": "igw"}, {"networkEntityId": "nat"}]}),
        );
        let client = provider.connect("core.VirtualNetworkClient", "r").unwrap();

        assert_eq!(clear_route_rules(&client, "rt").await.unwrap(), 2);
        let update = &provider.calls_for("update_route_table")[0];
        assert_eq!(update.params["updateRouteTableDetails"]["routeRules"], json!([]));
    }

    #[tokio::test]
    async fn empty_table_is_noop() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.respond("get_route_table", json!({"id": "rt", "routeRules": []}));
        let client = provider.connect("core.VirtualNetworkClient", "r").unwrap();

        assert_eq!(clear_route_rules(&client, "rt").await.unwrap(), 0);
        assert_eq!(provider.call_count("update_route_table"), 0);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let provider = FakeProvider::new("us-ashburn-1");
        let client = provider.connect("core.VirtualNetworkClient", "r").unwrap();
        // Unscripted get_* calls report not-found
        assert!(clear_route_rules(&client, "rt").await.unwrap_err().is_not_found());
    }
}
