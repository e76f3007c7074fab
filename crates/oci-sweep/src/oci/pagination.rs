//! Draining paginated listings
//!
//! List operations return `{"items": [...], "opcNextPage": "..."}`. The
//! continuation token is sent back as the `page` parameter until the
//! provider stops returning one.

use oci_sweep_common::provider::{ITEMS_FIELD, NEXT_PAGE_FIELD};
use oci_sweep_common::{ProviderError, ServiceClient};
use serde_json::Value;
use tracing::debug;

/// Request parameter carrying the continuation token
pub const PAGE_PARAM: &str = "page";

/// Invoke `operation` repeatedly until every page has been read.
pub async fn list_all<C: ServiceClient>(
    client: &C,
    operation: &str,
    params: Value,
) -> Result<Vec<Value>, ProviderError> {
    let mut items = Vec::new();
    let mut page: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let mut request = params.clone();
        if let Some(token) = &page {
            let Some(map) = request.as_object_mut() else {
                return Err(ProviderError::Decode {
                    operation: operation.to_string(),
                    message: "paginated listing needs object parameters".to_string(),
                });
            };
            map.insert(PAGE_PARAM.to_string(), Value::String(token.clone()));
        }

        let response = client.invoke(operation, request).await?;
        pages += 1;

        match response.get(ITEMS_FIELD) {
            Some(Value::Array(batch)) => items.extend(batch.iter().cloned()),
            // An empty page may come back as `{}`
            None | Some(Value::Null) => {}
            Some(_) => {
                return Err(ProviderError::Decode {
                    operation: operation.to_string(),
                    message: format!("`{ITEMS_FIELD}` is not an array"),
                });
            }
        }

        match response.get(NEXT_PAGE_FIELD).and_then(Value::as_str) {
            Some(token) if !token.is_empty() => page = Some(token.to_string()),
            _ => break,
        }
    }

    debug!(operation, pages, count = items.len(), "Listing complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_sweep_common::Provider;
    use oci_sweep_test_utils::{FakeProvider, page};
    use serde_json::json;

    #[tokio::test]
    async fn follows_continuation_tokens() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.on("list_vaults", |params, _| match params.get("page").and_then(Value::as_str) {
            None => Ok(page(vec![json!({"id": "v1"}), json!({"id": "v2"})], Some("p2"))),
            Some("p2") => Ok(page(vec![json!({"id": "v3"})], None)),
            Some(other) => panic!("unexpected page {other}"),
        });
        let client = provider.connect("key_management.KmsVaultClient", "r").unwrap();

        let items = list_all(&client, "list_vaults", json!({"compartmentId": "c"}))
            .await
            .unwrap();
        let ids: Vec<_> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);

        let calls = provider.calls_for("list_vaults");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].params["compartmentId"], "c");
    }

    #[tokio::test]
    async fn empty_object_is_empty_listing() {
        let provider = FakeProvider::new("us-ashburn-1");
        let client = provider.connect("x.Client", "r").unwrap();
        let items = list_all(&client, "list_things", json!({})).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn malformed_items_is_decode_error() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.respond("list_things", json!({"items": "nope"}));
        let client = provider.connect("x.Client", "r").unwrap();
        let err = list_all(&client, "list_things", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }
}
