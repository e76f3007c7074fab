//! Pre-Teardown Cleanup
//!
//! Route tables hold rules that target gateways, while those gateways can't
//! be deleted while a rule points at them. Clearing the rules up front
//! breaks the cycle. Nothing here is fatal; the worst case is a few extra
//! retry rounds later on.

use super::discovery::Discovered;
use crate::oci::network::clear_route_rules;
use crate::oci::{OciContext, clients};
use oci_sweep_common::{DiscoveredResource, Provider, ProviderError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Kind whose resources hold back-references to gateways
pub const ROUTE_TABLE_KIND: &str = "RouteTable";

/// What the cleanup pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Resources that had references removed
    pub cleared: usize,
    /// Resources already clear or already gone
    pub already_clear: usize,
    pub failed: usize,
}

/// Clear route rules on every discovered route table.
///
/// Pauses for `pause` after each table that actually changed.
#[instrument(skip_all)]
pub async fn sever_back_references<P: Provider>(
    ctx: &OciContext<P>,
    discovered: &Discovered,
    pause: Duration,
) -> CleanupSummary {
    let mut summary = CleanupSummary::default();
    let Some(tables) = discovered.get(ROUTE_TABLE_KIND) else {
        return summary;
    };

    for table in tables {
        match clear_one(ctx, table).await {
            Ok(0) => summary.already_clear += 1,
            Ok(rules) => {
                info!(
                    resource_id = %table.id,
                    name = %table.display_name,
                    rules,
                    "Cleared route rules"
                );
                summary.cleared += 1;
                tokio::time::sleep(pause).await;
            }
            Err(e) if e.is_not_found() => {
                debug!(resource_id = %table.id, "Route table already gone");
                summary.already_clear += 1;
            }
            Err(e) => {
                warn!(resource_id = %table.id, error = %e, "Could not clear route rules");
                summary.failed += 1;
            }
        }
    }

    if summary.cleared > 0 || summary.failed > 0 {
        info!(
            cleared = summary.cleared,
            failed = summary.failed,
            "Back-reference cleanup done"
        );
    }
    summary
}

async fn clear_one<P: Provider>(
    ctx: &OciContext<P>,
    table: &DiscoveredResource,
) -> Result<usize, ProviderError> {
    let client = ctx.client(clients::NETWORK, &table.region)?;
    clear_route_rules(client.as_ref(), &table.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_sweep_test_utils::{FakeProvider, resource};
    use serde_json::json;

    fn discovered(ids: &[&str]) -> Discovered {
        ids.iter().map(|id| resource(ROUTE_TABLE_KIND, id)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn clears_tables_with_rules_and_pauses() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.on("get_route_table", |params, _| match params["id"].as_str() {
            Some("rt-full") => Ok(json!({"routeRules": [{"networkEntityId": "igw"}]})),
            _ => Ok(json!({"routeRules": []})),
        });
        let ctx = OciContext::new(provider.clone());

        let start = tokio::time::Instant::now();
        let summary = sever_back_references(
            &ctx,
            &discovered(&["rt-full", "rt-empty"]),
            Duration::from_millis(500),
        )
        .await;

        assert_eq!(
            summary,
            CleanupSummary {
                cleared: 1,
                already_clear: 1,
                failed: 0
            }
        );
        let update = &provider.calls_for("update_route_table")[0];
        assert_eq!(update.params["id"], "rt-full");
        assert_eq!(provider.call_count("update_route_table"), 1);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn missing_table_is_noop() {
        // Unscripted get_* answers not-found
        let provider = FakeProvider::new("us-ashburn-1");
        let ctx = OciContext::new(provider.clone());

        let summary = sever_back_references(&ctx, &discovered(&["rt"]), Duration::ZERO).await;
        assert_eq!(summary.already_clear, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(provider.call_count("update_route_table"), 0);
    }

    #[tokio::test]
    async fn failures_are_not_fatal() {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.respond("get_route_table", json!({"routeRules": [{}]}));
        provider.fail(
            "update_route_table",
            ProviderError::from_status(500, None, "InternalError"),
        );
        let ctx = OciContext::new(provider.clone());

        let summary = sever_back_references(&ctx, &discovered(&["a", "b"]), Duration::ZERO).await;
        assert_eq!(summary.failed, 2);
        assert_eq!(provider.call_count("get_route_table"), 2);
    }

    #[tokio::test]
    async fn nothing_to_do_without_route_tables() {
        let provider = FakeProvider::new("us-ashburn-1");
        let ctx = OciContext::new(provider.clone());
        let only_vcn: Discovered = vec![resource("Vcn", "v")].into_iter().collect();

        let summary = sever_back_references(&ctx, &only_vcn, Duration::ZERO).await;
        assert_eq!(summary, CleanupSummary::default());
        assert!(provider.calls().is_empty());
    }
}
