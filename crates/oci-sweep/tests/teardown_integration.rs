//! End-to-end teardown runs against the scripted provider
//!
//! Every test drives the public `Orchestrator` API with a `FakeProvider`
//! and checks the resulting report, progress ledger and call log. Tests run
//! on a paused clock so retry back-off elapses instantly.

use oci_sweep::Orchestrator;
use oci_sweep::config::{RetryConfig, TeardownConfig};
use oci_sweep::teardown::{FinalizeOutcome, ResourceState, RunPhase};
use oci_sweep_common::ProviderError;
use oci_sweep_test_utils::{FakeProvider, page, search_item, test_scope_id};
use serde_json::{Value, json};
use std::time::Duration;

const HOME: &str = "us-ashburn-1";

fn provider_with(items: Vec<Value>) -> FakeProvider {
    let provider = FakeProvider::new(HOME);
    provider.respond("search_resources", page(items, None));
    provider
}

fn forced() -> TeardownConfig {
    let mut config = TeardownConfig::default();
    config.flags.force = true;
    config
}

#[tokio::test(start_paused = true)]
async fn bucket_deleted_and_vnics_ignored() {
    let provider = provider_with(vec![
        search_item("Vnic", "ocid1.vnic.oc1..a", "a"),
        search_item("Vnic", "ocid1.vnic.oc1..b", "b"),
        search_item("Vnic", "ocid1.vnic.oc1..c", "c"),
        search_item("Bucket", "ocid1.bucket.oc1..logs", "logs"),
    ]);
    provider.respond("get_namespace", json!("tenancy-ns"));
    provider.respond(
        "list_objects",
        json!({"objects": [{"name": "2024/01/app.log"}, {"name": "2024/02/app.log"}]}),
    );
    provider.respond(
        "list_multipart_uploads",
        page(vec![json!({"object": "big.tar", "uploadId": "u1"})], None),
    );
    provider.respond(
        "list_preauthenticated_requests",
        page(vec![json!({"id": "par1"})], None),
    );

    let orchestrator = Orchestrator::new(provider.clone());
    let scope = test_scope_id();

    let discovered = orchestrator.discover(&scope).await.unwrap();
    assert_eq!(discovered.total(), 1);
    assert!(discovered.get("Vnic").is_none());

    let outcome = orchestrator.run_teardown(&scope, &forced()).await.unwrap();
    let progress = orchestrator.progress().snapshot();
    assert_eq!(progress.deleted_count, 1);
    assert_eq!(progress.failed_count, 0);
    assert_eq!(outcome.report.total_removed(), 1);

    assert_eq!(provider.call_count("delete_object"), 2);
    assert_eq!(provider.call_count("abort_multipart_upload"), 1);
    assert_eq!(provider.call_count("delete_preauthenticated_request"), 1);
    let delete = &provider.calls_for("delete_bucket")[0];
    assert_eq!(delete.params["bucketName"], "logs");
    assert_eq!(provider.call_count("delete_vnic"), 0);
}

#[tokio::test(start_paused = true)]
async fn volume_conflicts_then_disappears() {
    let provider = provider_with(vec![search_item("Volume", "ocid1.volume.oc1..v", "data")]);
    provider.on("delete_volume", |_, call| {
        if call < 3 {
            Err(ProviderError::conflict(
                "Volume may not be deleted while attached to an instance",
            ))
        } else {
            Err(ProviderError::not_found("NotAuthorizedOrNotFound"))
        }
    });

    let orchestrator = Orchestrator::new(provider.clone());
    let outcome = orchestrator
        .run_teardown(&test_scope_id(), &forced())
        .await
        .unwrap();

    let entry = orchestrator.progress().get("ocid1.volume.oc1..v").unwrap();
    assert_eq!(entry.state, ResourceState::Deleted);
    assert_eq!(entry.attempts, 4);
    assert_eq!(outcome.report.total_failed(), 0);
    assert_eq!(outcome.report.kinds[0].rounds, 4);
}

#[tokio::test(start_paused = true)]
async fn persistent_conflicts_fail_after_bounded_rounds() {
    let ids: Vec<String> = (0..5).map(|i| format!("ocid1.subnet.oc1..s{i}")).collect();
    let provider = provider_with(ids.iter().map(|id| search_item("Subnet", id, "net")).collect());
    provider.fail(
        "delete_subnet",
        ProviderError::conflict("The Subnet has references to a VNIC"),
    );

    let orchestrator = Orchestrator::new(provider.clone());
    let config = TeardownConfig {
        retry: RetryConfig {
            max_retries: 2,
            max_workers: 10,
            base_delay: Duration::from_secs(3),
        },
        ..forced()
    };
    let outcome = orchestrator.run_teardown(&test_scope_id(), &config).await.unwrap();

    // One pass plus two retry rounds
    assert_eq!(provider.call_count("delete_subnet"), 15);
    let subnet = &outcome.report.kinds[0];
    assert_eq!(subnet.failed, 5);
    assert_eq!(
        subnet.retry_delays,
        vec![Duration::from_secs(3), Duration::from_secs(6)]
    );
    assert!(subnet.retry_delays.windows(2).all(|w| w[0] < w[1]));

    // Rounds are separated on the clock by the recorded delays
    let calls = provider.calls_for("delete_subnet");
    let first_of_round = |round: usize| calls[round * 5].at;
    assert!(first_of_round(1) - first_of_round(0) >= Duration::from_secs(3));
    assert!(first_of_round(2) - first_of_round(1) >= Duration::from_secs(6));

    for id in &ids {
        assert_eq!(orchestrator.progress().get(id).unwrap().state, ResourceState::Failed);
    }
    assert_eq!(orchestrator.progress().snapshot().failed_count, 5);
}

#[tokio::test(start_paused = true)]
async fn dependents_finish_before_dependencies_start() {
    let provider = provider_with(vec![
        search_item("Vcn", "vcn", "main"),
        search_item("Subnet", "subnet", "private"),
        search_item("Instance", "i1", "web"),
        search_item("Instance", "i2", "db"),
    ]);
    // One instance needs a retry round before it goes
    provider.on("terminate_instance", |params, _| {
        static FIRST: std::sync::Once = std::sync::Once::new();
        let mut conflict = false;
        if params["id"] == "i2" {
            FIRST.call_once(|| conflict = true);
        }
        if conflict {
            Err(ProviderError::conflict("Instance is still stopping"))
        } else {
            Ok(json!({}))
        }
    });

    let orchestrator = Orchestrator::new(provider.clone());
    let outcome = orchestrator
        .run_teardown(&test_scope_id(), &forced())
        .await
        .unwrap();
    assert_eq!(outcome.report.total_failed(), 0);

    let ops: Vec<String> = provider.calls().into_iter().map(|c| c.operation).collect();
    let last = |op: &str| ops.iter().rposition(|o| o == op).unwrap();
    let first = |op: &str| ops.iter().position(|o| o == op).unwrap();

    assert!(last("terminate_instance") < first("delete_subnet"));
    assert!(last("delete_subnet") < first("delete_vcn"));
    assert_eq!(provider.call_count("terminate_instance"), 3);
}

#[tokio::test]
async fn not_found_counts_as_deleted() {
    let provider = provider_with(vec![search_item("NatGateway", "nat", "nat")]);
    provider.fail("delete_nat_gateway", ProviderError::not_found("gone"));

    let orchestrator = Orchestrator::new(provider.clone());
    orchestrator
        .run_teardown(&test_scope_id(), &forced())
        .await
        .unwrap();

    let progress = orchestrator.progress();
    assert_eq!(progress.get("nat").unwrap().state, ResourceState::Deleted);
    assert_eq!(progress.snapshot().deleted_count, 1);
    assert_eq!(progress.snapshot().failed_count, 0);
}

#[tokio::test]
async fn failures_block_scope_deletion() {
    let provider = provider_with(vec![
        search_item("Vcn", "vcn", "main"),
        search_item("Bastion", "bastion", "jump"),
    ]);
    provider.fail(
        "delete_bastion",
        ProviderError::from_status(500, None, "InternalServerError"),
    );
    provider.respond("get_compartment", json!({"lifecycleState": "ACTIVE"}));

    let orchestrator = Orchestrator::new(provider.clone());
    let mut config = forced();
    config.flags.delete_scope = true;
    let outcome = orchestrator.run_teardown(&test_scope_id(), &config).await.unwrap();

    assert!(matches!(outcome.finalize, Some(FinalizeOutcome::Skipped(_))));
    assert_eq!(provider.call_count("get_compartment"), 0);
    assert_eq!(provider.call_count("delete_compartment"), 0);
    assert_eq!(provider.call_count("delete_vcn"), 1);
}

#[tokio::test]
async fn clean_run_deletes_scope() {
    let provider = provider_with(vec![search_item("Vcn", "vcn", "main")]);
    provider.respond("get_compartment", json!({"lifecycleState": "ACTIVE"}));

    let orchestrator = Orchestrator::new(provider.clone());
    let scope = test_scope_id();
    let mut config = forced();
    config.flags.delete_scope = true;
    let outcome = orchestrator.run_teardown(&scope, &config).await.unwrap();

    assert_eq!(outcome.finalize, Some(FinalizeOutcome::Deleted));
    let delete = &provider.calls_for("delete_compartment")[0];
    assert_eq!(delete.params["id"], scope.as_str());
    assert_eq!(delete.region, HOME);
}

#[tokio::test]
async fn search_outage_yields_empty_complete_run() {
    let provider = FakeProvider::new(HOME);
    provider.fail(
        "search_resources",
        ProviderError::Transport("connection refused".into()),
    );

    let orchestrator = Orchestrator::new(provider.clone());
    let outcome = orchestrator
        .run_teardown(&test_scope_id(), &forced())
        .await
        .unwrap();

    assert_eq!(outcome.discovered, 0);
    let progress = orchestrator.progress().snapshot();
    assert_eq!(progress.processed_count, 0);
    assert_eq!(progress.current_phase, RunPhase::Complete);
    assert!(
        provider
            .calls()
            .iter()
            .all(|c| c.operation == "search_resources")
    );
}

#[tokio::test]
async fn repeated_reports_count_once() {
    let provider = provider_with(vec![search_item("Vcn", "vcn", "main")]);
    let orchestrator = Orchestrator::new(provider.clone());
    orchestrator
        .run_teardown(&test_scope_id(), &forced())
        .await
        .unwrap();

    let progress = orchestrator.progress();
    let before = progress.snapshot();
    assert!(!progress.update("vcn", "main", "Vcn", ResourceState::Deleted, None));
    assert!(!progress.update("vcn", "main", "Vcn", ResourceState::Failed, Some("late".into())));
    assert_eq!(progress.snapshot(), before);
}

#[tokio::test]
async fn snapshot_serializes_for_front_ends() {
    let provider = provider_with(vec![search_item("Vcn", "vcn", "main")]);
    let orchestrator = Orchestrator::new(provider);
    orchestrator
        .run_teardown(&test_scope_id(), &forced())
        .await
        .unwrap();

    let json = serde_json::to_value(orchestrator.progress().progress_snapshot()).unwrap();
    assert_eq!(json["totalResources"], 1);
    assert_eq!(json["currentPhase"], "complete");
    assert_eq!(json["resources"][0]["state"], "deleted");
    assert!(json["runId"].is_string());
}
