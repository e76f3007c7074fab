//! Resource teardown orchestration
//!
//! A run goes through these phases, each owned by one submodule:
//! - discovery: find every live resource in the scope
//! - cleanup: sever back-references that would deadlock deletion
//! - scheduler: order kinds and drain them in retry rounds
//! - executor: delete one resource once and classify the result
//! - finalizer: delete the scope itself when nothing failed
//!
//! `progress` is the shared ledger every phase reports into, and `report`
//! holds what a run returns.

pub mod cleanup;
pub mod confirm;
pub mod discovery;
pub mod executor;
pub mod finalizer;
pub mod progress;
pub mod report;
pub mod scheduler;

pub use confirm::{AutoConfirm, Confirmer};
pub use discovery::Discovered;
pub use progress::{ProgressEntry, ProgressSnapshot, ProgressTracker, ResourceState, RunPhase, RunProgress};
pub use report::{FinalizeOutcome, KindReport, TeardownOutcome, TeardownReport};

use crate::config::TeardownConfig;
use crate::oci::identity::IdentityScope;
use crate::oci::{OciContext, clients};
use anyhow::{Result, bail};
use discovery::DiscoveryEngine;
use executor::DeletionExecutor;
use finalizer::ScopeFinalizer;
use oci_sweep_common::{Provider, TypeRegistry};
use scheduler::{DeletionScheduler, deletion_order};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Entry point for discovery and teardown of one scope
pub struct Orchestrator<P: Provider> {
    ctx: Arc<OciContext<P>>,
    registry: Arc<TypeRegistry>,
    progress: Arc<ProgressTracker>,
    confirmer: Arc<dyn Confirmer>,
    regions: Vec<String>,
}

impl<P: Provider> Orchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            ctx: Arc::new(OciContext::new(provider)),
            registry: Arc::new(TypeRegistry::builtin().clone()),
            progress: Arc::new(ProgressTracker::new()),
            confirmer: Arc::new(AutoConfirm),
            regions: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Regions listed for kinds search does not cover (home region if empty)
    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    /// Consulted before mutating anything, unless the run is forced
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// The live ledger, for polling front ends
    pub fn progress(&self) -> Arc<ProgressTracker> {
        self.progress.clone()
    }

    pub fn context(&self) -> &OciContext<P> {
        &self.ctx
    }

    /// Every live resource in `scope`, grouped by kind
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn discover(&self, scope: &str) -> Result<Discovered> {
        if scope.trim().is_empty() {
            bail!("Scope id must not be empty");
        }
        let engine = DiscoveryEngine::new(
            self.ctx.clone(),
            self.registry.clone(),
            self.regions.clone(),
        );
        Ok(engine.discover(scope).await)
    }

    /// Kinds in deletion order, with how many resources each holds
    pub fn deletion_plan(&self, discovered: &Discovered) -> Vec<(String, usize)> {
        deletion_order(discovered.kinds(), &self.registry)
            .into_iter()
            .map(|kind| {
                let count = discovered.get(&kind).map_or(0, <[_]>::len);
                (kind, count)
            })
            .collect()
    }

    /// Discover, then tear down everything found.
    pub async fn run_teardown(&self, scope: &str, config: &TeardownConfig) -> Result<TeardownOutcome> {
        let run_id = Uuid::new_v4();
        self.progress.reset(run_id);
        self.progress.set_phase(RunPhase::Discovering);

        let result = match self.discover(scope).await {
            Ok(discovered) => self.teardown(run_id, scope, discovered, config).await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.progress.set_phase(RunPhase::Error);
        }
        result
    }

    /// Tear down an already discovered scope as a new run.
    pub async fn teardown_discovered(
        &self,
        scope: &str,
        discovered: Discovered,
        config: &TeardownConfig,
    ) -> Result<TeardownOutcome> {
        let run_id = Uuid::new_v4();
        self.progress.reset(run_id);
        self.teardown(run_id, scope, discovered, config).await
    }

    #[instrument(skip_all, fields(run_id = %run_id, scope = %scope, resources = discovered.total()))]
    async fn teardown(
        &self,
        run_id: Uuid,
        scope: &str,
        discovered: Discovered,
        config: &TeardownConfig,
    ) -> Result<TeardownOutcome> {
        for resource in discovered.resources() {
            self.progress.register(resource);
        }

        let mut outcome = TeardownOutcome {
            run_id,
            discovered: discovered.total(),
            report: TeardownReport::default(),
            finalize: None,
            cancelled: false,
            dry_run: config.flags.dry_run,
        };

        if config.flags.dry_run {
            info!("Dry run, nothing will be deleted");
            self.progress.set_phase(RunPhase::Complete);
            return Ok(outcome);
        }

        if discovered.is_empty() {
            info!("Nothing to delete in scope");
        } else {
            if !config.flags.force && !self.confirmer.confirm_teardown(&discovered) {
                warn!("Teardown declined");
                self.progress.set_phase(RunPhase::Cancelled);
                outcome.cancelled = true;
                return Ok(outcome);
            }

            self.progress.set_phase(RunPhase::Cleanup);
            cleanup::sever_back_references(self.ctx.as_ref(), &discovered, config.cleanup_pause).await;

            self.progress.set_phase(RunPhase::Deleting);
            let executor = DeletionExecutor::new(
                self.ctx.clone(),
                self.progress.clone(),
                scope,
                &config.retry,
                config.wait.clone(),
            );
            let scheduler = DeletionScheduler::new(
                executor,
                self.registry.clone(),
                self.progress.clone(),
                config.retry.clone(),
            );
            outcome.report = scheduler.run(&discovered).await;
        }

        if config.flags.delete_scope {
            self.progress.set_phase(RunPhase::Finalizing);
            let failed = outcome.report.total_failed();
            outcome.finalize = Some(self.finalize(scope, failed, config.flags.force).await);
        }

        self.progress.set_phase(RunPhase::Complete);
        info!(
            removed = outcome.report.total_removed(),
            failed = outcome.report.total_failed(),
            "Teardown complete"
        );
        Ok(outcome)
    }

    async fn finalize(&self, scope: &str, failed: usize, force: bool) -> FinalizeOutcome {
        let client = match self.ctx.client(clients::IDENTITY, self.ctx.home_region()) {
            Ok(client) => client,
            Err(e) => return FinalizeOutcome::Failed(e.to_string()),
        };
        let mut finalizer = ScopeFinalizer::new(IdentityScope::new(client));
        if !force {
            finalizer = finalizer.with_confirmation(self.confirmer.clone());
        }
        finalizer.finalize(scope, failed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci_sweep_test_utils::{FakeProvider, page, search_item};
    use serde_json::json;

    struct Decline;

    impl Confirmer for Decline {
        fn confirm_teardown(&self, _: &Discovered) -> bool {
            false
        }
        fn confirm_scope_deletion(&self, _: &str) -> bool {
            false
        }
    }

    fn provider_with(items: Vec<serde_json::Value>) -> FakeProvider {
        let provider = FakeProvider::new("us-ashburn-1");
        provider.respond("search_resources", page(items, None));
        provider
    }

    #[tokio::test]
    async fn empty_scope_id_is_rejected() {
        let orchestrator = Orchestrator::new(FakeProvider::new("us-ashburn-1"));
        assert!(orchestrator.discover("  ").await.is_err());
        assert!(
            orchestrator
                .run_teardown("", &TeardownConfig::default())
                .await
                .is_err()
        );
        assert_eq!(orchestrator.progress().phase(), RunPhase::Error);
    }

    #[tokio::test]
    async fn dry_run_mutates_nothing() {
        let provider = provider_with(vec![
            search_item("Vcn", "v", "main"),
            search_item("Instance", "i", "web"),
        ]);
        let orchestrator = Orchestrator::new(provider.clone());
        let mut config = TeardownConfig::default();
        config.flags.dry_run = true;
        config.flags.delete_scope = true;

        let outcome = orchestrator.run_teardown("scope", &config).await.unwrap();
        assert!(outcome.dry_run);
        assert_eq!(outcome.discovered, 2);
        assert!(outcome.finalize.is_none());
        assert!(
            provider
                .calls()
                .iter()
                .all(|c| c.operation.starts_with("search") || c.operation.starts_with("list"))
        );
    }

    #[tokio::test]
    async fn declined_confirmation_cancels() {
        let provider = provider_with(vec![search_item("Vcn", "v", "main")]);
        let orchestrator = Orchestrator::new(provider.clone()).with_confirmer(Arc::new(Decline));

        let outcome = orchestrator
            .run_teardown("scope", &TeardownConfig::default())
            .await
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(orchestrator.progress().phase(), RunPhase::Cancelled);
        assert_eq!(provider.call_count("delete_vcn"), 0);
    }

    #[tokio::test]
    async fn force_skips_confirmation() {
        let provider = provider_with(vec![search_item("Vcn", "v", "main")]);
        let orchestrator = Orchestrator::new(provider.clone()).with_confirmer(Arc::new(Decline));
        let mut config = TeardownConfig::default();
        config.flags.force = true;

        let outcome = orchestrator.run_teardown("scope", &config).await.unwrap();
        assert!(!outcome.cancelled);
        assert_eq!(provider.call_count("delete_vcn"), 1);
        assert_eq!(orchestrator.progress().phase(), RunPhase::Complete);
    }

    #[tokio::test]
    async fn empty_scope_still_finalizes() {
        let provider = provider_with(vec![]);
        provider.respond("get_compartment", json!({"lifecycleState": "ACTIVE"}));
        let orchestrator = Orchestrator::new(provider.clone());
        let mut config = TeardownConfig::default();
        config.flags.force = true;
        config.flags.delete_scope = true;

        let outcome = orchestrator.run_teardown("scope", &config).await.unwrap();
        assert_eq!(outcome.finalize, Some(FinalizeOutcome::Deleted));
        assert_eq!(provider.calls_for("delete_compartment")[0].params["id"], "scope");
    }

    #[tokio::test]
    async fn each_run_starts_a_fresh_ledger() {
        let provider = provider_with(vec![
            search_item("Vcn", "v1", "main"),
            search_item("Bastion", "b", "jump"),
        ]);
        provider.fail(
            "delete_bastion",
            oci_sweep_common::ProviderError::from_status(500, None, "InternalServerError"),
        );
        provider.respond("get_compartment", json!({"lifecycleState": "ACTIVE"}));
        let orchestrator = Orchestrator::new(provider.clone());
        let mut config = TeardownConfig::default();
        config.flags.force = true;
        config.flags.delete_scope = true;

        let first = orchestrator.run_teardown("scope", &config).await.unwrap();
        assert!(matches!(first.finalize, Some(FinalizeOutcome::Skipped(_))));
        assert_eq!(orchestrator.progress().snapshot().failed_count, 1);

        let discovered: Discovered = std::iter::once(oci_sweep_test_utils::resource("Vcn", "v2")).collect();
        let second = orchestrator
            .teardown_discovered("scope", discovered, &config)
            .await
            .unwrap();

        assert_ne!(second.run_id, first.run_id);
        assert_eq!(second.finalize, Some(FinalizeOutcome::Deleted));
        let progress = orchestrator.progress().snapshot();
        assert_eq!(progress.total_resources, 1);
        assert_eq!(progress.failed_count, 0);
        assert!(orchestrator.progress().get("b").is_none());
        assert_eq!(orchestrator.progress().run_id(), Some(second.run_id));
    }

    #[tokio::test]
    async fn deletion_plan_follows_order() {
        let orchestrator = Orchestrator::new(FakeProvider::new("us-ashburn-1"));
        let discovered: Discovered = vec![
            oci_sweep_test_utils::resource("Vcn", "v"),
            oci_sweep_test_utils::resource("Instance", "i1"),
            oci_sweep_test_utils::resource("Instance", "i2"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            orchestrator.deletion_plan(&discovered),
            vec![("Instance".to_string(), 2), ("Vcn".to_string(), 1)]
        );
    }
}
