//! Deletion Scheduler
//!
//! Orders the discovered kinds and drains them one at a time.
//!
//! ## Ordering
//!
//! A topological sort over the present kinds, where `K1.dependencies`
//! containing `K2` adds the edge "K1 before K2". Among the kinds that are
//! free to go, the one with the highest static priority goes first, ties
//! broken by name. Kinds caught in a dependency cycle are treated as one
//! group: the group goes when its best-ranked member would, its members in
//! rank order, and a warning is logged.
//!
//! ## Rounds
//!
//! Every resource of a kind is attempted concurrently (bounded by
//! `max_workers`). Resources that came back retryable are tried again in
//! the next round after a linear back-off, up to `max_retries` extra
//! rounds. The next kind starts only once the current one has no retryable
//! resources left.

use super::discovery::Discovered;
use super::executor::DeletionExecutor;
use super::progress::{ProgressTracker, ResourceState};
use super::report::{DeletionOutcome, KindReport, TeardownReport};
use crate::backoff::LinearBuilder;
use crate::config::RetryConfig;
use backon::BackoffBuilder;
use futures::stream::{self, StreamExt};
use oci_sweep_common::{DiscoveredResource, Provider, TypeRegistry};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

/// Order in which `kinds` are deleted, first to last
pub fn deletion_order<'a>(
    kinds: impl IntoIterator<Item = &'a str>,
    registry: &TypeRegistry,
) -> Vec<String> {
    let present: BTreeSet<&str> = kinds.into_iter().collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for &kind in &present {
        let Some(descriptor) = registry.lookup(kind) else {
            continue;
        };
        for &dep in descriptor.dependencies {
            if dep != kind && present.contains(dep) {
                successors.entry(kind).or_default().push(dep);
            }
        }
    }

    let rank = |kind: &'a str| (registry.priority(kind), Reverse(kind));

    // Kinds that can reach each other form one group, ordered by rank
    let reach: HashMap<&str, HashSet<&str>> = present
        .iter()
        .map(|k| (*k, reachable(*k, &successors)))
        .collect();
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&str>> = Vec::new();
    for &kind in &present {
        if group_of.contains_key(kind) {
            continue;
        }
        let mut members: Vec<&str> = present
            .iter()
            .copied()
            .filter(|other| *other == kind || (reach[kind].contains(other) && reach[other].contains(kind)))
            .collect();
        members.sort_by_key(|k| Reverse(rank(*k)));
        for member in &members {
            group_of.insert(*member, groups.len());
        }
        groups.push(members);
    }

    let mut edges: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); groups.len()];
    let mut indegree = vec![0usize; groups.len()];
    for (kind, deps) in &successors {
        let from = group_of[kind];
        for dep in deps {
            let to = group_of[dep];
            if from != to && edges[from].insert(to) {
                indegree[to] += 1;
            }
        }
    }

    // A group ranks as its best member
    let lead = |group: usize| rank(groups[group][0]);
    let mut ready: BinaryHeap<_> = (0..groups.len())
        .filter(|g| indegree[*g] == 0)
        .map(|g| (lead(g), g))
        .collect();

    let mut order = Vec::with_capacity(present.len());
    while let Some((_, group)) = ready.pop() {
        let members = &groups[group];
        if members.len() > 1 {
            warn!(kinds = ?members, "Dependency cycle between kinds, ordering them by rank");
        }
        order.extend(members.iter().map(|k| k.to_string()));

        for &next in &edges[group] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.push((lead(next), next));
            }
        }
    }
    order
}

fn reachable<'a>(from: &'a str, successors: &HashMap<&'a str, Vec<&'a str>>) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(kind) = stack.pop() {
        for &next in successors.get(kind).map(Vec::as_slice).unwrap_or_default() {
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    seen
}

/// Drains discovered kinds through the executor
pub struct DeletionScheduler<P: Provider> {
    executor: DeletionExecutor<P>,
    registry: Arc<TypeRegistry>,
    progress: Arc<ProgressTracker>,
    retry: RetryConfig,
}

impl<P: Provider> DeletionScheduler<P> {
    pub fn new(
        executor: DeletionExecutor<P>,
        registry: Arc<TypeRegistry>,
        progress: Arc<ProgressTracker>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            executor,
            registry,
            progress,
            retry,
        }
    }

    #[instrument(skip_all, fields(total = discovered.total()))]
    pub async fn run(&self, discovered: &Discovered) -> TeardownReport {
        let start = Instant::now();
        let order = deletion_order(discovered.kinds(), &self.registry);
        info!(order = ?order, "Deletion order");

        let mut report = TeardownReport::default();
        for kind in &order {
            let resources = discovered.get(kind).unwrap_or_default();
            self.progress.set_current_kind(Some(kind.as_str()));
            report.kinds.push(self.run_kind(kind, resources).await);
        }
        self.progress.set_current_kind(None);

        report.elapsed = start.elapsed();
        info!(
            removed = report.total_removed(),
            failed = report.total_failed(),
            elapsed = ?report.elapsed,
            "All kinds processed"
        );
        report
    }

    async fn run_kind(&self, kind: &str, resources: &[DiscoveredResource]) -> KindReport {
        let mut report = KindReport::new(kind);

        let Some(descriptor) = self.registry.lookup(kind) else {
            error!(kind, count = resources.len(), "No deletion contract for kind");
            let message = format!("no deletion contract for kind {kind}");
            for resource in resources {
                self.progress.update(
                    &resource.id,
                    &resource.display_name,
                    kind,
                    ResourceState::Failed,
                    Some(message.clone()),
                );
            }
            report.failed = resources.len();
            return report;
        };

        info!(kind, count = resources.len(), "Deleting kind");

        let mut pending: Vec<&DiscoveredResource> = resources.iter().collect();
        let mut delays = LinearBuilder::new(self.retry.base_delay)
            .with_max_times(self.retry.max_retries as usize)
            .build();

        for round in 0..=self.retry.max_retries {
            if pending.is_empty() {
                break;
            }
            if round > 0 {
                let Some(delay) = delays.next() else {
                    break;
                };
                info!(kind, round, pending = pending.len(), delay = ?delay, "Retrying after back-off");
                tokio::time::sleep(delay).await;
                report.retry_delays.push(delay);
            }
            report.rounds = round + 1;

            let width = self.retry.max_workers.min(pending.len()).max(1);
            let attempts: Vec<_> = stream::iter(pending.iter().copied())
                .map(|resource| async move {
                    let attempt = self.executor.attempt(resource, descriptor, round).await;
                    (resource, attempt)
                })
                .buffer_unordered(width)
                .collect()
                .await;

            pending = Vec::new();
            for (resource, attempt) in attempts {
                match attempt.outcome {
                    DeletionOutcome::Deleted => report.deleted += 1,
                    DeletionOutcome::Skipped => report.skipped += 1,
                    DeletionOutcome::RetryableFailure => pending.push(resource),
                    DeletionOutcome::TerminalFailure => report.failed += 1,
                }
            }
        }

        // Only reachable if the back-off schedule runs out early
        for resource in &pending {
            self.progress.update(
                &resource.id,
                &resource.display_name,
                kind,
                ResourceState::Failed,
                Some("retries exhausted".to_string()),
            );
        }
        report.failed += pending.len();

        if report.failed > 0 {
            warn!(
                kind,
                deleted = report.deleted,
                skipped = report.skipped,
                failed = report.failed,
                rounds = report.rounds,
                "Kind finished with failures"
            );
        } else {
            info!(
                kind,
                deleted = report.deleted,
                skipped = report.skipped,
                rounds = report.rounds,
                "Kind finished"
            );
        }
        report
    }
}
