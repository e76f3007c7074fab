//! Progress Tracker
//!
//! Concurrency-safe ledger of per-resource state plus aggregate counters.
//! Deletion workers write to it concurrently; front ends poll it.
//!
//! ## Locking
//!
//! - The entry map sits behind an `RwLock` that is only write-locked to add
//!   a resource. Updates take the read lock.
//! - Each entry has its own `Mutex`, so updates to unrelated resources never
//!   contend with each other.
//! - Aggregate counters are atomics, bumped while the entry lock is held so
//!   that a transition is counted exactly once.
//!
//! ## State machine
//!
//! `Pending → Deleting → {Deleted | Failed}`. Deleted and Failed are final:
//! later reports for the same resource are ignored and never touch the
//! counters.

use oci_sweep_common::DiscoveredResource;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use uuid::Uuid;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Per-resource state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Pending,
    Deleting,
    Deleted,
    Failed,
}

impl ResourceState {
    /// Deleted or Failed
    pub fn is_final(&self) -> bool {
        matches!(self, ResourceState::Deleted | ResourceState::Failed)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceState::Pending => "pending",
            ResourceState::Deleting => "deleting",
            ResourceState::Deleted => "deleted",
            ResourceState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Phase of the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    #[default]
    Idle,
    Discovering,
    Cleanup,
    Deleting,
    Finalizing,
    Complete,
    Cancelled,
    Error,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Discovering => "discovering",
            RunPhase::Cleanup => "cleanup",
            RunPhase::Deleting => "deleting",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Complete => "complete",
            RunPhase::Cancelled => "cancelled",
            RunPhase::Error => "error",
        };
        f.write_str(s)
    }
}

/// One resource's row in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub resource_id: String,
    pub display_name: String,
    pub kind: String,
    pub state: ResourceState,
    pub last_error: Option<String>,
    /// Delete attempts made so far
    pub attempts: u32,
}

/// Aggregate counters and run status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProgress {
    pub total_resources: usize,
    pub processed_count: usize,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub current_phase: RunPhase,
    pub current_kind: Option<String>,
    pub current_resource: Option<String>,
}

/// Everything a polling front end shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub run_id: Option<Uuid>,
    #[serde(flatten)]
    pub progress: RunProgress,
    pub resources: Vec<ProgressEntry>,
}

#[derive(Debug, Default)]
struct Status {
    run_id: Option<Uuid>,
    phase: RunPhase,
    kind: Option<String>,
    resource: Option<String>,
}

/// The ledger
#[derive(Debug, Default)]
pub struct ProgressTracker {
    entries: RwLock<HashMap<String, Arc<Mutex<ProgressEntry>>>>,
    total: AtomicUsize,
    processed: AtomicUsize,
    deleted: AtomicUsize,
    failed: AtomicUsize,
    status: Mutex<Status>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything and start a new run
    pub fn reset(&self, run_id: Uuid) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.total.store(0, Ordering::SeqCst);
        self.processed.store(0, Ordering::SeqCst);
        self.deleted.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        *lock(&self.status) = Status {
            run_id: Some(run_id),
            ..Default::default()
        };
    }

    /// Add `resource` as Pending. Registering the same id twice is a no-op.
    pub fn register(&self, resource: &DiscoveredResource) {
        self.entry_or_insert(&resource.id, &resource.display_name, &resource.kind);
    }

    fn entry(&self, id: &str) -> Option<Arc<Mutex<ProgressEntry>>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn entry_or_insert(&self, id: &str, name: &str, kind: &str) -> Arc<Mutex<ProgressEntry>> {
        if let Some(entry) = self.entry(id) {
            return entry;
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(id.to_string())
            .or_insert_with(|| {
                self.total.fetch_add(1, Ordering::SeqCst);
                Arc::new(Mutex::new(ProgressEntry {
                    resource_id: id.to_string(),
                    display_name: name.to_string(),
                    kind: kind.to_string(),
                    state: ResourceState::Pending,
                    last_error: None,
                    attempts: 0,
                }))
            })
            .clone()
    }

    /// Move a resource to `state`.
    ///
    /// Unknown ids are registered on the fly. Returns `false` when the
    /// transition was ignored (the entry is already final, or `state` would
    /// move it backwards).
    pub fn update(
        &self,
        id: &str,
        name: &str,
        kind: &str,
        state: ResourceState,
        error: Option<String>,
    ) -> bool {
        let entry = self.entry_or_insert(id, name, kind);
        let mut entry = lock(&entry);

        let previous = entry.state;
        if previous.is_final() || (state == ResourceState::Pending && previous != state) {
            return false;
        }

        entry.state = state;
        if error.is_some() {
            entry.last_error = error;
        }

        if previous == ResourceState::Pending && state != ResourceState::Pending {
            self.processed.fetch_add(1, Ordering::SeqCst);
        }
        match state {
            ResourceState::Deleted => {
                self.deleted.fetch_add(1, Ordering::SeqCst);
            }
            ResourceState::Failed => {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
            ResourceState::Deleting if previous == ResourceState::Pending => {
                lock(&self.status).resource = Some(name.to_string());
            }
            _ => {}
        }
        true
    }

    /// Count one delete attempt against `id`
    pub fn record_attempt(&self, id: &str) {
        if let Some(entry) = self.entry(id) {
            lock(&entry).attempts += 1;
        }
    }

    pub fn set_phase(&self, phase: RunPhase) {
        lock(&self.status).phase = phase;
    }

    pub fn set_current_kind(&self, kind: Option<&str>) {
        lock(&self.status).kind = kind.map(str::to_string);
    }

    pub fn phase(&self) -> RunPhase {
        lock(&self.status).phase
    }

    /// Id given to the current run by [`ProgressTracker::reset`]
    pub fn run_id(&self) -> Option<Uuid> {
        lock(&self.status).run_id
    }

    /// Current row for `id`
    pub fn get(&self, id: &str) -> Option<ProgressEntry> {
        self.entry(id).map(|e| lock(&e).clone())
    }

    /// Aggregate counters and status
    pub fn snapshot(&self) -> RunProgress {
        let status = lock(&self.status);
        RunProgress {
            total_resources: self.total.load(Ordering::SeqCst),
            processed_count: self.processed.load(Ordering::SeqCst),
            deleted_count: self.deleted.load(Ordering::SeqCst),
            failed_count: self.failed.load(Ordering::SeqCst),
            current_phase: status.phase,
            current_kind: status.kind.clone(),
            current_resource: status.resource.clone(),
        }
    }

    /// All rows, sorted by kind then name
    pub fn entries(&self) -> Vec<ProgressEntry> {
        let handles: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();

        let mut rows: Vec<_> = handles.iter().map(|e| lock(e).clone()).collect();
        rows.sort_by(|a, b| {
            (a.kind.as_str(), a.display_name.as_str(), a.resource_id.as_str()).cmp(&(
                b.kind.as_str(),
                b.display_name.as_str(),
                b.resource_id.as_str(),
            ))
        });
        rows
    }

    /// Counters plus every row, ready to serialize
    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        // Status lock must be released before snapshot() takes it again
        let run_id = self.run_id();
        ProgressSnapshot {
            run_id,
            progress: self.snapshot(),
            resources: self.entries(),
        }
    }
}
