//! Outcomes and reports produced by a run

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Result of one delete attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionOutcome {
    Deleted,
    /// Already gone, or removed by its parent
    Skipped,
    RetryableFailure,
    TerminalFailure,
}

impl fmt::Display for DeletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeletionOutcome::Deleted => "deleted",
            DeletionOutcome::Skipped => "skipped",
            DeletionOutcome::RetryableFailure => "retryable failure",
            DeletionOutcome::TerminalFailure => "terminal failure",
        };
        f.write_str(s)
    }
}

/// One `(resource, round)` attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionAttempt {
    pub resource_id: String,
    /// Zero-based round the attempt ran in
    pub attempt_number: u32,
    pub outcome: DeletionOutcome,
    pub error_detail: Option<String>,
}

/// Per-kind totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindReport {
    pub kind: String,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Rounds actually run, including the first pass
    pub rounds: u32,
    /// Sleeps taken before each retry round
    #[serde(serialize_with = "serialize_secs")]
    pub retry_delays: Vec<Duration>,
}

fn serialize_secs<S: serde::Serializer>(delays: &[Duration], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(delays.iter().map(Duration::as_secs_f64))
}

impl KindReport {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    /// Deleted plus skipped
    pub fn removed(&self) -> usize {
        self.deleted + self.skipped
    }
}

/// Scheduler result
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownReport {
    /// In deletion order
    pub kinds: Vec<KindReport>,
    #[serde(serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

fn serialize_elapsed<S: serde::Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64())
}

impl TeardownReport {
    pub fn total_removed(&self) -> usize {
        self.kinds.iter().map(KindReport::removed).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.kinds.iter().map(|k| k.failed).sum()
    }

    /// Kinds with at least one failure
    pub fn failed_kinds(&self) -> impl Iterator<Item = &KindReport> {
        self.kinds.iter().filter(|k| k.failed > 0)
    }
}

/// What happened to the scope itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum FinalizeOutcome {
    Deleted,
    AlreadyGone,
    Skipped(String),
    Failed(String),
}

impl fmt::Display for FinalizeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalizeOutcome::Deleted => f.write_str("deletion initiated"),
            FinalizeOutcome::AlreadyGone => f.write_str("already gone"),
            FinalizeOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            FinalizeOutcome::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownOutcome {
    pub run_id: Uuid,
    pub discovered: usize,
    pub report: TeardownReport,
    pub finalize: Option<FinalizeOutcome>,
    /// Confirmation declined, nothing was mutated
    pub cancelled: bool,
    /// Planned only, nothing was mutated
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals() {
        let report = TeardownReport {
            kinds: vec![
                KindReport {
                    deleted: 2,
                    skipped: 1,
                    ..KindReport::new("Instance")
                },
                KindReport {
                    failed: 3,
                    ..KindReport::new("Subnet")
                },
            ],
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(report.total_removed(), 3);
        assert_eq!(report.total_failed(), 3);
        let failed: Vec<_> = report.failed_kinds().map(|k| k.kind.as_str()).collect();
        assert_eq!(failed, vec!["Subnet"]);
    }

    #[test]
    fn report_serializes_seconds() {
        let report = TeardownReport {
            kinds: vec![KindReport {
                retry_delays: vec![Duration::from_secs(5), Duration::from_millis(1500)],
                ..KindReport::new("Vcn")
            }],
            elapsed: Duration::from_millis(250),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsed"], 0.25);
        assert_eq!(json["kinds"][0]["retryDelays"], serde_json::json!([5.0, 1.5]));
    }

    #[test]
    fn finalize_display() {
        assert_eq!(
            FinalizeOutcome::Skipped("2 resources failed".into()).to_string(),
            "skipped: 2 resources failed"
        );
    }
}
