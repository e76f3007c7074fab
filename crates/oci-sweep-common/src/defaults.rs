//! Default configuration values shared across oci-sweep components
//!
//! These constants keep the CLI defaults and the library defaults in sync.

/// Maximum number of retry rounds per kind after the first pass
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound on concurrent deletions within one kind
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Base delay of the linear back-off between retry rounds (seconds)
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Ceiling for a single long-running wait (seconds, 20 minutes)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 1200;

/// Pause after clearing back-references so the change propagates (milliseconds)
pub const DEFAULT_CLEANUP_PAUSE_MS: u64 = 500;

/// Interval between progress log lines in the CLI (seconds)
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 5;

/// Page size requested from the search capability
pub const SEARCH_PAGE_LIMIT: u32 = 1000;

/// Minimum retention the provider enforces before a scheduled deletion (days)
pub const SCHEDULED_DELETION_DAYS: i64 = 7;

/// Neutral rank for kinds absent from the priority table
pub const DEFAULT_PRIORITY: u16 = 50;

/// Default home region when none is configured
pub const DEFAULT_REGION: &str = "us-ashburn-1";
