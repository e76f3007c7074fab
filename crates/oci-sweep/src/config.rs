//! Configuration types for a teardown run

use oci_sweep_common::defaults::{
    DEFAULT_CLEANUP_PAUSE_MS, DEFAULT_MAX_RETRIES, DEFAULT_MAX_WORKERS, DEFAULT_REGION,
    DEFAULT_RETRY_DELAY_SECS,
};
use std::time::Duration;

pub use crate::wait::WaitConfig;

/// Retry rounds and fan-out
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra rounds after the first pass over a kind
    pub max_retries: u32,
    /// Upper bound on concurrent deletions within a kind
    pub max_workers: usize,
    /// Linear back-off step between rounds
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_workers: DEFAULT_MAX_WORKERS,
            base_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

/// Behavior flags
#[derive(Debug, Clone, Default)]
pub struct TeardownFlags {
    /// Skip interactive confirmations
    pub force: bool,
    /// Delete the scope itself once it is empty
    pub delete_scope: bool,
    /// Discover and plan only
    pub dry_run: bool,
}

/// Configuration for a teardown run
///
/// Composed of focused sub-configs. The library only ever reads this struct;
/// the CLI builds it from its arguments.
#[derive(Debug, Clone)]
pub struct TeardownConfig {
    pub retry: RetryConfig,
    pub wait: WaitConfig,
    pub flags: TeardownFlags,
    /// Pause after clearing back-references so the change propagates
    pub cleanup_pause: Duration,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            wait: WaitConfig::default(),
            flags: TeardownFlags::default(),
            cleanup_pause: Duration::from_millis(DEFAULT_CLEANUP_PAUSE_MS),
        }
    }
}

/// Where and how to reach the provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the provider gateway
    pub endpoint: String,
    /// Home region, used for search and as the fallback resource region
    pub region: String,
    /// Additional regions for direct listing of non-searchable kinds
    pub regions: Vec<String>,
}

impl ProviderConfig {
    /// Home region followed by the extra regions, without duplicates
    pub fn all_regions(&self) -> Vec<String> {
        let mut all = vec![self.region.clone()];
        for region in &self.regions {
            if !all.contains(region) {
                all.push(region.clone());
            }
        }
        all
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8710".to_string(),
            region: DEFAULT_REGION.to_string(),
            regions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_regions_dedups_home() {
        let config = ProviderConfig {
            region: "us-ashburn-1".into(),
            regions: vec!["us-phoenix-1".into(), "us-ashburn-1".into()],
            ..Default::default()
        };
        assert_eq!(config.all_regions(), vec!["us-ashburn-1", "us-phoenix-1"]);
    }

    #[test]
    fn defaults_match_common() {
        let config = TeardownConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_workers, 10);
        assert_eq!(config.retry.base_delay, Duration::from_secs(5));
        assert!(!config.flags.force);
    }
}
