//! Polling with exponential backoff.
//!
//! Long-running deletions are confirmed by polling a "get" operation until
//! the resource reports one of its terminal wait states. This module holds
//! the generic poll loop; the executor supplies the check.

use backon::{BackoffBuilder, ExponentialBuilder};
use oci_sweep_common::ProviderError;
use oci_sweep_common::defaults::DEFAULT_WAIT_TIMEOUT_SECS;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for polling a long-running operation.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay before the second check
    pub initial_delay: Duration,
    /// Cap for exponential growth of the delay
    pub max_delay: Duration,
    /// Maximum total time to wait
    pub timeout: Duration,
    /// Randomize delays
    pub jitter: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            jitter: true,
        }
    }
}

/// Why a wait ended without the condition being met
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Timeout waiting for {what} after {waited:?} ({attempts} checks)")]
    Timeout {
        what: String,
        waited: Duration,
        attempts: u32,
    },

    #[error("Check for {what} failed: {source}")]
    Check {
        what: String,
        #[source]
        source: ProviderError,
    },
}

/// Poll `check` until it returns `Ok(true)`.
///
/// The first check runs immediately. Between checks the delay grows
/// exponentially from `initial_delay` up to `max_delay`. Any `Err` from the
/// check ends the wait.
///
/// # Example
/// ```ignore
/// poll_until(
///     &WaitConfig::default(),
///     || async { Ok(volume_is_terminated().await) },
///     "volume ocid1.volume...",
/// ).await?;
/// ```
pub async fn poll_until<F, Fut>(
    config: &WaitConfig,
    check: F,
    what: &str,
) -> Result<(), WaitError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool, ProviderError>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut builder = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .without_max_times();
    if config.jitter {
        builder = builder.with_jitter();
    }
    let mut delays = builder.build();

    loop {
        attempts += 1;

        match check().await {
            Ok(true) => {
                debug!(resource = %what, attempts, "Wait condition reached");
                return Ok(());
            }
            Ok(false) => {}
            Err(source) => {
                warn!(resource = %what, error = %source, "Wait check failed");
                return Err(WaitError::Check {
                    what: what.to_string(),
                    source,
                });
            }
        }

        let waited = start.elapsed();
        if waited >= config.timeout {
            return Err(WaitError::Timeout {
                what: what.to_string(),
                waited,
                attempts,
            });
        }

        let delay = delays
            .next()
            .unwrap_or(config.max_delay)
            .min(config.timeout - waited);
        debug!(
            resource = %what,
            attempt = attempts,
            delay_ms = delay.as_millis(),
            "Not there yet, polling again"
        );

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            jitter: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_after_a_few_checks() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let result = poll_until(
            &fast_config(),
            move || {
                let c = c.clone();
                async move { Ok(c.fetch_add(1, Ordering::SeqCst) >= 2) }
            },
            "thing",
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out() {
        let result = poll_until(&fast_config(), || async { Ok(false) }, "never").await;
        match result {
            Err(WaitError::Timeout { waited, .. }) => {
                assert!(waited >= Duration::from_secs(10));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn check_error_ends_wait() {
        let result = poll_until(
            &fast_config(),
            || async { Err(ProviderError::Transport("reset".into())) },
            "broken",
        )
        .await;
        assert!(matches!(result, Err(WaitError::Check { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn met_condition_does_not_sleep() {
        let start = Instant::now();
        let result = poll_until(&fast_config(), || async { Ok(true) }, "x").await;
        assert!(result.is_ok());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
