//! Retry with exponential backoff for transient request failures.

use std::thread;
use std::time::Duration;

use log::warn;
use rand::Rng;

use crate::domain::RetryPolicy;
use crate::error::PipelineError;

/// Run `op`, retrying while it fails with a retryable error and attempts remain.
///
/// Non-retryable errors (auth, lookup, no coverage) are returned immediately.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(err) if err.is_retryable() && attempt < attempts => {
                let delay = backoff_delay(policy, attempt);
                warn!("{what} failed (attempt {attempt}/{attempts}): {err}; retrying in {delay:?}");
                thread::sleep(delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Delay after the `attempt`-th failure: `base * 2^(attempt-1)` plus jitter.
fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    let base = policy.base_delay.saturating_mul(factor);
    let jitter_ms = policy.max_jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return base;
    }
    base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
}
