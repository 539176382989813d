use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Bounded exponential backoff for calls that may hit a cold or restarting proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay after the failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay_ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);

        Duration::from_millis(delay_ms)
    }
}

#[derive(Error, Debug)]
#[error("request failed after {attempts} attempts: {last}")]
pub struct RetriesExhausted<E: std::fmt::Display> {
    pub attempts: u32,
    pub last: E,
}

/// Runs `operation` until it yields `Ok`, sleeping between attempts.
///
/// `Err` from the operation means the call never produced a response (connect
/// refused, reset, timeout). Anything that did produce a response, including an
/// HTTP error status, must come back as `Ok` and is returned immediately.
pub async fn call_with_retry<Op, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: Op,
) -> Result<T, RetriesExhausted<E>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation(attempt).await {
            Ok(output) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "Call succeeded after retry");
                }
                return Ok(output);
            }
            Err(err) if attempt + 1 >= max => {
                warn!(attempts = max, error = %err, "Retries exhausted");
                return Err(RetriesExhausted { attempts: max, last: err });
            }
            Err(err) => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
