use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{sleep, Duration};

/// Bounds for retrying a remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt
    pub base_delay_ms: u64,
    /// Ceiling for a single exponential backoff wait
    pub max_delay_ms: u64,
    /// Ceiling for a wait requested by the server (rate-limit reset)
    pub max_reset_wait_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            max_reset_wait_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before the attempt following `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(20);
        let delay = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Clamps a server-requested wait to the reset ceiling
    pub fn clamp_reset_wait(&self, wait: Duration) -> Duration {
        wait.min(Duration::from_millis(self.max_reset_wait_ms))
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or attempts run out.
///
/// `is_retryable` decides which errors are worth another attempt. `wait_override` lets
/// an error dictate its own wait (e.g. a rate-limit reset timestamp); when it returns
/// `None` the policy's exponential backoff is used instead.
pub async fn with_retry<F, Fut, T, E, R, W>(
    policy: &RetryPolicy,
    mut op: F,
    is_retryable: R,
    wait_override: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    W: Fn(&E) -> Option<Duration>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let delay = match wait_override(&e) {
                    Some(wait) => policy.clamp_reset_wait(wait),
                    None => policy.backoff(attempt),
                };
                debug!("attempt {}/{} failed, retrying in {:?}", attempt, max_attempts, delay);
                sleep(delay).await;
            }
        }
    }
}
