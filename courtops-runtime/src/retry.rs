//! Bounded retry for model calls.

use crate::interfaces::RuntimeError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
const RATE_LIMIT_HINT_CAP: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Delay before the attempt following `attempt` (zero-based). A rate-limit
    /// error carrying a "retry after Ns" hint waits for the hint instead.
    pub fn delay_for(&self, attempt: u32, err: &RuntimeError) -> Duration {
        let msg = err.to_string().to_lowercase();
        if msg.contains("rate limit") || msg.contains("429") {
            if let Some(seconds) = extract_retry_seconds(&msg) {
                return Duration::from_secs(seconds).min(RATE_LIMIT_HINT_CAP);
            }
        }
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retriable error, or the
    /// attempts are spent. Exhaustion surfaces as `ModelUnavailable`.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RuntimeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RuntimeError>>,
    {
        let mut attempt = 0;
        loop {
            debug!("Model call attempt {}/{}", attempt + 1, self.max_attempts);
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retriable() => return Err(e),
                Err(e) => e,
            };

            attempt += 1;
            if attempt >= self.max_attempts {
                warn!("Model call failed after {} attempt(s): {}", attempt, err);
                return Err(RuntimeError::ModelUnavailable {
                    attempts: attempt,
                    last_error: err.to_string(),
                });
            }

            let delay = self.delay_for(attempt - 1, &err);
            warn!("Model call failed (attempt {}), retrying in {:?}: {}", attempt, delay, err);
            crate::metrics::increment_model_retries();
            tokio::time::sleep(delay).await;
        }
    }
}

fn extract_retry_seconds(msg: &str) -> Option<u64> {
    for token in msg.split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '.') {
        if let Some(stripped) = token.strip_suffix('s') {
            if let Ok(v) = stripped.parse::<u64>() {
                if v > 0 {
                    return Some(v);
                }
            }
        }
    }
    None
}
