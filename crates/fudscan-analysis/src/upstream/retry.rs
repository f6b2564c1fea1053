//! Retry with Exponential Backoff
//!
//! Wraps an upstream request in bounded retries. Only errors classified
//! retryable by `AnalysisError::is_retryable` are retried; anything else
//! returns immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::{AnalysisError, Result};

/// Retry policy for a single upstream
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles each subsequent retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `op` under the policy, backing off between retryable failures
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Upstream request failed, retrying"
                );
                last_error = Some(e);
                tokio::time::sleep(delay).await;
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                last_error = Some(e);
                break;
            }
        }
    }

    let last = last_error.map_or_else(|| "unknown".to_string(), |e| e.to_string());
    Err(AnalysisError::RetriesExhausted {
        attempts,
        last_error: last,
    })
}
