// src/blockchain/services/retry.rs

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ProviderError;

/// Exponential backoff with jitter for node reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    // Delay before attempt `attempt + 1`: base * 2^(attempt-1) * (1 + up to 25% jitter).
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter = 1.0 + 0.25 * rand::random::<f64>();
        self.base_delay.saturating_mul(factor).mul_f64(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Runs `op` until it succeeds or the policy's attempts are exhausted.
pub async fn with_retries<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "read succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(label, attempt, max_attempts, error = %e, ?delay, "read failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(label, attempt, error = %e, "read failed, giving up");
                return Err(e);
            }
        }
    }
}
