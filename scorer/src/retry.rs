use std::{future::Future, time::Duration};

use asset_data::ProviderError;
use tokio::time::{sleep, timeout};

/// Bounded retries with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound for a single attempt
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = Some(attempt_timeout);
        self
    }

    /// Delay before retry number `attempt + 1`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
    }
}

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// the retries are used up. The last error is returned.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;

    loop {
        let result = match policy.attempt_timeout {
            Some(limit) => match timeout(limit, operation()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "{label} after {}ms",
                    limit.as_millis()
                ))),
            },
            None => operation().await,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let backoff = policy.backoff(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}, backing off for {}ms",
                    label,
                    attempt + 1,
                    policy.max_retries + 1,
                    err,
                    backoff.as_millis()
                );
                sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
