//! Bounded retry with exponential backoff
//!
//! Used in two places: the research stage wraps each collaborator call
//! (transient network and rate-limit failures), and the dispatcher wraps
//! whole engine invocations. The last error is re-raised after exhaustion.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry strategy configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial backoff delay in milliseconds
    pub min_delay_ms: u64,

    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 3 attempts, exponential between 2s and 10s
        Self {
            max_attempts: 3,
            min_delay_ms: 2_000,
            max_delay_ms: 10_000,
            multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom attempt count
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the minimum backoff delay
    pub fn with_min_delay(mut self, ms: u64) -> Self {
        self.min_delay_ms = ms;
        self
    }

    /// Set the maximum backoff delay
    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set the backoff multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Backoff delay before the given retry (0-based attempt index)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = 2f64.powi(attempt as i32) * self.multiplier;
        let delay_ms = (self.min_delay_ms as f64 * exp) as u64;
        Duration::from_millis(delay_ms.clamp(self.min_delay_ms, self.max_delay_ms))
    }
}

/// Execute an async operation with bounded retry
///
/// Retries every error up to `policy.max_attempts` total attempts; after
/// exhaustion the last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            info!(
                operation = operation_name,
                attempt,
                max_attempts = policy.max_attempts,
                "Retrying operation"
            );
        }

        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                debug!(
                    operation = operation_name,
                    attempt,
                    error = %e,
                    "Operation failed"
                );
                last_error = Some(e);

                if attempt + 1 < policy.max_attempts {
                    let delay = policy.backoff_delay(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, will retry after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    warn!(
        operation = operation_name,
        max_attempts = policy.max_attempts,
        "All retry attempts exhausted"
    );

    // max_attempts >= 1 guarantees at least one recorded error
    Err(last_error.expect("retry executed at least once"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3).with_min_delay(1).with_max_delay(5)
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.min_delay_ms, 2_000);
        assert_eq!(policy.max_delay_ms, 10_000);
    }

    #[test]
    fn test_backoff_clamped_to_max() {
        let policy = RetryPolicy::new(5)
            .with_min_delay(2_000)
            .with_max_delay(10_000);

        assert_eq!(policy.backoff_delay(0), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(4_000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(8_000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(10_000));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        let result: Result<u32, String> =
            retry_with_backoff(&fast_policy(), "op", move || {
                let count = Arc::clone(&count_clone);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        let result: Result<u32, String> =
            retry_with_backoff(&fast_policy(), "op", move || {
                let count = Arc::clone(&count_clone);
                async move {
                    let n = count.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err("simulated transient failure".to_string())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        let result: Result<u32, String> =
            retry_with_backoff(&fast_policy(), "op", move || {
                let count = Arc::clone(&count_clone);
                async move {
                    let n = count.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {}", n))
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "failure 2");
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
