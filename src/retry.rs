use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::warn;

use crate::errors::Result;

/// Boxed future returned by a phase operation under retry.
pub type PhaseFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Fixed-backoff retry applied around phase-level operations.
///
/// Every attempt re-invokes the wrapped operation from its start, so phase
/// logic must re-read page state rather than assume prior progress. Only
/// failures classified retryable trigger a re-attempt; after the budget is
/// spent the last error propagates unchanged in kind.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, wait: Duration) -> Self {
        Self { max_attempts, wait }
    }

    pub async fn run<A, T, F>(&self, label: &str, target: &mut A, mut op: F) -> Result<T>
    where
        F: for<'a> FnMut(&'a mut A) -> PhaseFuture<'a, T>,
    {
        let mut attempt = 1;
        loop {
            match op(target).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        "{} failed on attempt {}/{}: {}; retrying in {:?}",
                        label, attempt, self.max_attempts, err, self.wait
                    );
                    tokio::time::sleep(self.wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AutomationError;

    fn flaky_until_third(attempts: &mut u32) -> PhaseFuture<'_, u32> {
        *attempts += 1;
        let n = *attempts;
        Box::pin(async move {
            if n < 3 {
                Err(AutomationError::Timeout("element never appeared".into()))
            } else {
                Ok(n)
            }
        })
    }

    fn always_times_out(attempts: &mut u32) -> PhaseFuture<'_, u32> {
        *attempts += 1;
        Box::pin(async move { Err(AutomationError::Timeout("still nothing".into())) })
    }

    fn strict_failure(attempts: &mut u32) -> PhaseFuture<'_, u32> {
        *attempts += 1;
        Box::pin(async move {
            Err(AutomationError::StrictResolution {
                selector: ".cart_item".into(),
                count: 2,
            })
        })
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let mut attempts = 0u32;
        let result = policy.run("login", &mut attempts, flaky_until_third).await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn exhaustion_propagates_the_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let mut attempts = 0u32;
        let err = policy
            .run("perform_actions", &mut attempts, always_times_out)
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Timeout(_)));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn non_retryable_errors_execute_once() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let mut attempts = 0u32;
        let err = policy
            .run("remove_item", &mut attempts, strict_failure)
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::StrictResolution { .. }));
        assert_eq!(attempts, 1);
    }
}
