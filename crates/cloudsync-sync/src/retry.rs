//! Retry policy with pluggable backoff
//!
//! [`RetryPolicy`] wraps a fallible async operation and re-runs it while the
//! error is classified as retryable and the retry budget is not spent. The
//! delay before retry `n` (1-based) comes from a backoff function; the
//! default is exponential, `base^n` seconds.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type BackoffFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Re-runs failed operations with a bounded number of retries
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Arc<BackoffFn>,
}

impl RetryPolicy {
    /// Creates a policy with a custom backoff function
    ///
    /// # Arguments
    /// * `max_retries` - Retries allowed after the first attempt
    /// * `backoff` - Delay before retry `n`, called with `n` starting at 1
    pub fn new(
        max_retries: u32,
        backoff: impl Fn(u32) -> Duration + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_retries,
            backoff: Arc::new(backoff),
        }
    }

    /// Creates a policy whose retry `n` waits `base_seconds^n` seconds
    pub fn exponential(max_retries: u32, base_seconds: u64) -> Self {
        Self::new(max_retries, move |retry| {
            Duration::from_secs(base_seconds.saturating_pow(retry))
        })
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, |_| Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        (self.backoff)(retry)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or exhausts the retry budget
    ///
    /// # Arguments
    /// * `operation` - Called with the 1-based attempt number
    /// * `is_retryable` - Classifies an error as worth retrying
    /// * `on_retry` - Called with the error, the upcoming delay and the
    ///   1-based retry number before each sleep
    ///
    /// # Returns
    /// The first success, or the last error observed
    pub async fn execute<T, E, F, Fut, P, R>(
        &self,
        mut operation: F,
        is_retryable: P,
        mut on_retry: R,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        R: FnMut(&E, Duration, u32),
    {
        let mut retries = 0;
        loop {
            match operation(retries + 1).await {
                Ok(value) => return Ok(value),
                Err(err) if retries < self.max_retries && is_retryable(&err) => {
                    retries += 1;
                    let delay = self.delay_for(retries);
                    on_retry(&err, delay, retries);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}
