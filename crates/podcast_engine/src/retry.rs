//! Bounded retry with a fixed delay.
//!
//! The policy is a plain value; [`retry_async`] composes it with any fallible
//! async operation and a predicate choosing which errors are worth another try.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Stop,
    RetryAfter(Duration),
}

impl RetryPolicy {
    /// `attempt` is 1-based and counts the attempt that just failed.
    pub fn decide(&self, attempt: u32, retryable: bool) -> RetryDecision {
        if !retryable || attempt >= self.max_attempts {
            RetryDecision::Stop
        } else {
            RetryDecision::RetryAfter(self.delay)
        }
    }
}

/// Run `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the policy runs out of attempts. The last error is returned unchanged.
///
/// `op` receives the 1-based attempt number. `on_retry` is told about each
/// failed attempt that will be retried, before the delay.
pub async fn retry_async<T, E, Op, Fut, P, N>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut on_retry: N,
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    N: FnMut(u32, Duration, &E),
{
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => match policy.decide(attempt, is_retryable(&err)) {
                RetryDecision::Stop => return Err(err),
                RetryDecision::RetryAfter(delay) => {
                    on_retry(attempt, delay, &err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
