//! Retry with a fixed delay between attempts
//!
//! Used by login: credential rejections are retried a bounded number of
//! times, anything else is handed back to the caller immediately.

use crate::session::pacing::{DelayRange, Pacer};
use crate::{Error, Result};
use std::future::Future;
use tracing::warn;

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait between attempts
    pub delay: DelayRange,
}

impl RetryPolicy {
    /// One initial attempt plus `retries` more, waiting `delay_secs` between them
    pub fn with_retries(retries: u32, delay_secs: f64) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            delay: DelayRange::fixed(delay_secs),
        }
    }
}

/// Why [`retry`] gave up
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: Error },
    /// An attempt failed with an error that is not worth retrying
    Fatal(Error),
}

/// Run `attempt` until it succeeds, `should_retry` rejects its error, or
/// the policy runs out of attempts.
///
/// Delays go through `pacer`, so cancellation interrupts the wait.
pub async fn retry<T, F, Fut, P>(
    policy: RetryPolicy,
    pacer: &Pacer,
    should_retry: P,
    mut attempt: F,
) -> std::result::Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match pacer.run(attempt(attempts)).await {
            Ok(value) => return Ok(value),
            Err(err) if !should_retry(&err) => return Err(RetryError::Fatal(err)),
            Err(err) if attempts >= policy.max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts,
                    last: err,
                });
            }
            Err(err) => {
                warn!(
                    "Attempt {}/{} failed: {}. Trying again in {:.1} seconds.",
                    attempts, policy.max_attempts, err, policy.delay.min_secs
                );
                pacer.pause(policy.delay).await.map_err(RetryError::Fatal)?;
            }
        }
    }
}
