//! Backoff for transient package manager failures.
//!
//! Package database locks and flaky mirrors are the common failures on a
//! managed host. Both clear up on their own; nothing else is retried.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use std::thread;
use std::time::Duration;

/// Observer notified before each backoff sleep.
pub trait RetryCallback {
    /// `attempt` is the 1-indexed attempt that just failed with `error`;
    /// the next one starts after `delay`.
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// Silent observer.
pub struct NoCallback;

impl RetryCallback for NoCallback {
    fn on_retry(&self, _: u32, _: u32, _: &Error, _: Duration) {}
}

/// Reports each retry as a `log` warning.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        log::warn!(
            "attempt {attempt}/{max_attempts} failed ({}): {error}; retrying in {}s",
            error.category().description(),
            delay.as_secs()
        );
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of
/// attempts. The error of the last attempt is returned unchanged.
pub fn with_retry<T>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: impl FnMut() -> Result<T>,
) -> Result<T> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let error = match operation() {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        if !error.is_retryable() || attempt >= max_attempts {
            return Err(error);
        }

        let delay = config.delay_for_attempt(attempt - 1);
        if let Some(callback) = callback {
            callback.on_retry(attempt, max_attempts, &error, delay);
        }
        thread::sleep(delay);
        attempt += 1;
    }
}
