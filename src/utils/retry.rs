//! Fixed-interval retry helper shared by the release and status fetchers.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// How often and how patiently to retry a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: usize,
    /// Sleep between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Returned when every attempt failed or was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    /// Attempts made
    pub attempts: usize,
    /// Description of the last failure
    pub last_error: String,
}

/// Run `action` until it yields a value that `accept` approves, sleeping
/// `policy.delay` between attempts.
///
/// Errors and rejected values are treated the same way: both consume an
/// attempt. The label is only used for log lines.
///
/// # Errors
///
/// Returns [`RetryExhausted`] with the last failure once `policy.max_attempts`
/// attempts have been made.
pub async fn retry_until<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut action: F,
    accept: P,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delays = FixedInterval::new(policy.delay).take(max_attempts - 1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("{label}: attempt {attempt}/{max_attempts}");

        let failure = match action().await {
            Ok(value) if accept(&value) => return Ok(value),
            Ok(_) => "empty or unusable response".to_string(),
            Err(e) => format!("{e:#}"),
        };

        match delays.next() {
            Some(delay) => {
                warn!(
                    "{label}: attempt {attempt}/{max_attempts} failed ({failure}), retrying in {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: failure,
                });
            }
        }
    }
}
