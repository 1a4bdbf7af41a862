//! Bounded exponential backoff and timeouts for external calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{FixragError, Result};

/// Base delay before the first retry; doubles after each attempt.
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Run `operation` with up to `max_attempts` tries.
///
/// Only transient errors (see [`FixragError::is_transient`]) are retried;
/// configuration and not-found errors surface immediately.
pub(crate) async fn with_backoff<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;
    for attempt in 0..max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * 2u64.pow(attempt));
                    warn!(
                        operation = label,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        FixragError::InvalidConfiguration("max_retries must be at least one".to_string())
    }))
}

/// Bound `operation` to `timeout`, surfacing [`FixragError::Timeout`]
/// instead of hanging.
///
/// The timeout covers the whole operation, retries included, so the caller's
/// bound holds regardless of the retry budget.
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    operation: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(FixragError::Timeout { operation: operation.to_string(), timeout }),
    }
}
