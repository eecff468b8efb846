//! Timeout and retry plumbing shared by the remote stages.
//!
//! Provides classification of retryable errors, exponential backoff, and
//! the wrapper the task runner puts around every remote call.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::StageError;
use crate::types::Stage;

/// Determine whether a stage error is worth retrying.
///
/// Retryable errors: timeouts, rate limits (429), server errors (5xx).
/// Non-retryable: auth failures, bad requests, malformed responses.
pub fn is_retryable(error: &StageError) -> bool {
    match error {
        StageError::Timeout { .. } => true,
        StageError::Transport {
            status_code,
            message,
            ..
        } => {
            // Classify by HTTP status code when available (structured)
            if let Some(code) = status_code {
                return *code == 429 || (500..=599).contains(code);
            }
            // Fallback for non-HTTP errors (e.g., connection refused, DNS failure)
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

/// Run one remote stage call under its time budget and the retry policy.
///
/// `call` runs once, plus up to `retry.attempts` more times while the
/// previous failure was retryable, with exponential backoff between
/// attempts. A timed-out attempt counts as a retryable failure. With the
/// default policy (`attempts = 0`) every failure is final on the first try.
pub async fn call_stage<T, F, Fut>(
    stage: Stage,
    timeout_ms: u64,
    retry: &RetryConfig,
    call: F,
) -> Result<T, StageError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StageError>>,
{
    let mut last_error = StageError::Timeout { stage, timeout_ms };

    for attempt in 0..=retry.attempts {
        if attempt > 0 {
            let delay = backoff_duration(attempt - 1, retry.delay_ms);
            tracing::debug!(
                "retry {attempt}/{} for {stage} stage after {delay:?}",
                retry.attempts
            );
            tokio::time::sleep(delay).await;
        }

        match tokio::time::timeout(Duration::from_millis(timeout_ms), call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                let retryable = is_retryable(&e);
                last_error = e;
                if !retryable {
                    break;
                }
            }
            Err(_) => {
                last_error = StageError::Timeout { stage, timeout_ms };
                // Timeouts are retryable
            }
        }
    }

    Err(last_error)
}
