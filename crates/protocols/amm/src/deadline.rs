//! Deadline resolution with bounded retry

use thiserror::Error;
use vex_core::{Deadline, ProviderError, RetryPolicy};

use crate::provider::DeadlineSource;

#[derive(Debug, Clone, Error)]
pub enum DeadlineError {
    #[error("Deadline unavailable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: ProviderError },

    #[error("Deadline lookup failed: {0}")]
    Failed(ProviderError),
}

/// Ask `source` for a deadline `timeout_secs` ahead, retrying transient
/// failures with capped exponential backoff.
pub async fn resolve_deadline<S>(
    source: &S,
    timeout_secs: u64,
    policy: &RetryPolicy,
) -> Result<Deadline, DeadlineError>
where
    S: DeadlineSource + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match source.deadline(timeout_secs).await {
            Ok(deadline) => {
                if attempt > 0 {
                    tracing::info!("Deadline resolved after {} retries", attempt);
                }
                return Ok(deadline);
            }
            Err(e) if !e.is_transient() => {
                tracing::error!("Deadline lookup failed: {}", e);
                return Err(DeadlineError::Failed(e));
            }
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    tracing::error!("Deadline lookup gave up after {} attempts: {}", attempt, e);
                    return Err(DeadlineError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                let delay = policy.delay_for_attempt(attempt - 1);
                tracing::warn!(
                    "Deadline lookup failed (attempt {}/{}): {}. Retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
