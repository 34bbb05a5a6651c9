//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::client::UploadError;

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Per-file retry configuration, loaded once from the CLI and shared
/// read-only across all workers.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts per file, including the first one.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    /// Passed through unchanged to every storage client call.
    pub chunk_size: u64,
}

/// Result of driving one operation through the policy.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, UploadError>,
    pub attempts_made: u32,
}

/// Delay inserted after the given number of failed attempts:
/// `base * 2^(failed_attempts - 1)`, capped at [`MAX_BACKOFF`].
pub fn backoff_delay(base: Duration, failed_attempts: u32) -> Duration {
    let factor = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Runs `op` up to `config.max_attempts` times, sleeping between attempts.
///
/// Only transient errors are retried; permanent ones are surfaced
/// immediately without consuming the remaining attempts. The first
/// success returns at once with the number of attempts it took.
pub async fn with_retries<T, F, Fut>(config: &RetryConfig, mut op: F) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UploadError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts_made: attempts,
                }
            }
            Err(error) if error.kind().is_transient() && attempts < config.max_attempts => {
                let delay = backoff_delay(config.base_backoff, attempts);
                warn!(
                    error = %error,
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off before next attempt"
                );
                sleep(delay).await;
            }
            Err(error) => {
                return Attempted {
                    result: Err(error),
                    attempts_made: attempts,
                }
            }
        }
    }
}
