//! Retry on rate limiting with exponential delay.

use std::time::Duration;

use crate::error::CanvasError;

pub const MAX_ATTEMPTS: u32 = 3;

/// Delay slept after failed attempt `attempt` (0-based): 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

/// Run `op`, retrying only [`CanvasError::RateLimited`], up to
/// [`MAX_ATTEMPTS`] attempts in total.
pub fn with_backoff<T>(op: impl FnMut() -> Result<T, CanvasError>) -> Result<T, CanvasError> {
    with_backoff_using(MAX_ATTEMPTS, std::thread::sleep, op)
}

/// [`with_backoff`] with an explicit attempt budget and sleeper.
pub fn with_backoff_using<T>(
    max_attempts: u32,
    mut sleep: impl FnMut(Duration),
    mut op: impl FnMut() -> Result<T, CanvasError>,
) -> Result<T, CanvasError> {
    let max_attempts = max_attempts.max(1);
    for attempt in 0..max_attempts {
        match op() {
            Err(CanvasError::RateLimited) => {
                if attempt + 1 == max_attempts {
                    break;
                }
                let delay = backoff_delay(attempt);
                tracing::warn!("rate limited; retrying in {}s", delay.as_secs());
                sleep(delay);
            }
            other => return other,
        }
    }
    Err(CanvasError::RateLimitExhausted { attempts: max_attempts })
}
