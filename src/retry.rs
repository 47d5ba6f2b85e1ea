//! Generic retry executor with exponential backoff.
//!
//! This is a pure sequencing utility: it knows nothing about what it retries.
//! Eligibility is injected by the caller as a predicate, and the attempt
//! budget and base delay come in as a [`RetryProfile`] value so different
//! environments (tests, constrained devices, servers) can tune them without
//! the call sites branching on platform identity.
//!
//! Backoff is `base_delay * 2^(attempt - 1)` (attempt is 1-based): with a
//! 2 s base and 3 attempts the wait sequence is 2 s → 4 s. No jitter, no
//! delay cap beyond the attempt budget bounding total wait.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;

/// Attempt budget and base delay for one retry site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryProfile {
    /// Total attempts, including the first one. Clamped to at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub base_delay: Duration,
}

impl RetryProfile {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Profile used for LLM network calls: 3 attempts, 2 s base delay.
    pub fn network() -> Self {
        Self::new(3, Duration::from_secs(2))
    }

    /// Profile used around resolve-then-extract: 2 attempts, 500 ms base.
    pub fn file_access() -> Self {
        Self::new(2, Duration::from_millis(500))
    }

    /// Backoff before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Run `op` up to `profile.max_attempts` times.
///
/// On success, return immediately. On failure, consult `is_retryable`: if the
/// error is fatal, or this was the final attempt, propagate it unchanged.
/// Otherwise sleep the exponential backoff and try again. The sleep is an
/// async suspension point, so a dropped future cancels before the next
/// attempt starts.
pub async fn run<T, E, F, Fut, P>(profile: RetryProfile, is_retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = profile.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let backoff = profile.backoff(attempt);
                warn!(
                    "attempt {}/{} failed ({}); retrying in {:?}",
                    attempt, max_attempts, e, backoff
                );
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
