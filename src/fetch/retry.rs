//! Retry logic with exponential backoff for transient fetch failures.
//!
//! Failed page fetches are classified into a [`FailureKind`]; the
//! [`RetryPolicy`] then decides whether another attempt is worthwhile and
//! how long to wait. Backoff starts at one second, doubles per attempt, and
//! is capped at sixty seconds, with a small random jitter to avoid lockstep
//! retries across workers.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::FetchError;

/// Default maximum retry attempts (4 total attempts including the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap (60 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Maximum jitter added to delays (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// HTTP status codes worth retrying; everything else in 4xx/5xx fails fast.
const RETRYABLE_STATUSES: [u16; 7] = [429, 500, 502, 503, 504, 522, 524];

/// Classification of a fetch failure for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Temporary failure that may succeed on retry (timeouts, connection
    /// errors, 429 and retryable 5xx statuses).
    Transient,
    /// Failure that will not succeed regardless of retries (404 and other
    /// non-retryable statuses, malformed URLs).
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay; `attempt` is the upcoming attempt number.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed).
        attempt: u32,
    },
    /// Do not retry.
    GiveUp,
}

/// Configuration for retry behavior with exponential backoff.
///
/// Delays with defaults are approximately 1s, 2s, 4s before the attempt
/// budget is exhausted, never exceeding the 60s cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Returns the configured retry budget (not counting the first attempt).
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decides whether to retry after `attempt` (1-indexed) just failed.
    pub fn should_retry(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if kind == FailureKind::Permanent {
            return RetryDecision::GiveUp;
        }

        if attempt > self.max_retries {
            debug!(attempt, max_retries = self.max_retries, "retry budget exhausted");
            return RetryDecision::GiveUp;
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Backoff delay for a retry: `min(base * 2^(attempt-1), cap) + jitter`.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let scaled = self.base_delay.saturating_mul(1_u32 << exponent);
        scaled.min(self.max_delay) + calculate_jitter()
    }
}

/// Random jitter between 0 and [`MAX_JITTER`], to spread lockstep retries.
#[allow(clippy::cast_possible_truncation)]
fn calculate_jitter() -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Classifies a fetch error into a failure kind.
///
/// Timeouts and network-level errors are transient; HTTP statuses are
/// transient only when listed in [`RETRYABLE_STATUSES`]; malformed URLs are
/// permanent.
#[must_use]
pub fn classify_fetch_error(error: &FetchError) -> FailureKind {
    match error {
        FetchError::Timeout { .. } | FetchError::Network { .. } => FailureKind::Transient,
        FetchError::HttpStatus { status, .. } => {
            if RETRYABLE_STATUSES.contains(status) {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        FetchError::InvalidUrl { .. } => FailureKind::Permanent,
    }
}
