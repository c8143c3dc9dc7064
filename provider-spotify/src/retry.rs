//! Retry policy for transient Web API failures

use std::time::Duration;

/// Statuses the Web API returns for transient gateway/backend failures.
pub const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 504, 524];

/// Bounded linear backoff: attempt `n` (0-based) waits
/// `base_delay + step_delay * n` before the next try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    /// Retries allowed after the peer reset the connection
    pub max_connection_retries: u32,
    pub retryable_statuses: Vec<u16>,
    pub base_delay: Duration,
    pub step_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            max_connection_retries: 4,
            retryable_statuses: RETRYABLE_STATUSES.to_vec(),
            base_delay: Duration::from_secs(1),
            step_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Same attempt limits, no waiting between attempts.
    pub fn no_delay() -> Self {
        Self {
            base_delay: Duration::ZERO,
            step_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Disable retries entirely.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            max_connection_retries: 0,
            ..Self::no_delay()
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay + self.step_delay * attempt
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Whether a retryable status seen on `attempt` may be retried.
    pub fn may_retry_status(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Whether a connection reset seen on `attempt` may be retried.
    pub fn may_retry_reset(&self, attempt: u32) -> bool {
        attempt < self.max_connection_retries && self.may_retry_status(attempt)
    }
}
