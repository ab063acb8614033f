//! Bounded exponential back-off for retryable model failures.

use std::time::Duration;

/// Retry budget and delay schedule applied by agent nodes.
///
/// `max_attempts` counts every model call including the first, so the default
/// budget of 3 allows two retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total model calls allowed per node, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with the given budget and base delay and the default cap.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    /// Returns `true` if another call may be made after `attempts` calls.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Delay before the call following attempt number `attempt` (1-based).
    ///
    /// A delay requested by the provider wins when it is longer than the
    /// schedule; the result never exceeds `max_delay`.
    pub fn delay_after(&self, attempt: u32, requested: Option<Duration>) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let scheduled = self.base_delay.saturating_mul(factor);
        scheduled
            .max(requested.unwrap_or_default())
            .min(self.max_delay)
    }
}
