//! Retry policy for delivery cycles.
//!
//! Bounded attempts with capped exponential backoff. Every cycle makes
//! at least one attempt regardless of configuration.

use std::time::Duration;

use courier_core::config::RetryConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum delivery attempts per cycle, never below 1.
    pub max_attempts: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Cap on the computed delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(3600),
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: cfg.base_delay,
            max_delay: cfg.max_delay,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempts_made` failures.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before the attempt that follows failed attempt `attempt`
    /// (1-indexed): `min(base * 2^(attempt - 1), cap)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let factor = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
        let secs = self.base_delay.as_secs().saturating_mul(factor);
        self.max_delay.min(Duration::from_secs(secs))
    }
}
