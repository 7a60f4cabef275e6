//! Retry and deadline policy.

use std::time::Duration;

/// Bounds for one entitlement check, covering every attempt and the
/// backoff between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (default: 3).
    pub max_attempts: u32,
    /// Wall-clock budget for the whole operation (default: 5 s).
    /// The caller gets an answer — definitive or fail-open — within
    /// this deadline plus scheduling overhead.
    pub total_deadline: Duration,
    /// Backoff before the second attempt (default: 100 ms).
    pub initial_backoff: Duration,
    /// Backoff growth factor per attempt (default: 2.0).
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            total_deadline: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff to sleep after the given zero-based attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        self.initial_backoff.mul_f64(factor)
    }
}
