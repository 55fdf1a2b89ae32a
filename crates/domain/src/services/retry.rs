//! Retry policy for the capture phase.
//!
//! One configurable policy decides how many attempts a capture run gets,
//! how long to wait between them, and which error kinds qualify. The
//! analysis phase deliberately does not use it: its external calls run
//! exactly once.

use std::time::Duration;

use super::snapshot_job::JobError;

/// Bounded retry policy over transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts. Zero means retry immediately.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Whether a failed attempt should be redone.
    ///
    /// Only transient transport faults qualify; duplicate snapshots and
    /// rejected queries are terminal on first occurrence.
    pub fn should_retry(&self, error: &JobError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }

    /// Wait out the backoff before the next attempt.
    pub async fn wait(&self) {
        if !self.backoff.is_zero() {
            tokio::time::sleep(self.backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_five_attempts_no_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert!(policy.backoff.is_zero());
    }

    #[test]
    fn test_transient_errors_retry_until_budget_spent() {
        let policy = RetryPolicy::default();
        let err = JobError::Transient("timeout".to_string());

        assert!(policy.should_retry(&err, 1));
        assert!(policy.should_retry(&err, 4));
        assert!(!policy.should_retry(&err, 5));
    }

    #[test]
    fn test_terminal_errors_never_retry() {
        let policy = RetryPolicy::default();

        let duplicate = JobError::DuplicateSnapshot("visitors20260825".to_string());
        let rejected = JobError::Rejected("permission denied".to_string());
        let unexpected = JobError::Unexpected("panic adjacent".to_string());

        assert!(!policy.should_retry(&duplicate, 1));
        assert!(!policy.should_retry(&rejected, 1));
        assert!(!policy.should_retry(&unexpected, 1));
    }

    #[tokio::test]
    async fn test_zero_backoff_does_not_sleep() {
        let policy = RetryPolicy::default();
        // Must complete immediately under a paused clock.
        tokio::time::pause();
        policy.wait().await;
    }
}
