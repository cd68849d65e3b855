//! Retry policy for transient transport conditions

use std::time::Duration;

/// How a receive loop waits out transient transport errors
///
/// `max_attempts` counts consecutive failures; a successful read resets the
/// count. `None` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub interval: Duration,
}

impl RetryPolicy {
    /// Retry forever with a fixed pause
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            max_attempts: None,
            interval,
        }
    }

    /// Retry at most `max_attempts` consecutive times
    pub fn bounded(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            interval,
        }
    }

    /// Start tracking consecutive failures under this policy
    pub fn tracker(&self) -> RetryTracker {
        RetryTracker {
            policy: *self,
            failures: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(1))
    }
}

/// Consecutive-failure counter for one receive loop
#[derive(Debug, Clone)]
pub struct RetryTracker {
    policy: RetryPolicy,
    failures: u32,
}

impl RetryTracker {
    /// Record a failure; returns the pause to take, or `None` when exhausted
    pub fn on_failure(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        match self.policy.max_attempts {
            Some(max) if self.failures > max => None,
            _ => Some(self.policy.interval),
        }
    }

    /// Clear the failure count after a successful read
    pub fn on_success(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures so far
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_policy_exhausts() {
        let mut tracker = RetryPolicy::bounded(2, Duration::from_millis(5)).tracker();
        assert_eq!(tracker.on_failure(), Some(Duration::from_millis(5)));
        assert_eq!(tracker.on_failure(), Some(Duration::from_millis(5)));
        assert_eq!(tracker.on_failure(), None);
        assert_eq!(tracker.failures(), 3);
    }

    #[test]
    fn test_success_resets() {
        let mut tracker = RetryPolicy::bounded(1, Duration::from_millis(5)).tracker();
        assert!(tracker.on_failure().is_some());
        tracker.on_success();
        assert!(tracker.on_failure().is_some());
    }

    #[test]
    fn test_unbounded_never_exhausts() {
        let mut tracker = RetryPolicy::default().tracker();
        for _ in 0..1000 {
            assert_eq!(tracker.on_failure(), Some(Duration::from_secs(1)));
        }
    }
}
