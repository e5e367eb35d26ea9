//! Retry policy configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many times each candidate is tried and how long to wait in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per candidate URL (at least 1).
    #[serde(default = "default_attempts")]
    pub attempts_per_candidate: u32,

    /// Pause between attempts on the same candidate, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_candidate: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts_per_candidate: u32, backoff_ms: u64) -> Self {
        Self {
            attempts_per_candidate,
            backoff_ms,
        }
    }

    /// A single attempt per candidate, no waiting.
    pub fn no_retry() -> Self {
        Self::new(1, 0)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Attempts per candidate, never less than one.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts_per_candidate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts_per_candidate, 2);
        assert_eq!(policy.backoff(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0, 0).attempts(), 1);
    }
}
