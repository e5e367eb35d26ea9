//! Attempt records and the exhausted-candidates error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractor::ExtractError;

/// Classifies errors for the retry loop.
pub trait Retryable {
    /// Whether the same or another candidate could still succeed.
    fn is_retryable(&self) -> bool;
}

impl Retryable for ExtractError {
    fn is_retryable(&self) -> bool {
        ExtractError::is_retryable(self)
    }
}

/// One extraction attempt against one candidate URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub url: String,
    /// 1-based attempt number for this URL.
    pub attempt: u32,
    /// Error message, `None` for the successful attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Every candidate failed, or a non-retryable error stopped the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateError {
    /// Distinct URLs tried, in order.
    pub attempted_urls: Vec<String>,
    /// Every attempt in order.
    pub attempts: Vec<AttemptRecord>,
    /// Message of the final failure.
    pub last_error: Option<String>,
}

impl AggregateError {
    pub(crate) fn from_attempts(attempts: Vec<AttemptRecord>) -> Self {
        let mut attempted_urls: Vec<String> = Vec::new();
        for record in &attempts {
            if !attempted_urls.contains(&record.url) {
                attempted_urls.push(record.url.clone());
            }
        }
        let last_error = attempts.iter().rev().find_map(|r| r.error.clone());
        Self {
            attempted_urls,
            attempts,
            last_error,
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no candidate URLs to try");
        }
        write!(
            f,
            "all {} candidate URL(s) failed after {} attempt(s)",
            self.attempted_urls.len(),
            self.attempts.len()
        )?;
        if let Some(ref last) = self.last_error {
            write!(f, ": {}", last)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, attempt: u32, error: Option<&str>) -> AttemptRecord {
        AttemptRecord {
            url: url.to_string(),
            attempt,
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_aggregate_collects_distinct_urls() {
        let err = AggregateError::from_attempts(vec![
            record("a", 1, Some("timeout")),
            record("a", 2, Some("exit 1")),
            record("b", 1, Some("empty")),
        ]);
        assert_eq!(err.attempted_urls, vec!["a", "b"]);
        assert_eq!(err.last_error.as_deref(), Some("empty"));
        assert!(err.to_string().contains("2 candidate URL(s) failed after 3 attempt(s)"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let err = AggregateError::from_attempts(vec![record("a", 1, Some("x"))]);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["attemptedUrls"][0], "a");
        assert_eq!(json["lastError"], "x");
    }
}
