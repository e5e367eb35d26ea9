//! The candidate x attempt loop.

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, info, warn};

use super::error::{AggregateError, AttemptRecord, Retryable};
use super::policy::RetryPolicy;
use crate::metrics;

/// Result of a successful run.
#[derive(Debug)]
pub struct RetrySuccess<T> {
    pub value: T,
    /// The candidate that produced `value`.
    pub url: String,
    /// Every attempt made, the successful one last.
    pub attempts: Vec<AttemptRecord>,
}

impl<T> RetrySuccess<T> {
    /// Distinct URLs tried, in order.
    pub fn attempted_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for record in &self.attempts {
            if !urls.contains(&record.url) {
                urls.push(record.url.clone());
            }
        }
        urls
    }
}

/// Runs an attempt function over candidates until one succeeds.
#[derive(Debug, Clone, Default)]
pub struct RetryOrchestrator {
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Tries `attempt(url, n)` for each candidate in order.
    ///
    /// Each candidate gets `attempts_per_candidate` tries separated by the
    /// backoff; moving on to the next candidate is immediate. A
    /// non-retryable error ends the run at once. Attempts are strictly
    /// sequential.
    pub async fn run<T, E, F, Fut>(
        &self,
        candidates: &[String],
        mut attempt: F,
    ) -> Result<RetrySuccess<T>, AggregateError>
    where
        E: Retryable + Display,
        F: FnMut(String, u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let per_candidate = self.policy.attempts();
        let mut records = Vec::new();

        for url in candidates {
            for n in 1..=per_candidate {
                if n > 1 && self.policy.backoff_ms > 0 {
                    tokio::time::sleep(self.policy.backoff()).await;
                }

                debug!("Attempt {}/{} for {}", n, per_candidate, url);
                match attempt(url.clone(), n).await {
                    Ok(value) => {
                        metrics::EXTRACTION_ATTEMPTS
                            .with_label_values(&["success"])
                            .inc();
                        records.push(AttemptRecord {
                            url: url.clone(),
                            attempt: n,
                            error: None,
                        });
                        info!(
                            "Candidate {} succeeded on attempt {} ({} total)",
                            url,
                            n,
                            records.len()
                        );
                        return Ok(RetrySuccess {
                            value,
                            url: url.clone(),
                            attempts: records,
                        });
                    }
                    Err(e) => {
                        let retryable = e.is_retryable();
                        records.push(AttemptRecord {
                            url: url.clone(),
                            attempt: n,
                            error: Some(e.to_string()),
                        });

                        if !retryable {
                            metrics::EXTRACTION_ATTEMPTS
                                .with_label_values(&["fatal"])
                                .inc();
                            warn!("Non-retryable failure on {}: {}", url, e);
                            return Err(AggregateError::from_attempts(records));
                        }

                        metrics::EXTRACTION_ATTEMPTS
                            .with_label_values(&["failure"])
                            .inc();
                        warn!("Attempt {}/{} for {} failed: {}", n, per_candidate, url, e);
                    }
                }
            }
        }

        Err(AggregateError::from_attempts(records))
    }
}
