//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Candidate building and extraction attempts
//! - Transcoding (file and stream modes)
//! - Job lifecycle and streaming requests

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

// =============================================================================
// Extraction
// =============================================================================

/// Candidate URLs produced per source.
pub static CANDIDATES_PER_SOURCE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "audiograb_candidates_per_source",
            "Number of candidate URLs built per source",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 6.0]),
    )
    .unwrap()
});

/// Extraction attempts by result.
pub static EXTRACTION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "audiograb_extraction_attempts_total",
            "Total extraction attempts",
        ),
        &["result"], // "success", "failure", "fatal"
    )
    .unwrap()
});

/// Duration of materializing extraction runs.
pub static EXTRACTION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "audiograb_extraction_duration_seconds",
            "Duration of a single materializing extraction",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
    )
    .unwrap()
});

// =============================================================================
// Transcoding
// =============================================================================

/// Transcodes by mode and result.
pub static TRANSCODES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("audiograb_transcodes_total", "Total transcode invocations"),
        &["mode", "result"], // mode: "file", "stream"
    )
    .unwrap()
});

// =============================================================================
// Jobs and streaming
// =============================================================================

/// Job lifecycle events.
pub static JOBS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("audiograb_jobs_total", "Job lifecycle events"),
        &["result"], // "submitted", "completed", "failed", "discarded", "expired"
    )
    .unwrap()
});

/// Streaming requests by outcome.
pub static STREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "audiograb_stream_requests_total",
            "Streaming pipeline requests",
        ),
        &["result"], // "started", "invalid", "exhausted"
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CANDIDATES_PER_SOURCE.clone()),
        Box::new(EXTRACTION_ATTEMPTS.clone()),
        Box::new(EXTRACTION_DURATION.clone()),
        Box::new(TRANSCODES.clone()),
        Box::new(JOBS.clone()),
        Box::new(STREAM_REQUESTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        JOBS.with_label_values(&["submitted"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"audiograb_jobs_total".to_string()));
    }
}
