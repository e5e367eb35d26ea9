//! Retry/fallback across candidate URLs.
//!
//! The [`RetryOrchestrator`] walks candidates strictly in order, giving each
//! up to [`RetryPolicy::attempts_per_candidate`] attempts with a fixed
//! backoff between attempts on the same candidate. The first success wins;
//! exhausting the matrix yields an [`AggregateError`] listing every attempt.

mod error;
mod orchestrator;
mod policy;

pub use error::{AggregateError, AttemptRecord, Retryable};
pub use orchestrator::{RetryOrchestrator, RetrySuccess};
pub use policy::RetryPolicy;
