//! Errors returned by job queries and submission.

use thiserror::Error;

use super::types::JobId;
use crate::candidates::CandidateError;
use crate::transcoder::TranscodeError;

/// Errors from the job service.
#[derive(Debug, Error)]
pub enum JobError {
    /// Unknown id, or the job was swept or already fetched.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// Result requested before the job finished.
    #[error("Job {0} is still processing")]
    StillProcessing(JobId),

    /// The job ended in failure.
    #[error("Job {id} failed: {reason}")]
    Failed {
        id: JobId,
        reason: String,
        attempted_urls: Vec<String>,
    },

    /// No identifier could be derived from the request.
    #[error(transparent)]
    InvalidSource(#[from] CandidateError),

    /// Trim bounds are malformed.
    #[error("{0}")]
    InvalidRange(String),

    /// The completed artifact could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TranscodeError> for JobError {
    fn from(e: TranscodeError) -> Self {
        Self::InvalidRange(e.to_string())
    }
}
