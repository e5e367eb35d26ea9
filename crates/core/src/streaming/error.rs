//! Streaming pipeline errors.

use thiserror::Error;

use crate::candidates::CandidateError;
use crate::extractor::ExtractError;
use crate::process::PipeError;
use crate::retry::{AggregateError, Retryable};
use crate::transcoder::TranscodeError;

/// Errors returned before any audio has been produced.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    InvalidSource(#[from] CandidateError),

    #[error("{0}")]
    InvalidRange(String),

    /// No candidate produced a first chunk.
    #[error(transparent)]
    Exhausted(#[from] AggregateError),
}

impl From<TranscodeError> for StreamError {
    fn from(e: TranscodeError) -> Self {
        Self::InvalidRange(e.to_string())
    }
}

/// Failure of one streaming attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("{0}")]
    Pipe(#[from] PipeError),
}

impl Retryable for AttemptError {
    /// Only extractor failures move on to the next candidate.
    ///
    /// Every stream ends in the transcoder, so a [`PipeError`] other than
    /// [`PipeError::Upstream`] was raised by the transcoder itself. The
    /// transcoder sees the same bytes from any mirror, so its failures end
    /// the run.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Extract(e) => e.is_retryable(),
            Self::Pipe(PipeError::Upstream(_)) => true,
            Self::Transcode(_) | Self::Pipe(_) => false,
        }
    }
}
