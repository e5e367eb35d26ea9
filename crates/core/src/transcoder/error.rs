//! Error types for the transcode adapter.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::{stderr_summary, PipeError, RunError};

/// Errors that can occur during transcoding.
///
/// None of these are retried: a second run over the same input is unlikely
/// to behave differently.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Trim bounds are malformed; rejected before ffmpeg is started.
    #[error("Invalid trim range: {reason}")]
    InvalidRange { reason: String },

    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// Transcoding timed out.
    #[error("Transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// FFmpeg exited cleanly but wrote nothing.
    #[error("Transcode produced an empty artifact: {target}")]
    EmptyArtifact { target: String },

    /// FFmpeg exited with a non-zero status.
    #[error("FFmpeg exited with code {code:?}{}", stderr_summary(.stderr.as_deref()))]
    ProcessExit {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// I/O error during transcoding.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates a new invalid range error.
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }

    /// Creates a process exit error, dropping blank diagnostics.
    pub fn process_exit(code: Option<i32>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self::ProcessExit {
            code,
            stderr: if stderr.trim().is_empty() {
                None
            } else {
                Some(stderr)
            },
        }
    }

    /// Returns true if the request itself was at fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }
}

impl From<RunError> for TranscodeError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::NotFound { path } => Self::ToolNotFound { path },
            RunError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            RunError::Exit { code, stderr } => Self::process_exit(code, stderr),
            RunError::Io(e) => Self::Io(e),
        }
    }
}

impl From<PipeError> for TranscodeError {
    fn from(e: PipeError) -> Self {
        match e {
            PipeError::Timeout { timeout_secs, .. } => Self::Timeout { timeout_secs },
            PipeError::Exit { code, stderr, .. } => Self::process_exit(code, stderr),
            PipeError::Empty { tool } => Self::EmptyArtifact {
                target: format!("{} stdout", tool),
            },
            PipeError::Upstream(reason) => Self::process_exit(None, reason),
            PipeError::Io(e) => Self::Io(e),
        }
    }
}
