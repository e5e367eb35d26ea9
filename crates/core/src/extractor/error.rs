//! Error types for the extraction adapter.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::{stderr_summary, PipeError, RunError};

/// Errors that can occur during a single extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Extractor binary not found.
    #[error("Extractor not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The attempt exceeded its wall-clock budget.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The tool exited cleanly but produced nothing.
    #[error("Extraction produced an empty artifact: {target}")]
    EmptyArtifact { target: String },

    /// The tool exited with a non-zero status.
    #[error("Extractor exited with code {code:?}{}", stderr_summary(.stderr.as_deref()))]
    ProcessExit {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// I/O error while running the tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Creates an empty artifact error for the given target.
    pub fn empty(target: impl Into<String>) -> Self {
        Self::EmptyArtifact {
            target: target.into(),
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

    /// Whether another attempt could plausibly succeed.
    ///
    /// A missing binary will be missing on every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ToolNotFound { .. })
    }

    /// Captured diagnostic output, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::ProcessExit { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

impl From<RunError> for ExtractError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::NotFound { path } => Self::ToolNotFound { path },
            RunError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            RunError::Exit { code, stderr } => Self::process_exit(code, stderr),
            RunError::Io(e) => Self::Io(e),
        }
    }
}

impl From<PipeError> for ExtractError {
    fn from(e: PipeError) -> Self {
        match e {
            PipeError::Timeout { timeout_secs, .. } => Self::Timeout { timeout_secs },
            PipeError::Exit { code, stderr, .. } => Self::process_exit(code, stderr),
            PipeError::Empty { tool } => Self::empty(format!("{} stdout", tool)),
            PipeError::Upstream(reason) => Self::process_exit(None, reason),
            PipeError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ExtractError::Timeout { timeout_secs: 1 }.is_retryable());
        assert!(ExtractError::empty("/tmp/x.mp3").is_retryable());
        assert!(ExtractError::process_exit(Some(1), "ERROR").is_retryable());
        assert!(!ExtractError::ToolNotFound {
            path: PathBuf::from("yt-dlp")
        }
        .is_retryable());
    }

    #[test]
    fn test_blank_stderr_is_dropped() {
        let err = ExtractError::process_exit(Some(2), "  \n");
        assert!(err.diagnostics().is_none());

        let err = ExtractError::process_exit(Some(2), "ERROR: 404");
        assert_eq!(err.diagnostics(), Some("ERROR: 404"));
    }

    #[test]
    fn test_pipe_error_mapping() {
        let err: ExtractError = PipeError::Empty { tool: "yt-dlp" }.into();
        assert!(matches!(err, ExtractError::EmptyArtifact { .. }));

        let err: ExtractError = PipeError::Timeout {
            tool: "yt-dlp",
            timeout_secs: 9,
        }
        .into();
        assert!(matches!(err, ExtractError::Timeout { timeout_secs: 9 }));
    }
}
