//! Child-process plumbing shared by the extractor and transcoder adapters.
//!
//! Both external tools follow the same conventions: a bounded
//! time budget, stderr drained into a bounded diagnostic buffer, and success
//! judged by exit status plus a non-empty result.

mod diagnostics;
mod stream;

pub use diagnostics::{capture_diagnostics, DiagnosticBuffer};
pub use stream::{spawn_stdin_pump, stream_stdout, ByteStream, StdinPump};

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// How long to wait for the stderr reader after the child has exited.
pub(crate) const DIAGNOSTICS_GRACE: Duration = Duration::from_secs(5);

/// Per-invocation resource limits.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLimits {
    /// Wall-clock budget for a run-to-completion invocation; for a streaming
    /// stage, the longest wait for its next chunk or its exit.
    pub timeout: Duration,
    /// Maximum bytes of stderr kept for error reports.
    pub max_diagnostic_bytes: usize,
}

/// Failure of a run-to-completion invocation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("executable not found: {path}")]
    NotFound { path: PathBuf },

    #[error("timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("exited with code {code:?}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure surfaced as an item of a [`ByteStream`].
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("{tool} timed out after {timeout_secs} seconds")]
    Timeout { tool: &'static str, timeout_secs: u64 },

    #[error("{tool} exited with code {code:?}{}", stderr_summary(Some(.stderr.as_str())))]
    Exit {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} exited cleanly but produced no output")]
    Empty { tool: &'static str },

    #[error("upstream stage failed: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// `": <last non-blank stderr line>"`, or nothing when there is none.
pub(crate) fn stderr_summary(stderr: Option<&str>) -> String {
    stderr
        .and_then(|s| s.lines().rev().map(str::trim).find(|l| !l.is_empty()))
        .map(|line| format!(": {}", line))
        .unwrap_or_default()
}

/// Maps a spawn failure, distinguishing a missing executable.
pub fn spawn_error(e: io::Error, program: &Path) -> RunError {
    if e.kind() == io::ErrorKind::NotFound {
        RunError::NotFound {
            path: program.to_path_buf(),
        }
    } else {
        RunError::Io(e)
    }
}

/// Runs `command` to completion within `limits`.
///
/// Stdout is discarded; on success the captured diagnostics are returned.
/// The child is killed if the timeout fires.
pub async fn run_to_completion(
    mut command: Command,
    program: &Path,
    limits: ProcessLimits,
) -> Result<String, RunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| spawn_error(e, program))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RunError::Io(io::Error::other("stderr was not captured")))?;
    let diagnostics = capture_diagnostics(stderr, limits.max_diagnostic_bytes);

    match timeout(limits.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stderr = timeout(DIAGNOSTICS_GRACE, diagnostics)
                .await
                .ok()
                .and_then(|joined| joined.ok())
                .unwrap_or_default();
            if status.success() {
                Ok(stderr)
            } else {
                Err(RunError::Exit {
                    code: status.code(),
                    stderr,
                })
            }
        }
        Ok(Err(e)) => Err(RunError::Io(e)),
        Err(_) => {
            let _ = child.kill().await;
            diagnostics.abort();
            Err(RunError::Timeout {
                timeout_secs: limits.timeout.as_secs(),
            })
        }
    }
}

/// Size of the file at `path`, or `None` if it is missing or empty.
pub async fn non_empty_size(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Some(meta.len()),
        _ => None,
    }
}

/// Removes a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub async fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes every file in `dir` whose name starts with `prefix`.
///
/// Tools write sidecar files (`.part`, `.ytdl`, pre-conversion formats)
/// next to the requested output; all of them share its stem.
pub async fn remove_with_prefix(dir: &Path, prefix: &str) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(prefix) && remove_if_exists(&entry.path()).await? {
            removed += 1;
        }
    }
    Ok(removed)
}
