//! Streaming child processes: stdout as a byte stream, stdin fed from one.
//!
//! A streaming stage may be consumed by a slow HTTP client, so its time
//! budget is an idle budget: every wait for the next chunk (and for the
//! final exit status) is bounded by [`ProcessLimits::timeout`], while time
//! spent with the consumer not polling is not counted.

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::{capture_diagnostics, PipeError, ProcessLimits, DIAGNOSTICS_GRACE};

/// A stream of audio bytes produced by a pipeline stage.
///
/// The stream ends cleanly only if the producing process exited with status
/// zero after emitting at least one byte; any other outcome is delivered as
/// a final `Err` item.
pub type ByteStream = BoxStream<'static, Result<Bytes, PipeError>>;

const READ_CHUNK: usize = 64 * 1024;

/// Background task copying a [`ByteStream`] into a child's stdin.
///
/// Dropping the pump aborts the copy, which drops the upstream stream and,
/// through `kill_on_drop`, the upstream process.
pub struct StdinPump {
    task: JoinHandle<()>,
    failure: oneshot::Receiver<PipeError>,
}

impl Drop for StdinPump {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts copying `input` into `stdin`.
///
/// An upstream error is reported through the pump before stdin is closed, so
/// the reading side always sees it once the child reaches end of input.
pub fn spawn_stdin_pump(mut input: ByteStream, mut stdin: ChildStdin) -> StdinPump {
    let (failure_tx, failure) = oneshot::channel();

    let task = tokio::spawn(async move {
        while let Some(item) = input.next().await {
            match item {
                Ok(chunk) => {
                    if let Err(e) = stdin.write_all(&chunk).await {
                        // Downstream stopped reading, e.g. the trim window ended.
                        debug!("Stdin pump stopped: {}", e);
                        return;
                    }
                }
                Err(e) => {
                    let _ = failure_tx.send(PipeError::Upstream(e.to_string()));
                    return;
                }
            }
        }
        let _ = stdin.shutdown().await;
    });

    StdinPump { task, failure }
}

struct StreamState {
    tool: &'static str,
    child: Child,
    reader: ReaderStream<tokio::process::ChildStdout>,
    diagnostics: Option<JoinHandle<String>>,
    pump: Option<StdinPump>,
    idle_timeout: Duration,
    emitted: u64,
}

impl StreamState {
    async fn next_item(&mut self) -> Option<Result<Bytes, PipeError>> {
        match timeout(self.idle_timeout, self.reader.next()).await {
            Err(_) => {
                self.kill().await;
                Some(Err(self.timed_out()))
            }
            Ok(Some(Ok(chunk))) => {
                self.emitted += chunk.len() as u64;
                Some(Ok(chunk))
            }
            Ok(Some(Err(e))) => {
                self.kill().await;
                Some(Err(PipeError::Io(e)))
            }
            Ok(None) => self.finish().await.err().map(Err),
        }
    }

    async fn finish(&mut self) -> Result<(), PipeError> {
        let status = match timeout(self.idle_timeout, self.child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                self.kill().await;
                return Err(self.timed_out());
            }
        };

        let stderr = match self.diagnostics.take() {
            Some(handle) => timeout(DIAGNOSTICS_GRACE, handle)
                .await
                .ok()
                .and_then(|joined| joined.ok())
                .unwrap_or_default(),
            None => String::new(),
        };

        if let Some(pump) = self.pump.as_mut() {
            if let Ok(failure) = pump.failure.try_recv() {
                return Err(failure);
            }
        }

        if !status.success() {
            return Err(PipeError::Exit {
                tool: self.tool,
                code: status.code(),
                stderr,
            });
        }

        if self.emitted == 0 {
            return Err(PipeError::Empty { tool: self.tool });
        }

        debug!(tool = self.tool, bytes = self.emitted, "Stream finished");
        Ok(())
    }

    fn timed_out(&self) -> PipeError {
        PipeError::Timeout {
            tool: self.tool,
            timeout_secs: self.idle_timeout.as_secs(),
        }
    }

    async fn kill(&mut self) {
        let _ = self.child.kill().await;
        if let Some(handle) = self.diagnostics.take() {
            handle.abort();
        }
    }
}

/// Turns a spawned child's stdout into a [`ByteStream`].
///
/// The child must have been spawned with piped stdout (and usually piped
/// stderr) and `kill_on_drop(true)`, so dropping the stream stops it.
pub fn stream_stdout(
    mut child: Child,
    tool: &'static str,
    limits: ProcessLimits,
    pump: Option<StdinPump>,
) -> io::Result<ByteStream> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout was not captured"))?;
    let diagnostics = child
        .stderr
        .take()
        .map(|stderr| capture_diagnostics(stderr, limits.max_diagnostic_bytes));

    let state = StreamState {
        tool,
        child,
        reader: ReaderStream::with_capacity(stdout, READ_CHUNK),
        diagnostics,
        pump,
        idle_timeout: limits.timeout,
        emitted: 0,
    };

    Ok(stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        match state.next_item().await {
            Some(Ok(chunk)) => Some((Ok(chunk), Some(state))),
            Some(Err(e)) => Some((Err(e), None)),
            None => None,
        }
    })
    .boxed())
}
