//! Mock transcoder for testing.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::mock_extractor::MockFailure;
use crate::artifact::Artifact;
use crate::process::{ByteStream, PipeError};
use crate::transcoder::{TranscodeError, Transcoder, TrimRange};

/// A recorded transcode for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTranscode {
    /// Input file, `None` for stream mode.
    pub input: Option<PathBuf>,
    /// Output file, `None` for stream mode.
    pub output: Option<PathBuf>,
    pub trim: Option<TrimRange>,
}

/// Mock implementation of the Transcoder trait.
///
/// File mode copies the input to the output; stream mode passes bytes
/// through unchanged and, like the real adapter, reports an input failure
/// as [`PipeError::Upstream`]. Ranges are validated like the real adapter,
/// and a rejected range is not recorded.
#[derive(Debug)]
pub struct MockTranscoder {
    transcodes: Arc<RwLock<Vec<RecordedTranscode>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<MockFailure>>>,
    /// Simulated transcode duration.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            transcodes: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.transcodes.read().await.clone()
    }

    pub async fn transcode_count(&self) -> usize {
        self.transcodes.read().await.len()
    }

    /// Configure the next operation to fail.
    pub async fn set_next_error(&self, failure: MockFailure) {
        *self.next_error.write().await = Some(failure);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    async fn record(&self, transcode: RecordedTranscode) -> Option<MockFailure> {
        self.transcodes.write().await.push(transcode);
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.next_error.write().await.take()
    }
}

fn transcode_error(failure: &MockFailure, target: &str) -> TranscodeError {
    match failure {
        MockFailure::Timeout => TranscodeError::Timeout { timeout_secs: 1 },
        MockFailure::Empty => TranscodeError::EmptyArtifact {
            target: target.to_string(),
        },
        MockFailure::Exit { code, stderr } => {
            TranscodeError::process_exit(Some(*code), stderr.clone())
        }
        MockFailure::ToolNotFound => TranscodeError::ToolNotFound {
            path: PathBuf::from("mock-transcoder"),
        },
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode_file(
        &self,
        input: &Path,
        output: &Path,
        trim: Option<TrimRange>,
    ) -> Result<Artifact, TranscodeError> {
        if let Some(range) = &trim {
            range.validate()?;
        }

        let failure = self
            .record(RecordedTranscode {
                input: Some(input.to_path_buf()),
                output: Some(output.to_path_buf()),
                trim,
            })
            .await;
        if let Some(failure) = failure {
            return Err(transcode_error(&failure, &output.display().to_string()));
        }

        let payload = tokio::fs::read(input).await?;
        if payload.is_empty() {
            return Err(transcode_error(
                &MockFailure::Empty,
                &output.display().to_string(),
            ));
        }
        tokio::fs::write(output, &payload).await?;
        Ok(Artifact::new(output, payload.len() as u64))
    }

    async fn transcode_stream(
        &self,
        input: ByteStream,
        trim: Option<TrimRange>,
    ) -> Result<ByteStream, TranscodeError> {
        if let Some(range) = &trim {
            range.validate()?;
        }

        let failure = self
            .record(RecordedTranscode {
                input: None,
                output: None,
                trim,
            })
            .await;
        match failure {
            Some(failure) => Err(transcode_error(&failure, "stdout")),
            None => Ok(input
                .map(|item| item.map_err(|e| PipeError::Upstream(e.to_string())))
                .boxed()),
        }
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp3");
        let output = dir.path().join("out.mp3");
        tokio::fs::write(&input, b"audio").await.unwrap();

        let transcoder = MockTranscoder::new();
        let artifact = transcoder
            .transcode_file(&input, &output, Some(TrimRange::new(1.0, 2.0)))
            .await
            .unwrap();
        assert_eq!(artifact.size_bytes, 5);
        assert_eq!(transcoder.transcode_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_range_not_recorded() {
        let dir = TempDir::new().unwrap();
        let transcoder = MockTranscoder::new();
        let err = transcoder
            .transcode_file(
                &dir.path().join("in.mp3"),
                &dir.path().join("out.mp3"),
                Some(TrimRange::new(3.0, 1.0)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidRange { .. }));
        assert_eq!(transcoder.transcode_count().await, 0);
    }

    #[tokio::test]
    async fn test_stream_reports_input_failure_as_upstream() {
        let input: ByteStream = futures::stream::iter(vec![
            Ok(bytes::Bytes::from_static(b"ab")),
            Err(PipeError::Empty { tool: "yt-dlp" }),
        ])
        .boxed();

        let transcoder = MockTranscoder::new();
        let mut output = transcoder.transcode_stream(input, None).await.unwrap();
        assert_eq!(output.next().await.unwrap().unwrap().as_ref(), b"ab");
        assert!(matches!(output.next().await, Some(Err(PipeError::Upstream(_)))));
    }
}
