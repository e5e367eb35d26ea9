//! Mock extractor for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::artifact::Artifact;
use crate::extractor::{ExtractError, Extractor};
use crate::process::{ByteStream, PipeError};

/// Which adapter mode was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    File,
    Stream,
}

/// A recorded extraction call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExtraction {
    pub url: String,
    pub mode: ExtractMode,
    /// Target file for `File` mode.
    pub output: Option<PathBuf>,
}

/// Scripted failure kinds, convertible into each error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    Empty,
    Exit { code: i32, stderr: String },
    ToolNotFound,
}

impl MockFailure {
    pub fn exit(code: i32, stderr: impl Into<String>) -> Self {
        Self::Exit {
            code,
            stderr: stderr.into(),
        }
    }

    pub fn to_extract_error(&self, target: &str) -> ExtractError {
        match self {
            Self::Timeout => ExtractError::Timeout { timeout_secs: 1 },
            Self::Empty => ExtractError::empty(target),
            Self::Exit { code, stderr } => ExtractError::process_exit(Some(*code), stderr.clone()),
            Self::ToolNotFound => ExtractError::ToolNotFound {
                path: PathBuf::from("mock-extractor"),
            },
        }
    }

    pub fn to_pipe_error(&self, tool: &'static str) -> PipeError {
        match self {
            Self::Timeout => PipeError::Timeout {
                tool,
                timeout_secs: 1,
            },
            Self::Empty | Self::ToolNotFound => PipeError::Empty { tool },
            Self::Exit { code, stderr } => PipeError::Exit {
                tool,
                code: Some(*code),
                stderr: stderr.clone(),
            },
        }
    }
}

/// What a single call should do.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Produce these bytes.
    Succeed(Bytes),
    /// Fail before producing anything.
    Fail(MockFailure),
    /// Stream mode: emit the bytes, then fail. File mode treats this as `Fail`.
    FailAfter(Bytes, MockFailure),
}

impl MockOutcome {
    pub fn audio(payload: &'static [u8]) -> Self {
        Self::Succeed(Bytes::from_static(payload))
    }
}

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Script outcomes per URL (consumed in order, then the default applies)
/// - Record every call for assertions
/// - Simulate slow extractions
///
/// # Example
///
/// ```rust,ignore
/// use audiograb_core::testing::{MockExtractor, MockFailure, MockOutcome};
///
/// let extractor = MockExtractor::new();
/// extractor
///     .script("https://vimeo.com/1", vec![MockOutcome::Fail(MockFailure::Timeout)])
///     .await;
///
/// // ... run a job ...
///
/// assert_eq!(extractor.call_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockExtractor {
    scripts: Arc<RwLock<HashMap<String, VecDeque<MockOutcome>>>>,
    default_outcome: Arc<RwLock<MockOutcome>>,
    calls: Arc<RwLock<Vec<RecordedExtraction>>>,
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a mock that succeeds for every URL.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            default_outcome: Arc::new(RwLock::new(MockOutcome::audio(b"ID3 mock audio payload"))),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Create a mock whose every call fails with `failure`.
    pub fn failing(failure: MockFailure) -> Self {
        Self {
            default_outcome: Arc::new(RwLock::new(MockOutcome::Fail(failure))),
            ..Self::new()
        }
    }

    /// Queue outcomes for `url`.
    pub async fn script(&self, url: impl Into<String>, outcomes: Vec<MockOutcome>) {
        self.scripts
            .write()
            .await
            .entry(url.into())
            .or_default()
            .extend(outcomes);
    }

    /// Outcome used once a URL's script is exhausted.
    pub async fn set_default(&self, outcome: MockOutcome) {
        *self.default_outcome.write().await = outcome;
    }

    /// Delay applied before every call resolves.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn calls(&self) -> Vec<RecordedExtraction> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// URLs in call order.
    pub async fn called_urls(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|c| c.url.clone())
            .collect()
    }

    async fn next_outcome(&self, call: RecordedExtraction) -> MockOutcome {
        let url = call.url.clone();
        self.calls.write().await.push(call);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = self
            .scripts
            .write()
            .await
            .get_mut(&url)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }
        self.default_outcome.read().await.clone()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract_to_file(&self, url: &str, output: &Path) -> Result<Artifact, ExtractError> {
        let outcome = self
            .next_outcome(RecordedExtraction {
                url: url.to_string(),
                mode: ExtractMode::File,
                output: Some(output.to_path_buf()),
            })
            .await;

        let target = output.display().to_string();
        match outcome {
            MockOutcome::Succeed(payload) if payload.is_empty() => {
                Err(MockFailure::Empty.to_extract_error(&target))
            }
            MockOutcome::Succeed(payload) => {
                if let Some(parent) = output.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(output, &payload).await?;
                Ok(Artifact::new(output, payload.len() as u64))
            }
            MockOutcome::Fail(failure) | MockOutcome::FailAfter(_, failure) => {
                Err(failure.to_extract_error(&target))
            }
        }
    }

    async fn extract_stream(&self, url: &str) -> Result<ByteStream, ExtractError> {
        let outcome = self
            .next_outcome(RecordedExtraction {
                url: url.to_string(),
                mode: ExtractMode::Stream,
                output: None,
            })
            .await;

        let items: Vec<Result<Bytes, PipeError>> = match outcome {
            MockOutcome::Fail(MockFailure::ToolNotFound) => {
                return Err(MockFailure::ToolNotFound.to_extract_error(url));
            }
            MockOutcome::Succeed(payload) if payload.is_empty() => {
                vec![Err(MockFailure::Empty.to_pipe_error("mock-extractor"))]
            }
            MockOutcome::Succeed(payload) => split(payload).into_iter().map(Ok).collect(),
            MockOutcome::Fail(failure) => vec![Err(failure.to_pipe_error("mock-extractor"))],
            MockOutcome::FailAfter(payload, failure) => {
                let mut items: Vec<_> = split(payload).into_iter().map(Ok).collect();
                items.push(Err(failure.to_pipe_error("mock-extractor")));
                items
            }
        };
        Ok(stream::iter(items).boxed())
    }

    async fn validate(&self) -> Result<(), ExtractError> {
        Ok(())
    }
}

/// Splits a payload in two chunks so consumers see more than one item.
fn split(payload: Bytes) -> Vec<Bytes> {
    if payload.len() < 2 {
        return vec![payload];
    }
    let mid = payload.len() / 2;
    vec![payload.slice(..mid), payload.slice(mid..)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_script_then_default() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let extractor = MockExtractor::new();
        extractor
            .script("u1", vec![MockOutcome::Fail(MockFailure::Timeout)])
            .await;

        let err = extractor.extract_to_file("u1", &output).await.unwrap_err();
        assert!(matches!(err, ExtractError::Timeout { .. }));
        assert!(!output.exists());

        let artifact = extractor.extract_to_file("u1", &output).await.unwrap();
        assert!(artifact.size_bytes > 0);
        assert!(output.exists());
        assert_eq!(extractor.called_urls().await, vec!["u1", "u1"]);
    }

    #[tokio::test]
    async fn test_stream_fail_after() {
        let extractor = MockExtractor::new();
        extractor
            .script(
                "u1",
                vec![MockOutcome::FailAfter(
                    Bytes::from_static(b"abcd"),
                    MockFailure::exit(1, "broken pipe"),
                )],
            )
            .await;

        let items: Vec<_> = extractor.extract_stream("u1").await.unwrap().collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[2].is_err());
    }

    #[tokio::test]
    async fn test_stream_tool_not_found_fails_immediately() {
        let extractor = MockExtractor::failing(MockFailure::ToolNotFound);
        assert!(matches!(
            extractor.extract_stream("u1").await,
            Err(ExtractError::ToolNotFound { .. })
        ));
        assert_eq!(extractor.calls().await[0].mode, ExtractMode::Stream);
    }
}
