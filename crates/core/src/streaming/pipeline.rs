//! Streaming pipeline implementation.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{AttemptError, StreamError};
use crate::artifact::download_filename;
use crate::candidates::CandidateBuilder;
use crate::config::Config;
use crate::extractor::Extractor;
use crate::jobs::JobRequest;
use crate::metrics;
use crate::process::{ByteStream, PipeError};
use crate::retry::RetryOrchestrator;
use crate::transcoder::{Transcoder, TrimRange};

/// MIME type of every streamed response.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// A committed audio stream with its response metadata.
pub struct AudioStream {
    /// Suggested download file name.
    pub filename: String,
    pub content_type: &'static str,
    /// Candidate URL that is being streamed.
    pub source_url: String,
    pub attempted_urls: Vec<String>,
    /// Audio bytes; starts with the already received first chunk.
    pub body: ByteStream,
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("source_url", &self.source_url)
            .field("attempted_urls", &self.attempted_urls)
            .finish_non_exhaustive()
    }
}

/// Pipes extractor output through the transcoder to the caller.
#[derive(Clone)]
pub struct StreamingPipeline {
    builder: CandidateBuilder,
    orchestrator: RetryOrchestrator,
    extractor: Arc<dyn Extractor>,
    transcoder: Arc<dyn Transcoder>,
}

impl StreamingPipeline {
    pub fn new(
        builder: CandidateBuilder,
        orchestrator: RetryOrchestrator,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            builder,
            orchestrator,
            extractor,
            transcoder,
        }
    }

    /// Builds a pipeline from the application config.
    pub fn from_config(
        config: &Config,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self::new(
            CandidateBuilder::new(config.candidates.clone()),
            RetryOrchestrator::new(config.retry.clone()),
            extractor,
            transcoder,
        )
    }

    /// Opens an audio stream for `request`.
    ///
    /// Returns once the first audio chunk is in hand, or with an error if no
    /// attempt got that far.
    pub async fn open(&self, request: &JobRequest) -> Result<AudioStream, StreamError> {
        let (source, trim) = match self.validate(request) {
            Ok(parsed) => parsed,
            Err(e) => {
                metrics::STREAM_REQUESTS.with_label_values(&["invalid"]).inc();
                return Err(e);
            }
        };

        let candidates = self.builder.build(&source);
        debug!(
            "Streaming video {} from {} candidate(s)",
            source.video_id,
            candidates.len()
        );

        let extractor = Arc::clone(&self.extractor);
        let transcoder = Arc::clone(&self.transcoder);
        let outcome = self
            .orchestrator
            .run(&candidates, |url, _attempt| {
                let extractor = Arc::clone(&extractor);
                let transcoder = Arc::clone(&transcoder);
                async move { attempt(extractor, transcoder, url, trim).await }
            })
            .await;

        let success = match outcome {
            Ok(success) => success,
            Err(aggregate) => {
                metrics::STREAM_REQUESTS.with_label_values(&["exhausted"]).inc();
                warn!("Streaming video {} failed: {}", source.video_id, aggregate);
                return Err(StreamError::Exhausted(aggregate));
            }
        };

        metrics::STREAM_REQUESTS.with_label_values(&["started"]).inc();
        info!("Streaming video {} from {}", source.video_id, success.url);

        let attempted_urls = success.attempted_urls();
        Ok(AudioStream {
            filename: download_filename(&source.video_id, trim.as_ref()),
            content_type: AUDIO_CONTENT_TYPE,
            source_url: success.url,
            attempted_urls,
            body: success.value,
        })
    }

    fn validate(
        &self,
        request: &JobRequest,
    ) -> Result<(crate::candidates::SourceRef, Option<TrimRange>), StreamError> {
        let source = self
            .builder
            .resolve(&request.source_url, request.video_id.as_deref())?;
        let trim = TrimRange::from_bounds(request.start_time, request.end_time)?;
        Ok((source, trim))
    }
}

/// One candidate attempt: spawn the stages and wait for the first chunk.
///
/// The extractor picks whatever audio the site offers, so its output always
/// goes through the transcoder, which makes the response MP3 and applies
/// the trim window when there is one.
async fn attempt(
    extractor: Arc<dyn Extractor>,
    transcoder: Arc<dyn Transcoder>,
    url: String,
    trim: Option<TrimRange>,
) -> Result<ByteStream, AttemptError> {
    let raw = extractor.extract_stream(&url).await?;
    let output = transcoder.transcode_stream(raw, trim).await?;
    Ok(first_chunk(output).await?)
}

/// Waits for the first non-empty chunk and returns a stream replaying it.
///
/// Dropping the stream on error tears down the processes behind it.
async fn first_chunk(mut stream: ByteStream) -> Result<ByteStream, PipeError> {
    loop {
        match stream.next().await {
            Some(Ok(chunk)) if chunk.is_empty() => continue,
            Some(Ok(chunk)) => {
                let head = stream::once(async move { Ok::<Bytes, PipeError>(chunk) });
                return Ok(head.chain(stream).boxed());
            }
            Some(Err(e)) => return Err(e),
            None => return Err(PipeError::Empty { tool: "pipeline" }),
        }
    }
}
