//! Streaming pipeline integration tests.
//!
//! These tests verify the synchronous streaming mode with mock tools:
//! - Metadata is fixed before the body is handed out
//! - Fallback only happens before the first chunk
//! - Failures after the first chunk surface as a stream error
//! - Transcoder failures end the run instead of trying more candidates

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;

use audiograb_core::{
    candidates::CandidateBuilder,
    jobs::JobRequest,
    process::PipeError,
    retry::{RetryOrchestrator, RetryPolicy},
    streaming::{StreamError, StreamingPipeline, AUDIO_CONTENT_TYPE},
    testing::{MockExtractor, MockFailure, MockOutcome, MockTranscoder},
};

const TOKEN_URL: &str = "https://vimeo.com/12345?h=abcdef";
const FIRST_CANDIDATE: &str = "https://player.vimeo.com/video/12345?h=abcdef";

fn pipeline(extractor: &Arc<MockExtractor>, transcoder: &Arc<MockTranscoder>) -> StreamingPipeline {
    StreamingPipeline::new(
        CandidateBuilder::default(),
        RetryOrchestrator::new(RetryPolicy::new(1, 0)),
        extractor.clone(),
        transcoder.clone(),
    )
}

async fn collect(body: audiograb_core::ByteStream) -> (Vec<u8>, Option<PipeError>) {
    let mut bytes = Vec::new();
    let mut body = body;
    while let Some(item) = body.next().await {
        match item {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(e) => return (bytes, Some(e)),
        }
    }
    (bytes, None)
}

#[tokio::test]
async fn test_untrimmed_stream_is_normalized_by_transcoder() {
    let extractor = Arc::new(MockExtractor::new());
    extractor
        .set_default(MockOutcome::audio(b"ID3 full length audio"))
        .await;
    let transcoder = Arc::new(MockTranscoder::new());

    let audio = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL))
        .await
        .unwrap();

    assert_eq!(audio.content_type, AUDIO_CONTENT_TYPE);
    assert_eq!(audio.filename, "12345.mp3");
    assert_eq!(audio.source_url, FIRST_CANDIDATE);

    let (bytes, error) = collect(audio.body).await;
    assert_eq!(bytes, b"ID3 full length audio");
    assert!(error.is_none());

    let transcodes = transcoder.recorded_transcodes().await;
    assert_eq!(transcodes.len(), 1);
    assert!(transcodes[0].input.is_none());
    assert_eq!(transcodes[0].trim, None);
}

#[tokio::test]
async fn test_trimmed_stream_goes_through_transcoder() {
    let extractor = Arc::new(MockExtractor::new());
    let transcoder = Arc::new(MockTranscoder::new());

    let audio = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL).with_range(10.0, 25.0))
        .await
        .unwrap();

    assert_eq!(audio.filename, "12345_10-25.mp3");
    let transcodes = transcoder.recorded_transcodes().await;
    assert_eq!(transcodes.len(), 1);
    assert!(transcodes[0].input.is_none());
    assert_eq!(transcodes[0].trim.unwrap().start, 10.0);

    let (bytes, error) = collect(audio.body).await;
    assert!(!bytes.is_empty());
    assert!(error.is_none());
}

#[tokio::test]
async fn test_falls_back_before_first_chunk() {
    let extractor = Arc::new(MockExtractor::new());
    extractor
        .script(
            FIRST_CANDIDATE,
            vec![MockOutcome::Fail(MockFailure::exit(1, "HTTP Error 404"))],
        )
        .await;
    let transcoder = Arc::new(MockTranscoder::new());

    let audio = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL))
        .await
        .unwrap();

    assert_eq!(audio.source_url, TOKEN_URL);
    assert_eq!(audio.attempted_urls, vec![FIRST_CANDIDATE, TOKEN_URL]);
    assert_eq!(extractor.called_urls().await, vec![FIRST_CANDIDATE, TOKEN_URL]);
}

#[tokio::test]
async fn test_empty_output_counts_as_failure() {
    let extractor = Arc::new(MockExtractor::new());
    extractor
        .script(FIRST_CANDIDATE, vec![MockOutcome::Succeed(Bytes::new())])
        .await;
    let transcoder = Arc::new(MockTranscoder::new());

    let audio = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL))
        .await
        .unwrap();
    assert_eq!(audio.source_url, TOKEN_URL);
}

#[tokio::test]
async fn test_exhausted_candidates_return_structured_error() {
    let extractor = Arc::new(MockExtractor::failing(MockFailure::Timeout));
    let transcoder = Arc::new(MockTranscoder::new());

    let err = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL))
        .await
        .unwrap_err();

    match err {
        StreamError::Exhausted(aggregate) => {
            assert_eq!(aggregate.attempted_urls.len(), 4);
            assert!(aggregate.last_error.unwrap().contains("timed out"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_failure_after_first_chunk_ends_stream() {
    let extractor = Arc::new(MockExtractor::new());
    extractor
        .script(
            FIRST_CANDIDATE,
            vec![MockOutcome::FailAfter(
                Bytes::from_static(b"partial audio"),
                MockFailure::exit(1, "connection reset"),
            )],
        )
        .await;
    let transcoder = Arc::new(MockTranscoder::new());

    let audio = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL))
        .await
        .unwrap();
    let (bytes, error) = collect(audio.body).await;

    assert_eq!(bytes, b"partial audio");
    match error {
        Some(PipeError::Upstream(message)) => assert!(message.contains("connection reset")),
        other => panic!("expected upstream error, got {:?}", other),
    }
    // Committed: no other candidate is tried.
    assert_eq!(extractor.call_count().await, 1);
}

#[tokio::test]
async fn test_transcoder_failure_is_not_retried() {
    let extractor = Arc::new(MockExtractor::new());
    let transcoder = Arc::new(MockTranscoder::new());
    transcoder
        .set_next_error(MockFailure::exit(1, "Invalid data found when processing input"))
        .await;

    let err = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL).with_range(10.0, 25.0))
        .await
        .unwrap_err();

    match err {
        StreamError::Exhausted(aggregate) => {
            assert_eq!(aggregate.attempted_urls, vec![FIRST_CANDIDATE]);
            assert!(aggregate.last_error.unwrap().contains("Invalid data found"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(extractor.call_count().await, 1);
    assert_eq!(transcoder.transcode_count().await, 1);
}

#[tokio::test]
async fn test_invalid_requests_spawn_nothing() {
    let extractor = Arc::new(MockExtractor::new());
    let transcoder = Arc::new(MockTranscoder::new());
    let pipeline = pipeline(&extractor, &transcoder);

    let err = pipeline
        .open(&JobRequest::new("https://example.com/about"))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidSource(_)));

    let err = pipeline
        .open(&JobRequest::new(TOKEN_URL).with_range(30.0, 30.0))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidRange(_)));

    assert_eq!(extractor.call_count().await, 0);
    assert_eq!(transcoder.transcode_count().await, 0);
}

#[tokio::test]
async fn test_missing_extractor_stops_after_one_attempt() {
    let extractor = Arc::new(MockExtractor::failing(MockFailure::ToolNotFound));
    let transcoder = Arc::new(MockTranscoder::new());

    let err = pipeline(&extractor, &transcoder)
        .open(&JobRequest::new(TOKEN_URL))
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::Exhausted(_)));
    assert_eq!(extractor.call_count().await, 1);
}
