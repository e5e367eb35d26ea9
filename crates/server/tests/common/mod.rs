//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock tools injected, so the HTTP surface can be exercised without
//! yt-dlp or ffmpeg installed.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use audiograb_core::{
    testing::{MockExtractor, MockTranscoder},
    Config, Extractor, RetryPolicy, Transcoder,
};
use audiograb_server::{api::create_router, state::AppState};

/// Test fixture for API testing with mock tools.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/jobs", json!({
///         "sourceUrl": "https://vimeo.com/12345"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state, for inspecting the job registry
    pub state: Arc<AppState>,
    /// Mock extractor - script per-URL outcomes
    pub extractor: Arc<MockExtractor>,
    /// Mock transcoder - inspect trims, inject failures
    pub transcoder: Arc<MockTranscoder>,
    /// Job work directory
    pub work_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw body bytes received before the body ended or failed
    pub bytes: Bytes,
    /// Whether the body ended with an error
    pub body_failed: bool,
    /// Body parsed as JSON, or `Null`
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Create a fixture whose extractor succeeds for every URL.
    pub fn new() -> Self {
        Self::with_extractor(MockExtractor::new())
    }

    /// Create a fixture around a preconfigured extractor.
    pub fn with_extractor(extractor: MockExtractor) -> Self {
        let work_dir = TempDir::new().expect("Failed to create work dir");

        let mut config = Config::default();
        config.jobs.work_dir = work_dir.path().to_path_buf();
        config.retry = RetryPolicy::new(1, 0);

        let extractor = Arc::new(extractor);
        let transcoder = Arc::new(MockTranscoder::new());

        let state = Arc::new(AppState::from_config(
            config,
            Arc::clone(&extractor) as Arc<dyn Extractor>,
            Arc::clone(&transcoder) as Arc<dyn Transcoder>,
        ));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            extractor,
            transcoder,
            work_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Submit a job and return its id.
    pub async fn submit(&self, body: Value) -> String {
        let response = self.post("/api/v1/jobs", body).await;
        assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
        response.body["jobId"]
            .as_str()
            .expect("jobId missing")
            .to_string()
    }

    /// Poll job status until it leaves `processing`.
    pub async fn wait_for_terminal(&self, job_id: &str) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/jobs/{}", job_id)).await;
            if response.body["status"] != "processing" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job {} did not finish in time", job_id);
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();

        let mut body = response.into_body();
        let mut collected = Vec::new();
        let mut body_failed = false;
        while let Some(frame) = body.frame().await {
            match frame {
                Ok(frame) => {
                    if let Some(data) = frame.data_ref() {
                        collected.extend_from_slice(data);
                    }
                }
                Err(_) => {
                    body_failed = true;
                    break;
                }
            }
        }
        let bytes = Bytes::from(collected);

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body_failed,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
