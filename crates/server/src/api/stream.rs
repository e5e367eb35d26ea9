//! Streaming API handlers.

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use audiograb_core::{ByteStream, JobRequest, AUDIO_CONTENT_TYPE};

use super::error::ApiError;
use crate::state::AppState;

/// Query parameters for one-shot downloads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadParams {
    pub url: String,
    pub video_id: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl From<DownloadParams> for JobRequest {
    fn from(params: DownloadParams) -> Self {
        Self {
            source_url: params.url,
            video_id: params.video_id,
            start_time: params.start,
            end_time: params.end,
        }
    }
}

/// POST /stream - Stream audio in the response body
pub async fn stream_audio(
    State(state): State<Arc<AppState>>,
    body: Result<Json<JobRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    open_stream(&state, request).await
}

/// GET /download?url=...&start=...&end=... - Same as `/stream` with query parameters
pub async fn download(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    open_stream(&state, params.into()).await
}

async fn open_stream(state: &AppState, request: JobRequest) -> Result<Response, ApiError> {
    let audio = state.streaming().open(&request).await?;
    audio_response(&audio.filename, None, audio.body)
}

/// Builds an audio response; headers are final once this returns.
pub(crate) fn audio_response(
    filename: &str,
    content_length: Option<u64>,
    body: ByteStream,
) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, AUDIO_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    builder
        .body(Body::from_stream(body))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
