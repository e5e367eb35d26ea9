//! Job API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use audiograb_core::{JobError, JobId, JobRequest, JobStatus, JobView};

use super::error::ApiError;
use super::stream::audio_response;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a submitted or still-processing job.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: JobId,
    pub status: JobStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /jobs - Submit a new extraction job
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    body: Result<Json<JobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let view = state.jobs().submit(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id: view.job_id,
            status: view.status,
        }),
    ))
}

/// GET /jobs/{id} - Get job status
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    let id = parse_job_id(&id)?;
    Ok(Json(state.jobs().status(&id).await?))
}

/// GET /jobs/{id}/result - Download the finished audio (once)
pub async fn get_job_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_job_id(&id)?;

    match state.jobs().take_result(&id).await {
        Ok(guard) => {
            let filename = guard.filename().to_string();
            let size = guard.artifact().size_bytes;
            let body = guard.into_stream().await.map_err(JobError::Io)?;
            audio_response(&filename, Some(size), body)
        }
        Err(JobError::StillProcessing(id)) => Ok((
            StatusCode::ACCEPTED,
            Json(JobAccepted {
                job_id: id,
                status: JobStatus::Processing,
            }),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Malformed ids can never name a job.
fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("Job not found: {}", raw)))
}
