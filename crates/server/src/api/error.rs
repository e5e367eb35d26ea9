//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use audiograb_core::{JobError, StreamError};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted_urls: Vec<String>,
}

/// An error response with its status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                attempted_urls: Vec::new(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_attempted_urls(mut self, urls: Vec<String>) -> Self {
        self.body.attempted_urls = urls;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}: {}", self.status, self.body.error);
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        let message = e.to_string();
        match e {
            JobError::NotFound(_) => Self::not_found(message),
            JobError::StillProcessing(_) => Self::new(StatusCode::ACCEPTED, message),
            JobError::Failed { attempted_urls, .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
                    .with_attempted_urls(attempted_urls)
            }
            JobError::InvalidSource(_) | JobError::InvalidRange(_) => Self::bad_request(message),
            JobError::Io(_) => Self::internal(message),
        }
    }
}

impl From<StreamError> for ApiError {
    fn from(e: StreamError) -> Self {
        let message = e.to_string();
        match e {
            StreamError::InvalidSource(_) | StreamError::InvalidRange(_) => {
                Self::bad_request(message)
            }
            StreamError::Exhausted(aggregate) => {
                Self::new(StatusCode::BAD_GATEWAY, message)
                    .with_attempted_urls(aggregate.attempted_urls)
            }
        }
    }
}
