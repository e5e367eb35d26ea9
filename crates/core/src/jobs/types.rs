//! Job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::candidates::SourceRef;
use crate::transcoder::TrimRange;

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Externally visible job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to extract audio from a source URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub source_url: String,
    #[serde(default)]
    pub video_id: Option<String>,
    /// Trim start in seconds.
    #[serde(default)]
    pub start_time: Option<f64>,
    /// Trim end in seconds.
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl JobRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    pub fn with_video_id(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = Some(video_id.into());
        self
    }

    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }
}

/// Internal job state.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Processing,
    Completed {
        artifact: Artifact,
        attempted_urls: Vec<String>,
    },
    Failed {
        reason: String,
        attempted_urls: Vec<String>,
    },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Processing => JobStatus::Processing,
            Self::Completed { .. } => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// A tracked job.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    pub source: SourceRef,
    pub trim: Option<TrimRange>,
    pub state: JobState,
}

impl Job {
    /// Creates a new job in the `Processing` state.
    pub fn new(source: SourceRef, trim: Option<TrimRange>) -> Self {
        Self {
            id: JobId::new(),
            created_at: Utc::now(),
            source,
            trim,
            state: JobState::Processing,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Suggested download file name for the result.
    pub fn filename(&self) -> String {
        crate::artifact::download_filename(&self.source.video_id, self.trim.as_ref())
    }

    pub fn view(&self) -> JobView {
        let (file_size, error, attempted_urls) = match &self.state {
            JobState::Processing => (None, None, Vec::new()),
            JobState::Completed {
                artifact,
                attempted_urls,
            } => (Some(artifact.size_bytes), None, attempted_urls.clone()),
            JobState::Failed {
                reason,
                attempted_urls,
            } => (None, Some(reason.clone()), attempted_urls.clone()),
        };

        JobView {
            job_id: self.id,
            status: self.status(),
            file_size,
            error,
            created_at: self.created_at,
            attempted_urls,
        }
    }
}

/// Serializable snapshot of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted_urls: Vec<String>,
}
