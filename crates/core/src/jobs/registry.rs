//! In-memory job registry.

use futures::StreamExt;
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::error::JobError;
use super::types::{Job, JobId, JobState, JobStatus, JobView};
use crate::artifact::Artifact;
use crate::process::{ByteStream, PipeError};

/// Guarded collection of jobs.
///
/// Every state transition happens under the write lock and only from
/// `Processing`, so a terminal state is never overwritten and a job that is
/// gone stays gone.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn view(&self, id: &JobId) -> Option<JobView> {
        self.jobs.read().await.get(id).map(Job::view)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Number of jobs currently in `status`.
    pub async fn count(&self, status: JobStatus) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|job| job.status() == status)
            .count()
    }

    /// Marks a job completed. Returns false if the update was discarded.
    pub async fn complete(
        &self,
        id: &JobId,
        artifact: Artifact,
        attempted_urls: Vec<String>,
    ) -> bool {
        self.transition(
            id,
            JobState::Completed {
                artifact,
                attempted_urls,
            },
        )
        .await
    }

    /// Marks a job failed. Returns false if the update was discarded.
    pub async fn fail(
        &self,
        id: &JobId,
        reason: impl Into<String>,
        attempted_urls: Vec<String>,
    ) -> bool {
        self.transition(
            id,
            JobState::Failed {
                reason: reason.into(),
                attempted_urls,
            },
        )
        .await
    }

    async fn transition(&self, id: &JobId, state: JobState) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) if job.status() == JobStatus::Processing => {
                debug!("Job {} -> {}", id, state.status());
                job.state = state;
                true
            }
            Some(job) => {
                warn!(
                    "Ignoring {} update for job {} already {}",
                    state.status(),
                    id,
                    job.status()
                );
                false
            }
            None => {
                warn!("Ignoring {} update for unknown job {}", state.status(), id);
                false
            }
        }
    }

    /// Hands a completed artifact to the caller and forgets the job.
    ///
    /// The returned guard owns the file and deletes it when dropped, so a
    /// result can be fetched once.
    pub async fn take_artifact(&self, id: &JobId) -> Result<ArtifactGuard, JobError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get(id).map(|job| &job.state) {
            None => return Err(JobError::NotFound(*id)),
            Some(JobState::Processing) => return Err(JobError::StillProcessing(*id)),
            Some(JobState::Failed {
                reason,
                attempted_urls,
            }) => {
                return Err(JobError::Failed {
                    id: *id,
                    reason: reason.clone(),
                    attempted_urls: attempted_urls.clone(),
                })
            }
            Some(JobState::Completed { .. }) => {}
        }

        let job = jobs.remove(id).ok_or(JobError::NotFound(*id))?;
        let filename = job.filename();
        match job.state {
            JobState::Completed { artifact, .. } => Ok(ArtifactGuard {
                job_id: *id,
                artifact,
                filename,
            }),
            _ => Err(JobError::NotFound(*id)),
        }
    }

    /// Removes every job whose age is at least `max_age`, whatever its state.
    ///
    /// The removed jobs are returned so their files can be deleted outside
    /// the lock.
    pub async fn sweep_expired(&self, max_age: Duration) -> Vec<Job> {
        let now = chrono::Utc::now();
        let mut jobs = self.jobs.write().await;

        let expired: Vec<JobId> = jobs
            .values()
            .filter(|job| {
                (now - job.created_at)
                    .to_std()
                    .map(|age| age >= max_age)
                    .unwrap_or(false)
            })
            .map(|job| job.id)
            .collect();

        expired.iter().filter_map(|id| jobs.remove(id)).collect()
    }
}

/// Exclusive ownership of a fetched artifact.
///
/// Deletes the file when dropped.
#[derive(Debug)]
pub struct ArtifactGuard {
    job_id: JobId,
    artifact: Artifact,
    filename: String,
}

impl ArtifactGuard {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Suggested download file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Streams the file; the guard lives as long as the stream.
    pub async fn into_stream(self) -> io::Result<ByteStream> {
        let file = tokio::fs::File::open(&self.artifact.path).await?;
        let guard = self;
        let stream = ReaderStream::new(file).map(move |chunk| {
            let _owner = &guard;
            chunk.map_err(PipeError::Io)
        });
        Ok(stream.boxed())
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.artifact.path) {
            Ok(()) => debug!(
                "Deleted delivered artifact for job {}: {}",
                self.job_id,
                self.artifact.path.display()
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to delete artifact {}: {}",
                self.artifact.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::SourceRef;
    use tempfile::TempDir;

    fn job() -> Job {
        Job::new(
            SourceRef {
                video_id: "12345".to_string(),
                token: None,
                original_url: "https://vimeo.com/12345".to_string(),
            },
            None,
        )
    }

    async fn artifact(dir: &TempDir, name: &str) -> Artifact {
        let path = dir.path().join(name);
        tokio::fs::write(&path, b"ID3audio").await.unwrap();
        Artifact::new(path, 8)
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let dir = TempDir::new().unwrap();
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id;
        registry.insert(job).await;

        assert!(registry.fail(&id, "boom", vec![]).await);
        assert!(!registry.complete(&id, artifact(&dir, "a.mp3").await, vec![]).await);
        assert_eq!(registry.view(&id).await.unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_update_for_missing_job_is_discarded() {
        let registry = JobRegistry::new();
        assert!(!registry.fail(&JobId::new(), "late", vec![]).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_status_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id;
        registry.insert(job).await;
        registry
            .complete(&id, artifact(&dir, "a.mp3").await, vec!["u1".to_string()])
            .await;

        let first = registry.view(&id).await.unwrap();
        let second = registry.view(&id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.file_size, Some(8));
    }

    #[tokio::test]
    async fn test_take_artifact_once() {
        let dir = TempDir::new().unwrap();
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id;
        registry.insert(job).await;

        assert!(matches!(
            registry.take_artifact(&id).await,
            Err(JobError::StillProcessing(_))
        ));

        let artifact = artifact(&dir, "a.mp3").await;
        let path = artifact.path.clone();
        registry.complete(&id, artifact, vec![]).await;

        let guard = registry.take_artifact(&id).await.unwrap();
        assert_eq!(guard.filename(), "12345.mp3");
        assert!(matches!(
            registry.take_artifact(&id).await,
            Err(JobError::NotFound(_))
        ));

        assert!(path.exists());
        drop(guard);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_stream_keeps_file_until_dropped() {
        let dir = TempDir::new().unwrap();
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id;
        registry.insert(job).await;
        let artifact = artifact(&dir, "a.mp3").await;
        let path = artifact.path.clone();
        registry.complete(&id, artifact, vec![]).await;

        let mut stream = registry.take_artifact(&id).await.unwrap().into_stream().await.unwrap();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"ID3audio");
        assert!(path.exists());

        drop(stream);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_take_failed_job_reports_reason() {
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id;
        registry.insert(job).await;
        registry.fail(&id, "exhausted", vec!["u1".to_string()]).await;

        match registry.take_artifact(&id).await {
            Err(JobError::Failed {
                reason,
                attempted_urls,
                ..
            }) => {
                assert_eq!(reason, "exhausted");
                assert_eq!(attempted_urls, vec!["u1"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|g| g.job_id())),
        }
        // Failed jobs stay until swept.
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_old_jobs_only() {
        let registry = JobRegistry::new();
        let mut old = job();
        old.created_at = chrono::Utc::now() - chrono::Duration::hours(2);
        let old_id = old.id;
        let fresh = job();
        let fresh_id = fresh.id;
        registry.insert(old).await;
        registry.insert(fresh).await;

        let swept = registry.sweep_expired(Duration::from_secs(3600)).await;
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, old_id);
        assert!(registry.get(&old_id).await.is_none());
        assert!(registry.get(&fresh_id).await.is_some());
    }
}
