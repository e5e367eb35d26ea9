//! Job submission, runners and the expiry sweeper.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

use super::config::JobsConfig;
use super::error::JobError;
use super::registry::{ArtifactGuard, JobRegistry};
use super::types::{Job, JobId, JobRequest, JobState, JobView};
use crate::candidates::{CandidateBuilder, SourceRef};
use crate::config::Config;
use crate::extractor::{extraction_target, Extractor};
use crate::metrics;
use crate::process::{remove_if_exists, remove_with_prefix};
use crate::retry::RetryOrchestrator;
use crate::transcoder::{Transcoder, TrimRange};

/// Everything a runner needs, cheap to clone into a task.
#[derive(Clone)]
struct JobRunner {
    registry: Arc<JobRegistry>,
    builder: CandidateBuilder,
    orchestrator: RetryOrchestrator,
    extractor: Arc<dyn Extractor>,
    transcoder: Arc<dyn Transcoder>,
    work_dir: PathBuf,
}

impl JobRunner {
    /// Runs one job to a terminal state.
    async fn run(&self, id: JobId, source: SourceRef, trim: Option<TrimRange>) {
        let candidates = self.builder.build(&source);
        info!(
            "Job {} started: video {} with {} candidate(s)",
            id,
            source.video_id,
            candidates.len()
        );

        let extract_path = extraction_target(
            &self.work_dir,
            &format!("{}.extract", id),
            self.extractor.output_extension(),
        );
        let extractor = Arc::clone(&self.extractor);
        let outcome = self
            .orchestrator
            .run(&candidates, |url, _attempt| {
                let extractor = Arc::clone(&extractor);
                let path = extract_path.clone();
                async move { extractor.extract_to_file(&url, &path).await }
            })
            .await;

        let success = match outcome {
            Ok(success) => success,
            Err(aggregate) => {
                self.finish_failed(&id, aggregate.to_string(), aggregate.attempted_urls)
                    .await;
                return;
            }
        };
        let attempted_urls = success.attempted_urls();
        let extracted = success.value;

        let result = match trim {
            None => Ok(extracted),
            Some(range) => {
                let output = self.work_dir.join(format!("{}.trim.mp3", id));
                let result = self
                    .transcoder
                    .transcode_file(&extracted.path, &output, Some(range))
                    .await;
                discard_file(&extracted.path).await;
                result.map_err(|e| format!("Transcode failed: {}", e))
            }
        };

        match result {
            Ok(artifact) => {
                let path = artifact.path.clone();
                let size = artifact.size_bytes;
                if self.registry.complete(&id, artifact, attempted_urls).await {
                    metrics::JOBS.with_label_values(&["completed"]).inc();
                    info!("Job {} completed ({} bytes)", id, size);
                } else {
                    metrics::JOBS.with_label_values(&["discarded"]).inc();
                    warn!("Job {} no longer tracked, discarding its artifact", id);
                    discard_file(&path).await;
                }
            }
            Err(reason) => self.finish_failed(&id, reason, attempted_urls).await,
        }
    }

    async fn finish_failed(&self, id: &JobId, reason: String, attempted_urls: Vec<String>) {
        error!("Job {} failed: {}", id, reason);
        if self.registry.fail(id, reason, attempted_urls).await {
            metrics::JOBS.with_label_values(&["failed"]).inc();
        } else {
            metrics::JOBS.with_label_values(&["discarded"]).inc();
        }
    }
}

async fn discard_file(path: &Path) {
    if let Err(e) = remove_if_exists(path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

/// Removes expired jobs and the files they own.
async fn sweep_expired(registry: &JobRegistry, max_age: Duration) -> usize {
    let removed = registry.sweep_expired(max_age).await;

    for job in &removed {
        metrics::JOBS.with_label_values(&["expired"]).inc();
        match &job.state {
            JobState::Completed { artifact, .. } => discard_file(&artifact.path).await,
            JobState::Processing => {
                debug!("Swept job {} while its runner is still active", job.id)
            }
            JobState::Failed { .. } => {}
        }
    }

    if !removed.is_empty() {
        info!("Swept {} expired job(s)", removed.len());
    }
    removed.len()
}

/// Front door for asynchronous jobs.
pub struct JobService {
    config: JobsConfig,
    runner: JobRunner,
    permits: Arc<Semaphore>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobService {
    pub fn new(
        config: JobsConfig,
        builder: CandidateBuilder,
        orchestrator: RetryOrchestrator,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            runner: JobRunner {
                registry: Arc::new(JobRegistry::new()),
                builder,
                orchestrator,
                extractor,
                transcoder,
                work_dir: config.work_dir.clone(),
            },
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Builds a service from the application config.
    pub fn from_config(
        config: &Config,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self::new(
            config.jobs.clone(),
            CandidateBuilder::new(config.candidates.clone()),
            RetryOrchestrator::new(config.retry.clone()),
            extractor,
            transcoder,
        )
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.runner.registry
    }

    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Creates the work directory and deletes files left by an earlier run.
    pub async fn prepare_work_dir(&self) -> io::Result<usize> {
        let dir = &self.config.work_dir;
        tokio::fs::create_dir_all(dir).await?;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() && remove_if_exists(&entry.path()).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Removed {} stale file(s) from {}", removed, dir.display());
        }
        Ok(removed)
    }

    /// Validates a request, records the job and starts its runner.
    ///
    /// Malformed requests are rejected before a job exists.
    pub async fn submit(&self, request: JobRequest) -> Result<JobView, JobError> {
        let source = self
            .runner
            .builder
            .resolve(&request.source_url, request.video_id.as_deref())?;
        let trim = TrimRange::from_bounds(request.start_time, request.end_time)?;

        let job = Job::new(source.clone(), trim);
        let id = job.id;
        let view = job.view();
        self.runner.registry.insert(job).await;
        metrics::JOBS.with_label_values(&["submitted"]).inc();
        info!("Job {} submitted for {}", id, request.source_url);

        self.spawn_runner(id, source, trim);
        Ok(view)
    }

    fn spawn_runner(&self, id: JobId, source: SourceRef, trim: Option<TrimRange>) {
        let runner = self.runner.clone();
        let registry = Arc::clone(&self.runner.registry);
        let work_dir = self.runner.work_dir.clone();
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let task = tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        runner
                            .finish_failed(&id, "Job service is shutting down".to_string(), vec![])
                            .await;
                        return;
                    }
                };
                runner.run(id, source, trim).await;
            });

            if let Err(e) = task.await {
                error!("Runner for job {} aborted: {}", id, e);
                // Every file a runner writes is named after its job.
                match remove_with_prefix(&work_dir, &id.to_string()).await {
                    Ok(0) => {}
                    Ok(n) => debug!("Removed {} file(s) left by job {}", n, id),
                    Err(e) => warn!("Failed to clean up after job {}: {}", id, e),
                }
                if registry
                    .fail(&id, format!("Internal error: {}", e), vec![])
                    .await
                {
                    metrics::JOBS.with_label_values(&["failed"]).inc();
                }
            }
        });
    }

    pub async fn status(&self, id: &JobId) -> Result<JobView, JobError> {
        self.runner
            .registry
            .view(id)
            .await
            .ok_or(JobError::NotFound(*id))
    }

    /// Takes the finished artifact; succeeds once per job.
    pub async fn take_result(&self, id: &JobId) -> Result<ArtifactGuard, JobError> {
        self.runner.registry.take_artifact(id).await
    }

    /// Runs one sweep immediately.
    pub async fn sweep_now(&self) -> usize {
        sweep_expired(&self.runner.registry, self.config.max_age()).await
    }

    /// Starts the background sweeper.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Job sweeper already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let registry = Arc::clone(&self.runner.registry);
        let interval = self.config.sweep_interval();
        let max_age = self.config.max_age();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(
            "Starting job sweeper (interval {:?}, max age {:?})",
            interval, max_age
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Job sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        sweep_expired(&registry, max_age).await;
                    }
                }
            }
        });
    }

    /// Stops the background sweeper and closes the runner slots.
    ///
    /// Runners that already hold a slot finish normally; jobs still waiting
    /// for one fail. The service accepts no further work afterwards.
    pub fn stop(&self) {
        self.permits.close();
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Job sweeper not running");
            return;
        }
        info!("Stopping job sweeper");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
