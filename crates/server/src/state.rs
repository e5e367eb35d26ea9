use std::sync::Arc;

use audiograb_core::{Config, Extractor, JobService, StreamingPipeline, Transcoder};

/// Shared application state
pub struct AppState {
    config: Config,
    jobs: Arc<JobService>,
    streaming: StreamingPipeline,
}

impl AppState {
    pub fn new(config: Config, jobs: Arc<JobService>, streaming: StreamingPipeline) -> Self {
        Self {
            config,
            jobs,
            streaming,
        }
    }

    /// Wires the job service and streaming pipeline to the given tools.
    pub fn from_config(
        config: Config,
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let jobs = Arc::new(JobService::from_config(
            &config,
            Arc::clone(&extractor),
            Arc::clone(&transcoder),
        ));
        let streaming = StreamingPipeline::from_config(&config, extractor, transcoder);
        Self::new(config, jobs, streaming)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn jobs(&self) -> &Arc<JobService> {
        &self.jobs
    }

    pub fn streaming(&self) -> &StreamingPipeline {
        &self.streaming
    }
}
