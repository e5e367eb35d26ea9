pub mod artifact;
pub mod candidates;
pub mod config;
pub mod extractor;
pub mod jobs;
pub mod metrics;
pub mod process;
pub mod retry;
pub mod streaming;
pub mod testing;
pub mod transcoder;

pub use artifact::{download_filename, Artifact};
pub use candidates::{CandidateBuilder, CandidateConfig, CandidateError, SourceRef};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use extractor::{ExtractError, Extractor, ExtractorConfig, YtDlpExtractor};
pub use jobs::{
    ArtifactGuard, JobError, JobId, JobRegistry, JobRequest, JobService, JobStatus, JobView,
    JobsConfig,
};
pub use process::{ByteStream, PipeError};
pub use retry::{AggregateError, AttemptRecord, RetryOrchestrator, RetryPolicy};
pub use streaming::{AudioStream, StreamError, StreamingPipeline, AUDIO_CONTENT_TYPE};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig, TrimRange};
