//! yt-dlp based extractor implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::ExtractorConfig;
use super::error::ExtractError;
use super::traits::Extractor;
use crate::artifact::Artifact;
use crate::metrics;
use crate::process::{
    non_empty_size, remove_with_prefix, run_to_completion, spawn_error, stream_stdout, ByteStream,
    RunError,
};

/// Extractor driving the yt-dlp command-line tool.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Creates a new yt-dlp extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Arguments for a materializing run writing to `output`.
    ///
    /// The output template keeps the stem of `output` and lets yt-dlp pick
    /// the intermediate extension; audio post-processing then leaves the
    /// final file at `output` itself.
    fn build_file_args(&self, url: &str, output: &Path) -> Vec<String> {
        let template = output.with_extension("%(ext)s");

        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-part".to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            self.config.format.clone(),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Arguments for a streaming run writing to stdout.
    fn build_stream_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            self.config.stream_format.clone(),
            "-o".to_string(),
            "-".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Removes everything a failed run may have left next to `output`.
    async fn cleanup_partials(&self, output: &Path) {
        let (Some(dir), Some(stem)) = (output.parent(), output.file_stem()) else {
            return;
        };
        let prefix = stem.to_string_lossy();
        match remove_with_prefix(dir, &prefix).await {
            Ok(0) => {}
            Ok(n) => debug!("Removed {} partial file(s) for {}", n, output.display()),
            Err(e) => warn!(
                "Failed to remove partial files for {}: {}",
                output.display(),
                e
            ),
        }
    }

    async fn run_file(&self, url: &str, output: &Path) -> Result<Artifact, ExtractError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_file_args(url, output);
        debug!("Running yt-dlp with args: {:?}", args);

        let mut command = Command::new(&self.config.path);
        command.args(&args);
        run_to_completion(command, &self.config.path, self.config.limits()).await?;

        match non_empty_size(output).await {
            Some(size) => Ok(Artifact::new(output, size)),
            None => Err(ExtractError::empty(output.display().to_string())),
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn output_extension(&self) -> &str {
        &self.config.audio_format
    }

    async fn extract_to_file(&self, url: &str, output: &Path) -> Result<Artifact, ExtractError> {
        let start = Instant::now();
        let result = self.run_file(url, output).await;
        metrics::EXTRACTION_DURATION.observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(artifact) => info!(
                "Extracted {} ({} bytes) in {:.1}s",
                url,
                artifact.size_bytes,
                start.elapsed().as_secs_f64()
            ),
            Err(e) => {
                debug!("Extraction of {} failed: {}", url, e);
                self.cleanup_partials(output).await;
            }
        }
        result
    }

    async fn extract_stream(&self, url: &str) -> Result<ByteStream, ExtractError> {
        let args = self.build_stream_args(url);
        debug!("Streaming yt-dlp with args: {:?}", args);

        let mut command = Command::new(&self.config.path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| ExtractError::from(spawn_error(e, &self.config.path)))?;

        Ok(stream_stdout(child, "yt-dlp", self.config.limits(), None)?)
    }

    async fn validate(&self) -> Result<(), ExtractError> {
        let mut command = Command::new(&self.config.path);
        command.arg("--version");
        match run_to_completion(command, &self.config.path, self.config.limits()).await {
            Ok(_) => Ok(()),
            Err(RunError::NotFound { path }) => Err(ExtractError::ToolNotFound { path }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Path a job's extraction writes to inside `work_dir`.
pub fn extraction_target(work_dir: &Path, stem: &str, audio_format: &str) -> PathBuf {
    work_dir.join(format!("{}.{}", stem, audio_format))
}
