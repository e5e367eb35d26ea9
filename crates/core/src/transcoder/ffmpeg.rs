//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::TrimRange;
use crate::artifact::Artifact;
use crate::metrics;
use crate::process::{
    non_empty_size, remove_if_exists, run_to_completion, spawn_error, spawn_stdin_pump,
    stream_stdout, ByteStream,
};

const STDIN: &str = "pipe:0";
const STDOUT: &str = "pipe:1";

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds ffmpeg arguments. `input` and `output` may be pipe specifiers.
    fn build_args(&self, input: &str, output: &str, trim: Option<TrimRange>) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-y".to_string(),
        ];

        // Input seeking: -ss/-t before -i apply to the input.
        if let Some(range) = trim {
            args.extend([
                "-ss".to_string(),
                format_seconds(range.start),
                "-t".to_string(),
                format_seconds(range.duration()),
            ]);
        }

        args.extend(["-i".to_string(), input.to_string()]);

        args.extend([
            "-vn".to_string(),
            "-c:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.config.bitrate_kbps),
        ]);

        args.extend(self.config.extra_args.iter().cloned());

        args.extend(["-f".to_string(), "mp3".to_string(), output.to_string()]);
        args
    }

    async fn run_file(
        &self,
        input: &Path,
        output: &Path,
        trim: Option<TrimRange>,
    ) -> Result<Artifact, TranscodeError> {
        if !input.exists() {
            return Err(TranscodeError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("input file not found: {}", input.display()),
            )));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(
            &input.to_string_lossy(),
            &output.to_string_lossy(),
            trim,
        );
        debug!("Running ffmpeg with args: {:?}", args);

        let mut command = Command::new(&self.config.ffmpeg_path);
        command.args(&args);
        run_to_completion(command, &self.config.ffmpeg_path, self.config.limits()).await?;

        match non_empty_size(output).await {
            Some(size) => Ok(Artifact::new(output, size)),
            None => Err(TranscodeError::EmptyArtifact {
                target: output.display().to_string(),
            }),
        }
    }
}

/// Formats seconds for ffmpeg's duration syntax.
fn format_seconds(secs: f64) -> String {
    format!("{:.3}", secs)
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode_file(
        &self,
        input: &Path,
        output: &Path,
        trim: Option<TrimRange>,
    ) -> Result<Artifact, TranscodeError> {
        if let Some(range) = &trim {
            range.validate()?;
        }

        let start = Instant::now();
        let result = self.run_file(input, output, trim).await;

        match &result {
            Ok(artifact) => {
                metrics::TRANSCODES.with_label_values(&["file", "success"]).inc();
                info!(
                    "Transcoded {} -> {} ({} bytes) in {:.1}s",
                    input.display(),
                    output.display(),
                    artifact.size_bytes,
                    start.elapsed().as_secs_f64()
                );
            }
            Err(e) => {
                metrics::TRANSCODES.with_label_values(&["file", "failure"]).inc();
                warn!("Transcode of {} failed: {}", input.display(), e);
                if let Err(cleanup) = remove_if_exists(output).await {
                    warn!("Failed to remove {}: {}", output.display(), cleanup);
                }
            }
        }
        result
    }

    async fn transcode_stream(
        &self,
        input: ByteStream,
        trim: Option<TrimRange>,
    ) -> Result<ByteStream, TranscodeError> {
        if let Some(range) = &trim {
            range.validate()?;
        }

        let args = self.build_args(STDIN, STDOUT, trim);
        debug!("Streaming through ffmpeg with args: {:?}", args);

        let mut command = Command::new(&self.config.ffmpeg_path);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                metrics::TRANSCODES.with_label_values(&["stream", "failure"]).inc();
                return Err(spawn_error(e, &self.config.ffmpeg_path).into());
            }
        };

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TranscodeError::Io(io::Error::other("stdin was not captured")))?;
        let pump = spawn_stdin_pump(input, stdin);

        metrics::TRANSCODES.with_label_values(&["stream", "started"]).inc();
        Ok(stream_stdout(child, "ffmpeg", self.config.limits(), Some(pump))?)
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let mut command = Command::new(&self.config.ffmpeg_path);
        command.arg("-version");
        run_to_completion(command, &self.config.ffmpeg_path, self.config.limits()).await?;
        Ok(())
    }
}
