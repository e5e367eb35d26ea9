//! Configuration for the transcode adapter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::process::ProcessLimits;

/// Configuration for the ffmpeg based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Wall-clock limit for a single transcode in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Target MP3 bitrate.
    #[serde(default = "default_bitrate")]
    pub bitrate_kbps: u32,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum bytes of stderr kept for error reports.
    #[serde(default = "default_max_diagnostic_bytes")]
    pub max_diagnostic_bytes: usize,

    /// Additional output arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout() -> u64 {
    600 // 10 minutes
}

fn default_bitrate() -> u32 {
    192
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_max_diagnostic_bytes() -> usize {
    64 * 1024
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout(),
            bitrate_kbps: default_bitrate(),
            log_level: default_log_level(),
            max_diagnostic_bytes: default_max_diagnostic_bytes(),
            extra_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(path: PathBuf) -> Self {
        Self {
            ffmpeg_path: path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the output bitrate.
    pub fn with_bitrate(mut self, bitrate_kbps: u32) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }

    pub(crate) fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            max_diagnostic_bytes: self.max_diagnostic_bytes,
        }
    }
}
