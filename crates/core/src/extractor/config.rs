//! Configuration for the extraction adapter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::process::ProcessLimits;

/// Configuration for the yt-dlp based extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Wall-clock limit for a single attempt in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum bytes of stderr kept for error reports.
    #[serde(default = "default_max_diagnostic_bytes")]
    pub max_diagnostic_bytes: usize,

    /// Format selector used when materializing to a file.
    #[serde(default = "default_format")]
    pub format: String,

    /// Audio codec the materialized file is converted to.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Format selector used when streaming to stdout.
    #[serde(default = "default_stream_format")]
    pub stream_format: String,

    /// Additional arguments passed before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    300
}

fn default_max_diagnostic_bytes() -> usize {
    64 * 1024
}

fn default_format() -> String {
    "bestaudio/best".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_stream_format() -> String {
    "bestaudio[ext=mp3]/bestaudio".to_string()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            timeout_secs: default_timeout(),
            max_diagnostic_bytes: default_max_diagnostic_bytes(),
            format: default_format(),
            audio_format: default_audio_format(),
            stream_format: default_stream_format(),
            extra_args: Vec::new(),
        }
    }
}

impl ExtractorConfig {
    /// Creates a config pointing at a specific yt-dlp binary.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Sets the per-attempt timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub(crate) fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            max_diagnostic_bytes: self.max_diagnostic_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert_eq!(config.path, PathBuf::from("yt-dlp"));
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.audio_format, "mp3");
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ExtractorConfig::with_path(PathBuf::from("/usr/local/bin/yt-dlp"))
            .with_timeout(30);
        assert_eq!(config.path, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert_eq!(config.limits().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ExtractorConfig = toml::from_str(
            r#"
            timeout_secs = 90
            extra_args = ["--force-ipv4"]
        "#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 90);
        assert_eq!(config.extra_args, vec!["--force-ipv4".to_string()]);
        assert_eq!(config.stream_format, "bestaudio[ext=mp3]/bestaudio");
    }
}
