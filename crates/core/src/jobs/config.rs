//! Job service configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the job service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Directory holding intermediate and finished artifacts.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Jobs older than this are swept regardless of status.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// How often the sweeper runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Maximum runners executing at the same time.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("audiograb")
}

fn default_max_age() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            max_age_secs: default_max_age(),
            sweep_interval_secs: default_sweep_interval(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl JobsConfig {
    /// Creates a config rooted at `work_dir`.
    pub fn with_work_dir(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            ..Default::default()
        }
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JobsConfig::default();
        assert!(config.work_dir.ends_with("audiograb"));
        assert_eq!(config.max_age(), Duration::from_secs(3600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.max_concurrent, 4);
    }
}
