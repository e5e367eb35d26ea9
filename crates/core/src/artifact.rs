//! Finished audio files on local storage.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::transcoder::TrimRange;

/// A completed, non-empty audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Location of the file.
    pub path: PathBuf,
    /// Size in bytes, always greater than zero.
    pub size_bytes: u64,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Suggested download name: `{video_id}.mp3`, or `{video_id}_{start}-{end}.mp3`
/// for trimmed audio.
pub fn download_filename(video_id: &str, trim: Option<&TrimRange>) -> String {
    match trim {
        Some(range) => format!("{}_{}.mp3", video_id, range),
        None => format!("{}.mp3", video_id),
    }
}
