//! Trait definitions for the extraction adapter.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExtractError;
use crate::artifact::Artifact;
use crate::process::ByteStream;

/// Resolves a source URL into audio.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Extension of files written by [`extract_to_file`](Self::extract_to_file).
    fn output_extension(&self) -> &str {
        "mp3"
    }

    /// Downloads the audio at `url` into `output`.
    ///
    /// On success the returned artifact is non-empty and lives at `output`.
    /// On failure nothing derived from `output` is left on disk.
    async fn extract_to_file(&self, url: &str, output: &Path) -> Result<Artifact, ExtractError>;

    /// Starts streaming the audio at `url`.
    ///
    /// Spawn failures are returned directly; everything after that
    /// (timeouts, non-zero exit, empty output) arrives as the stream's final
    /// `Err` item.
    async fn extract_stream(&self, url: &str) -> Result<ByteStream, ExtractError>;

    /// Validates that the extractor is properly configured and ready.
    async fn validate(&self) -> Result<(), ExtractError>;
}
