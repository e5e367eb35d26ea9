//! Trait definitions for the transcode adapter.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscodeError;
use super::types::TrimRange;
use crate::artifact::Artifact;
use crate::process::ByteStream;

/// Re-encodes audio, optionally trimming it.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Transcodes `input` into `output`.
    ///
    /// A partially written `output` is removed on failure.
    async fn transcode_file(
        &self,
        input: &Path,
        output: &Path,
        trim: Option<TrimRange>,
    ) -> Result<Artifact, TranscodeError>;

    /// Transcodes a live byte stream.
    ///
    /// Errors from `input` surface as the final `Err` item of the returned
    /// stream.
    async fn transcode_stream(
        &self,
        input: ByteStream,
        trim: Option<TrimRange>,
    ) -> Result<ByteStream, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}
