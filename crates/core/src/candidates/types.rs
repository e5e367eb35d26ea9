//! Types for candidate URL construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier and optional access token derived from a source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Numeric video identifier.
    pub video_id: String,
    /// Access token for unlisted videos, if the URL carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// The URL exactly as submitted (trimmed).
    pub original_url: String,
}

/// URL bases used to build the generic candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Base of the canonical page URL (`{base}/{id}`).
    #[serde(default = "default_canonical_base")]
    pub canonical_base: String,

    /// Base of the embeddable player URL (`{base}/{id}`).
    #[serde(default = "default_player_base")]
    pub player_base: String,
}

fn default_canonical_base() -> String {
    "https://vimeo.com".to_string()
}

fn default_player_base() -> String {
    "https://player.vimeo.com/video".to_string()
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            canonical_base: default_canonical_base(),
            player_base: default_player_base(),
        }
    }
}

/// Errors from candidate construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CandidateError {
    /// No identifier could be derived from the input.
    #[error("Invalid source URL {url:?}: {reason}")]
    InvalidSource { url: String, reason: String },
}

impl CandidateError {
    pub fn invalid_source(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
