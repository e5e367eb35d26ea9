//! Candidate URL construction.
//!
//! A source URL is reduced to a [`SourceRef`] (numeric video identifier plus
//! an optional access token) by an ordered list of matchers, then expanded
//! into the ordered list of URL variants the extractor should try:
//!
//! 1. the token-qualified player URL (only when a token is known),
//! 2. the original URL as submitted,
//! 3. the canonical page URL built from the identifier,
//! 4. the bare player URL built from the identifier.
//!
//! Duplicates are removed keeping the first occurrence, so callers can try
//! the list strictly left to right and stop at the first success.

mod rules;
mod types;

use crate::metrics;

pub use rules::{parse_source, MatchRule, RULES};
pub use types::{CandidateConfig, CandidateError, SourceRef};

/// Builds candidate URL lists from source references.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    config: CandidateConfig,
}

impl CandidateBuilder {
    /// Creates a builder using the given URL bases.
    pub fn new(config: CandidateConfig) -> Self {
        Self { config }
    }

    /// Resolves a source URL (and optional caller-supplied identifier) into a
    /// [`SourceRef`].
    pub fn resolve(
        &self,
        source_url: &str,
        video_id: Option<&str>,
    ) -> Result<SourceRef, CandidateError> {
        parse_source(source_url, video_id)
    }

    /// Expands a resolved source into its ordered, deduplicated candidates.
    pub fn build(&self, source: &SourceRef) -> Vec<String> {
        let player_base = self.config.player_base.trim_end_matches('/');
        let canonical_base = self.config.canonical_base.trim_end_matches('/');

        let mut ordered = Vec::with_capacity(4);
        if let Some(ref token) = source.token {
            ordered.push(format!(
                "{}/{}?h={}",
                player_base,
                source.video_id,
                urlencoding::encode(token)
            ));
        }
        ordered.push(source.original_url.clone());
        ordered.push(format!("{}/{}", canonical_base, source.video_id));
        ordered.push(format!("{}/{}", player_base, source.video_id));

        let mut candidates: Vec<String> = Vec::with_capacity(ordered.len());
        for url in ordered {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
        metrics::CANDIDATES_PER_SOURCE.observe(candidates.len() as f64);
        candidates
    }

    /// Resolves and expands in one step.
    pub fn candidates(
        &self,
        source_url: &str,
        video_id: Option<&str>,
    ) -> Result<Vec<String>, CandidateError> {
        let source = self.resolve(source_url, video_id)?;
        Ok(self.build(&source))
    }
}

impl Default for CandidateBuilder {
    fn default() -> Self {
        Self::new(CandidateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CandidateBuilder {
        CandidateBuilder::new(CandidateConfig {
            canonical_base: "https://vimeo.com".to_string(),
            player_base: "https://player.vimeo.com/video".to_string(),
        })
    }

    #[test]
    fn test_token_url_puts_token_qualified_candidate_first() {
        let candidates = builder()
            .candidates("https://host/video/12345?h=abcdef", None)
            .unwrap();

        assert_eq!(
            candidates,
            vec![
                "https://player.vimeo.com/video/12345?h=abcdef".to_string(),
                "https://host/video/12345?h=abcdef".to_string(),
                "https://vimeo.com/12345".to_string(),
                "https://player.vimeo.com/video/12345".to_string(),
            ]
        );
    }

    #[test]
    fn test_token_first_for_every_token_form() {
        let b = builder();
        for url in [
            "https://vimeo.com/12345/abcdef",
            "https://vimeo.com/12345?h=abcdef",
            "https://player.vimeo.com/video/12345?h=abcdef&autoplay=1",
            "https://other.example/channels/staff/12345?h=abcdef",
        ] {
            let candidates = b.candidates(url, None).unwrap();
            assert_eq!(
                candidates[0], "https://player.vimeo.com/video/12345?h=abcdef",
                "token-qualified URL must come first for {}",
                url
            );
        }
    }

    #[test]
    fn test_no_token_starts_with_original_url() {
        let candidates = builder()
            .candidates("https://www.example.org/clips/98765", None)
            .unwrap();

        assert_eq!(
            candidates,
            vec![
                "https://www.example.org/clips/98765".to_string(),
                "https://vimeo.com/98765".to_string(),
                "https://player.vimeo.com/video/98765".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidates_are_deduplicated() {
        let candidates = builder().candidates("https://vimeo.com/555", None).unwrap();
        assert_eq!(
            candidates,
            vec![
                "https://vimeo.com/555".to_string(),
                "https://player.vimeo.com/video/555".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_identifier_is_invalid_source() {
        let b = builder();
        for url in [
            "https://example.com/about",
            "https://example.com/",
            "not a url",
            "ftp://vimeo.com/12345",
            "",
        ] {
            let result = b.candidates(url, None);
            assert!(
                matches!(result, Err(CandidateError::InvalidSource { .. })),
                "expected InvalidSource for {:?}",
                url
            );
        }
    }

    #[test]
    fn test_caller_supplied_id_rescues_url_without_identifier() {
        let candidates = builder()
            .candidates("https://example.com/share/my-talk", Some("4242"))
            .unwrap();
        assert_eq!(candidates[0], "https://example.com/share/my-talk");
        assert!(candidates.contains(&"https://vimeo.com/4242".to_string()));
    }

    #[test]
    fn test_token_is_url_encoded() {
        let source = SourceRef {
            video_id: "1".to_string(),
            token: Some("a b".to_string()),
            original_url: "https://vimeo.com/1".to_string(),
        };
        let candidates = builder().build(&source);
        assert_eq!(candidates[0], "https://player.vimeo.com/video/1?h=a%20b");
    }
}
