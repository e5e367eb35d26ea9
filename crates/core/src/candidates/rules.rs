//! Ordered identifier matchers.
//!
//! Rules are evaluated strictly in [`RULES`] order and the first match wins.
//! Order matters: the player form and the unlisted share form must be tried
//! before the generic trailing-number rule, otherwise their tokens are lost.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{CandidateError, SourceRef};

static URL_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:https?)://([^/?#\s]+)([^?#\s]*)(?:\?([^#\s]*))?(?:#\S*)?$").unwrap());
static PLAYER_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/video/(\d+)/?$").unwrap());
static SHARE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)/([0-9A-Fa-f]+)/?$").unwrap());
static TRAILING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)/?$").unwrap());
static SUPPLIED_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// The pieces of a source URL the matchers look at.
#[derive(Debug)]
struct UrlParts<'a> {
    path: &'a str,
    query: Option<&'a str>,
}

impl UrlParts<'_> {
    /// Value of the `h` query parameter, percent-decoded.
    fn token(&self) -> Option<String> {
        self.query?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "h")
            .map(|(_, value)| {
                urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
            .filter(|token| !token.is_empty())
    }
}

/// A named matcher: returns `(video_id, token)` when it recognises the URL.
pub struct MatchRule {
    pub name: &'static str,
    matcher: fn(&UrlParts<'_>) -> Option<(String, Option<String>)>,
}

impl std::fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchRule").field("name", &self.name).finish()
    }
}

/// Matchers in priority order.
pub static RULES: &[MatchRule] = &[
    MatchRule {
        name: "player_with_token",
        matcher: match_player_with_token,
    },
    MatchRule {
        name: "unlisted_share",
        matcher: match_unlisted_share,
    },
    MatchRule {
        name: "trailing_id_with_token",
        matcher: match_trailing_id_with_token,
    },
    MatchRule {
        name: "trailing_id",
        matcher: match_trailing_id,
    },
];

fn match_player_with_token(url: &UrlParts<'_>) -> Option<(String, Option<String>)> {
    let id = PLAYER_PATH.captures(url.path)?.get(1)?.as_str().to_string();
    let token = url.token()?;
    Some((id, Some(token)))
}

fn match_unlisted_share(url: &UrlParts<'_>) -> Option<(String, Option<String>)> {
    let caps = SHARE_PATH.captures(url.path)?;
    let id = caps.get(1)?.as_str().to_string();
    let token = caps.get(2)?.as_str().to_string();
    Some((id, Some(token)))
}

fn match_trailing_id_with_token(url: &UrlParts<'_>) -> Option<(String, Option<String>)> {
    let id = TRAILING_ID.captures(url.path)?.get(1)?.as_str().to_string();
    let token = url.token()?;
    Some((id, Some(token)))
}

fn match_trailing_id(url: &UrlParts<'_>) -> Option<(String, Option<String>)> {
    let id = TRAILING_ID.captures(url.path)?.get(1)?.as_str().to_string();
    Some((id, None))
}

/// Resolves a source URL into a [`SourceRef`].
///
/// A caller-supplied `video_id` overrides the identifier found in the URL.
/// The URL's token is only kept when it belongs to that same identifier.
pub fn parse_source(source_url: &str, video_id: Option<&str>) -> Result<SourceRef, CandidateError> {
    let original_url = source_url.trim();
    let caps = URL_PARTS
        .captures(original_url)
        .ok_or_else(|| CandidateError::invalid_source(original_url, "not an http(s) URL"))?;

    let parts = UrlParts {
        path: caps.get(2).map(|m| m.as_str()).unwrap_or(""),
        query: caps.get(3).map(|m| m.as_str()),
    };

    let matched = RULES.iter().find_map(|rule| {
        (rule.matcher)(&parts).map(|found| {
            tracing::debug!(rule = rule.name, url = original_url, "Matched source URL");
            found
        })
    });

    let supplied = video_id.map(str::trim).filter(|id| !id.is_empty());
    if let Some(id) = supplied {
        if !SUPPLIED_ID.is_match(id) {
            return Err(CandidateError::invalid_source(
                original_url,
                format!("video id {:?} contains invalid characters", id),
            ));
        }
    }

    let (video_id, token) = match (matched, supplied) {
        (Some((found, token)), Some(id)) if found == id => (found, token),
        (_, Some(id)) => (id.to_string(), None),
        (Some(found), None) => found,
        (None, None) => {
            return Err(CandidateError::invalid_source(
                original_url,
                "no video identifier found",
            ))
        }
    };

    Ok(SourceRef {
        video_id,
        token,
        original_url: original_url.to_string(),
    })
}
