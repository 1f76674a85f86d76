//! Clip link extraction from chat text.
//!
//! Two URL shapes are recognized:
//! - `https://clips.twitch.tv/<slug>`
//! - `https://www.twitch.tv/<user>/clip/<slug>`

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::ExtractError;

static CLIP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|//|\.)(?:clips\.twitch\.tv/|twitch\.tv/[^/\s]+/clip/)")
        .expect("clip URL pattern is valid")
});

/// Identifier of a clip, exactly as it appeared in the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipReference(String);

impl ClipReference {
    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical short-link URL for this clip.
    #[must_use]
    pub fn short_url(&self) -> String {
        format!("https://clips.twitch.tv/{}", self.0)
    }
}

impl std::fmt::Display for ClipReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a single whitespace-free token looks like a clip URL on a Twitch host.
#[must_use]
pub fn is_clip_url(token: &str) -> bool {
    CLIP_URL.is_match(token) && parse_url(token).is_some_and(|url| is_twitch_host(&url))
}

/// Extract the clip id from the first clip URL in `text`.
pub fn extract_clip_id(text: &str) -> Result<ClipReference, ExtractError> {
    let Some(token) = text.split_whitespace().find(|t| is_clip_url(t)) else {
        return Err(ExtractError::NoClipFound);
    };
    debug!(url = token, "Found clip URL");

    let slug = last_path_segment(token)
        .ok_or_else(|| ExtractError::MalformedClipUrl(token.to_string()))?;

    debug!(clip_id = %slug, "Extracted clip slug");
    Ok(ClipReference(slug))
}

fn parse_url(token: &str) -> Option<Url> {
    if token.contains("://") {
        Url::parse(token).ok()
    } else {
        Url::parse(&format!("https://{token}")).ok()
    }
}

fn is_twitch_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == "twitch.tv" || host.ends_with(".twitch.tv"))
}

fn last_path_segment(token: &str) -> Option<String> {
    let url = parse_url(token)?;
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;

    // Clip URLs have a fixed prefix; the slug is never one of these.
    if segment.eq_ignore_ascii_case("clip") {
        return None;
    }
    Some(segment.to_string())
}
