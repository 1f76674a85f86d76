//! Error types for the clip relay.

use thiserror::Error;

/// Errors from pulling a clip id out of chat text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No token in the message looks like a clip URL
    #[error("no clip URL found in message")]
    NoClipFound,

    /// A clip URL was found but carries no identifier
    #[error("malformed clip URL: {0}")]
    MalformedClipUrl(String),
}

/// Errors from the Helix lookup API.
#[derive(Debug, Error)]
pub enum HelixError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Helix answered with a non-success status
    #[error("Helix returned {status} for /{endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Rate limited by Helix
    #[error("rate limited on /{endpoint}")]
    RateLimited { endpoint: &'static str },

    /// The response `data` array was empty
    #[error("no {endpoint} found for {key}")]
    NotFound { endpoint: &'static str, key: String },

    /// Invalid header value (client id or token)
    #[error("invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Errors from clip enrichment.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// No app token; enrichment is switched off, not broken
    #[error("enrichment unavailable: no app token")]
    Unavailable,

    /// A mandatory lookup failed
    #[error("enrichment failed: {0}")]
    EnrichmentFailed(String),

    /// The clip belongs to a channel that is not being tracked
    #[error("clip {clip_id} belongs to untracked broadcaster {broadcaster_id}")]
    OutsideChannel {
        clip_id: String,
        broadcaster_id: String,
    },
}

/// Errors from delivering a notification to the webhook.
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook did not confirm delivery
    #[error("webhook post {phase} returned {status} instead of 204")]
    PublishFailed {
        phase: &'static str,
        status: reqwest::StatusCode,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delivered, but the clip could not be recorded as posted
    #[error("clip delivered but not recorded: {0}")]
    Record(#[from] StoreError),
}

/// Errors from the dedup store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a valid store document
    #[error("store file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup failure resolving tracked channel logins to ids. Non-fatal.
#[derive(Debug, Error)]
#[error("could not resolve channel ids: {0}")]
pub struct ChannelResolutionFailed(pub String);

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable could not be parsed
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}
