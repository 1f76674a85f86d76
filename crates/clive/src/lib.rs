//! Clive watches Twitch chat for clip links and relays each new clip to a
//! Discord webhook.
//!
//! This crate provides:
//! - Clip id extraction from chat text
//! - Role-based gating of who may post clips
//! - Clip, creator, channel and category lookups via Twitch Helix
//! - Plain or rich (link + embed) Discord notifications
//! - A JSON-file dedup store so each clip is posted once
//! - An optional admin HTTP API for runtime toggles

pub mod chat;
pub mod compose;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod extract;
pub mod gate;
pub mod logging;
pub mod pipeline;
pub mod publish;
pub mod server;
pub mod storage;
pub mod twitch;

// Re-export main types
pub use chat::{ChatEvent, ChatSession, RoleFlags, TwitchChat};
pub use compose::{compose, compose_degraded, Embed, Notification, RenderMode};
pub use config::{RuntimeSettings, Settings, SettingsPatch, SharedSettings};
pub use enrichment::{Enricher, EnrichmentResult};
pub use error::{EnrichError, ExtractError, HelixError, PublishError, StoreError};
pub use extract::{extract_clip_id, ClipReference};
pub use gate::{Rejection, Restrictions};
pub use pipeline::{ClipPipeline, Outcome};
pub use publish::{DiscordWebhook, Publisher, Webhook};
pub use storage::{ClaimGuard, ClipRecord, ClipStore};
