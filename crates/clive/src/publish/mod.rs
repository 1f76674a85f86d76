//! Notification delivery.
//!
//! A [`Notification`] is sent as one or two ordered webhook calls. The
//! second call of a rich notification only goes out after the first is
//! confirmed, so the platform's own link preview (triggered by the plain
//! message) shows up above the embed. The clip is recorded as posted only
//! after every call is confirmed.

pub mod discord;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, error, info};

pub use discord::DiscordWebhook;

use crate::compose::{Embed, Notification};
use crate::error::PublishError;
use crate::storage::ClaimGuard;

/// One webhook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase<'a> {
    /// Plain message content, no embeds.
    Text(&'a str),
    /// Empty content with a single embed.
    Embed(&'a Embed),
}

impl Notification {
    /// Webhook calls needed to deliver this notification, in order.
    #[must_use]
    pub fn phases(&self) -> Vec<Phase<'_>> {
        match self {
            Self::Text(text) => vec![Phase::Text(text)],
            Self::Rich {
                plain_prefix_text,
                embed,
            } => vec![Phase::Text(plain_prefix_text), Phase::Embed(embed)],
        }
    }
}

/// Trait for webhook endpoints.
#[async_trait]
pub trait Webhook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Perform one call and return the response status.
    async fn post(&self, phase: Phase<'_>) -> Result<StatusCode, PublishError>;
}

/// Delivers notifications and commits delivered clips to the store.
#[derive(Clone)]
pub struct Publisher {
    webhook: Arc<dyn Webhook>,
}

impl Publisher {
    #[must_use]
    pub fn new(webhook: Arc<dyn Webhook>) -> Self {
        Self { webhook }
    }

    /// Deliver `notification`, then record the claimed clip.
    ///
    /// Every call must answer `204 No Content`. If one does not, later calls
    /// are skipped and the claim is released unrecorded so a future message
    /// can retry. A delivered clip whose record cannot be written is reported
    /// as [`PublishError::Record`].
    pub async fn publish(
        &self,
        notification: &Notification,
        claim: ClaimGuard,
    ) -> Result<(), PublishError> {
        let phases = notification.phases();
        let total = phases.len();
        let channel = self.webhook.name();

        for (index, phase) in phases.into_iter().enumerate() {
            let step = index + 1;
            debug!(channel, clip_id = claim.id(), step, total, "Posting notification");

            let status = self.webhook.post(phase).await.map_err(|e| {
                error!(channel, clip_id = claim.id(), step, total, error = %e, "Webhook post failed");
                e
            })?;

            if status != StatusCode::NO_CONTENT {
                error!(channel, clip_id = claim.id(), step, total, status = %status, "Webhook did not confirm delivery");
                return Err(PublishError::PublishFailed {
                    phase: phase_label(step, total),
                    status,
                });
            }
        }

        let clip_id = claim.id().to_string();
        claim.commit(Utc::now()).await?;
        info!(channel, clip_id = %clip_id, "Clip posted");
        Ok(())
    }
}

const fn phase_label(step: usize, total: usize) -> &'static str {
    match (step, total) {
        (1, 1) => "1 of 1",
        (1, _) => "1 of 2",
        _ => "2 of 2",
    }
}
