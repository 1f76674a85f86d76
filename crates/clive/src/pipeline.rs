//! Clip pipeline - gate, extract, dedup, enrich, compose, publish.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::chat::{ChatError, ChatEvent, ChatSession};
use crate::compose::{compose, compose_degraded, RenderMode};
use crate::config::SharedSettings;
use crate::enrichment::Enricher;
use crate::error::{EnrichError, ExtractError, PublishError};
use crate::extract::extract_clip_id;
use crate::gate::{self, Rejection};
use crate::publish::Publisher;
use crate::storage::ClipStore;

/// What happened to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sender not allowed to post clips.
    Rejected(Rejection),
    /// No clip link in the message.
    NoClip,
    /// A clip link without an id.
    MalformedClip,
    /// Clip already posted, or being posted by another handler.
    Duplicate { clip_id: String },
    /// Clip belongs to a channel that is not being watched.
    OutsideChannel { clip_id: String },
    /// Clip metadata could not be resolved.
    EnrichmentFailed { clip_id: String },
    /// Webhook did not confirm delivery.
    PublishFailed { clip_id: String },
    /// Clip posted and recorded.
    Posted { clip_id: String, enriched: bool },
    /// Clip posted, but the dedup record could not be written.
    PostedUnrecorded { clip_id: String },
}

/// Message-to-notification pipeline.
pub struct ClipPipeline {
    settings: SharedSettings,
    store: Arc<ClipStore>,
    enricher: Enricher,
    publisher: Publisher,
}

impl ClipPipeline {
    #[must_use]
    pub fn new(
        settings: SharedSettings,
        store: Arc<ClipStore>,
        enricher: Enricher,
        publisher: Publisher,
    ) -> Self {
        Self {
            settings,
            store,
            enricher,
            publisher,
        }
    }

    /// Handle one chat message. Failures are logged, never propagated.
    pub async fn handle(&self, event: &ChatEvent) -> Outcome {
        let runtime = *self.settings.read().await;

        if let Err(rejection) = gate::check(event, runtime.restrictions) {
            if rejection != Rejection::SelfMessage {
                info!(
                    channel = %event.channel,
                    sender = %event.sender_display_name,
                    reason = rejection.as_str(),
                    "Ignoring message from restricted sender"
                );
            }
            return Outcome::Rejected(rejection);
        }

        let clip_id = match extract_clip_id(&event.text) {
            Ok(id) => id,
            Err(ExtractError::NoClipFound) => return Outcome::NoClip,
            Err(e @ ExtractError::MalformedClipUrl(_)) => {
                warn!(channel = %event.channel, error = %e, "Ignoring malformed clip URL");
                return Outcome::MalformedClip;
            }
        };
        debug!(channel = %event.channel, clip_id = %clip_id, "Clip detected");

        let Some(claim) = self.store.claim(clip_id.as_str()).await else {
            match self.store.get(clip_id.as_str()).await {
                Some(record) => info!(
                    clip_id = %clip_id,
                    posted_at = ?record.posted_at(),
                    "Clip was already shared"
                ),
                None => info!(clip_id = %clip_id, "Clip is already being posted"),
            }
            return Outcome::Duplicate {
                clip_id: clip_id.to_string(),
            };
        };

        let (notification, enriched) = match self
            .enricher
            .enrich(&clip_id, runtime.restrict_channels)
            .await
        {
            Ok(result) => (
                compose(&result, RenderMode::from_rich_flag(runtime.rich_embed)),
                true,
            ),
            Err(EnrichError::Unavailable) => {
                debug!(clip_id = %clip_id, "Enrichment unavailable, using chat message");
                (compose_degraded(event), false)
            }
            Err(EnrichError::OutsideChannel { .. }) => {
                return Outcome::OutsideChannel {
                    clip_id: clip_id.to_string(),
                }
            }
            Err(e @ EnrichError::EnrichmentFailed(_)) => {
                warn!(clip_id = %clip_id, error = %e, "Dropping clip");
                return Outcome::EnrichmentFailed {
                    clip_id: clip_id.to_string(),
                };
            }
        };

        match self.publisher.publish(&notification, claim).await {
            Ok(()) => Outcome::Posted {
                clip_id: clip_id.to_string(),
                enriched,
            },
            Err(e @ PublishError::Record(_)) => {
                error!(clip_id = %clip_id, error = %e, "Clip posted but may be posted again");
                Outcome::PostedUnrecorded {
                    clip_id: clip_id.to_string(),
                }
            }
            Err(e) => {
                warn!(clip_id = %clip_id, error = %e, "Clip not posted");
                Outcome::PublishFailed {
                    clip_id: clip_id.to_string(),
                }
            }
        }
    }

    /// Connect `session`, join `channels` and handle messages until the
    /// session closes. Each message is handled on its own task.
    pub async fn run<S: ChatSession>(
        self: Arc<Self>,
        mut session: S,
        channels: &[String],
    ) -> Result<(), ChatError> {
        session.connect().await?;
        for channel in channels {
            session.join(channel)?;
        }

        while let Some(event) = session.next_event().await {
            let pipeline = Arc::clone(&self);
            tokio::spawn(async move {
                let outcome = pipeline.handle(&event).await;
                debug!(?outcome, "Message handled");
            });
        }

        warn!("Chat session closed");
        Ok(())
    }
}
