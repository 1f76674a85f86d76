//! Clip enrichment via Helix.
//!
//! One clip lookup, then creator, channel and category lookups in parallel.
//! Creator and channel are mandatory; a missing category is a normal state.

use std::sync::Arc;

use futures::future::OptionFuture;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ChannelResolutionFailed, EnrichError};
use crate::extract::ClipReference;
use crate::twitch::{Game, HelixClient, User};

/// Clip-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipInfo {
    pub title: String,
    pub url: String,
    /// RFC 3339 creation time as reported by Helix.
    pub created_at: String,
}

/// The user who made the clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatorInfo {
    pub display_name: String,
    pub login_name: String,
    pub avatar_url: String,
}

/// The channel the clip was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub display_name: String,
    pub login_name: String,
}

/// The category (game) being played in the clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub name: String,
    /// Box art URL with `{width}`/`{height}` placeholders.
    pub thumbnail_url_template: String,
}

/// Everything known about a clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    pub clip: ClipInfo,
    pub creator: CreatorInfo,
    pub channel: ChannelInfo,
    pub category: Option<CategoryInfo>,
}

impl From<User> for CreatorInfo {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name,
            login_name: user.login,
            avatar_url: user.profile_image_url,
        }
    }
}

impl From<User> for ChannelInfo {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name,
            login_name: user.login,
        }
    }
}

impl From<Game> for CategoryInfo {
    fn from(game: Game) -> Self {
        Self {
            name: game.name,
            thumbnail_url_template: game.box_art_url,
        }
    }
}

/// Resolves clip ids into [`EnrichmentResult`]s.
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    helix: Option<HelixClient>,
    tracked_channel_ids: Option<Arc<[String]>>,
}

impl Enricher {
    /// Enricher that always reports [`EnrichError::Unavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Enricher backed by Helix.
    ///
    /// `tracked_channel_ids` is `None` when channel resolution was skipped or
    /// failed; the tracked-channel restriction is then not applied.
    #[must_use]
    pub fn new(helix: HelixClient, tracked_channel_ids: Option<Vec<String>>) -> Self {
        Self {
            helix: Some(helix),
            tracked_channel_ids: tracked_channel_ids.map(Into::into),
        }
    }

    /// Whether a Helix client is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.helix.is_some()
    }

    /// Resolved ids of the tracked channels, if any.
    #[must_use]
    pub fn tracked_channel_ids(&self) -> Option<&[String]> {
        self.tracked_channel_ids.as_deref()
    }

    /// Look up everything needed to render a notification for `clip_id`.
    ///
    /// With `restrict_channels` set and tracked ids known, clips from other
    /// broadcasters are refused with [`EnrichError::OutsideChannel`].
    pub async fn enrich(
        &self,
        clip_id: &ClipReference,
        restrict_channels: bool,
    ) -> Result<EnrichmentResult, EnrichError> {
        let Some(helix) = &self.helix else {
            return Err(EnrichError::Unavailable);
        };

        let clip = helix.get_clip(clip_id.as_str()).await.map_err(|e| {
            error!(clip_id = %clip_id, error = %e, "Clip lookup failed");
            EnrichError::EnrichmentFailed(format!("clip lookup: {e}"))
        })?;
        debug!(clip_id = %clip_id, broadcaster_id = %clip.broadcaster_id, "Clip found");

        if restrict_channels {
            if let Some(tracked) = &self.tracked_channel_ids {
                if !tracked.contains(&clip.broadcaster_id) {
                    info!(clip_id = %clip_id, broadcaster = %clip.broadcaster_name, "Clip from an untracked channel");
                    return Err(EnrichError::OutsideChannel {
                        clip_id: clip_id.to_string(),
                        broadcaster_id: clip.broadcaster_id,
                    });
                }
            }
        }

        let category_lookup: OptionFuture<_> = (!clip.game_id.is_empty())
            .then(|| helix.get_game(&clip.game_id))
            .into();

        let (creator, channel, category) = tokio::join!(
            helix.get_user(&clip.creator_id),
            helix.get_user(&clip.broadcaster_id),
            category_lookup,
        );

        let creator = creator.map_err(|e| {
            error!(clip_id = %clip_id, creator_id = %clip.creator_id, error = %e, "Creator lookup failed");
            EnrichError::EnrichmentFailed(format!("creator lookup: {e}"))
        })?;
        let channel = channel.map_err(|e| {
            error!(clip_id = %clip_id, broadcaster_id = %clip.broadcaster_id, error = %e, "Channel lookup failed");
            EnrichError::EnrichmentFailed(format!("channel lookup: {e}"))
        })?;
        let category = match category {
            Some(Ok(game)) => Some(CategoryInfo::from(game)),
            Some(Err(e)) => {
                warn!(clip_id = %clip_id, game_id = %clip.game_id, error = %e, "Category lookup failed");
                None
            }
            None => None,
        };

        Ok(EnrichmentResult {
            clip: ClipInfo {
                title: clip.title.trim().to_string(),
                url: clip.url,
                created_at: clip.created_at,
            },
            creator: creator.into(),
            channel: channel.into(),
            category,
        })
    }
}

/// Resolve channel logins to Helix user ids.
///
/// Logins that do not resolve are logged and skipped; resolving none at all
/// is a failure.
pub async fn resolve_channel_ids(
    helix: &HelixClient,
    logins: &[String],
) -> Result<Vec<String>, ChannelResolutionFailed> {
    let users = helix
        .get_users_by_login(logins)
        .await
        .map_err(|e| ChannelResolutionFailed(e.to_string()))?;

    for login in logins {
        if !users.iter().any(|u| u.login.eq_ignore_ascii_case(login)) {
            warn!(channel = %login, "Channel login did not resolve to a user id");
        }
    }

    if users.is_empty() {
        return Err(ChannelResolutionFailed(
            "no configured channel resolved".to_string(),
        ));
    }

    let ids: Vec<String> = users.into_iter().map(|u| u.id).collect();
    info!(count = ids.len(), "Resolved tracked channel ids");
    Ok(ids)
}
