//! Rendering of clip notifications.

use crate::chat::ChatEvent;
use crate::enrichment::EnrichmentResult;

/// Embed side-bar color (Twitch purple).
pub const EMBED_COLOR: u32 = 0x0090_13fe;

/// Box-art thumbnail edge length in pixels.
const THUMBNAIL_SIZE: &str = "80";

/// How enriched clips are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One formatted text line plus the clip URL.
    Plain,
    /// A link-preview message followed by a rich embed.
    Rich,
}

impl RenderMode {
    #[must_use]
    pub const fn from_rich_flag(rich_embed: bool) -> Self {
        if rich_embed {
            Self::Rich
        } else {
            Self::Plain
        }
    }
}

/// Structured embed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub color: u32,
    pub timestamp: String,
    pub thumbnail_url: Option<String>,
    pub author_name: String,
    pub author_url: String,
    pub author_icon_url: String,
    pub channel_field_value: String,
    pub category_field_value: Option<String>,
}

/// A rendered notification, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A single text message.
    Text(String),
    /// A plain link message followed by an embed.
    Rich {
        plain_prefix_text: String,
        embed: Embed,
    },
}

/// Render an enriched clip.
#[must_use]
pub fn compose(result: &EnrichmentResult, mode: RenderMode) -> Notification {
    match mode {
        RenderMode::Plain => Notification::Text(plain_text(result)),
        RenderMode::Rich => Notification::Rich {
            plain_prefix_text: format!("*{}*\n{}", result.clip.title, result.clip.url),
            embed: embed(result),
        },
    }
}

/// Render a clip without enrichment, from the chat message alone.
#[must_use]
pub fn compose_degraded(event: &ChatEvent) -> Notification {
    Notification::Text(format!(
        "**{}** posted a clip: {}",
        event.sender_display_name, event.text
    ))
}

fn plain_text(result: &EnrichmentResult) -> String {
    let playing = result
        .category
        .as_ref()
        .map(|c| format!(" playing __{}__", c.name))
        .unwrap_or_default();

    format!(
        "*{}*\n**{}** created a clip of **{}**{playing}\n{}",
        result.clip.title, result.creator.display_name, result.channel.display_name, result.clip.url
    )
}

fn embed(result: &EnrichmentResult) -> Embed {
    Embed {
        title: result.clip.title.clone(),
        url: result.clip.url.clone(),
        color: EMBED_COLOR,
        timestamp: result.clip.created_at.clone(),
        thumbnail_url: result.category.as_ref().map(|c| {
            c.thumbnail_url_template
                .replace("{width}", THUMBNAIL_SIZE)
                .replace("{height}", THUMBNAIL_SIZE)
        }),
        author_name: result.creator.display_name.clone(),
        author_url: channel_url(&result.creator.login_name),
        author_icon_url: result.creator.avatar_url.clone(),
        channel_field_value: format!(
            "[{}]({})",
            result.channel.display_name,
            channel_url(&result.channel.login_name)
        ),
        category_field_value: result.category.as_ref().map(|c| c.name.clone()),
    }
}

fn channel_url(login: &str) -> String {
    format!("https://www.twitch.tv/{login}")
}
