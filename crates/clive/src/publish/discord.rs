//! Discord webhook endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Phase, Webhook};
use crate::compose::Embed;
use crate::error::PublishError;

/// Discord webhook with a fixed sender identity.
pub struct DiscordWebhook {
    webhook_url: String,
    username: String,
    avatar_url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(
        webhook_url: impl Into<String>,
        username: impl Into<String>,
        avatar_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        Ok(Self {
            webhook_url: webhook_url.into(),
            username: username.into(),
            avatar_url: avatar_url.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Format a call as a Discord webhook payload.
    fn format_payload<'a>(&'a self, phase: Phase<'a>) -> DiscordPayload<'a> {
        let (content, embeds) = match phase {
            Phase::Text(text) => (text, Vec::new()),
            Phase::Embed(embed) => ("", vec![Self::format_embed(embed)]),
        };

        DiscordPayload {
            content,
            username: &self.username,
            avatar_url: &self.avatar_url,
            embeds,
        }
    }

    fn format_embed(embed: &Embed) -> DiscordEmbed<'_> {
        let mut fields = vec![DiscordField {
            name: "Channel",
            value: &embed.channel_field_value,
            inline: true,
        }];
        if let Some(category) = &embed.category_field_value {
            fields.push(DiscordField {
                name: "Game",
                value: category,
                inline: true,
            });
        }

        DiscordEmbed {
            title: &embed.title,
            url: &embed.url,
            color: embed.color,
            timestamp: &embed.timestamp,
            thumbnail: embed
                .thumbnail_url
                .as_deref()
                .map(|url| DiscordImage { url }),
            author: DiscordAuthor {
                name: &embed.author_name,
                url: &embed.author_url,
                icon_url: &embed.author_icon_url,
            },
            fields,
        }
    }
}

#[async_trait]
impl Webhook for DiscordWebhook {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn post(&self, phase: Phase<'_>) -> Result<StatusCode, PublishError> {
        let payload = self.format_payload(phase);
        debug!(channel = "discord", embeds = payload.embeds.len(), "Sending webhook");

        let response = self.client.post(&self.webhook_url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                channel = "discord",
                status = %status,
                body = %body,
                "Discord webhook request failed"
            );
        }
        Ok(status)
    }
}

// =============================================================================
// Discord API types
// =============================================================================

#[derive(Debug, Serialize)]
struct DiscordPayload<'a> {
    content: &'a str,
    username: &'a str,
    avatar_url: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<DiscordEmbed<'a>>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed<'a> {
    title: &'a str,
    url: &'a str,
    color: u32,
    timestamp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<DiscordImage<'a>>,
    author: DiscordAuthor<'a>,
    fields: Vec<DiscordField<'a>>,
}

#[derive(Debug, Serialize)]
struct DiscordImage<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct DiscordAuthor<'a> {
    name: &'a str,
    url: &'a str,
    icon_url: &'a str,
}

#[derive(Debug, Serialize)]
struct DiscordField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::EMBED_COLOR;
    use serde_json::json;

    fn webhook() -> DiscordWebhook {
        DiscordWebhook::new(
            "http://localhost/webhook",
            "Clive",
            "http://i.imgur.com/9s3TBNv.png",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn embed(with_category: bool) -> Embed {
        Embed {
            title: "My Clip".to_string(),
            url: "https://clips.twitch.tv/AbCd1234".to_string(),
            color: EMBED_COLOR,
            timestamp: "2024-03-01T12:00:00Z".to_string(),
            thumbnail_url: with_category.then(|| "https://cdn.example/box-80x80.jpg".to_string()),
            author_name: "Bob".to_string(),
            author_url: "https://www.twitch.tv/bob".to_string(),
            author_icon_url: "https://cdn.example/bob.png".to_string(),
            channel_field_value: "[StreamerX](https://www.twitch.tv/streamerx)".to_string(),
            category_field_value: with_category.then(|| "GameY".to_string()),
        }
    }

    #[test]
    fn test_text_payload_has_no_embeds() {
        let hook = webhook();
        let value = serde_json::to_value(hook.format_payload(Phase::Text("hello"))).unwrap();
        assert_eq!(
            value,
            json!({
                "content": "hello",
                "username": "Clive",
                "avatar_url": "http://i.imgur.com/9s3TBNv.png",
            })
        );
    }

    #[test]
    fn test_embed_payload() {
        let hook = webhook();
        let embed = embed(true);
        let value = serde_json::to_value(hook.format_payload(Phase::Embed(&embed))).unwrap();

        assert_eq!(value["content"], "");
        let sent = &value["embeds"][0];
        assert_eq!(sent["color"], 9_442_302);
        assert_eq!(sent["thumbnail"]["url"], "https://cdn.example/box-80x80.jpg");
        assert_eq!(sent["author"]["icon_url"], "https://cdn.example/bob.png");
        assert_eq!(
            sent["fields"],
            json!([
                {"name": "Channel", "value": "[StreamerX](https://www.twitch.tv/streamerx)", "inline": true},
                {"name": "Game", "value": "GameY", "inline": true},
            ])
        );
    }

    #[test]
    fn test_embed_payload_without_category() {
        let hook = webhook();
        let embed = embed(false);
        let value = serde_json::to_value(hook.format_payload(Phase::Embed(&embed))).unwrap();

        let sent = &value["embeds"][0];
        assert!(sent.get("thumbnail").is_none());
        assert_eq!(sent["fields"].as_array().unwrap().len(), 1);
    }
}
