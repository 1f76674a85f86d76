//! Helix response types.

use serde::Deserialize;

/// Every Helix list endpoint wraps results in `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `GET /clips` item.
#[derive(Debug, Clone, Deserialize)]
pub struct Clip {
    pub id: String,
    pub url: String,
    pub broadcaster_id: String,
    #[serde(default)]
    pub broadcaster_name: String,
    pub creator_id: String,
    #[serde(default)]
    pub creator_name: String,
    /// Empty when the clip has no category.
    #[serde(default)]
    pub game_id: String,
    pub title: String,
    pub created_at: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

/// `GET /users` item.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// `GET /games` item.
#[derive(Debug, Clone, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    /// Contains `{width}` and `{height}` placeholders.
    #[serde(default)]
    pub box_art_url: String,
}

/// Response of the client-credentials token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AppToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}
