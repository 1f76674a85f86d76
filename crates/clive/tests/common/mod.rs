//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::RwLock;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clive::chat::{ChatEvent, RoleFlags};
use clive::config::RuntimeSettings;
use clive::enrichment::Enricher;
use clive::publish::{DiscordWebhook, Publisher};
use clive::storage::ClipStore;
use clive::twitch::HelixClient;
use clive::ClipPipeline;

pub const CLIP_ID: &str = "AbCd1234";
pub const BROADCASTER_ID: &str = "123";
pub const CREATOR_ID: &str = "456";
pub const GAME_ID: &str = "789";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn event(text: &str) -> ChatEvent {
    ChatEvent {
        channel: "streamerx".to_string(),
        sender_display_name: "Alice".to_string(),
        text: text.to_string(),
        roles: RoleFlags::default(),
        is_self: false,
    }
}

pub fn clip_message() -> ChatEvent {
    event(&format!("check https://clips.twitch.tv/{CLIP_ID}"))
}

pub fn helix_client(server: &MockServer) -> HelixClient {
    HelixClient::new("client-id", "app-token", &server.uri(), TIMEOUT).unwrap()
}

/// Mount clip, creator, channel and game lookups for [`CLIP_ID`].
pub async fn mount_helix(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/clips"))
        .and(query_param("id", CLIP_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": CLIP_ID,
                "url": format!("https://clips.twitch.tv/{CLIP_ID}"),
                "broadcaster_id": BROADCASTER_ID,
                "broadcaster_name": "StreamerX",
                "creator_id": CREATOR_ID,
                "creator_name": "Bob",
                "game_id": GAME_ID,
                "title": "  My Clip ",
                "created_at": "2024-03-01T12:00:00Z",
                "thumbnail_url": "https://clips-media.example/thumb.jpg"
            }]
        })))
        .mount(server)
        .await;

    mount_user(server, CREATOR_ID, "bob", "Bob").await;
    mount_user(server, BROADCASTER_ID, "streamerx", "StreamerX").await;

    Mock::given(method("GET"))
        .and(path("/games"))
        .and(query_param("id", GAME_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": GAME_ID,
                "name": "GameY",
                "box_art_url": "https://cdn.example/box-{width}x{height}.jpg"
            }]
        })))
        .mount(server)
        .await;
}

pub async fn mount_user(server: &MockServer, id: &str, login: &str, display_name: &str) {
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": id,
                "login": login,
                "display_name": display_name,
                "profile_image_url": format!("https://cdn.example/{login}.png")
            }]
        })))
        .mount(server)
        .await;
}

pub struct Harness {
    pub pipeline: Arc<ClipPipeline>,
    pub store: Arc<ClipStore>,
    pub settings: Arc<RwLock<RuntimeSettings>>,
    _temp_dir: TempDir,
}

/// Build a pipeline posting to `{webhook_server}/webhook`.
pub async fn harness(
    webhook_server: &MockServer,
    enricher: Enricher,
    runtime: RuntimeSettings,
) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(
        ClipStore::open(temp_dir.path().join("db.json"), None)
            .await
            .unwrap(),
    );
    let webhook = DiscordWebhook::new(
        format!("{}/webhook", webhook_server.uri()),
        "Clive",
        "http://i.imgur.com/9s3TBNv.png",
        TIMEOUT,
    )
    .unwrap();
    let settings = Arc::new(RwLock::new(runtime));
    let pipeline = Arc::new(ClipPipeline::new(
        Arc::clone(&settings),
        Arc::clone(&store),
        enricher,
        Publisher::new(Arc::new(webhook)),
    ));

    Harness {
        pipeline,
        store,
        settings,
        _temp_dir: temp_dir,
    }
}

/// JSON bodies of every request the server received.
pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}
