//! Admin API tests against a live server on a random port.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::DateTime;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use clive::config::Settings;
use clive::server::{build_router, AppState};
use clive::storage::ClipStore;

struct TestServer {
    addr: SocketAddr,
    state: AppState,
    _temp_dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

async fn start_server() -> TestServer {
    let settings = Settings::from_lookup(|key| match key {
        "DISCORD_WEBHOOK_URL" => Some("https://discord.com/api/webhooks/1/secret-part".to_string()),
        "TWITCH_CHANNELS" => Some("streamerx".to_string()),
        "TWITCH_CLIENT_SECRET" => Some("hunter2".to_string()),
        _ => None,
    })
    .unwrap();

    let temp_dir = TempDir::new().unwrap();
    let store = ClipStore::open(temp_dir.path().join("db.json"), None)
        .await
        .unwrap();
    let t = |ms| DateTime::from_timestamp_millis(ms).unwrap();
    store.record("Older", t(1_000)).await.unwrap();
    store.record("Newer", t(2_000)).await.unwrap();

    let state = AppState {
        runtime: Arc::new(RwLock::new(settings.runtime)),
        settings: Arc::new(settings),
        store: Arc::new(store),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        addr,
        state,
        _temp_dir: temp_dir,
    }
}

#[tokio::test]
async fn test_health() {
    let server = start_server().await;
    let body: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_settings_hide_secrets() {
    let server = start_server().await;
    let response = reqwest::get(server.url("/settings")).await.unwrap();
    assert!(response.status().is_success());

    let text = response.text().await.unwrap();
    assert!(!text.contains("hunter2"));
    assert!(!text.contains("secret-part"));

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["channels"], json!(["streamerx"]));
    assert_eq!(body["subs_only"], false);
    assert_eq!(body["restrict_channels"], true);
}

#[tokio::test]
async fn test_patch_settings_updates_shared_state() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .patch(server.url("/settings"))
        .json(&json!({ "mods_only": true, "rich_embed": true }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["mods_only"], true);
    assert_eq!(body["rich_embed"], true);
    assert_eq!(body["broadcaster_only"], false);

    let runtime = *server.state.runtime.read().await;
    assert!(runtime.restrictions.mods_only);
    assert!(runtime.rich_embed);
    assert!(runtime.restrict_channels);
}

#[tokio::test]
async fn test_patch_rejects_unknown_fields() {
    let server = start_server().await;
    let response = reqwest::Client::new()
        .patch(server.url("/settings"))
        .json(&json!({ "webhook_url": "https://evil.example" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(
        *server.state.runtime.read().await,
        server.state.settings.runtime
    );
}

#[tokio::test]
async fn test_clips_newest_first() {
    let server = start_server().await;
    let body: Value = reqwest::get(server.url("/clips?limit=1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!([{ "id": "Newer", "date": 2000 }]));

    let all: Vec<Value> = reqwest::get(server.url("/clips"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let bad = reqwest::get(server.url("/clips?limit=0")).await.unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}
