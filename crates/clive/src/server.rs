//! Admin HTTP API for viewing and changing runtime settings.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{PublicSettings, RuntimeSettings, Settings, SettingsPatch, SharedSettings};
use crate::storage::{ClipRecord, ClipStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration.
    pub settings: Arc<Settings>,
    /// Live toggles shared with the pipeline.
    pub runtime: SharedSettings,
    /// Posted clip store.
    pub store: Arc<ClipStore>,
}

/// Build the admin router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/settings", get(get_settings).patch(update_settings))
        .route("/clips", get(list_clips))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn get_settings(State(state): State<AppState>) -> Json<PublicSettings> {
    let runtime = *state.runtime.read().await;
    Json(state.settings.public_view(runtime))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Json<RuntimeSettings> {
    let mut runtime = state.runtime.write().await;
    runtime.apply(patch);
    info!(settings = ?*runtime, "Runtime settings updated");
    Json(*runtime)
}

#[derive(Debug, Deserialize)]
struct ClipsQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

const fn default_limit() -> usize {
    20
}

async fn list_clips(
    State(state): State<AppState>,
    Query(query): Query<ClipsQuery>,
) -> Result<Json<Vec<ClipRecord>>, StatusCode> {
    if query.limit == 0 || query.limit > 500 {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(state.store.recent(query.limit).await))
}

/// Serve the admin API on `port` until the process exits.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(addr = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, build_router(state)).await
}
