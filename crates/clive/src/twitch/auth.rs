//! App access token via the OAuth client-credentials grant.

use std::time::Duration;

use tracing::{error, info, warn};

use super::types::AppToken;
use crate::error::HelixError;

/// Default Twitch identity base URL.
pub const TWITCH_AUTH_URL: &str = "https://id.twitch.tv";

/// Exchanges a client id and secret for an app token.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
}

impl TokenProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: &str,
        timeout: Duration,
    ) -> Result<Self, HelixError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// Request a fresh app token.
    pub async fn fetch(&self) -> Result<AppToken, HelixError> {
        let response = self
            .client
            .post(format!("{}/oauth2/token", self.auth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HelixError::Status {
                endpoint: "oauth2/token",
                status,
                body,
            });
        }

        let token: AppToken = response.json().await?;
        info!(expires_in = token.expires_in, "Fetched Twitch app token");
        Ok(token)
    }
}

/// Work out which app token to use, if any.
///
/// A pre-issued token wins; otherwise the client credentials are exchanged.
/// A failed exchange is logged and yields `None` so the bot keeps running in
/// degraded mode.
pub async fn resolve_app_token(
    client_id: Option<&str>,
    client_secret: Option<&str>,
    static_token: Option<&str>,
    auth_url: &str,
    timeout: Duration,
) -> Option<String> {
    let Some(client_id) = client_id else {
        info!("TWITCH_CLIENT_ID not set - clip enrichment disabled");
        return None;
    };

    if let Some(token) = static_token {
        return Some(token.to_string());
    }

    let Some(secret) = client_secret else {
        warn!("TWITCH_CLIENT_SECRET not set - clip enrichment disabled");
        return None;
    };

    let provider = match TokenProvider::new(client_id, secret, auth_url, timeout) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to build token client");
            return None;
        }
    };

    match provider.fetch().await {
        Ok(token) => Some(token.access_token),
        Err(e) => {
            error!(error = %e, "Failed to fetch Twitch app token");
            None
        }
    }
}
