//! Helix REST client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use super::types::{Clip, Game, HelixResponse, User};
use crate::error::HelixError;

/// Default Helix API base.
pub const HELIX_API_URL: &str = "https://api.twitch.tv/helix";

/// Authenticated Helix client.
#[derive(Debug, Clone)]
pub struct HelixClient {
    client: reqwest::Client,
    api_url: String,
}

impl HelixClient {
    /// Create a client sending `Client-ID` and a bearer app token on every request.
    pub fn new(
        client_id: &str,
        app_token: &str,
        api_url: &str,
        timeout: Duration,
    ) -> Result<Self, HelixError> {
        let mut headers = HeaderMap::new();
        headers.insert("Client-ID", HeaderValue::from_str(client_id)?);
        let mut auth = HeaderValue::from_str(&format!("Bearer {app_token}"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a clip by id.
    #[instrument(skip(self))]
    pub async fn get_clip(&self, id: &str) -> Result<Clip, HelixError> {
        self.get_first("clips", &[("id", id)]).await
    }

    /// Fetch a user by id.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<User, HelixError> {
        self.get_first("users", &[("id", id)]).await
    }

    /// Fetch a game (category) by id.
    #[instrument(skip(self))]
    pub async fn get_game(&self, id: &str) -> Result<Game, HelixError> {
        self.get_first("games", &[("id", id)]).await
    }

    /// Look up several users by login in one request.
    ///
    /// Unknown logins are simply absent from the result.
    #[instrument(skip(self))]
    pub async fn get_users_by_login(&self, logins: &[String]) -> Result<Vec<User>, HelixError> {
        let query: Vec<(&str, &str)> = logins.iter().map(|l| ("login", l.as_str())).collect();
        self.get_list("users", &query).await
    }

    async fn get_first<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, HelixError> {
        self.get_list(endpoint, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HelixError::NotFound {
                endpoint,
                key: query
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&"),
            })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, HelixError> {
        info!(endpoint, "GET /{endpoint}");

        let response = self
            .client
            .get(format!("{}/{endpoint}", self.api_url))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(HelixError::RateLimited { endpoint });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HelixError::Status {
                endpoint,
                status,
                body,
            });
        }

        let parsed: HelixResponse<T> = response.json().await?;
        debug!(endpoint, count = parsed.data.len(), "Helix response");
        Ok(parsed.data)
    }
}
