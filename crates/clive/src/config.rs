//! Configuration for the clip relay.
//!
//! Everything is read from environment variables once at startup. The
//! toggles in [`RuntimeSettings`] can later be changed through the admin API;
//! they are shared with the pipeline through [`SharedSettings`].

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::ConfigError;
use crate::gate::Restrictions;
use crate::twitch::{HELIX_API_URL, TWITCH_AUTH_URL};

const DEFAULT_DB_FILE: &str = "db.json";
const DEFAULT_LOG_FILE: &str = "clive.log";
const DEFAULT_BOT_USERNAME: &str = "Clive";
const DEFAULT_AVATAR_URL: &str = "http://i.imgur.com/9s3TBNv.png";

/// Toggles that may change while the bot runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Role restrictions on who may post clips.
    #[serde(flatten)]
    pub restrictions: Restrictions,
    /// Render enriched clips as link message + embed.
    pub rich_embed: bool,
    /// Only relay clips from the channels being watched.
    pub restrict_channels: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            restrictions: Restrictions::default(),
            rich_embed: false,
            restrict_channels: true,
        }
    }
}

/// Partial update of [`RuntimeSettings`]. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    pub broadcaster_only: Option<bool>,
    pub mods_only: Option<bool>,
    pub subs_only: Option<bool>,
    pub rich_embed: Option<bool>,
    pub restrict_channels: Option<bool>,
}

impl RuntimeSettings {
    /// Apply a partial update.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.broadcaster_only {
            self.restrictions.broadcaster_only = v;
        }
        if let Some(v) = patch.mods_only {
            self.restrictions.mods_only = v;
        }
        if let Some(v) = patch.subs_only {
            self.restrictions.subs_only = v;
        }
        if let Some(v) = patch.rich_embed {
            self.rich_embed = v;
        }
        if let Some(v) = patch.restrict_channels {
            self.restrict_channels = v;
        }
    }
}

/// Runtime toggles shared between the pipeline and the admin API.
pub type SharedSettings = Arc<RwLock<RuntimeSettings>>;

/// Full bot configuration.
#[derive(Clone)]
pub struct Settings {
    /// Discord webhook URL.
    pub webhook_url: String,
    /// Channel logins to watch (lowercase, no `#`).
    pub channels: Vec<String>,
    /// Helix client id.
    pub twitch_client_id: Option<String>,
    /// Helix client secret, exchanged for an app token.
    pub twitch_client_secret: Option<String>,
    /// Pre-issued app token.
    pub twitch_app_token: Option<String>,
    /// Helix API base URL.
    pub twitch_api_url: String,
    /// Twitch identity base URL.
    pub twitch_auth_url: String,
    /// Login of the bot account; its own messages are ignored.
    pub bot_login: Option<String>,
    /// Dedup store file.
    pub db_file: PathBuf,
    /// Drop posted-clip records older than this many days on startup.
    pub dedup_retention_days: Option<u32>,
    /// Webhook sender name.
    pub bot_username: String,
    /// Webhook sender avatar.
    pub avatar_url: String,
    /// Log filter directive.
    pub log_level: String,
    /// Log file path; `None` disables file logging.
    pub log_file: Option<PathBuf>,
    /// Whether the admin API is served.
    pub api_enabled: bool,
    /// Admin API port.
    pub api_port: u16,
    /// Timeout applied to every outgoing HTTP request.
    pub http_timeout: Duration,
    /// Initial runtime toggles.
    pub runtime: RuntimeSettings,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| get(key).is_some_and(|v| parse_bool(&v));

        let webhook_url = get("DISCORD_WEBHOOK_URL").ok_or(ConfigError::Missing("DISCORD_WEBHOOK_URL"))?;
        let channels = parse_channel_list(&get("TWITCH_CHANNELS").unwrap_or_default());
        if channels.is_empty() {
            return Err(ConfigError::Missing("TWITCH_CHANNELS"));
        }

        let runtime = RuntimeSettings {
            restrictions: Restrictions {
                broadcaster_only: flag("BROADCASTER_ONLY"),
                mods_only: flag("MODS_ONLY"),
                subs_only: flag("SUBS_ONLY"),
            },
            rich_embed: flag("RICH_EMBED"),
            restrict_channels: get("RESTRICT_CHANNELS").is_none_or(|v| !v.eq_ignore_ascii_case("false")),
        };

        let settings = Self {
            webhook_url,
            channels,
            twitch_client_id: get("TWITCH_CLIENT_ID"),
            twitch_client_secret: get("TWITCH_CLIENT_SECRET"),
            twitch_app_token: get("TWITCH_APP_TOKEN"),
            twitch_api_url: get("TWITCH_API_URL").unwrap_or_else(|| HELIX_API_URL.to_string()),
            twitch_auth_url: get("TWITCH_AUTH_URL").unwrap_or_else(|| TWITCH_AUTH_URL.to_string()),
            bot_login: get("TWITCH_BOT_LOGIN").map(|l| l.to_lowercase()),
            db_file: PathBuf::from(get("DB_FILE").unwrap_or_else(|| DEFAULT_DB_FILE.to_string())),
            dedup_retention_days: parse_opt("DEDUP_RETENTION_DAYS", get("DEDUP_RETENTION_DAYS"))?,
            bot_username: get("BOT_USERNAME").unwrap_or_else(|| DEFAULT_BOT_USERNAME.to_string()),
            avatar_url: get("URL_AVATAR").unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "error".to_string()),
            log_file: match lookup("LOG_FILE") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(PathBuf::from(v)),
                None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
            },
            api_enabled: flag("API"),
            api_port: parse_opt("API_PORT", get("API_PORT"))?.unwrap_or(3000),
            http_timeout: Duration::from_secs(
                parse_opt("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"))?.unwrap_or(30),
            ),
            runtime,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.webhook_url.starts_with("http://") && !self.webhook_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "DISCORD_WEBHOOK_URL",
                value: self.webhook_url.clone(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Retention window for the dedup store.
    #[must_use]
    pub fn dedup_retention(&self) -> Option<chrono::Duration> {
        self.dedup_retention_days
            .map(|days| chrono::Duration::days(i64::from(days)))
    }

    /// Settings safe to log or expose: no secrets, no webhook URL.
    #[must_use]
    pub fn public_view(&self, runtime: RuntimeSettings) -> PublicSettings {
        PublicSettings {
            channels: self.channels.clone(),
            twitch_client_id_set: self.twitch_client_id.is_some(),
            bot_username: self.bot_username.clone(),
            avatar_url: self.avatar_url.clone(),
            db_file: self.db_file.display().to_string(),
            dedup_retention_days: self.dedup_retention_days,
            runtime,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("channels", &self.channels)
            .field("twitch_client_id_set", &self.twitch_client_id.is_some())
            .field("twitch_api_url", &self.twitch_api_url)
            .field("bot_login", &self.bot_login)
            .field("db_file", &self.db_file)
            .field("dedup_retention_days", &self.dedup_retention_days)
            .field("bot_username", &self.bot_username)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("api_enabled", &self.api_enabled)
            .field("api_port", &self.api_port)
            .field("http_timeout", &self.http_timeout)
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}

/// Settings view returned by the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSettings {
    pub channels: Vec<String>,
    pub twitch_client_id_set: bool,
    pub bot_username: String,
    pub avatar_url: String,
    pub db_file: String,
    pub dedup_retention_days: Option<u32>,
    #[serde(flatten)]
    pub runtime: RuntimeSettings,
}

/// Parse a boolean flag: `true` or `1`, case-insensitive.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true") || value.trim() == "1"
}

/// Split a space or comma separated channel list into lowercase logins.
#[must_use]
pub fn parse_channel_list(value: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for login in value
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|c| c.trim_start_matches('#').to_lowercase())
        .filter(|c| !c.is_empty())
    {
        if !channels.contains(&login) {
            channels.push(login);
        }
    }
    channels
}

fn parse_opt<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value: v })
        })
        .transpose()
}
