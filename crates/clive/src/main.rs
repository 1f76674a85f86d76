//! Clive CLI - Twitch clip relay bot.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use clive::config::Settings;
use clive::enrichment::{resolve_channel_ids, Enricher};
use clive::extract::extract_clip_id;
use clive::publish::{DiscordWebhook, Publisher};
use clive::server::{self, AppState};
use clive::storage::ClipStore;
use clive::twitch::{resolve_app_token, HelixClient};
use clive::{logging, ClipPipeline, TwitchChat};

const DEFAULT_ENV_FILE: &str = ".env";

/// Clive - relay Twitch clips posted in chat to Discord.
#[derive(Parser)]
#[command(name = "clive")]
#[command(about = "Twitch chat clip relay for Discord")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Environment file to load before reading settings
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to chat and relay clips (default)
    Run,

    /// Print the clip id found in a message
    Extract {
        /// Chat message text
        text: String,
    },

    /// List recently posted clips
    History {
        /// Dedup store file
        #[arg(long, env = "DB_FILE", default_value = "db.json")]
        db: PathBuf,

        /// Limit results
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loaded before parsing so `env = ".."` arguments see values from the file.
    load_env_file(&env_file_arg(std::env::args_os()))?;
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(cli.verbose).await,
        Commands::Extract { text } => {
            match extract_clip_id(&text) {
                Ok(id) => println!("{id}"),
                Err(e) => println!("{e}"),
            }
            Ok(())
        }
        Commands::History { db, limit } => run_history(db, limit).await,
    }
}

/// Value of `--env-file` in raw arguments, or the default.
fn env_file_arg(args: impl IntoIterator<Item = OsString>) -> PathBuf {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--env-file" {
            if let Some(value) = args.next() {
                return PathBuf::from(value);
            }
        } else if let Some(value) = arg.to_str().and_then(|a| a.strip_prefix("--env-file=")) {
            return PathBuf::from(value);
        }
    }
    PathBuf::from(DEFAULT_ENV_FILE)
}

/// Load `path` into the process environment. A missing file is fine.
fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Err(e) if !e.not_found() => {
            Err(e).with_context(|| format!("Failed to load {}", path.display()))
        }
        _ => Ok(()),
    }
}

async fn run_bot(verbose: bool) -> Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;
    let _log_guard = logging::init(&settings.log_level, verbose, settings.log_file.as_deref());
    info!(settings = ?settings, "Starting Clive");

    let store = ClipStore::open(&settings.db_file, settings.dedup_retention())
        .await
        .context("Failed to open clip store")?;
    let store = Arc::new(store);
    info!(path = %store.path().display(), clips = store.len().await, "Clip store ready");

    let enricher = build_enricher(&settings).await?;
    let webhook = DiscordWebhook::new(
        &settings.webhook_url,
        &settings.bot_username,
        &settings.avatar_url,
        settings.http_timeout,
    )
    .context("Failed to build webhook client")?;
    let publisher = Publisher::new(Arc::new(webhook));

    let runtime = Arc::new(RwLock::new(settings.runtime));
    let settings = Arc::new(settings);

    if settings.api_enabled {
        let state = AppState {
            settings: Arc::clone(&settings),
            runtime: Arc::clone(&runtime),
            store: Arc::clone(&store),
        };
        let port = settings.api_port;
        tokio::spawn(async move {
            if let Err(e) = server::serve(state, port).await {
                error!(error = %e, port, "Admin API stopped");
            }
        });
    }

    let pipeline = Arc::new(ClipPipeline::new(runtime, store, enricher, publisher));
    let chat = TwitchChat::new(settings.bot_login.clone());

    tokio::select! {
        result = pipeline.run(chat, &settings.channels) => {
            result.context("Chat session failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
    Ok(())
}

async fn build_enricher(settings: &Settings) -> Result<Enricher> {
    let token = resolve_app_token(
        settings.twitch_client_id.as_deref(),
        settings.twitch_client_secret.as_deref(),
        settings.twitch_app_token.as_deref(),
        &settings.twitch_auth_url,
        settings.http_timeout,
    )
    .await;

    let (Some(client_id), Some(token)) = (settings.twitch_client_id.as_deref(), token) else {
        warn!("Twitch API unavailable - clips will be posted without details");
        return Ok(Enricher::unavailable());
    };

    let helix = HelixClient::new(
        client_id,
        &token,
        &settings.twitch_api_url,
        settings.http_timeout,
    )
    .context("Failed to build Twitch API client")?;

    // RESTRICT_CHANNELS can be toggled at runtime.
    let tracked = match resolve_channel_ids(&helix, &settings.channels).await {
        Ok(ids) => Some(ids),
        Err(e) => {
            warn!(error = %e, "Tracked-channel restriction disabled");
            None
        }
    };

    Ok(Enricher::new(helix, tracked))
}

async fn run_history(db: PathBuf, limit: usize) -> Result<()> {
    let store = ClipStore::open_existing(&db)
        .await
        .with_context(|| format!("Failed to open {}", db.display()))?;

    let records = match store {
        Some(store) => store.recent(limit).await,
        None => Vec::new(),
    };
    if records.is_empty() {
        println!("No clips posted yet.");
        return Ok(());
    }

    for record in records {
        let posted = record
            .posted_at()
            .map_or_else(|| record.date.to_string(), |t| t.to_rfc3339());
        println!("{posted}  https://clips.twitch.tv/{}", record.id);
    }
    Ok(())
}
