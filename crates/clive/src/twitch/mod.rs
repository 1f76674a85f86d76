//! Twitch Helix API access.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{resolve_app_token, TokenProvider, TWITCH_AUTH_URL};
pub use client::{HelixClient, HELIX_API_URL};
pub use types::{AppToken, Clip, Game, User};
