//! Chat session abstraction.
//!
//! The pipeline only consumes [`ChatEvent`]s. Anything able to connect,
//! join channels and hand out events can drive it through [`ChatSession`].

pub mod twitch;

use async_trait::async_trait;

pub use twitch::TwitchChat;

/// Role badges carried by a chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleFlags {
    pub broadcaster: bool,
    pub moderator: bool,
    pub subscriber: bool,
}

/// One incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Channel login the message was sent in (no `#`).
    pub channel: String,
    /// Display name of the sender.
    pub sender_display_name: String,
    /// Raw message text.
    pub text: String,
    /// Role badges of the sender.
    pub roles: RoleFlags,
    /// Whether the bot itself sent this message.
    pub is_self: bool,
}

/// Errors raised by a chat session.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Could not establish the connection
    #[error("chat connection failed: {0}")]
    Connect(String),

    /// Channel name was rejected
    #[error("cannot join channel {channel}: {reason}")]
    Join { channel: String, reason: String },
}

/// A source of chat events.
#[async_trait]
pub trait ChatSession: Send {
    /// Open the underlying connection.
    async fn connect(&mut self) -> Result<(), ChatError>;

    /// Join a channel by login name.
    fn join(&mut self, channel: &str) -> Result<(), ChatError>;

    /// Wait for the next chat message. `None` once the session has closed.
    async fn next_event(&mut self) -> Option<ChatEvent>;
}
