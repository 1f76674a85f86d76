//! Anonymous Twitch IRC session built on `twitch-irc`.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use twitch_irc::login::StaticLoginCredentials;
use twitch_irc::message::{PrivmsgMessage, ServerMessage};
use twitch_irc::{ClientConfig, SecureTCPTransport, TwitchIRCClient};

use super::{ChatError, ChatEvent, ChatSession, RoleFlags};

type IrcClient = TwitchIRCClient<SecureTCPTransport, StaticLoginCredentials>;

/// Read-only Twitch chat connection.
pub struct TwitchChat {
    client: IrcClient,
    incoming: UnboundedReceiver<ServerMessage>,
    bot_login: Option<String>,
}

impl TwitchChat {
    /// Create an anonymous session. Messages sent by `bot_login` are flagged as self.
    #[must_use]
    pub fn new(bot_login: Option<String>) -> Self {
        let (incoming, client) = IrcClient::new(ClientConfig::default());
        Self {
            client,
            incoming,
            bot_login: bot_login.map(|l| l.to_lowercase()),
        }
    }
}

#[async_trait]
impl ChatSession for TwitchChat {
    async fn connect(&mut self) -> Result<(), ChatError> {
        self.client.connect().await;
        info!("Connected to Twitch chat");
        Ok(())
    }

    fn join(&mut self, channel: &str) -> Result<(), ChatError> {
        let login = channel.trim_start_matches('#').to_lowercase();
        self.client
            .join(login.clone())
            .map_err(|e| ChatError::Join {
                channel: login.clone(),
                reason: e.to_string(),
            })?;
        info!(channel = %login, "Joined channel");
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChatEvent> {
        while let Some(message) = self.incoming.recv().await {
            match message {
                ServerMessage::Privmsg(msg) => {
                    return Some(to_chat_event(msg, self.bot_login.as_deref()));
                }
                ServerMessage::Notice(notice) => {
                    warn!(message = %notice.message_text, "Twitch notice");
                }
                other => debug!(command = %other.source().command, "Ignoring IRC message"),
            }
        }
        None
    }
}

fn to_chat_event(msg: PrivmsgMessage, bot_login: Option<&str>) -> ChatEvent {
    let has_badge = |name: &str| msg.badges.iter().any(|b| b.name == name);
    let roles = RoleFlags {
        broadcaster: has_badge("broadcaster"),
        moderator: has_badge("moderator"),
        subscriber: has_badge("subscriber") || has_badge("founder"),
    };
    let is_self = bot_login.is_some_and(|login| msg.sender.login == login);

    ChatEvent {
        channel: msg.channel_login,
        sender_display_name: msg.sender.name,
        text: msg.message_text,
        roles,
        is_self,
    }
}
