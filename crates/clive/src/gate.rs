//! Posting eligibility checks on chat metadata.

use crate::chat::ChatEvent;

/// Role restrictions. Any subset may be enabled at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Restrictions {
    pub broadcaster_only: bool,
    pub mods_only: bool,
    pub subs_only: bool,
}

/// Why a message was not allowed to post a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    SelfMessage,
    NotBroadcaster,
    NotModerator,
    NotSubscriber,
}

impl Rejection {
    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelfMessage => "self",
            Self::NotBroadcaster => "non-broadcaster",
            Self::NotModerator => "non-moderator",
            Self::NotSubscriber => "non-subscriber",
        }
    }
}

/// Decide whether `event` may post. Checks run in a fixed order and stop at
/// the first failure, so the order only affects the reported reason.
pub fn check(event: &ChatEvent, restrictions: Restrictions) -> Result<(), Rejection> {
    let roles = event.roles;

    if event.is_self {
        return Err(Rejection::SelfMessage);
    }
    if restrictions.broadcaster_only && !roles.broadcaster {
        return Err(Rejection::NotBroadcaster);
    }
    if restrictions.mods_only && !(roles.moderator || roles.broadcaster) {
        return Err(Rejection::NotModerator);
    }
    if restrictions.subs_only && !roles.subscriber {
        return Err(Rejection::NotSubscriber);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::RoleFlags;

    fn event(roles: RoleFlags) -> ChatEvent {
        ChatEvent {
            channel: "streamerx".to_string(),
            sender_display_name: "Alice".to_string(),
            text: "https://clips.twitch.tv/AbCd1234".to_string(),
            roles,
            is_self: false,
        }
    }

    const VIEWER: RoleFlags = RoleFlags {
        broadcaster: false,
        moderator: false,
        subscriber: false,
    };

    #[test]
    fn test_no_restrictions_allows_everyone() {
        assert_eq!(check(&event(VIEWER), Restrictions::default()), Ok(()));
    }

    #[test]
    fn test_self_always_rejected() {
        let mut e = event(RoleFlags {
            broadcaster: true,
            ..VIEWER
        });
        e.is_self = true;
        assert_eq!(
            check(&e, Restrictions::default()),
            Err(Rejection::SelfMessage)
        );
    }

    #[test]
    fn test_broadcaster_only() {
        let r = Restrictions {
            broadcaster_only: true,
            ..Restrictions::default()
        };
        assert_eq!(check(&event(VIEWER), r), Err(Rejection::NotBroadcaster));
        let mod_event = event(RoleFlags {
            moderator: true,
            ..VIEWER
        });
        assert_eq!(check(&mod_event, r), Err(Rejection::NotBroadcaster));
        let owner = event(RoleFlags {
            broadcaster: true,
            ..VIEWER
        });
        assert_eq!(check(&owner, r), Ok(()));
    }

    #[test]
    fn test_mods_only_accepts_broadcaster() {
        let r = Restrictions {
            mods_only: true,
            ..Restrictions::default()
        };
        assert_eq!(check(&event(VIEWER), r), Err(Rejection::NotModerator));
        let owner = event(RoleFlags {
            broadcaster: true,
            ..VIEWER
        });
        assert_eq!(check(&owner, r), Ok(()));
        let moderator = event(RoleFlags {
            moderator: true,
            ..VIEWER
        });
        assert_eq!(check(&moderator, r), Ok(()));
    }

    #[test]
    fn test_restrictions_combine() {
        let r = Restrictions {
            broadcaster_only: false,
            mods_only: true,
            subs_only: true,
        };
        let unsubbed_mod = event(RoleFlags {
            moderator: true,
            ..VIEWER
        });
        assert_eq!(check(&unsubbed_mod, r), Err(Rejection::NotSubscriber));

        let subbed_mod = event(RoleFlags {
            moderator: true,
            subscriber: true,
            ..VIEWER
        });
        assert_eq!(check(&subbed_mod, r), Ok(()));

        // Both checks fail: the earlier one is reported.
        let owner_and_subs = Restrictions {
            broadcaster_only: true,
            subs_only: true,
            ..Restrictions::default()
        };
        assert_eq!(check(&event(VIEWER), owner_and_subs), Err(Rejection::NotBroadcaster));
    }
}
