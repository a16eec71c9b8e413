use std::{fmt, str::FromStr};

use {
    serde::{Deserialize, Serialize},
    thevoid_common::{ChannelId, ServerId, UserId},
};

use crate::{Error, Result};

/// A channel whose messages are deleted after `delete_after` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidChannel {
    pub server_id: ServerId,
    pub channel_id: ChannelId,
    /// When false the row is kept but nothing is deleted.
    pub enabled: bool,
    /// Seconds to wait before deleting; `0.0` deletes immediately.
    pub delete_after: f64,
}

impl VoidChannel {
    #[must_use]
    pub fn new(server_id: ServerId, channel_id: ChannelId, delete_after: f64) -> Self {
        Self {
            server_id,
            channel_id,
            enabled: true,
            delete_after,
        }
    }
}

/// Redirects or suppresses log output for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverride {
    pub server_id: ServerId,
    pub user_id: UserId,
    /// `None` suppresses the user's logs entirely.
    pub log_channel_id: Option<ChannelId>,
}

/// Per-server configuration for one kind of logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogConfig {
    pub enabled: bool,
    /// Overrides the server's default log channel for this event type.
    pub log_channel_id: Option<ChannelId>,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_channel_id: None,
        }
    }
}

/// Kinds of audit events that can be routed to a log channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MessageDelete,
    MessageEdit,
    MemberJoin,
    MemberLeave,
    MemberBan,
    MemberUnban,
    NicknameChange,
    UsernameChange,
    AvatarChange,
}

impl EventType {
    pub const ALL: [Self; 9] = [
        Self::MessageDelete,
        Self::MessageEdit,
        Self::MemberJoin,
        Self::MemberLeave,
        Self::MemberBan,
        Self::MemberUnban,
        Self::NicknameChange,
        Self::UsernameChange,
        Self::AvatarChange,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageDelete => "message_delete",
            Self::MessageEdit => "message_edit",
            Self::MemberJoin => "member_join",
            Self::MemberLeave => "member_leave",
            Self::MemberBan => "member_ban",
            Self::MemberUnban => "member_unban",
            Self::NicknameChange => "nickname_change",
            Self::UsernameChange => "username_change",
            Self::AvatarChange => "avatar_change",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| Error::unknown_event_type(s))
    }
}

/// Check that a delete delay is usable: finite and not negative.
pub fn validate_delay(seconds: f64) -> Result<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(Error::InvalidDelay { seconds })
    }
}
