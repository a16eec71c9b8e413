//! Per-message deletion decision.
//!
//! [`Classifier::classify`] is a pure function of the message and a
//! [`ConfigSnapshot`]; fetching the snapshot is the caller's job so the
//! decision itself never blocks or fails.

use std::{sync::OnceLock, time::Duration};

use {
    thevoid_channels::{InboundMessage, RelayIdentity},
    thevoid_common::{ChannelId, UserId},
    thevoid_store::VoidChannel,
};

/// What to do with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Ignore,
    /// Delete the message once the delay has elapsed.
    DeleteAfter(Duration),
}

/// The configuration state a decision is made against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSnapshot<'a> {
    /// Void configuration for the message's channel, if any.
    pub channel: Option<&'a VoidChannel>,
    /// Cached relay identity for the message's channel, if any.
    pub cached_relay: Option<&'a RelayIdentity>,
}

pub struct Classifier {
    bot_user_id: OnceLock<UserId>,
    exempt_markers: Vec<String>,
    report_channel: Option<ChannelId>,
}

impl Classifier {
    /// `exempt_markers` are titles of the bot's own UI messages that must
    /// never be deleted.
    pub fn new(exempt_markers: Vec<String>) -> Self {
        Self {
            bot_user_id: OnceLock::new(),
            exempt_markers,
            report_channel: None,
        }
    }

    /// Everything the bot posts in `channel_id`, where failure reports go,
    /// is exempt.
    #[must_use]
    pub fn with_report_channel(mut self, channel_id: Option<ChannelId>) -> Self {
        self.report_channel = channel_id;
        self
    }

    /// Record the bot's own user id once the platform session is ready.
    /// Later calls are ignored.
    pub fn set_bot_user_id(&self, user_id: UserId) {
        let _ = self.bot_user_id.set(user_id);
    }

    pub fn bot_user_id(&self) -> Option<UserId> {
        self.bot_user_id.get().copied()
    }

    /// True for the bot's own confirmation/UI messages and for anything it
    /// posts in the report channel.
    pub fn is_own_artifact(&self, message: &InboundMessage) -> bool {
        if self.bot_user_id() != Some(message.author_id) {
            return false;
        }
        self.report_channel == Some(message.channel_id)
            || message
                .content_markers
                .iter()
                .any(|marker| self.exempt_markers.contains(marker))
    }

    pub fn classify(&self, message: &InboundMessage, snapshot: ConfigSnapshot<'_>) -> Decision {
        if self.is_own_artifact(message) {
            return Decision::Ignore;
        }

        let Some(channel) = snapshot.channel.filter(|c| c.enabled) else {
            return Decision::Ignore;
        };

        // A relay message is exempt only when it matches the cached identity.
        // With a cold cache it is deleted like any other message.
        if let (Some(relay_id), Some(cached)) = (message.relay_id, snapshot.cached_relay)
            && relay_id == cached.id
        {
            return Decision::Ignore;
        }

        Decision::DeleteAfter(delay_from_secs(channel.delete_after))
    }
}

/// Convert stored seconds to a `Duration`, clamping negatives and NaN to zero
/// and overflow to `Duration::MAX`.
pub fn delay_from_secs(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}
