//! Picks the log destination for an audit event.
//!
//! Resolution order, first match wins:
//!
//! 1. A user override for the acting user. A null channel suppresses.
//! 2. The event type's configuration. Disabled suppresses; a specific channel
//!    is used as-is.
//! 3. The server's default log channel, or suppressed when there is none.

use std::sync::Arc;

use {
    thevoid_common::{CategoryId, ChannelId, ServerId, UserId},
    thevoid_store::{EventType, LogConfigStore},
    tracing::trace,
};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    Channel(ChannelId),
    Suppressed,
}

impl LogDestination {
    pub fn channel(self) -> Option<ChannelId> {
        match self {
            Self::Channel(id) => Some(id),
            Self::Suppressed => None,
        }
    }
}

/// Result of looking up a single user's override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOverrideMatch {
    NoOverride,
    /// Logs for this user are dropped.
    Ignored,
    Redirected(ChannelId),
}

pub struct OverrideResolver {
    store: Arc<dyn LogConfigStore>,
}

impl OverrideResolver {
    pub fn new(store: Arc<dyn LogConfigStore>) -> Self {
        Self { store }
    }

    pub async fn check_user_override(
        &self,
        server_id: ServerId,
        user_id: UserId,
    ) -> Result<UserOverrideMatch> {
        let overrides = self.store.user_overrides(server_id).await?;
        Ok(overrides
            .iter()
            .find(|o| o.user_id == user_id)
            .map_or(UserOverrideMatch::NoOverride, |o| match o.log_channel_id {
                Some(channel) => UserOverrideMatch::Redirected(channel),
                None => UserOverrideMatch::Ignored,
            }))
    }

    pub async fn resolve(
        &self,
        server_id: ServerId,
        event: Option<EventType>,
        user_id: Option<UserId>,
    ) -> Result<LogDestination> {
        if let Some(user_id) = user_id {
            match self.check_user_override(server_id, user_id).await? {
                UserOverrideMatch::Ignored => {
                    trace!(%server_id, %user_id, "user is ignored");
                    return Ok(LogDestination::Suppressed);
                },
                UserOverrideMatch::Redirected(channel) => {
                    return Ok(LogDestination::Channel(channel));
                },
                UserOverrideMatch::NoOverride => {},
            }
        }

        if let Some(event) = event {
            let configs = self.store.event_log_configs(server_id).await?;
            if let Some(config) = configs.get(&event) {
                if !config.enabled {
                    trace!(%server_id, %event, "event type disabled");
                    return Ok(LogDestination::Suppressed);
                }
                if let Some(channel) = config.log_channel_id {
                    return Ok(LogDestination::Channel(channel));
                }
            }
        }

        Ok(self
            .store
            .default_log_channel(server_id)
            .await?
            .map_or(LogDestination::Suppressed, LogDestination::Channel))
    }

    pub async fn is_channel_ignored(&self, server_id: ServerId, channel_id: ChannelId) -> Result<bool> {
        Ok(self
            .store
            .ignored_channels(server_id)
            .await?
            .contains(&channel_id))
    }

    /// A channel outside any category is never ignored; the store is not
    /// consulted.
    pub async fn is_category_ignored(
        &self,
        server_id: ServerId,
        category_id: Option<CategoryId>,
    ) -> Result<bool> {
        let Some(category_id) = category_id else {
            return Ok(false);
        };
        Ok(self
            .store
            .ignored_categories(server_id)
            .await?
            .contains(&category_id))
    }

    /// Like [`resolve`](Self::resolve), but an event raised in an ignored
    /// channel or category is suppressed first.
    pub async fn resolve_for_scope(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        category_id: Option<CategoryId>,
        event: Option<EventType>,
        user_id: Option<UserId>,
    ) -> Result<LogDestination> {
        if self.is_channel_ignored(server_id, channel_id).await?
            || self.is_category_ignored(server_id, category_id).await?
        {
            return Ok(LogDestination::Suppressed);
        }
        self.resolve(server_id, event, user_id).await
    }
}
