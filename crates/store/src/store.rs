//! Persistence traits for void channels and log routing.

use std::collections::{HashMap, HashSet};

use {
    async_trait::async_trait,
    thevoid_common::{CategoryId, ChannelId, ServerId, UserId},
};

use crate::{
    Result,
    types::{EventLogConfig, EventType, UserOverride, VoidChannel},
};

/// Storage for void channel rows.
///
/// Every read reflects the latest committed write. Partial updates on a
/// missing row are no-ops; callers that must report "not configured" check
/// with [`VoidChannelStore::get_void_channel`] first.
#[async_trait]
pub trait VoidChannelStore: Send + Sync {
    /// Insert a new row. Fails with `AlreadyExists` if the channel has one.
    async fn add_void_channel(&self, channel: &VoidChannel) -> Result<()>;

    /// Delete the row. Removing a missing row succeeds.
    async fn remove_void_channel(&self, server_id: ServerId, channel_id: ChannelId) -> Result<()>;

    async fn get_void_channel(&self, channel_id: ChannelId) -> Result<Option<VoidChannel>>;

    /// All rows for a server, in insertion order.
    async fn list_void_channels(&self, server_id: ServerId) -> Result<Vec<VoidChannel>>;

    async fn list_all_void_channels(&self) -> Result<Vec<VoidChannel>>;

    async fn set_enabled(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        enabled: bool,
    ) -> Result<()>;

    async fn set_delete_after(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        seconds: f64,
    ) -> Result<()>;
}

/// Storage for per-server log routing: user overrides, ignored scopes,
/// per-event configuration and the default log channel.
#[async_trait]
pub trait LogConfigStore: Send + Sync {
    async fn user_overrides(&self, server_id: ServerId) -> Result<Vec<UserOverride>>;
    async fn ignored_channels(&self, server_id: ServerId) -> Result<HashSet<ChannelId>>;
    async fn ignored_categories(&self, server_id: ServerId) -> Result<HashSet<CategoryId>>;
    async fn event_log_configs(
        &self,
        server_id: ServerId,
    ) -> Result<HashMap<EventType, EventLogConfig>>;
    async fn default_log_channel(&self, server_id: ServerId) -> Result<Option<ChannelId>>;

    /// Insert or replace the override for `user_override.user_id`.
    async fn set_user_override(&self, user_override: &UserOverride) -> Result<()>;
    async fn remove_user_override(&self, server_id: ServerId, user_id: UserId) -> Result<()>;
    async fn set_channel_ignored(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        ignored: bool,
    ) -> Result<()>;
    async fn set_category_ignored(
        &self,
        server_id: ServerId,
        category_id: CategoryId,
        ignored: bool,
    ) -> Result<()>;
    async fn set_event_log_config(
        &self,
        server_id: ServerId,
        event: EventType,
        config: EventLogConfig,
    ) -> Result<()>;
    /// `None` clears the default log channel.
    async fn set_default_log_channel(
        &self,
        server_id: ServerId,
        channel_id: Option<ChannelId>,
    ) -> Result<()>;
}
