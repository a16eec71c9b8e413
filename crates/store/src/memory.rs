//! In-memory store for testing.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    thevoid_common::{CategoryId, ChannelId, ServerId, UserId},
};

use crate::{
    Error, Result,
    store::{LogConfigStore, VoidChannelStore},
    types::{EventLogConfig, EventType, UserOverride, VoidChannel, validate_delay},
};

#[derive(Default)]
struct ServerLogState {
    user_overrides: Vec<UserOverride>,
    ignored_channels: HashSet<ChannelId>,
    ignored_categories: HashSet<CategoryId>,
    event_configs: HashMap<EventType, EventLogConfig>,
    default_log_channel: Option<ChannelId>,
}

/// In-memory store without persistence, used in tests.
#[derive(Default)]
pub struct InMemoryStore {
    /// Kept as a `Vec` so listing preserves insertion order.
    channels: Mutex<Vec<VoidChannel>>,
    logs: Mutex<HashMap<ServerId, ServerLogState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_channel(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        apply: impl FnOnce(&mut VoidChannel),
    ) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(row) = channels
            .iter_mut()
            .find(|c| c.server_id == server_id && c.channel_id == channel_id)
        {
            apply(row);
        }
    }

    fn with_logs<T>(&self, server_id: ServerId, f: impl FnOnce(&mut ServerLogState) -> T) -> T {
        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        f(logs.entry(server_id).or_default())
    }
}

#[async_trait]
impl VoidChannelStore for InMemoryStore {
    async fn add_void_channel(&self, channel: &VoidChannel) -> Result<()> {
        validate_delay(channel.delete_after)?;
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if channels.iter().any(|c| c.channel_id == channel.channel_id) {
            return Err(Error::already_exists(channel.channel_id));
        }
        channels.push(channel.clone());
        Ok(())
    }

    async fn remove_void_channel(&self, server_id: ServerId, channel_id: ChannelId) -> Result<()> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.retain(|c| !(c.server_id == server_id && c.channel_id == channel_id));
        Ok(())
    }

    async fn get_void_channel(&self, channel_id: ChannelId) -> Result<Option<VoidChannel>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(channels.iter().find(|c| c.channel_id == channel_id).cloned())
    }

    async fn list_void_channels(&self, server_id: ServerId) -> Result<Vec<VoidChannel>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(channels
            .iter()
            .filter(|c| c.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn list_all_void_channels(&self) -> Result<Vec<VoidChannel>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(channels.clone())
    }

    async fn set_enabled(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        enabled: bool,
    ) -> Result<()> {
        self.update_channel(server_id, channel_id, |row| row.enabled = enabled);
        Ok(())
    }

    async fn set_delete_after(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        seconds: f64,
    ) -> Result<()> {
        let seconds = validate_delay(seconds)?;
        self.update_channel(server_id, channel_id, |row| row.delete_after = seconds);
        Ok(())
    }
}

#[async_trait]
impl LogConfigStore for InMemoryStore {
    async fn user_overrides(&self, server_id: ServerId) -> Result<Vec<UserOverride>> {
        Ok(self.with_logs(server_id, |s| s.user_overrides.clone()))
    }

    async fn ignored_channels(&self, server_id: ServerId) -> Result<HashSet<ChannelId>> {
        Ok(self.with_logs(server_id, |s| s.ignored_channels.clone()))
    }

    async fn ignored_categories(&self, server_id: ServerId) -> Result<HashSet<CategoryId>> {
        Ok(self.with_logs(server_id, |s| s.ignored_categories.clone()))
    }

    async fn event_log_configs(
        &self,
        server_id: ServerId,
    ) -> Result<HashMap<EventType, EventLogConfig>> {
        Ok(self.with_logs(server_id, |s| s.event_configs.clone()))
    }

    async fn default_log_channel(&self, server_id: ServerId) -> Result<Option<ChannelId>> {
        Ok(self.with_logs(server_id, |s| s.default_log_channel))
    }

    async fn set_user_override(&self, user_override: &UserOverride) -> Result<()> {
        self.with_logs(user_override.server_id, |s| {
            s.user_overrides
                .retain(|o| o.user_id != user_override.user_id);
            s.user_overrides.push(user_override.clone());
        });
        Ok(())
    }

    async fn remove_user_override(&self, server_id: ServerId, user_id: UserId) -> Result<()> {
        self.with_logs(server_id, |s| s.user_overrides.retain(|o| o.user_id != user_id));
        Ok(())
    }

    async fn set_channel_ignored(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        ignored: bool,
    ) -> Result<()> {
        self.with_logs(server_id, |s| {
            if ignored {
                s.ignored_channels.insert(channel_id);
            } else {
                s.ignored_channels.remove(&channel_id);
            }
        });
        Ok(())
    }

    async fn set_category_ignored(
        &self,
        server_id: ServerId,
        category_id: CategoryId,
        ignored: bool,
    ) -> Result<()> {
        self.with_logs(server_id, |s| {
            if ignored {
                s.ignored_categories.insert(category_id);
            } else {
                s.ignored_categories.remove(&category_id);
            }
        });
        Ok(())
    }

    async fn set_event_log_config(
        &self,
        server_id: ServerId,
        event: EventType,
        config: EventLogConfig,
    ) -> Result<()> {
        self.with_logs(server_id, |s| {
            s.event_configs.insert(event, config);
        });
        Ok(())
    }

    async fn set_default_log_channel(
        &self,
        server_id: ServerId,
        channel_id: Option<ChannelId>,
    ) -> Result<()> {
        self.with_logs(server_id, |s| s.default_log_channel = channel_id);
        Ok(())
    }
}
