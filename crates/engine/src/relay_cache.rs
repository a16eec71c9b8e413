//! Process-wide cache of the bot's relay identity per channel.
//!
//! Entries are derived from the platform and never persisted. They live until
//! the process exits; a stale entry only costs a missed self-message
//! exemption.

use std::sync::Arc;

use {
    dashmap::DashMap,
    thevoid_channels::{RelayDirectory, RelayIdentity},
    thevoid_common::ChannelId,
    tokio::sync::OnceCell,
    tracing::{debug, warn},
};

use crate::Result;

/// Caches one relay identity per channel and de-duplicates creation.
///
/// Each channel maps to a shared `OnceCell`. Concurrent
/// [`RelayCache::get_or_create`] calls for the same channel wait on the same
/// cell, so at most one lookup/creation runs per channel. A failed creation
/// leaves the cell empty and the error goes back to the caller.
pub struct RelayCache {
    directory: Arc<dyn RelayDirectory>,
    relay_name: String,
    entries: DashMap<ChannelId, Arc<OnceCell<RelayIdentity>>>,
}

impl RelayCache {
    pub fn new(directory: Arc<dyn RelayDirectory>, relay_name: impl Into<String>) -> Self {
        Self {
            directory,
            relay_name: relay_name.into(),
            entries: DashMap::new(),
        }
    }

    /// Return the cached identity without touching the network.
    pub fn get(&self, channel_id: ChannelId) -> Option<RelayIdentity> {
        self.entries
            .get(&channel_id)
            .and_then(|cell| cell.get().cloned())
    }

    /// Return the cached identity, or find/create one on the platform.
    pub async fn get_or_create(&self, channel_id: ChannelId) -> Result<RelayIdentity> {
        // Clone the cell out so no map shard lock is held across the await.
        let cell = Arc::clone(self.entries.entry(channel_id).or_default().value());
        let relay = cell
            .get_or_try_init(|| self.find_or_create(channel_id))
            .await?;
        Ok(relay.clone())
    }

    pub fn directory(&self) -> &Arc<dyn RelayDirectory> {
        &self.directory
    }

    /// Number of channels with a resolved relay identity.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn find_or_create(&self, channel_id: ChannelId) -> Result<RelayIdentity> {
        if let Some(existing) = self.directory.find_relay(channel_id).await? {
            debug!(%channel_id, relay_id = %existing.id, "found existing relay identity");
            return Ok(existing);
        }

        warn!(%channel_id, name = %self.relay_name, "no relay identity in channel, creating one");
        let created = self
            .directory
            .create_relay(channel_id, &self.relay_name)
            .await?;
        Ok(created)
    }
}
