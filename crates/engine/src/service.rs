//! Front door of the void: the ingest path and the mutation contract.

use std::{sync::Arc, time::Duration};

use {
    thevoid_channels::{InboundMessage, RelayedMessage},
    thevoid_common::{ChannelId, MessageId, ServerId, UserId},
    thevoid_store::{VoidChannel, VoidChannelStore, validate_delay},
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    classifier::{Classifier, ConfigSnapshot, Decision},
    relay_cache::RelayCache,
    scheduler::{DeleteOutcome, DeleteScheduler},
};

#[derive(Debug, Clone)]
pub struct VoidSettings {
    /// Delay used by [`VoidService::add_channel`] when none is given.
    pub default_delete_after: f64,
    /// Embed titles marking the bot's own UI messages.
    pub exempt_markers: Vec<String>,
    /// Channel that receives failure reports. The bot's own messages there
    /// are never deleted.
    pub report_channel: Option<ChannelId>,
}

impl Default for VoidSettings {
    fn default() -> Self {
        Self {
            default_delete_after: 5.0,
            exempt_markers: vec!["`void` purge".into(), "`void` proxy".into()],
            report_channel: None,
        }
    }
}

pub struct VoidService {
    store: Arc<dyn VoidChannelStore>,
    relays: Arc<RelayCache>,
    classifier: Classifier,
    scheduler: DeleteScheduler,
    default_delete_after: f64,
}

impl VoidService {
    pub fn new(
        store: Arc<dyn VoidChannelStore>,
        relays: Arc<RelayCache>,
        scheduler: DeleteScheduler,
        settings: VoidSettings,
    ) -> Self {
        Self {
            store,
            relays,
            classifier: Classifier::new(settings.exempt_markers)
                .with_report_channel(settings.report_channel),
            scheduler,
            default_delete_after: settings.default_delete_after,
        }
    }

    pub fn set_bot_user_id(&self, user_id: UserId) {
        self.classifier.set_bot_user_id(user_id);
    }

    pub fn relays(&self) -> &RelayCache {
        &self.relays
    }

    /// Decide what to do with `message`.
    ///
    /// Never touches the network. Fails only when the store cannot answer.
    pub async fn classify(&self, message: &InboundMessage) -> Result<Decision> {
        if self.classifier.is_own_artifact(message) {
            return Ok(Decision::Ignore);
        }
        let channel = self.store.get_void_channel(message.channel_id).await?;
        let cached_relay = self.relays.get(message.channel_id);
        Ok(self.classifier.classify(message, ConfigSnapshot {
            channel: channel.as_ref(),
            cached_relay: cached_relay.as_ref(),
        }))
    }

    /// Classify `message` and schedule its deletion when it belongs to an
    /// enabled void channel.
    ///
    /// Returns the deletion task, if one was scheduled. A store failure
    /// skips the message rather than guessing.
    pub async fn handle_message(&self, message: &InboundMessage) -> Option<JoinHandle<DeleteOutcome>> {
        match self.classify(message).await {
            Ok(Decision::Ignore) => None,
            Ok(Decision::DeleteAfter(delay)) => Some(self.scheduler.schedule(
                message.channel_id,
                message.message_id,
                delay,
            )),
            Err(e) => {
                warn!(
                    channel_id = %message.channel_id,
                    message_id = %message.message_id,
                    error = %e,
                    "cannot classify message, skipping"
                );
                None
            },
        }
    }

    /// Delete one of the bot's own notices after `delay`, void channel or not.
    pub fn delete_later(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        delay: Duration,
    ) -> JoinHandle<DeleteOutcome> {
        self.scheduler.schedule(channel_id, message_id, delay)
    }

    /// Delete up to `limit` recent messages in `channel_id`, only those older
    /// than `before` when given. Returns how many were deleted.
    pub async fn purge(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<usize> {
        if limit == 0 {
            return Err(Error::InvalidInput {
                message: "purge needs at least one message".into(),
            });
        }
        let deleted = self
            .scheduler
            .deleter()
            .purge(channel_id, before, limit)
            .await?;
        info!(%channel_id, deleted, "purged channel");
        Ok(deleted)
    }

    /// Register `channel_id` as a void channel, enabled.
    pub async fn add_channel(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        delete_after: Option<f64>,
    ) -> Result<VoidChannel> {
        let delete_after = validate_delay(delete_after.unwrap_or(self.default_delete_after))?;
        let channel = VoidChannel::new(server_id, channel_id, delete_after);
        self.store.add_void_channel(&channel).await?;
        info!(%server_id, %channel_id, delete_after, "void channel added");
        Ok(channel)
    }

    /// Removing a channel that is not configured succeeds.
    pub async fn remove_channel(&self, server_id: ServerId, channel_id: ChannelId) -> Result<()> {
        self.store.remove_void_channel(server_id, channel_id).await?;
        info!(%server_id, %channel_id, "void channel removed");
        Ok(())
    }

    pub async fn enable_channel(&self, server_id: ServerId, channel_id: ChannelId) -> Result<VoidChannel> {
        self.set_enabled(server_id, channel_id, true).await
    }

    pub async fn disable_channel(&self, server_id: ServerId, channel_id: ChannelId) -> Result<VoidChannel> {
        self.set_enabled(server_id, channel_id, false).await
    }

    pub async fn set_delete_after(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        seconds: f64,
    ) -> Result<VoidChannel> {
        let mut channel = self.configured(server_id, channel_id).await?;
        let seconds = validate_delay(seconds)?;
        self.store
            .set_delete_after(server_id, channel_id, seconds)
            .await?;
        info!(%server_id, %channel_id, delete_after = seconds, "void delay updated");
        channel.delete_after = seconds;
        Ok(channel)
    }

    pub async fn list_channels(&self, server_id: ServerId) -> Result<Vec<VoidChannel>> {
        Ok(self.store.list_void_channels(server_id).await?)
    }

    pub async fn list_all_channels(&self) -> Result<Vec<VoidChannel>> {
        Ok(self.store.list_all_void_channels().await?)
    }

    /// Post `message` in `channel_id` through the bot's relay identity,
    /// creating the relay if the channel has none yet.
    pub async fn proxy(&self, channel_id: ChannelId, message: &RelayedMessage) -> Result<()> {
        if message.content.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "nothing to proxy".into(),
            });
        }
        let relay = self.relays.get_or_create(channel_id).await?;
        self.relays
            .directory()
            .send_via_relay(&relay, message)
            .await?;
        debug!(%channel_id, relay_id = %relay.id, "proxied message");
        Ok(())
    }

    async fn set_enabled(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        enabled: bool,
    ) -> Result<VoidChannel> {
        let mut channel = self.configured(server_id, channel_id).await?;
        self.store
            .set_enabled(server_id, channel_id, enabled)
            .await?;
        info!(%server_id, %channel_id, enabled, "void channel toggled");
        channel.enabled = enabled;
        Ok(channel)
    }

    /// The row for `channel_id`, which must belong to `server_id`.
    async fn configured(&self, server_id: ServerId, channel_id: ChannelId) -> Result<VoidChannel> {
        self.store
            .get_void_channel(channel_id)
            .await?
            .filter(|c| c.server_id == server_id)
            .ok_or_else(|| Error::not_configured(channel_id))
    }
}
