use async_trait::async_trait;

use {
    crate::{
        Result,
        message::{RelayIdentity, RelayedMessage},
    },
    thevoid_common::{ChannelId, MessageId},
};

/// Deletes messages on the platform.
#[async_trait]
pub trait MessageDeleter: Send + Sync {
    /// Delete a message right away.
    ///
    /// Returns [`crate::Error::NotFound`] if the message is already gone and
    /// [`crate::Error::PermissionDenied`] if the bot may not delete it.
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()>;

    /// Delete up to `limit` of the newest messages in `channel_id`, only
    /// those older than `before` when given. Returns how many were deleted.
    async fn purge(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<usize>;
}

/// Looks up, creates and posts through the bot's relay identities.
#[async_trait]
pub trait RelayDirectory: Send + Sync {
    /// Find a relay identity owned by the bot in `channel_id`, if any.
    async fn find_relay(&self, channel_id: ChannelId) -> Result<Option<RelayIdentity>>;

    /// Create a new relay identity named `name` in `channel_id`.
    async fn create_relay(&self, channel_id: ChannelId, name: &str) -> Result<RelayIdentity>;

    /// Post `message` through `relay`.
    async fn send_via_relay(&self, relay: &RelayIdentity, message: &RelayedMessage) -> Result<()>;
}
