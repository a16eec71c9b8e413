use thevoid_common::{ChannelId, MessageId, RelayId, ServerId, UserId};

/// A message received from the platform, reduced to what the void needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    /// `None` for direct messages.
    pub server_id: Option<ServerId>,
    pub author_id: UserId,
    /// Set when the message was posted through a relay identity.
    pub relay_id: Option<RelayId>,
    /// Titles of the rich-content blocks attached to the message, in order.
    /// Untitled blocks are skipped.
    pub content_markers: Vec<String>,
}

/// The bot's own relay identity in one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayIdentity {
    pub id: RelayId,
    pub channel_id: ChannelId,
    pub name: String,
}

/// Content posted through a relay on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedMessage {
    /// Name shown as the author of the relayed message.
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub content: String,
}
