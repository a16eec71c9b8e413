//! [`MessageDeleter`] and [`RelayDirectory`] over the Discord REST API.
//!
//! Relay identities are channel webhooks owned by the bot user.

use std::{num::NonZeroU64, sync::Arc};

use {
    async_trait::async_trait,
    serenity::all::{
        ChannelId as DiscordChannelId, CreateAllowedMentions, CreateWebhook, ExecuteWebhook,
        GetMessages, Http, Message, MessageId as DiscordMessageId, Permissions, Timestamp,
        UserId as DiscordUserId, Webhook, WebhookId,
    },
    thevoid_channels::{
        Error as ChannelError, MessageDeleter, RelayDirectory, RelayIdentity, RelayedMessage,
        Result as ChannelResult,
    },
    thevoid_common::{ChannelId, MessageId, RelayId, UserId},
    tokio::sync::OnceCell,
    tracing::debug,
};

use crate::{markdown::escape_mentions, permissions};

const WEBHOOK_REASON: &str = "Creating webhook for void";

/// Discord refuses to bulk-delete messages older than two weeks.
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 3600;

pub struct DiscordPlatform {
    http: Arc<Http>,
    bot_user_id: OnceCell<UserId>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            bot_user_id: OnceCell::new(),
        }
    }

    /// Record the bot user once the gateway reports it.
    pub fn set_bot_user_id(&self, user_id: UserId) {
        let _ = self.bot_user_id.set(user_id);
    }

    /// Effective permissions of `user_id` in a server channel.
    pub async fn permissions_in(&self, channel_id: ChannelId, user_id: UserId) -> ChannelResult<Permissions> {
        let channel = DiscordChannelId::from(non_zero(channel_id.get(), "channel id")?)
            .to_channel(&self.http)
            .await
            .map_err(|e| map_error("fetch channel", e))?
            .guild()
            .ok_or_else(|| {
                ChannelError::invalid_input(format!("channel {channel_id} is not a server channel"))
            })?;
        let guild = self
            .http
            .get_guild(channel.guild_id)
            .await
            .map_err(|e| map_error("fetch server", e))?;
        let user = DiscordUserId::from(non_zero(user_id.get(), "user id")?);
        let member = self
            .http
            .get_member(channel.guild_id, user)
            .await
            .map_err(|e| map_error("fetch member", e))?;
        Ok(guild.user_permissions_in(&channel, &member))
    }

    /// Permissions from `required` the bot lacks in `channel_id`.
    pub async fn bot_missing_permissions(
        &self,
        channel_id: ChannelId,
        required: Permissions,
    ) -> ChannelResult<Permissions> {
        let bot = self.bot_user_id().await?;
        let granted = self.permissions_in(channel_id, bot).await?;
        Ok(permissions::missing(required, granted))
    }

    async fn bot_user_id(&self) -> ChannelResult<UserId> {
        let id = self
            .bot_user_id
            .get_or_try_init(|| async {
                let me = self
                    .http
                    .get_current_user()
                    .await
                    .map_err(|e| map_error("get current user", e))?;
                Ok::<_, ChannelError>(UserId::new(me.id.get()))
            })
            .await?;
        Ok(*id)
    }
}

#[async_trait]
impl MessageDeleter for DiscordPlatform {
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> ChannelResult<()> {
        let channel = DiscordChannelId::from(non_zero(channel_id.get(), "channel id")?);
        let message = DiscordMessageId::from(non_zero(message_id.get(), "message id")?);
        channel
            .delete_message(&self.http, message)
            .await
            .map_err(|e| map_error("delete message", e))
    }

    async fn purge(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> ChannelResult<usize> {
        let channel = DiscordChannelId::from(non_zero(channel_id.get(), "channel id")?);
        let mut query = GetMessages::new().limit(limit);
        if let Some(before) = before {
            query = query.before(DiscordMessageId::from(non_zero(before.get(), "message id")?));
        }
        let messages = channel
            .messages(&self.http, query)
            .await
            .map_err(|e| map_error("fetch messages", e))?;

        let cutoff = Timestamp::now().unix_timestamp() - BULK_DELETE_MAX_AGE_SECS;
        let (recent, old): (Vec<Message>, Vec<Message>) = messages
            .into_iter()
            .partition(|m| m.timestamp.unix_timestamp() > cutoff);

        match recent.as_slice() {
            [] => {},
            [single] => channel
                .delete_message(&self.http, single.id)
                .await
                .map_err(|e| map_error("delete message", e))?,
            _ => channel
                .delete_messages(&self.http, &recent)
                .await
                .map_err(|e| map_error("bulk delete messages", e))?,
        }
        for message in &old {
            channel
                .delete_message(&self.http, message.id)
                .await
                .map_err(|e| map_error("delete message", e))?;
        }

        debug!(%channel_id, recent = recent.len(), old = old.len(), "purged messages");
        Ok(recent.len() + old.len())
    }
}

#[async_trait]
impl RelayDirectory for DiscordPlatform {
    async fn find_relay(&self, channel_id: ChannelId) -> ChannelResult<Option<RelayIdentity>> {
        let bot = self.bot_user_id().await?;
        let channel = DiscordChannelId::from(non_zero(channel_id.get(), "channel id")?);
        let webhooks = channel
            .webhooks(&self.http)
            .await
            .map_err(|e| map_error("list webhooks", e))?;
        debug!(%channel_id, count = webhooks.len(), "listed channel webhooks");

        Ok(webhooks
            .iter()
            .find(|w| w.user.as_ref().is_some_and(|u| u.id.get() == bot.get()))
            .map(|w| relay_identity(channel_id, w)))
    }

    async fn create_relay(&self, channel_id: ChannelId, name: &str) -> ChannelResult<RelayIdentity> {
        let channel = DiscordChannelId::from(non_zero(channel_id.get(), "channel id")?);
        let webhook = channel
            .create_webhook(
                &self.http,
                CreateWebhook::new(name).audit_log_reason(WEBHOOK_REASON),
            )
            .await
            .map_err(|e| map_error("create webhook", e))?;
        Ok(relay_identity(channel_id, &webhook))
    }

    async fn send_via_relay(&self, relay: &RelayIdentity, message: &RelayedMessage) -> ChannelResult<()> {
        let id = WebhookId::from(non_zero(relay.id.get(), "relay id")?);
        let webhook = Webhook::from_id(&self.http, id)
            .await
            .map_err(|e| map_error("fetch webhook", e))?;

        let mut builder = ExecuteWebhook::new()
            .content(escape_mentions(&message.content))
            .username(&message.display_name)
            .allowed_mentions(CreateAllowedMentions::new());
        if let Some(avatar) = &message.avatar_url {
            builder = builder.avatar_url(avatar);
        }

        webhook
            .execute(&self.http, false, builder)
            .await
            .map_err(|e| map_error("execute webhook", e))?;
        Ok(())
    }
}

fn relay_identity(channel_id: ChannelId, webhook: &Webhook) -> RelayIdentity {
    RelayIdentity {
        id: RelayId::new(webhook.id.get()),
        channel_id,
        name: webhook.name.clone().unwrap_or_default(),
    }
}

/// Discord ids are never zero; serenity panics on one.
fn non_zero(id: u64, what: &str) -> ChannelResult<NonZeroU64> {
    NonZeroU64::new(id).ok_or_else(|| ChannelError::invalid_input(format!("{what} must not be 0")))
}

/// Map HTTP 404/403 to the typed channel errors.
pub(crate) fn map_error(context: &str, err: serenity::Error) -> ChannelError {
    match status_code(&err) {
        Some(404) => ChannelError::not_found(format!("{context}: {err}")),
        Some(403) => ChannelError::permission_denied(format!("{context}: {err}")),
        _ => ChannelError::external(context, err),
    }
}

fn status_code(err: &serenity::Error) -> Option<u16> {
    match err {
        serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()),
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ids_are_rejected() {
        assert!(matches!(
            non_zero(0, "channel id"),
            Err(ChannelError::InvalidInput { .. })
        ));
        assert_eq!(non_zero(5, "channel id").unwrap().get(), 5);
    }

    #[test]
    fn non_http_errors_are_external() {
        let err = map_error("delete message", serenity::Error::Other("boom"));
        assert!(matches!(err, ChannelError::External { .. }));
    }
}
