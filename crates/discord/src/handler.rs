//! Discord event handler for serenity.
//!
//! Feeds every guild message into the void, runs chat commands and records
//! the bot user on `ready`.

use std::{num::NonZeroU64, sync::Arc};

use {
    serenity::{
        all::{
            ChannelId as DiscordChannelId, Context, CreateEmbed, CreateMessage, EventHandler,
            GatewayIntents, GuildId, Message, Ready,
        },
        async_trait,
    },
    thevoid_channels::InboundMessage,
    thevoid_common::{ChannelId, MessageId, RelayId, ServerId, UserId},
    thevoid_engine::VoidService,
    tracing::{debug, info, warn},
};

use crate::{
    commands::{self, Author, Command, NOTICE_LIFETIME, Notice},
    permissions,
    platform::DiscordPlatform,
};

/// Handler for Discord gateway events.
pub struct VoidHandler {
    service: Arc<VoidService>,
    platform: Arc<DiscordPlatform>,
    command_prefix: String,
}

impl VoidHandler {
    pub fn new(
        service: Arc<VoidService>,
        platform: Arc<DiscordPlatform>,
        command_prefix: impl Into<String>,
    ) -> Self {
        Self {
            service,
            platform,
            command_prefix: command_prefix.into(),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }

    async fn run_command(
        &self,
        ctx: &Context,
        msg: &Message,
        inbound: &InboundMessage,
        command: Command,
    ) {
        let granted = match self
            .platform
            .permissions_in(inbound.channel_id, inbound.author_id)
            .await
        {
            Ok(granted) => granted,
            Err(e) => {
                warn!(channel_id = %inbound.channel_id, error = %e, "cannot check command permissions");
                return;
            },
        };
        if !permissions::missing(permissions::COMMAND_AUTHOR, granted).is_empty() {
            self.post_notice(ctx, inbound.channel_id, Notice::not_allowed(&command))
                .await;
            return;
        }

        let author = command_author(msg);
        if let Some(notice) = commands::execute(&self.service, inbound, &author, command).await {
            self.post_notice(ctx, inbound.channel_id, notice).await;
        }
    }

    /// Post `notice` as an embed and delete it after [`NOTICE_LIFETIME`].
    async fn post_notice(&self, ctx: &Context, channel_id: ChannelId, notice: Notice) {
        let Some(channel) = NonZeroU64::new(channel_id.get()) else {
            return;
        };
        let embed = CreateEmbed::new()
            .title(notice.title)
            .description(notice.description)
            .colour(0x000000);
        match DiscordChannelId::from(channel)
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await
        {
            Ok(sent) => {
                self.service
                    .delete_later(channel_id, MessageId::new(sent.id.get()), NOTICE_LIFETIME);
            },
            Err(e) => warn!(%channel_id, error = %e, "failed to post command notice"),
        }
    }
}

/// Reduce a gateway message to what the void needs.
pub fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        message_id: MessageId::new(msg.id.get()),
        channel_id: ChannelId::new(msg.channel_id.get()),
        server_id: msg.guild_id.map(|g| ServerId::new(g.get())),
        author_id: UserId::new(msg.author.id.get()),
        relay_id: msg.webhook_id.map(|w| RelayId::new(w.get())),
        content_markers: msg.embeds.iter().filter_map(|e| e.title.clone()).collect(),
    }
}

/// Server nickname first, then the account's display name.
fn command_author(msg: &Message) -> Author {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .unwrap_or_else(|| msg.author.display_name().to_string());
    Author {
        display_name,
        avatar_url: Some(msg.author.face()),
    }
}

#[async_trait]
impl EventHandler for VoidHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        let bot = UserId::new(ready.user.id.get());
        self.service.set_bot_user_id(bot);
        self.platform.set_bot_user_id(bot);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Void channels only exist in guilds.
        if msg.guild_id.is_none() {
            return;
        }
        let inbound = inbound_message(&msg);
        if self.service.handle_message(&inbound).await.is_some() {
            debug!(
                channel_id = %inbound.channel_id,
                message_id = %inbound.message_id,
                "void deletion scheduled"
            );
        }

        if msg.author.bot || msg.webhook_id.is_some() {
            return;
        }
        match commands::parse(&self.command_prefix, &msg.content) {
            None => {},
            Some(Ok(command)) => self.run_command(&ctx, &msg, &inbound, command).await,
            Some(Err(usage)) => self.post_notice(&ctx, inbound.channel_id, usage).await,
        }
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }
}
