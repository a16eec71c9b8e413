use std::sync::Arc;

use {
    anyhow::Result,
    clap::Subcommand,
    thevoid_common::{CategoryId, ChannelId, ServerId, UserId},
    thevoid_config::VoidBotConfig,
    thevoid_engine::{LogDestination, OverrideResolver},
    thevoid_store::{EventLogConfig, EventType, LogConfigStore, UserOverride},
};

#[derive(Subcommand)]
pub enum LoggingAction {
    /// Show where an event would be logged.
    Resolve {
        server: ServerId,
        #[arg(long)]
        event: Option<EventType>,
        #[arg(long)]
        user: Option<UserId>,
        /// Channel the event happened in; ignored channels suppress logging.
        #[arg(long)]
        channel: Option<ChannelId>,
        /// Category of `--channel`, if any.
        #[arg(long, requires = "channel")]
        category: Option<CategoryId>,
    },
    /// Set the server's default log channel.
    SetDefault { server: ServerId, channel: ChannelId },
    /// Remove the server's default log channel.
    ClearDefault { server: ServerId },
    /// Drop all logs about a user.
    IgnoreUser { server: ServerId, user: UserId },
    /// Send logs about a user to a specific channel.
    RedirectUser {
        server: ServerId,
        user: UserId,
        channel: ChannelId,
    },
    /// Remove a user's override.
    ClearUser { server: ServerId, user: UserId },
    /// Stop logging events that happen in a channel.
    IgnoreChannel {
        server: ServerId,
        channel: ChannelId,
        /// Log the channel again.
        #[arg(long)]
        undo: bool,
    },
    /// Stop logging events that happen in a category.
    IgnoreCategory {
        server: ServerId,
        category: CategoryId,
        #[arg(long)]
        undo: bool,
    },
    /// Configure one event type.
    Event {
        server: ServerId,
        event: EventType,
        #[arg(long, conflicts_with = "enable")]
        disable: bool,
        #[arg(long)]
        enable: bool,
        /// Log this event type to a specific channel.
        #[arg(long)]
        channel: Option<ChannelId>,
    },
}

pub async fn handle_logging(action: LoggingAction, config: &VoidBotConfig) -> Result<()> {
    let store: Arc<dyn LogConfigStore> = crate::open_store(config).await?;

    match action {
        LoggingAction::Resolve {
            server,
            event,
            user,
            channel,
            category,
        } => {
            let resolver = OverrideResolver::new(store);
            let destination = match channel {
                Some(channel) => {
                    resolver
                        .resolve_for_scope(server, channel, category, event, user)
                        .await?
                },
                None => resolver.resolve(server, event, user).await?,
            };
            match destination {
                LogDestination::Channel(channel) => println!("Log to channel {channel}"),
                LogDestination::Suppressed => println!("Suppressed"),
            }
        },
        LoggingAction::SetDefault { server, channel } => {
            store.set_default_log_channel(server, Some(channel)).await?;
            println!("Default log channel for server {server} is now {channel}.");
        },
        LoggingAction::ClearDefault { server } => {
            store.set_default_log_channel(server, None).await?;
            println!("Server {server} has no default log channel.");
        },
        LoggingAction::IgnoreUser { server, user } => {
            store.set_user_override(&user_override(server, user, None)).await?;
            println!("Logs about user {user} are now suppressed.");
        },
        LoggingAction::RedirectUser {
            server,
            user,
            channel,
        } => {
            store
                .set_user_override(&user_override(server, user, Some(channel)))
                .await?;
            println!("Logs about user {user} now go to channel {channel}.");
        },
        LoggingAction::ClearUser { server, user } => {
            store.remove_user_override(server, user).await?;
            println!("User {user} has no override.");
        },
        LoggingAction::IgnoreChannel {
            server,
            channel,
            undo,
        } => {
            store.set_channel_ignored(server, channel, !undo).await?;
            println!("Channel {channel} ignored: {}", !undo);
        },
        LoggingAction::IgnoreCategory {
            server,
            category,
            undo,
        } => {
            store.set_category_ignored(server, category, !undo).await?;
            println!("Category {category} ignored: {}", !undo);
        },
        LoggingAction::Event {
            server,
            event,
            disable,
            enable,
            channel,
        } => {
            let mut event_config = store
                .event_log_configs(server)
                .await?
                .remove(&event)
                .unwrap_or_default();
            if disable {
                event_config.enabled = false;
            } else if enable {
                event_config.enabled = true;
            }
            if channel.is_some() {
                event_config.log_channel_id = channel;
            }
            store.set_event_log_config(server, event, event_config).await?;
            println!("{event}: {}", describe_event(&event_config));
        },
    }
    Ok(())
}

fn user_override(server_id: ServerId, user_id: UserId, log_channel_id: Option<ChannelId>) -> UserOverride {
    UserOverride {
        server_id,
        user_id,
        log_channel_id,
    }
}

fn describe_event(config: &EventLogConfig) -> String {
    match (config.enabled, config.log_channel_id) {
        (false, _) => "disabled".into(),
        (true, Some(channel)) => format!("enabled, logged to channel {channel}"),
        (true, None) => "enabled, logged to the default channel".into(),
    }
}
