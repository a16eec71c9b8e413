use std::{
    io::{BufRead, Write},
    sync::Arc,
};

use {
    anyhow::Result,
    clap::Subcommand,
    thevoid_common::{ChannelId, ServerId},
    thevoid_config::VoidBotConfig,
    thevoid_discord::permissions,
    thevoid_engine::{Error, VoidService},
    thevoid_store::VoidChannel,
};

#[derive(Subcommand)]
pub enum ChannelAction {
    /// List void channels, for one server or all of them.
    List {
        #[arg(long)]
        server: Option<ServerId>,
    },
    /// Make a channel a void channel.
    Add {
        server: ServerId,
        channel: ChannelId,
        /// Seconds before messages are deleted (defaults to `void.default_delete_after`).
        #[arg(long, allow_negative_numbers = true)]
        delete_after: Option<f64>,
        /// Add the channel without asking Discord whether the bot can delete there.
        #[arg(long)]
        skip_permission_check: bool,
    },
    /// Stop voiding a channel and forget its settings.
    Remove { server: ServerId, channel: ChannelId },
    /// Resume deleting messages in a configured channel.
    Enable { server: ServerId, channel: ChannelId },
    /// Pause deleting messages without forgetting the channel.
    Disable { server: ServerId, channel: ChannelId },
    /// Change how long messages live in a void channel.
    Time {
        server: ServerId,
        channel: ChannelId,
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
    /// Delete the newest messages in a channel, void channel or not.
    Purge {
        channel: ChannelId,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=100))]
        count: u8,
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

pub async fn handle_channels(action: ChannelAction, config: &VoidBotConfig) -> Result<()> {
    let store = crate::open_store(config).await?;
    let bot = thevoid_discord::build(&crate::bot_settings(config), store);
    let service: Arc<VoidService> = bot.service;

    match action {
        ChannelAction::List { server } => {
            let channels = match server {
                Some(server) => service.list_channels(server).await?,
                None => service.list_all_channels().await?,
            };
            if channels.is_empty() {
                println!("No void channels configured.");
            }
            for channel in &channels {
                println!("{}", describe(channel));
            }
        },
        ChannelAction::Add {
            server,
            channel,
            delete_after,
            skip_permission_check,
        } => {
            if !skip_permission_check {
                let missing = bot
                    .platform
                    .bot_missing_permissions(channel, permissions::VOID_CHANNEL)
                    .await?;
                if !missing.is_empty() {
                    anyhow::bail!(permissions::describe_missing(channel, missing));
                }
            }
            match service.add_channel(server, channel, delete_after).await {
                Ok(added) => println!("Added {}", describe(&added)),
                Err(Error::AlreadyExists { .. }) => {
                    println!("Channel {channel} is already a void channel.");
                },
                Err(e) => return Err(e.into()),
            }
        },
        ChannelAction::Remove { server, channel } => {
            service.remove_channel(server, channel).await?;
            println!("Channel {channel} is no longer a void channel.");
        },
        ChannelAction::Enable { server, channel } => {
            report(service.enable_channel(server, channel).await, channel)?;
        },
        ChannelAction::Disable { server, channel } => {
            report(service.disable_channel(server, channel).await, channel)?;
        },
        ChannelAction::Time {
            server,
            channel,
            seconds,
        } => report(service.set_delete_after(server, channel, seconds).await, channel)?,
        ChannelAction::Purge {
            channel,
            count,
            yes,
        } => {
            let question = format!("Delete the newest {count} message(s) in channel {channel}?");
            if !yes && !confirm(&question)? {
                println!("Nothing deleted.");
                return Ok(());
            }
            let deleted = service.purge(channel, None, count).await?;
            println!("Deleted {deleted} message(s) in channel {channel}.");
        },
    }
    Ok(())
}

fn report(result: thevoid_engine::Result<VoidChannel>, channel: ChannelId) -> Result<()> {
    match result {
        Ok(updated) => println!("Updated {}", describe(&updated)),
        Err(Error::NotConfigured { .. }) => {
            println!("Channel {channel} has not yet been configured as a void channel.");
        },
        Err(Error::InvalidDelay { .. }) => println!("The time entered must be positive."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub(crate) fn describe(channel: &VoidChannel) -> String {
    let when = if channel.delete_after == 0.0 {
        "immediately".to_string()
    } else {
        format!("after {} seconds", channel.delete_after)
    };
    let state = if channel.enabled {
        "enabled"
    } else {
        "disabled"
    };
    format!(
        "channel {} in server {}: {state}, deletes {when}",
        channel.channel_id, channel.server_id
    )
}
