//! Chat commands: `proxy` and `purge`.
//!
//! Parsing and execution are kept apart from serenity so the whole command
//! path runs against any [`VoidService`].

use std::time::Duration;

use {
    thevoid_channels::{InboundMessage, RelayedMessage},
    thevoid_engine::{Error as EngineError, VoidService},
    tracing::warn,
};

/// Embed title of every notice the `proxy` command posts.
pub const PROXY_TITLE: &str = "`void` proxy";
/// Embed title of every notice the `purge` command posts.
pub const PURGE_TITLE: &str = "`void` purge";

/// How long a command notice stays before the bot deletes it.
pub const NOTICE_LIFETIME: Duration = Duration::from_secs(20);

const PURGE_MAX: u8 = 100;
const FOOTER: &str = "\n\nThis message will be sucked into the void in 20 seconds.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Repost the text through the channel's relay identity.
    Proxy(String),
    /// Delete this many messages before the command.
    Purge(u8),
}

/// A short-lived embed the bot posts in reply to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub description: String,
}

impl Notice {
    fn new(title: &'static str, description: impl Into<String>) -> Self {
        Self {
            title,
            description: format!("{}{FOOTER}", description.into()),
        }
    }

    pub fn not_allowed(command: &Command) -> Self {
        let (title, name) = match command {
            Command::Proxy(_) => (PROXY_TITLE, "proxy"),
            Command::Purge(_) => (PURGE_TITLE, "purge"),
        };
        Self::new(
            title,
            format!("\u{26a0} The {name} command requires the **Manage Messages** permission."),
        )
    }
}

/// Who asked for a proxied message.
#[derive(Debug, Clone)]
pub struct Author {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Parse `content` as a command for `prefix`.
///
/// `None` when the message is not addressed to the bot or names an unknown
/// command. A malformed known command yields its usage notice.
pub fn parse(prefix: &str, content: &str) -> Option<Result<Command, Notice>> {
    let head = content.get(..prefix.len())?;
    if prefix.is_empty() || !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = content[prefix.len()..].trim_start();
    let (name, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, args)| (name, args.trim()));

    match name.to_ascii_lowercase().as_str() {
        "proxy" | "p" => Some(if args.is_empty() {
            Err(Notice::new(PROXY_TITLE, format!("Usage: `{prefix}proxy <message>`")))
        } else {
            Ok(Command::Proxy(args.to_string()))
        }),
        "purge" => Some(match args.parse::<u8>() {
            Ok(n @ 1..=PURGE_MAX) => Ok(Command::Purge(n)),
            _ => Err(Notice::new(
                PURGE_TITLE,
                format!("Usage: `{prefix}purge <1-{PURGE_MAX}>`"),
            )),
        }),
        _ => None,
    }
}

/// Run `command` sent as `message`. Returns the notice to post, if any.
pub async fn execute(
    service: &VoidService,
    message: &InboundMessage,
    author: &Author,
    command: Command,
) -> Option<Notice> {
    match command {
        Command::Proxy(content) => {
            let relayed = RelayedMessage {
                display_name: author.display_name.clone(),
                avatar_url: author.avatar_url.clone(),
                content,
            };
            match service.proxy(message.channel_id, &relayed).await {
                Ok(()) => None,
                Err(EngineError::PermissionDenied { .. }) => Some(Notice::new(
                    PROXY_TITLE,
                    "\u{26a0} The proxy command requires that `void` has the **Manage Webhooks** permission.",
                )),
                Err(e) => {
                    warn!(channel_id = %message.channel_id, error = %e, "proxy failed");
                    None
                },
            }
        },
        Command::Purge(limit) => {
            match service
                .purge(message.channel_id, Some(message.message_id), limit)
                .await
            {
                Ok(deleted) => Some(Notice::new(PURGE_TITLE, format!("Deleted {deleted} message(s)."))),
                Err(EngineError::PermissionDenied { .. }) => Some(Notice::new(
                    PURGE_TITLE,
                    "\u{26a0} Could not purge messages! The purge command requires that `void` has \
                     the **Manage Messages** and the **Read Message History** permissions.",
                )),
                Err(e) => {
                    warn!(channel_id = %message.channel_id, error = %e, "purge failed");
                    None
                },
            }
        },
    }
}
