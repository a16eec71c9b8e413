//! Discord adapter: serenity gateway handler, webhooks as relay identities,
//! message deletion and error-log reporting.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handler;
pub mod markdown;
pub mod permissions;
pub mod platform;
pub mod report;

pub use {
    bot::{BotSettings, VoidBot, build, run},
    error::{Error, Result},
    handler::VoidHandler,
    platform::DiscordPlatform,
    report::ErrorChannelReporter,
};
