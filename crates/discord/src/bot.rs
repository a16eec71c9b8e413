use std::sync::Arc;

use {
    serenity::all::{Client, Http},
    thevoid_channels::{FailureReporter, TracingReporter},
    thevoid_common::ChannelId,
    thevoid_engine::{DeleteScheduler, RelayCache, VoidService, VoidSettings},
    thevoid_store::VoidChannelStore,
    tracing::{info, warn},
};

use crate::{
    Error, Result, handler::VoidHandler, platform::DiscordPlatform, report::ErrorChannelReporter,
};

/// Everything the gateway client needs besides the store.
#[derive(Clone)]
pub struct BotSettings {
    pub token: String,
    /// Name for webhooks created as relay identities.
    pub relay_name: String,
    /// Where deletion failures are posted; logged only when `None`.
    pub error_log_channel: Option<ChannelId>,
    /// Prefix of chat commands, matched case-insensitively.
    pub command_prefix: String,
    pub void: VoidSettings,
}

impl std::fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSettings")
            .field("token", &"[REDACTED]")
            .field("relay_name", &self.relay_name)
            .field("error_log_channel", &self.error_log_channel)
            .field("command_prefix", &self.command_prefix)
            .field("void", &self.void)
            .finish()
    }
}

/// The pieces a gateway client or a one-shot front-end needs.
pub struct VoidBot {
    pub platform: Arc<DiscordPlatform>,
    pub service: Arc<VoidService>,
}

/// Wire the void service to Discord without opening a gateway connection.
///
/// No request is made until a platform call needs one.
pub fn build(settings: &BotSettings, store: Arc<dyn VoidChannelStore>) -> VoidBot {
    let http = Arc::new(Http::new(&settings.token));
    let platform = Arc::new(DiscordPlatform::new(Arc::clone(&http)));
    let reporter: Arc<dyn FailureReporter> = match settings.error_log_channel {
        Some(channel) => {
            info!(log_channel = %channel, "reporting deletion failures to channel");
            Arc::new(ErrorChannelReporter::new(Arc::clone(&http), channel))
        },
        None => Arc::new(TracingReporter),
    };

    let void = VoidSettings {
        report_channel: settings.error_log_channel,
        ..settings.void.clone()
    };
    let service = Arc::new(VoidService::new(
        store,
        Arc::new(RelayCache::new(platform.clone(), settings.relay_name.clone())),
        DeleteScheduler::new(platform.clone(), reporter),
        void,
    ));

    VoidBot {
        platform,
        service,
    }
}

/// Connect to the gateway and run until the connection ends or Ctrl-C.
pub async fn run(settings: BotSettings, store: Arc<dyn VoidChannelStore>) -> Result<()> {
    if settings.token.trim().is_empty() {
        return Err(Error::message("discord token is empty"));
    }

    let VoidBot { platform, service } = build(&settings, store);

    let mut client = Client::builder(&settings.token, VoidHandler::intents())
        .event_handler(VoidHandler::new(
            service,
            platform,
            settings.command_prefix.clone(),
        ))
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down discord client");
            shard_manager.shutdown_all().await;
        }
    });

    info!("starting discord client");
    if let Err(e) = client.start().await {
        warn!(error = %e, "discord client stopped with error");
        return Err(e.into());
    }
    Ok(())
}
