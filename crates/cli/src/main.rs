mod channel_commands;
mod config_commands;
mod db_commands;
mod logging_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    thevoid_config::{Severity, VoidBotConfig},
    thevoid_discord::BotSettings,
    thevoid_engine::VoidSettings,
    thevoid_store::SqliteStore,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "thevoid", about = "thevoid: Discord bot that empties void channels", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "THEVOID_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and start voiding (default when no subcommand is provided).
    Run,
    /// Database management.
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
    /// Void channel management.
    Channels {
        #[command(subcommand)]
        action: channel_commands::ChannelAction,
    },
    /// Log routing overrides.
    Logging {
        #[command(subcommand)]
        action: logging_commands::LoggingAction,
    },
    /// Configuration checks.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config file, then apply environment overrides.
///
/// An explicit `--config` path must load; a discovered file that fails to
/// load falls back to defaults with a warning.
pub(crate) fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<VoidBotConfig> {
    let mut config = match path {
        Some(path) => thevoid_config::load_config(path)?,
        None => thevoid_config::discover_and_load(),
    };
    thevoid_config::apply_env_overrides(&mut config);
    Ok(config)
}

pub(crate) async fn open_store(config: &VoidBotConfig) -> anyhow::Result<Arc<SqliteStore>> {
    let store = SqliteStore::new(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", config.database.url))?;
    Ok(Arc::new(store))
}

pub(crate) fn bot_settings(config: &VoidBotConfig) -> BotSettings {
    BotSettings {
        token: config.discord.token().unwrap_or_default().to_string(),
        relay_name: config.discord.relay_name.clone(),
        error_log_channel: config.discord.error_log_channel,
        command_prefix: config.discord.command_prefix.clone(),
        void: VoidSettings {
            default_delete_after: config.void.default_delete_after,
            exempt_markers: config.void.exempt_embed_titles.clone(),
            report_channel: config.discord.error_log_channel,
        },
    }
}

async fn run(config: VoidBotConfig) -> anyhow::Result<()> {
    let diagnostics = thevoid_config::validate_config(&config, true);
    for d in &diagnostics {
        warn!(path = %d.path, "{}", d.message);
    }
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        anyhow::bail!("invalid configuration; run `thevoid config check` for details");
    }

    let store = open_store(&config).await?;
    thevoid_discord::run(bot_settings(&config), store).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "thevoid starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        None | Some(Commands::Run) => run(load_config(config_path)?).await,
        Some(Commands::Db { action }) => {
            db_commands::handle_db(action, &load_config(config_path)?).await
        },
        Some(Commands::Channels { action }) => {
            channel_commands::handle_channels(action, &load_config(config_path)?).await
        },
        Some(Commands::Logging { action }) => {
            logging_commands::handle_logging(action, &load_config(config_path)?).await
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action, config_path),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory, rstest::rstest};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["thevoid"])]
    #[case(&["thevoid", "run", "--json-logs"])]
    #[case(&["thevoid", "db", "migrate"])]
    #[case(&["thevoid", "channels", "list"])]
    #[case(&["thevoid", "channels", "add", "1", "2", "--delete-after", "0"])]
    #[case(&["thevoid", "channels", "time", "1", "2", "30.5"])]
    #[case(&["thevoid", "channels", "add", "1", "2", "--skip-permission-check"])]
    #[case(&["thevoid", "channels", "purge", "2", "100", "--yes"])]
    #[case(&["thevoid", "logging", "resolve", "1", "--event", "message_delete", "--user", "3"])]
    #[case(&["thevoid", "logging", "event", "1", "member_join", "--disable"])]
    #[case(&["thevoid", "logging", "resolve", "1", "--channel", "4", "--category", "5"])]
    #[case(&["thevoid", "logging", "ignore-channel", "1", "4", "--undo"])]
    #[case(&["thevoid", "logging", "redirect-user", "1", "3", "4"])]
    #[case(&["thevoid", "db", "clear"])]
    #[case(&["thevoid", "config", "check", "--verbose"])]
    #[case(&["thevoid", "config", "check", "--for-run"])]
    fn parses(#[case] args: &[&str]) {
        Cli::try_parse_from(args).unwrap();
    }

    #[rstest]
    #[case(&["thevoid", "channels", "add", "one", "2"])]
    #[case(&["thevoid", "logging", "event", "1", "message_explode"])]
    #[case(&["thevoid", "channels", "time", "1", "2"])]
    #[case(&["thevoid", "channels", "purge", "2", "0"])]
    #[case(&["thevoid", "channels", "purge", "2", "101"])]
    #[case(&["thevoid", "logging", "resolve", "1", "--category", "5"])]
    #[case(&["thevoid", "logging", "event", "1", "member_join", "--enable", "--disable"])]
    fn rejects(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn explicit_config_must_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("thevoid.toml");
        std::fs::write(&path, "[void]\ndefault_delete_after = 1.5\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.void.default_delete_after, 1.5);
        let settings = bot_settings(&config);
        assert_eq!(settings.void.default_delete_after, 1.5);
        assert_eq!(settings.command_prefix, "v;");
    }
}
