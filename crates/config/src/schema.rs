//! Config schema for the void bot.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    thevoid_common::ChannelId,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidBotConfig {
    pub discord: DiscordConfig,
    pub database: DatabaseConfig,
    pub void: VoidConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied as `${DISCORD_TOKEN}` or through
    /// `THEVOID_DISCORD_TOKEN`.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,

    /// Name given to relay webhooks the bot creates.
    pub relay_name: String,

    /// Prefix of chat commands (`v;proxy …`, `v;purge 20`). Matched
    /// case-insensitively.
    pub command_prefix: String,

    /// Channel that receives reports of failed deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_log_channel: Option<ChannelId>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("relay_name", &self.relay_name)
            .field("command_prefix", &self.command_prefix)
            .field("error_log_channel", &self.error_log_channel)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            relay_name: "void".into(),
            command_prefix: "v;".into(),
            error_log_channel: None,
        }
    }
}

impl DiscordConfig {
    /// The token, if one is configured and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://thevoid.db?mode=rwc".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidConfig {
    /// Seconds used when a channel is added without an explicit delay.
    pub default_delete_after: f64,

    /// Embed titles that mark the bot's own messages as exempt from deletion.
    pub exempt_embed_titles: Vec<String>,
}

impl Default for VoidConfig {
    fn default() -> Self {
        Self {
            default_delete_after: 5.0,
            exempt_embed_titles: vec!["`void` purge".into(), "`void` proxy".into()],
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: VoidBotConfig = toml::from_str("").unwrap();
        assert_eq!(config.discord.relay_name, "void");
        assert_eq!(config.discord.command_prefix, "v;");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.void.default_delete_after, 5.0);
        assert_eq!(config.void.exempt_embed_titles.len(), 2);
        assert!(config.discord.token().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config: VoidBotConfig = toml::from_str(
            r#"
            [discord]
            token = "super-secret"
            error_log_channel = 1234
            "#,
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(config.discord.token(), Some("super-secret"));
        assert_eq!(config.discord.error_log_channel, Some(ChannelId::new(1234)));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let config: VoidBotConfig = toml::from_str("[discord]\ntoken = \"  \"\n").unwrap();
        assert!(config.discord.token().is_none());
    }
}
