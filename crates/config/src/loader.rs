use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{Error, Result, env_subst::substitute_env, schema::VoidBotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "thevoid.toml",
    "thevoid.yaml",
    "thevoid.yml",
    "thevoid.json",
];

const ENV_TOKEN: &str = "THEVOID_DISCORD_TOKEN";
const ENV_DATABASE_URL: &str = "THEVOID_DATABASE_URL";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<VoidBotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./thevoid.{toml,yaml,yml,json}`
/// 2. `<user config dir>/thevoid/thevoid.{toml,yaml,yml,json}`
///
/// Returns defaults if no file is found or the file cannot be loaded.
pub fn discover_and_load() -> VoidBotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    VoidBotConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    find_in(Path::new("."), config_dir().as_deref())
}

fn find_in(local: &Path, global: Option<&Path>) -> Option<PathBuf> {
    std::iter::once(local)
        .chain(global)
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.exists())
}

/// Returns the user-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "thevoid").map(|d| d.config_dir().to_path_buf())
}

/// Apply `THEVOID_*` environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut VoidBotConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut VoidBotConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
        debug!(var = ENV_TOKEN, "token overridden from environment");
        config.discord.token = Some(Secret::new(token));
    }
    if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()) {
        debug!(var = ENV_DATABASE_URL, "database url overridden from environment");
        config.database.url = url;
    }
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<VoidBotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

/// Parse raw text into a format-neutral JSON value.
pub(crate) fn parse_config_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw).map_err(|e| Error::parse(path, e))?;
            serde_json::to_value(v).map_err(|e| Error::parse(path, e))
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e))?;
            serde_json::to_value(v).map_err(|e| Error::parse(path, e))
        },
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}
