//! Configuration loading, validation and env substitution.
//!
//! Config files: `thevoid.toml`, `thevoid.yaml`, `thevoid.yml` or
//! `thevoid.json`. Searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
    },
    schema::{DatabaseConfig, DiscordConfig, VoidBotConfig, VoidConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_config},
};
