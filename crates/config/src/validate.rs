//! Configuration validation.
//!
//! Flags unknown or misspelled keys in the config file and reports values
//! the bot cannot run with.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    env_subst::substitute_env,
    loader::{apply_env_overrides, find_config_file, parse_config, parse_config_value},
    schema::VoidBotConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// "syntax", "unknown-field", "type-error", "value" or "file-ref".
    pub category: &'static str,
    /// Dotted path, e.g. "void.default_delete_after".
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, category: &'static str, path: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.severity, self.path, self.message)
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        (
            "discord",
            Struct(HashMap::from([
                ("token", Leaf),
                ("relay_name", Leaf),
                ("command_prefix", Leaf),
                ("error_log_channel", Leaf),
            ])),
        ),
        (
            "database",
            Struct(HashMap::from([("url", Leaf), ("max_connections", Leaf)])),
        ),
        (
            "void",
            Struct(HashMap::from([
                ("default_delete_after", Leaf),
                ("exempt_embed_titles", Leaf),
            ])),
        ),
    ]))
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (serde_json::Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known: Vec<&str> = fields.keys().copied().collect();
    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => check_unknown_fields(child, child_schema, &path, diagnostics),
            None => {
                let message = match suggest(key, &known, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    &path,
                    message,
                ));
            },
        }
    }
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate the config file at `path`, or the discovered one when `None`.
///
/// Environment overrides are applied before value checks so that a token
/// supplied only through the environment is accepted. With `require_token`
/// a missing token is an error.
#[must_use]
pub fn validate(path: Option<&Path>, require_token: bool) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

    let Some(actual_path) = config_path else {
        let mut config = VoidBotConfig::default();
        apply_env_overrides(&mut config);
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults",
        )];
        diagnostics.extend(validate_config(&config, require_token));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let raw = match std::fs::read_to_string(&actual_path) {
        Ok(raw) => substitute_env(&raw),
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    format!("failed to read config file: {e}"),
                )],
                config_path: Some(actual_path),
            };
        },
    };

    let mut result = validate_str(&raw, &actual_path, require_token);
    result.config_path = Some(actual_path);
    result
}

fn validate_str(raw: &str, path: &Path, require_token: bool) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value = match parse_config_value(raw, path) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", e.to_string()));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    match parse_config(raw, path) {
        Ok(mut config) => {
            apply_env_overrides(&mut config);
            diagnostics.extend(validate_config(&config, require_token));
        },
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            e.to_string(),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Check values of an already-parsed config.
#[must_use]
pub fn validate_config(config: &VoidBotConfig, require_token: bool) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if require_token && config.discord.token().is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "value",
            "discord.token",
            "no bot token configured (set discord.token or THEVOID_DISCORD_TOKEN)",
        ));
    }

    if config.discord.relay_name.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "value",
            "discord.relay_name",
            "relay name must not be empty",
        ));
    }

    if config.discord.command_prefix.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "value",
            "discord.command_prefix",
            "command prefix must not be empty",
        ));
    }

    let delay = config.void.default_delete_after;
    if !delay.is_finite() || delay < 0.0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "value",
            "void.default_delete_after",
            format!("must be a finite, non-negative number of seconds (got {delay})"),
        ));
    }

    if config.void.exempt_embed_titles.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "void.exempt_embed_titles",
            "no exempt titles; the bot's own confirmations in void channels will be deleted",
        ));
    }

    if config.database.max_connections == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "value",
            "database.max_connections",
            "must be at least 1",
        ));
    }

    diagnostics
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn toml(raw: &str) -> ValidationResult {
        validate_str(raw, Path::new("thevoid.toml"), false)
    }

    #[rstest]
    #[case("kitten", "sitting", 3)]
    #[case("", "abc", 3)]
    #[case("abc", "", 3)]
    #[case("relay_nme", "relay_name", 1)]
    fn levenshtein_distance(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
    }

    #[test]
    fn default_config_is_clean() {
        let result = toml("");
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn misspelled_key_gets_suggestion() {
        let result = toml("[discord]\nrelay_nme = \"void\"\n");
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(d.path, "discord.relay_nme");
        assert!(d.message.contains("relay_name"));
    }

    #[test]
    fn unknown_section_is_flagged() {
        let result = toml("[metrics]\nenabled = true\n");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "unknown-field" && d.path == "metrics")
        );
    }

    #[test]
    fn syntax_error_stops_validation() {
        let result = toml("[void\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn wrong_type_is_reported() {
        let result = toml("[void]\ndefault_delete_after = \"soon\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn bad_default_delay_is_an_error(#[case] delay: f64) {
        let mut config = VoidBotConfig::default();
        config.void.default_delete_after = delay;
        let diagnostics = validate_config(&config, false);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.path == "void.default_delete_after" && d.severity == Severity::Error)
        );
    }

    #[test]
    fn token_required_only_for_running() {
        let config = VoidBotConfig::default();
        assert!(validate_config(&config, false).is_empty());
        let diagnostics = validate_config(&config, true);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "discord.token");
    }

    #[test]
    fn empty_exempt_titles_is_a_warning() {
        let mut config = VoidBotConfig::default();
        config.void.exempt_embed_titles.clear();
        config.discord.relay_name = " ".into();
        let diagnostics = validate_config(&config, false);
        assert!(diagnostics.iter().any(|d| d.severity == Severity::Warning));
        assert!(
            diagnostics
                .iter()
                .any(|d| d.path == "discord.relay_name" && d.severity == Severity::Error)
        );
    }

    #[test]
    fn blank_command_prefix_is_an_error() {
        let mut config = VoidBotConfig::default();
        config.discord.command_prefix = String::new();
        let diagnostics = validate_config(&config, false);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "discord.command_prefix");
    }

    #[test]
    fn validates_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thevoid.yaml");
        std::fs::write(&path, "void:\n  default_delete_after: -2\n").unwrap();

        let result = validate(Some(&path), false);
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        assert!(result.has_errors());

        let result = validate(Some(&dir.path().join("nope.toml")), false);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn display_includes_path() {
        let d = Diagnostic::new(Severity::Warning, "value", "void.x", "bad");
        assert_eq!(d.to_string(), "warning: void.x: bad");
    }
}
