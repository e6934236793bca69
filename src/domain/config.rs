//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`)
//! and the environment values that never live on disk (the bot token, the REPL flag).
//! `BotConfiguration` is the immutable result handed to the host.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::ConfigurationError;
use crate::domain::types::ExtensionName;

pub const TOKEN_VAR: &str = "BOT_TOKEN";
pub const DEBUG_REPL_VAR: &str = "BOT_DEBUG_REPL";
pub const CONFIG_PATH_VAR: &str = "BOT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "data/config.yaml";

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub bot: BotSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub username: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotSettings {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Also accept commands addressed to the bot by mention.
    #[serde(default = "default_true")]
    pub mention: bool,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub intents: IntentSet,
    /// Overrides the built-in startup list when present.
    #[serde(default)]
    pub extensions: Option<Vec<ExtensionName>>,
    #[serde(default)]
    pub drain_delay_ms: Option<u64>,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            mention: true,
            owner: None,
            intents: IntentSet::default(),
            extensions: None,
            drain_delay_ms: None,
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_file")]
    pub file: String,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file: default_log_file(),
            filter: None,
        }
    }
}

fn default_prefix() -> String {
    "%".to_string()
}
fn default_true() -> bool {
    true
}
fn default_database_path() -> PathBuf {
    PathBuf::from("data/rooms.json")
}
fn default_log_directory() -> PathBuf {
    PathBuf::from("data")
}
fn default_log_file() -> String {
    "session.log".to_string()
}

impl AppConfig {
    /// Reads the file named by `BOT_CONFIG`, or `data/config.yaml`.
    pub fn load_default() -> Result<Self, ConfigurationError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(content).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Combines the file with the environment into the host's configuration.
    pub fn bot_configuration(&self, env: EnvSettings) -> BotConfiguration {
        BotConfiguration {
            token: env.token,
            prefix: CommandPrefix {
                literal: self.bot.prefix.clone(),
                mention: self.bot.mention,
            },
            intents: self.bot.intents.clone(),
            owner: self.bot.owner.clone(),
        }
    }
}

/// Values taken from the process environment.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub token: SecretToken,
    pub debug_repl: bool,
}

impl EnvSettings {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let token = lookup(TOKEN_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigurationError::MissingVar(TOKEN_VAR))?;
        let debug_repl = match lookup(DEBUG_REPL_VAR) {
            Some(value) => parse_flag(DEBUG_REPL_VAR, &value)?,
            None => false,
        };
        Ok(Self {
            token: SecretToken(token),
            debug_repl,
        })
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::InvalidVar {
            name,
            value: value.to_string(),
        }),
    }
}

/// Credential for the gateway session. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

/// Which gateway events the session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Room text messages.
    Messages,
    /// Membership changes; needed to accept invites.
    Members,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct IntentSet(BTreeSet<Intent>);

impl IntentSet {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn with(mut self, intent: Intent) -> Self {
        self.0.insert(intent);
        self
    }

    pub fn contains(&self, intent: Intent) -> bool {
        self.0.contains(&intent)
    }
}

impl Default for IntentSet {
    fn default() -> Self {
        Self::empty().with(Intent::Messages).with(Intent::Members)
    }
}

/// How a message is recognised as a command: a literal prefix, or a mention of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPrefix {
    pub literal: String,
    pub mention: bool,
}

impl CommandPrefix {
    pub fn literal(prefix: impl Into<String>) -> Self {
        Self {
            literal: prefix.into(),
            mention: false,
        }
    }

    /// Returns the text after the prefix, or `None` if `body` is not a command.
    ///
    /// Mentions are checked before the literal prefix. `own_user` is unknown until
    /// the gateway reports `Ready`.
    pub fn strip<'a>(&self, body: &'a str, own_user: Option<&str>) -> Option<&'a str> {
        if self.mention {
            if let Some(user_id) = own_user {
                for form in mention_forms(user_id) {
                    if let Some(rest) = body.strip_prefix(form.as_str()) {
                        let rest = rest.strip_prefix(':').unwrap_or(rest);
                        return Some(rest.trim_start());
                    }
                }
            }
        }
        if self.literal.is_empty() {
            return None;
        }
        body.strip_prefix(self.literal.as_str())
    }
}

/// `@bot:server` and the `bot:` form Matrix clients put in reply bodies.
fn mention_forms(user_id: &str) -> Vec<String> {
    let mut forms = vec![user_id.to_string()];
    let localpart = user_id
        .trim_start_matches('@')
        .split(':')
        .next()
        .unwrap_or_default();
    if !localpart.is_empty() {
        forms.push(format!("{localpart}:"));
    }
    forms
}

/// Everything the host is built from. Consumed once.
#[derive(Debug, Clone)]
pub struct BotConfiguration {
    pub token: SecretToken,
    pub prefix: CommandPrefix,
    pub intents: IntentSet,
    /// User allowed to run owner-only commands.
    pub owner: Option<String>,
}

impl BotConfiguration {
    pub fn new(token: SecretToken, prefix: CommandPrefix) -> Self {
        Self {
            token,
            prefix,
            intents: IntentSet::default(),
            owner: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_token_is_required() {
        let err = EnvSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingVar(TOKEN_VAR)));

        let err = EnvSettings::from_lookup(lookup(&[(TOKEN_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingVar(TOKEN_VAR)));
    }

    #[test]
    fn test_debug_repl_flag() {
        let env = EnvSettings::from_lookup(lookup(&[(TOKEN_VAR, "t")])).unwrap();
        assert!(!env.debug_repl);

        for value in ["1", "true", "YES", "on"] {
            let env =
                EnvSettings::from_lookup(lookup(&[(TOKEN_VAR, "t"), (DEBUG_REPL_VAR, value)]))
                    .unwrap();
            assert!(env.debug_repl, "{value}");
        }
        for value in ["", "0", "false", "off"] {
            let env =
                EnvSettings::from_lookup(lookup(&[(TOKEN_VAR, "t"), (DEBUG_REPL_VAR, value)]))
                    .unwrap();
            assert!(!env.debug_repl, "{value}");
        }

        let err = EnvSettings::from_lookup(lookup(&[(TOKEN_VAR, "t"), (DEBUG_REPL_VAR, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidVar { .. }));
    }

    #[test]
    fn test_token_is_not_printed() {
        let token = SecretToken::new("hunter2");
        assert!(!format!("{token:?}").contains("hunter2"));
        assert_eq!(token.expose(), "hunter2");
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = "matrix:\n  homeserver: https://example.org\n  username: joshgone\n";
        let config = AppConfig::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.bot.prefix, "%");
        assert!(config.bot.mention);
        assert!(config.bot.extensions.is_none());
        assert_eq!(config.bot.intents, IntentSet::default());
        assert_eq!(config.logging.file, "session.log");
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
matrix:
  homeserver: https://example.org
  username: joshgone
bot:
  prefix: "!"
  mention: false
  owner: "@me:example.org"
  intents: [messages]
  extensions: [info, gee]
  drain_delay_ms: 250
"#;
        let config = AppConfig::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.bot.prefix, "!");
        assert!(!config.bot.intents.contains(Intent::Members));
        assert!(config.bot.intents.contains(Intent::Messages));
        assert_eq!(
            config.bot.extensions,
            Some(vec![ExtensionName::from("info"), ExtensionName::from("gee")])
        );
        assert_eq!(config.bot.drain_delay_ms, Some(250));

        let env = EnvSettings::from_lookup(lookup(&[(TOKEN_VAR, "t")])).unwrap();
        let bot = config.bot_configuration(env);
        assert_eq!(bot.prefix, CommandPrefix::literal("!"));
        assert_eq!(bot.owner.as_deref(), Some("@me:example.org"));
    }

    #[test]
    fn test_yaml_without_matrix_section_fails() {
        let err = AppConfig::from_yaml("bot: {}\n", Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse { .. }));
    }

    #[test]
    fn test_literal_prefix() {
        let prefix = CommandPrefix::literal("%");
        assert_eq!(prefix.strip("%gee hi", None), Some("gee hi"));
        assert_eq!(prefix.strip("gee hi", None), None);
        assert_eq!(prefix.strip("@bot:example.org gee", Some("@bot:example.org")), None);
    }

    #[test]
    fn test_mention_prefix() {
        let prefix = CommandPrefix {
            literal: "%".to_string(),
            mention: true,
        };
        let me = Some("@bot:example.org");
        assert_eq!(prefix.strip("@bot:example.org gee", me), Some("gee"));
        assert_eq!(prefix.strip("@bot:example.org: gee", me), Some("gee"));
        assert_eq!(prefix.strip("bot: gee", me), Some("gee"));
        assert_eq!(prefix.strip("%gee", me), Some("gee"));
        assert_eq!(prefix.strip("bottle: gee", me), None);
        // Unknown own user: only the literal prefix applies.
        assert_eq!(prefix.strip("bot: gee", None), None);
    }
}
