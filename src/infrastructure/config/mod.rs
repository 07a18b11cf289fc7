//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::messaging::RateLimitConfig;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Per-trigger rate-limit overrides
    #[serde(default)]
    pub rate_limits: HashMap<String, RateLimitConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    #[serde(default = "default_prefix")]
    pub default_prefix: String,
}

/// Where the scoped store lives; no path means in-memory only
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub service_id: String,
    pub guild_id: String,
    pub user: String,
    /// Users treated as admins regardless of the stored admin list
    #[serde(default)]
    pub owners: Vec<String>,
}

fn default_prefix() -> String {
    "!".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            service_id: "console".to_string(),
            guild_id: "local".to_string(),
            user: "operator".to_string(),
            owners: vec!["operator".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "carik-commands".to_string(),
                default_prefix: default_prefix(),
            },
            storage: StorageConfig {
                path: Some(PathBuf::from("data/store.json")),
            },
            console: ConsoleConfig::default(),
            rate_limits: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.into(), content)
            .map_err(|e| ConfigError::Parse(format!("Failed to write config: {}", e)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.name.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.name".to_string()));
        }
        for (trigger, limit) in &self.rate_limits {
            if limit.identifier.trim().is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "rate-limits.{}.identifier",
                    trigger
                )));
            }
            if limit.seconds_per_interval < 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "rate-limits.{}.seconds-per-interval must not be negative",
                    trigger
                )));
            }
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment overrides: `BOT_PREFIX`, `BOT_STORAGE` (empty = in-memory)
    pub fn apply_env(&mut self) {
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.default_prefix = prefix;
        }

        if let Ok(storage) = std::env::var("BOT_STORAGE") {
            self.storage.path = if storage.is_empty() {
                None
            } else {
                Some(PathBuf::from(storage))
            };
        }
    }
}
