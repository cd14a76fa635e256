//! Configuration management for Postwall.

use crate::{ConfigError, ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default collection holding the feed's posts.
pub const DEFAULT_COLLECTION: &str = "posts";

/// Default avatar size requested from the photo host.
pub const DEFAULT_AVATAR_SIZE: &str = "large";

/// Environment variable overriding `log_level`.
const ENV_LOG_LEVEL: &str = "POSTWALL_LOG_LEVEL";

/// Environment variable overriding `collection`.
const ENV_COLLECTION: &str = "POSTWALL_COLLECTION";

/// Main Postwall configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Collection the feed follows and posts into.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Value of the `type` parameter on avatar URLs.
    #[serde(default = "default_avatar_size")]
    pub avatar_size: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_avatar_size() -> String {
    DEFAULT_AVATAR_SIZE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            collection: default_collection(),
            avatar_size: default_avatar_size(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Config("collection must not be empty".to_string()));
        }
        if self.avatar_size.trim().is_empty() {
            return Err(ConfigError::Config("avatar_size must not be empty".to_string()));
        }
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override configuration from a variable lookup. Blank values are
    /// ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value: &String| !value.trim().is_empty());

        if let Some(log_level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(collection) = non_empty(ENV_COLLECTION) {
            tracing::debug!(%collection, "collection overridden from environment");
            self.collection = collection;
        }
    }
}
