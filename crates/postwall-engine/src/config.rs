//! Engine settings.

use postwall_config::Config;

/// Settings for one feed engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Collection the feed follows and posts into.
    pub collection: String,
    /// Value of the `type` parameter on avatar URLs.
    pub avatar_size: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            collection: config.collection.clone(),
            avatar_size: config.avatar_size.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_posts_collection() {
        let config = EngineConfig::default();
        assert_eq!(config.collection, "posts");
        assert_eq!(config.avatar_size, "large");
    }

    #[test]
    fn built_from_app_config() {
        let app = Config {
            collection: "staging_posts".to_string(),
            avatar_size: "normal".to_string(),
            ..Config::default()
        };
        let config = EngineConfig::from(&app);
        assert_eq!(config.collection, "staging_posts");
        assert_eq!(config.avatar_size, "normal");
    }
}
