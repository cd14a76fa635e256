//! File system paths for Postwall.

use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Directory name under the platform config and data directories.
const APP_DIR_NAME: &str = "postwall";

/// Resolves where Postwall keeps its files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (`<config dir>/postwall`)
    base_dir: PathBuf,
    /// Log directory (`<local data dir>/postwall/logs`)
    logs_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance from the platform directories.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::Path("Could not determine config directory".to_string())
        })?;
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| config_dir.clone());

        Ok(Self {
            base_dir: config_dir.join(APP_DIR_NAME),
            logs_dir: data_dir.join(APP_DIR_NAME).join("logs"),
        })
    }

    /// Create a new Paths instance rooted at a custom directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            logs_dir: base_dir.join("logs"),
            base_dir,
        }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (`<base>/config.json`).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the logs directory.
    pub fn logs_dir(&self) -> &PathBuf {
        &self.logs_dir
    }

    /// Get the JSONL log file path (`<logs>/postwall.jsonl`).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join("postwall.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(&self.logs_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-postwall");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.logs_dir(), &base.join("logs"));
        assert_eq!(paths.log_file(), base.join("logs/postwall.jsonl"));
    }

    #[test]
    fn test_paths_default_ends_with_app_dir() {
        if let Ok(paths) = Paths::new() {
            assert!(paths.base_dir().ends_with("postwall"));
            assert!(paths.logs_dir().ends_with("postwall/logs"));
        }
    }

    #[test]
    fn test_ensure_dirs_creates_directories() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("postwall");
        let paths = Paths::with_base_dir(base.clone());

        assert!(!base.exists());

        paths.ensure_dirs().unwrap();

        assert!(base.is_dir());
        assert!(paths.logs_dir().is_dir());
    }

    #[test]
    fn test_ensure_dirs_idempotent() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.logs_dir().exists());
    }
}
