//! Configuration, paths, and logging setup for Postwall.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_AVATAR_SIZE, DEFAULT_COLLECTION, DEFAULT_LOG_LEVEL};
pub use error::{ConfigError, ConfigResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
