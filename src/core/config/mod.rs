//! Defines the core runtime `Config` struct, its defaults, and loading from
//! the TOML configuration file.

pub(crate) mod file;

pub use file::ConfigFile;

use crate::core::error::{AppError, Result};
use std::path::Path;
use std::time::Duration;

/// Default overall verification budget when no `timeout` is configured.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default producer chunking granularity (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Runtime configuration settings used by the dkim-gate core logic.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key lookup method handed to engine construction by the embedder.
    pub query_method: Option<String>,
    /// Companion argument for `query_method`.
    pub query_info: Option<String>,
    /// Overall per-message verification budget, if configured.
    pub timeout: Option<Duration>,
    /// Suggested producer chunking granularity, in bytes.
    pub chunk_size: usize,

    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            query_method: None,
            query_info: None,
            timeout: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            loaded_config_path: None,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, merging it over the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&raw)?;
        let mut config = Config::from_config_file(file)?;
        config.loaded_config_path = Some(path.display().to_string());
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Merges a parsed [`ConfigFile`] over the defaults and validates it.
    pub fn from_config_file(file: ConfigFile) -> Result<Self> {
        let defaults = Config::default();
        let config = Config {
            query_method: file.general.query_method,
            query_info: file.general.query_info,
            timeout: file.general.timeout.map(Duration::from_secs),
            chunk_size: file.verify.chunk_size.unwrap_or(defaults.chunk_size),
            loaded_config_path: None,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "verify.chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The budget for how long a single verification may stay outstanding.
    ///
    /// One second is shaved off a configured timeout so the stream's bound
    /// trips before the surrounding pipeline's own deadline does.
    pub fn verify_timeout(&self) -> Duration {
        match self.timeout {
            Some(t) => t.saturating_sub(Duration::from_secs(1)),
            None => DEFAULT_VERIFY_TIMEOUT,
        }
    }
}
