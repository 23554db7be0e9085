//! Configuration management for lottobox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use lottobox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Proxy listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `LOTTOBOX__<section>__<key>`
//!
//! Examples:
//! - `LOTTOBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `LOTTOBOX__CLIENT__BASE_URL=http://predictions:5000`
//! - `LOTTOBOX__OFFLINE__VERSION=v2`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/lottobox.toml`.
//! This can be overridden using the `LOTTOBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{
    ClientConfig, Config, OfflineConfig, ServerConfig, StoreBackend, StoreConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            r#"
[offline]
upstream = "http://origin:5000"
            "#,
        )
        .unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.offline.upstream, "http://origin:5000");
        assert_eq!(config.client.history_capacity, 20);
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            r#"
[client]
duplicate_window = 30
history_capacity = 20
            "#,
        )
        .unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::WindowExceedsHistory { .. })
        ));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[client\nbase_url = ").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
