use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("duplicate_window must be positive")]
    EmptyDuplicateWindow,

    #[error("duplicate_window ({window}) exceeds history_capacity ({capacity})")]
    WindowExceedsHistory { window: usize, capacity: usize },

    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must start with '/': {value}")]
    InvalidPath { field: &'static str, value: String },

    #[error("Invalid cache name component {field} = '{value}' (allowed: a-z, A-Z, 0-9, '.', '_')")]
    InvalidCacheName { field: &'static str, value: String },

    #[error("max_entry_bytes must be positive")]
    InvalidMaxEntryBytes,

    #[error("sweep_interval must be positive")]
    InvalidSweepInterval,

    #[error("max_concurrent_requests must be positive")]
    InvalidConcurrencyLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_client(config)?;
    validate_offline(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_concurrent_requests == 0 {
        return Err(ValidationError::InvalidConcurrencyLimit);
    }
    Ok(())
}

fn validate_client(config: &Config) -> Result<(), ValidationError> {
    let client = &config.client;

    if client.duplicate_window == 0 {
        return Err(ValidationError::EmptyDuplicateWindow);
    }

    // A window wider than the history could never be filled
    if client.duplicate_window > client.history_capacity {
        return Err(ValidationError::WindowExceedsHistory {
            window: client.duplicate_window,
            capacity: client.history_capacity,
        });
    }

    validate_url("client.base_url", &client.base_url)?;

    for (field, value) in [
        ("client.predict_path", &client.predict_path),
        ("client.force_refresh_path", &client.force_refresh_path),
        ("client.cache_clear_path", &client.cache_clear_path),
        ("client.health_path", &client.health_path),
    ] {
        validate_path(field, value)?;
    }

    Ok(())
}

fn validate_offline(config: &Config) -> Result<(), ValidationError> {
    let offline = &config.offline;

    validate_url("offline.upstream", &offline.upstream)?;
    validate_cache_name("offline.version", &offline.version)?;
    validate_cache_name("offline.partition_prefix", &offline.partition_prefix)?;

    for (field, value) in [
        ("offline.api_prefix", &offline.api_prefix),
        ("offline.static_prefix", &offline.static_prefix),
        ("offline.sync_path", &offline.sync_path),
        ("offline.sync_invalidate", &offline.sync_invalidate),
    ] {
        validate_path(field, value)?;
    }

    for url in &offline.precache {
        validate_path("offline.precache", url)?;
    }

    if offline.max_entry_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidMaxEntryBytes);
    }

    if offline.sweep_interval.as_duration().is_zero() {
        return Err(ValidationError::InvalidSweepInterval);
    }

    Ok(())
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !value.starts_with('/') {
        return Err(ValidationError::InvalidPath {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Partition names are `{prefix}-{kind}-{version}`, so '-' is reserved as the separator
fn validate_cache_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');

    if !valid {
        return Err(ValidationError::InvalidCacheName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::{ByteSize, HumanDuration};

    #[test]
    fn test_valid_default_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_window() {
        let mut config = Config::default();
        config.client.duplicate_window = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::EmptyDuplicateWindow)));
    }

    #[test]
    fn test_window_larger_than_history() {
        let mut config = Config::default();
        config.client.duplicate_window = 25;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::WindowExceedsHistory { window: 25, capacity: 20 })
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.client.base_url = "not a url".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidUrl { .. })));

        config.client.base_url = "ftp://example.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_relative_prefix_rejected() {
        let mut config = Config::default();
        config.offline.api_prefix = "api/".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidPath { .. })));
    }

    #[test]
    fn test_version_with_separator_rejected() {
        let mut config = Config::default();
        config.offline.version = "v1-beta".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidCacheName { .. })));

        config.offline.version = "v1.2_beta".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = Config::default();
        config.offline.max_entry_bytes = ByteSize(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidMaxEntryBytes)
        ));

        let mut config = Config::default();
        config.offline.sweep_interval = HumanDuration::from_millis(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidSweepInterval)
        ));
    }
}
