use crate::humanize::{ByteSize, HumanDuration};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
}

/// Proxy server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Maximum proxied requests handled at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Largest request body accepted for pass-through and control messages
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_concurrent_requests: default_max_concurrent_requests(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_concurrent_requests() -> usize {
    256
}

fn default_max_request_bytes() -> ByteSize {
    ByteSize(1024 * 1024) // 1 MB
}

/// Prediction API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the prediction API (or of the offline proxy in front of it)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_predict_path")]
    pub predict_path: String,
    #[serde(default = "default_force_refresh_path")]
    pub force_refresh_path: String,
    #[serde(default = "default_cache_clear_path")]
    pub cache_clear_path: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Number of recent history entries compared against a new result
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window: usize,
    /// A result is duplicated when more than this many algorithms repeat
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Wait between cache invalidation and regeneration
    #[serde(default = "default_refresh_delay")]
    pub refresh_delay: HumanDuration,
    /// Algorithms named in the cache-clear request
    #[serde(default = "default_problematic_algorithms")]
    pub problematic_algorithms: Vec<String>,
    /// Version string carried in every cache-busting envelope
    #[serde(default = "default_envelope_version")]
    pub envelope_version: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    /// No request timeout unless set; the transport default applies
    #[serde(default)]
    pub request_timeout: Option<HumanDuration>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            predict_path: default_predict_path(),
            force_refresh_path: default_force_refresh_path(),
            cache_clear_path: default_cache_clear_path(),
            health_path: default_health_path(),
            duplicate_window: default_duplicate_window(),
            duplicate_threshold: default_duplicate_threshold(),
            history_capacity: default_history_capacity(),
            refresh_delay: default_refresh_delay(),
            problematic_algorithms: default_problematic_algorithms(),
            envelope_version: default_envelope_version(),
            connect_timeout: default_connect_timeout(),
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_predict_path() -> String {
    "/api/predictions".to_string()
}

fn default_force_refresh_path() -> String {
    "/api/predictions/force-refresh".to_string()
}

fn default_cache_clear_path() -> String {
    "/api/cache/clear".to_string()
}

fn default_health_path() -> String {
    "/api/health".to_string()
}

fn default_duplicate_window() -> usize {
    10
}

fn default_duplicate_threshold() -> usize {
    3
}

fn default_history_capacity() -> usize {
    20
}

fn default_refresh_delay() -> HumanDuration {
    HumanDuration::from_millis(500)
}

fn default_problematic_algorithms() -> Vec<String> {
    ["frequency_analysis", "pattern_analysis", "statistical_analysis"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_envelope_version() -> String {
    "2.0".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("lottobox/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Offline cache proxy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OfflineConfig {
    /// Cache generation; bumping it orphans the previous partitions
    #[serde(default = "default_cache_version")]
    pub version: String,
    /// Prefix shared by every partition this service owns
    #[serde(default = "default_partition_prefix")]
    pub partition_prefix: String,
    /// Origin the proxy forwards to
    #[serde(default = "default_upstream")]
    pub upstream: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,
    /// URLs fetched and stored on install, each in its own class partition
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: HumanDuration,
    /// Responses larger than this are served but never stored
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: ByteSize,
    #[serde(default = "default_sync_path")]
    pub sync_path: String,
    /// Entry invalidated after a successful sync when the message names none
    #[serde(default = "default_sync_invalidate")]
    pub sync_invalidate: String,
    /// Stay in the waiting state after install until `skip-waiting`
    #[serde(default)]
    pub wait_for_activation: bool,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            version: default_cache_version(),
            partition_prefix: default_partition_prefix(),
            upstream: default_upstream(),
            api_prefix: default_api_prefix(),
            static_prefix: default_static_prefix(),
            static_extensions: default_static_extensions(),
            precache: default_precache(),
            sweep_interval: default_sweep_interval(),
            max_entry_bytes: default_max_entry_bytes(),
            sync_path: default_sync_path(),
            sync_invalidate: default_sync_invalidate(),
            wait_for_activation: false,
            store: StoreConfig::default(),
        }
    }
}

fn default_cache_version() -> String {
    "v1".to_string()
}

fn default_partition_prefix() -> String {
    "lottobox".to_string()
}

fn default_upstream() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_static_prefix() -> String {
    "/static/".to_string()
}

fn default_static_extensions() -> Vec<String> {
    [
        "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2", "ttf",
        "eot",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/static/css/style.css",
        "/static/js/app.js",
        "/static/js/api.js",
        "/static/manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_sweep_interval() -> HumanDuration {
    HumanDuration::from_secs(24 * 3600)
}

fn default_max_entry_bytes() -> ByteSize {
    ByteSize(5 * 1024 * 1024) // 5 MB
}

fn default_sync_path() -> String {
    "/api/sync".to_string()
}

fn default_sync_invalidate() -> String {
    "/api/saved-numbers".to_string()
}

/// Cache store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Fjall,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/offline-cache")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.client.duplicate_window, 10);
        assert_eq!(config.client.duplicate_threshold, 3);
        assert_eq!(config.client.history_capacity, 20);
        assert_eq!(config.client.refresh_delay.as_duration(), Duration::from_millis(500));
        assert!(config.client.request_timeout.is_none());
        assert_eq!(config.offline.version, "v1");
        assert_eq!(config.offline.sweep_interval.as_duration(), Duration::from_secs(86400));
        assert_eq!(config.offline.store.backend, StoreBackend::Fjall);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[client]
duplicate_threshold = 4
refresh_delay = "1s"

[offline.store]
backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.client.duplicate_threshold, 4);
        assert_eq!(config.client.duplicate_window, 10);
        assert_eq!(config.client.refresh_delay.as_duration(), Duration::from_secs(1));
        assert_eq!(config.offline.store.backend, StoreBackend::Memory);
        assert_eq!(config.offline.api_prefix, "/api/");
    }
}
