//! Per-request cache-busting metadata

use serde::Serialize;

pub const HEADER_RANDOM_SEED: &str = "X-Random-Seed";
pub const HEADER_REQUEST_ID: &str = "X-Request-ID";
pub const HEADER_TIMESTAMP: &str = "X-Cache-Buster-Timestamp";
pub const HEADER_RANDOM_VALUE: &str = "X-Cache-Buster-Random";
pub const HEADER_VERSION: &str = "X-Cache-Buster-Version";
pub const HEADER_FORCE_REFRESH: &str = "X-Force-Refresh";

/// Fresh random/timestamp metadata attached to every outbound request.
///
/// Merged into POST bodies (field names below) and sent as headers on GET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheBustingEnvelope {
    pub timestamp: i64,
    pub seed: u32,
    pub random_value: u32,
    pub version: String,
    pub force_refresh: bool,
}

impl CacheBustingEnvelope {
    pub fn generate(version: &str, force_refresh: bool) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            seed: rand::random(),
            random_value: rand::random(),
            version: version.to_string(),
            force_refresh,
        }
    }

    /// Headers sent on every request: seed, request id, no-cache directives
    pub fn base_headers(&self, request_id: &str) -> Vec<(String, String)> {
        vec![
            (HEADER_RANDOM_SEED.to_string(), self.seed.to_string()),
            (HEADER_REQUEST_ID.to_string(), request_id.to_string()),
            (
                "Cache-Control".to_string(),
                "no-cache, no-store, must-revalidate".to_string(),
            ),
            ("Pragma".to_string(), "no-cache".to_string()),
            ("Expires".to_string(), "0".to_string()),
        ]
    }

    /// Base headers plus the full envelope, for requests without a body
    pub fn get_headers(&self, request_id: &str) -> Vec<(String, String)> {
        let mut headers = self.base_headers(request_id);
        headers.extend([
            (HEADER_TIMESTAMP.to_string(), self.timestamp.to_string()),
            (HEADER_RANDOM_VALUE.to_string(), self.random_value.to_string()),
            (HEADER_VERSION.to_string(), self.version.clone()),
            (HEADER_FORCE_REFRESH.to_string(), self.force_refresh.to_string()),
        ]);
        headers
    }
}
