//! Request classification and cache key derivation

use serde::Serialize;

use crate::config::OfflineConfig;

/// Resource kind; each kind has its own strategy and partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestClass {
    Api,
    Static,
    Dynamic,
}

impl RequestClass {
    pub const ALL: [RequestClass; 3] = [RequestClass::Static, RequestClass::Api, RequestClass::Dynamic];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Api => "api",
            RequestClass::Static => "static",
            RequestClass::Dynamic => "dynamic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    api_prefix: String,
    static_prefix: String,
    static_extensions: Vec<String>,
}

impl Classifier {
    pub fn new(api_prefix: &str, static_prefix: &str, static_extensions: &[String]) -> Self {
        Self {
            api_prefix: api_prefix.to_string(),
            static_prefix: static_prefix.to_string(),
            static_extensions: static_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &OfflineConfig) -> Self {
        Self::new(
            &config.api_prefix,
            &config.static_prefix,
            &config.static_extensions,
        )
    }

    /// Classify by path, first match wins: API prefix, then static
    /// extension or prefix, then dynamic
    pub fn classify(&self, path_and_query: &str) -> RequestClass {
        let path = strip_query(path_and_query);

        if path.starts_with(&self.api_prefix) {
            return RequestClass::Api;
        }

        if self.has_static_extension(path) || path.starts_with(&self.static_prefix) {
            return RequestClass::Static;
        }

        RequestClass::Dynamic
    }

    fn has_static_extension(&self, path: &str) -> bool {
        let file = path.rsplit('/').next().unwrap_or(path);
        match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.static_extensions.iter().any(|known| *known == ext)
            }
            _ => false,
        }
    }
}

/// Path without query string or fragment
pub fn strip_query(path_and_query: &str) -> &str {
    let end = path_and_query
        .find(['?', '#'])
        .unwrap_or(path_and_query.len());
    &path_and_query[..end]
}

/// Store key for a request: `"{METHOD} {path?query}"`, fragment dropped
pub fn cache_key(method: &str, path_and_query: &str) -> String {
    let target = path_and_query
        .split_once('#')
        .map_or(path_and_query, |(before, _)| before);
    format!("{} {}", method.to_ascii_uppercase(), target)
}
