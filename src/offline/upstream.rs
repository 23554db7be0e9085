//! Origin fetch for the offline cache

use async_trait::async_trait;
use axum::http::Method;
use bytes::Bytes;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use super::entry::CachedResponse;
use crate::client::HttpConfig;

/// The origin could not be reached. An HTTP error status is not a
/// network error; it comes back as a normal response.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Request as seen by the proxy and forwarded to the origin
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn get(path_and_query: &str) -> Self {
        Self {
            method: Method::GET,
            path_and_query: path_and_query.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// First value of `name`, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &ProxyRequest) -> Result<CachedResponse, NetworkError>;
}

/// Headers that describe a single connection and must not be forwarded
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// reqwest-backed origin client
pub struct HttpUpstream {
    client: Client,
    origin: Url,
}

impl HttpUpstream {
    pub fn new(origin: &str, config: HttpConfig) -> Result<Self, NetworkError> {
        let origin = Url::parse(origin).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;

        Ok(Self { client, origin })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &ProxyRequest) -> Result<CachedResponse, NetworkError> {
        let url = self
            .origin
            .join(&request.path_and_query)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {e}", request.path_and_query)))?;

        debug!(method = %request.method, %url, "Fetching from origin");

        let mut outbound = self.client.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) && !name.eq_ignore_ascii_case("content-length") {
                outbound = outbound.header(name, value);
            }
        }
        if !request.body.is_empty() {
            outbound = outbound.body(request.body.clone());
        }

        let response = outbound.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout
            } else {
                NetworkError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()) && name.as_str() != "content-length")
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::RequestFailed(format!("Failed to read body: {e}")))?;

        debug!(%url, status, size = body.len(), "Origin responded");

        Ok(CachedResponse::new(status, headers, body))
    }
}
