//! HTTP transport for the prediction API

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;

/// Any failure to get a usable JSON body back from the API.
///
/// Surfaced to the caller untouched; this layer never retries.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Generic JSON fetch capability the reliability client is built on
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_json(
        &self,
        path: &str,
        headers: &[(String, String)],
    ) -> Result<Value, TransportError>;

    async fn post_json(
        &self,
        path: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> Result<Value, TransportError>;
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// `None` leaves reqwest's default (no overall timeout)
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            user_agent: concat!("lottobox/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl From<&ClientConfig> for HttpConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout.as_duration(),
            request_timeout: config.request_timeout.map(|t| t.as_duration()),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// reqwest-backed [`ApiTransport`] rooted at a base URL
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, config: HttpConfig) -> Result<Self, TransportError> {
        let base_url =
            Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.base_url, HttpConfig::from(config))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))?;

        debug!(%method, %url, "Sending API request");

        let mut request = self
            .client
            .request(method, url.clone())
            .header(header::ACCEPT, "application/json");

        for (name, value) in headers {
            request = request.header(name, value);
        }

        if let Some(body) = body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| TransportError::Decode(e.to_string()))?;
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        debug!(%url, status = status.as_u16(), size = bytes.len(), "API response received");

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        headers: &[(String, String)],
    ) -> Result<Value, TransportError> {
        self.send(Method::GET, path, headers, None).await
    }

    async fn post_json(
        &self,
        path: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> Result<Value, TransportError> {
        self.send(Method::POST, path, headers, Some(body)).await
    }
}
