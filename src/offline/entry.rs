//! Stored response format and partition naming
//!
//! Entries are protobuf-encoded so the on-disk layout stays compact and
//! independent of any Rust struct layout.

use bytes::Bytes;
use prost::Message;

use super::classify::RequestClass;

#[derive(Clone, PartialEq, Message)]
pub struct HeaderEntry {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// An HTTP response as fetched from upstream or read back from a partition
#[derive(Clone, PartialEq, Message)]
pub struct CachedResponse {
    #[prost(uint32, tag = "1")]
    pub status: u32,
    #[prost(message, repeated, tag = "2")]
    pub headers: Vec<HeaderEntry>,
    #[prost(bytes = "bytes", tag = "3")]
    pub body: Bytes,
    /// Unix millis; zero until written to a store
    #[prost(uint64, tag = "4")]
    pub stored_at_ms: u64,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status: status as u32,
            headers: headers
                .into_iter()
                .map(|(name, value)| HeaderEntry { name, value })
                .collect(),
            body: body.into(),
            stored_at_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of `name`, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Copy stamped with the current time, ready to store
    pub fn stamped(&self) -> Self {
        let now_ms = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self {
            stored_at_ms: now_ms.max(0) as u64,
            ..self.clone()
        }
    }
}

/// `{prefix}-{kind}-{version}`
pub fn partition_name(prefix: &str, class: RequestClass, version: &str) -> String {
    format!("{}-{}-{}", prefix, class.as_str(), version)
}

/// Version part of a partition owned by `prefix`, or `None` for foreign names
pub fn partition_version<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
    let (kind, version) = rest.split_once('-')?;
    RequestClass::ALL
        .iter()
        .any(|class| class.as_str() == kind)
        .then_some(version)
}
