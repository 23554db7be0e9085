//! Control messages accepted at `POST /_offline/messages`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::service::LifecycleState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    GetVersion,
    ClearCache,
    SkipWaiting,
    SyncData {
        #[serde(default)]
        payload: Value,
        /// Path whose cached API response becomes stale after the sync
        #[serde(default, alias = "cacheKey")]
        cache_key: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlReply {
    Version { version: String },
    Cleared { cleared: Vec<String> },
    State { state: LifecycleState },
    Synced { synced: bool, invalidated: bool },
}
