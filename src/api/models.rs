//! Response bodies for the `/_offline/*` endpoints

use serde::Serialize;

use crate::offline::LifecycleState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache_version: String,
    pub state: LifecycleState,
}
