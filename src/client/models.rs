//! Wire types exchanged with the prediction API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;
pub const PICK_SIZE: usize = 6;

/// Outbound prediction request, immutable once sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRequest {
    pub user_numbers: Vec<u8>,
    pub request_id: String,
    pub client_timestamp: i64,
}

impl PredictionRequest {
    pub fn new(user_numbers: &[u8]) -> Self {
        Self {
            user_numbers: user_numbers.to_vec(),
            request_id: Uuid::now_v7().to_string(),
            client_timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// One algorithm's output inside a prediction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmResult {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "confidenceScore", alias = "confidence")]
    pub confidence_score: f64,
    #[serde(alias = "priorityNumbers")]
    pub priority_numbers: Vec<u8>,
    #[serde(default)]
    pub description: String,
}

/// Algorithm key -> result. Never mutated by the client.
pub type PredictionResult = BTreeMap<String, AlgorithmResult>;

/// Envelope returned by the prediction and force-refresh endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Health endpoint body: `status` plus whatever else the server reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumbersError {
    #[error("expected 0 or 6 numbers, got {0}")]
    WrongCount(usize),
    #[error("number {0} is outside 1..=45")]
    OutOfRange(u8),
    #[error("number {0} appears more than once")]
    Duplicate(u8),
}

/// Check a user selection before calling `predict`: empty, or six unique numbers in 1..=45
pub fn validate_user_numbers(numbers: &[u8]) -> Result<(), NumbersError> {
    if !numbers.is_empty() && numbers.len() != PICK_SIZE {
        return Err(NumbersError::WrongCount(numbers.len()));
    }

    let mut seen = HashSet::with_capacity(numbers.len());
    for &n in numbers {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
            return Err(NumbersError::OutOfRange(n));
        }
        if !seen.insert(n) {
            return Err(NumbersError::Duplicate(n));
        }
    }

    Ok(())
}
