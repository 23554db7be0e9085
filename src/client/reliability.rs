//! Duplicate-aware prediction client
//!
//! Every prediction is compared with the recent history. When more than
//! `duplicate_threshold` algorithms return a number sequence already seen in
//! the last `duplicate_window` results, the server is assumed to be stuck on
//! a cached seed: the client asks it to clear the affected algorithm caches,
//! waits `refresh_delay`, and requests a regeneration with new seeds. The
//! regenerated result is returned as-is; recovery is not recursive.

use bon::Builder;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::envelope::CacheBustingEnvelope;
use super::history::{DEFAULT_HISTORY_CAPACITY, PredictionHistory};
use super::models::{ApiResponse, HealthStatus, PredictionRequest, PredictionResult};
use super::stats::RandomnessStats;
use super::transport::{ApiTransport, TransportError};
use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The API answered `success: false`
    #[error("prediction rejected by server: {0}")]
    Rejected(String),

    #[error("a prediction is already in flight")]
    Busy,
}

#[derive(Debug, Clone, Builder)]
pub struct ReliabilitySettings {
    #[builder(default = String::from("/api/predictions"), into)]
    pub predict_path: String,
    #[builder(default = String::from("/api/predictions/force-refresh"), into)]
    pub force_refresh_path: String,
    #[builder(default = String::from("/api/cache/clear"), into)]
    pub cache_clear_path: String,
    #[builder(default = String::from("/api/health"), into)]
    pub health_path: String,
    #[builder(default = 10)]
    pub duplicate_window: usize,
    #[builder(default = 3)]
    pub duplicate_threshold: usize,
    #[builder(default = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,
    #[builder(default = Duration::from_millis(500))]
    pub refresh_delay: Duration,
    #[builder(default = vec![
        String::from("frequency_analysis"),
        String::from("pattern_analysis"),
        String::from("statistical_analysis"),
    ])]
    pub problematic_algorithms: Vec<String>,
    #[builder(default = String::from("2.0"), into)]
    pub envelope_version: String,
}

impl Default for ReliabilitySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&ClientConfig> for ReliabilitySettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            predict_path: config.predict_path.clone(),
            force_refresh_path: config.force_refresh_path.clone(),
            cache_clear_path: config.cache_clear_path.clone(),
            health_path: config.health_path.clone(),
            duplicate_window: config.duplicate_window,
            duplicate_threshold: config.duplicate_threshold,
            history_capacity: config.history_capacity,
            refresh_delay: config.refresh_delay.as_duration(),
            problematic_algorithms: config.problematic_algorithms.clone(),
            envelope_version: config.envelope_version.clone(),
        }
    }
}

/// Result handed back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub request_id: String,
    pub result: PredictionResult,
    /// Algorithms that repeated a recent result (before any refresh)
    pub duplicate_algorithms: usize,
    /// True when `result` came from the forced-refresh path
    pub forced_refresh: bool,
}

#[derive(Debug)]
struct ClientState {
    history: PredictionHistory,
    stats: RandomnessStats,
}

/// Clears the busy flag when the owning call finishes, on every exit path
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Body for prediction requests: request fields plus the envelope, flattened
#[derive(Serialize)]
struct PredictBody<'a> {
    #[serde(flatten)]
    request: &'a PredictionRequest,
    #[serde(flatten)]
    envelope: &'a CacheBustingEnvelope,
}

#[derive(Serialize)]
struct ForceRefreshBody<'a> {
    #[serde(flatten)]
    request: &'a PredictionRequest,
    #[serde(flatten)]
    envelope: &'a CacheBustingEnvelope,
    original_request_id: &'a str,
    force_new_seeds: bool,
    clear_cache: bool,
}

pub struct ReliabilityClient {
    transport: Arc<dyn ApiTransport>,
    settings: ReliabilitySettings,
    state: Mutex<ClientState>,
    busy: AtomicBool,
}

impl ReliabilityClient {
    pub fn new(transport: Arc<dyn ApiTransport>, settings: ReliabilitySettings) -> Self {
        let history = PredictionHistory::new(settings.history_capacity);
        Self {
            transport,
            settings,
            state: Mutex::new(ClientState {
                history,
                stats: RandomnessStats::default(),
            }),
            busy: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ReliabilitySettings {
        &self.settings
    }

    /// Request a prediction, recovering once from a duplicated result set.
    ///
    /// `user_numbers` must be empty or six unique numbers in 1..=45
    /// (see [`super::validate_user_numbers`]); it is not re-checked here.
    pub async fn predict(&self, user_numbers: &[u8]) -> Result<Prediction, ClientError> {
        let _guard = self.try_acquire()?;
        self.state().stats.record_request();

        let request = PredictionRequest::new(user_numbers);
        let envelope = CacheBustingEnvelope::generate(&self.settings.envelope_version, false);

        debug!(
            request_id = %request.request_id,
            seed = envelope.seed,
            numbers = ?request.user_numbers,
            "Requesting prediction"
        );

        let body = serde_json::to_value(PredictBody {
            request: &request,
            envelope: &envelope,
        })
        .map_err(|e| TransportError::Decode(e.to_string()))?;

        let response = self
            .transport
            .post_json(
                &self.settings.predict_path,
                &envelope.base_headers(&request.request_id),
                &body,
            )
            .await?;
        let result = parse_prediction(response)?;

        let duplicates = {
            let mut state = self.state();
            let duplicates = state
                .history
                .count_duplicate_algorithms(&result, self.settings.duplicate_window);

            if duplicates <= self.settings.duplicate_threshold {
                state.history.push(result.clone());
                state.stats.record_unique();
            } else {
                state.stats.record_duplicate();
            }
            duplicates
        };

        if duplicates <= self.settings.duplicate_threshold {
            debug!(
                request_id = %request.request_id,
                algorithms = result.len(),
                duplicates,
                "Prediction accepted"
            );
            return Ok(Prediction {
                request_id: request.request_id,
                result,
                duplicate_algorithms: duplicates,
                forced_refresh: false,
            });
        }

        warn!(
            request_id = %request.request_id,
            duplicates,
            threshold = self.settings.duplicate_threshold,
            "Duplicate prediction detected, forcing refresh"
        );

        let result = self
            .run_forced_refresh(user_numbers, &request.request_id)
            .await?;

        Ok(Prediction {
            request_id: request.request_id,
            result,
            duplicate_algorithms: duplicates,
            forced_refresh: true,
        })
    }

    /// Invalidate server caches and regenerate with fresh seeds.
    ///
    /// Entry point for callers that want a refresh without a prior duplicate;
    /// it counts as a request of its own.
    pub async fn force_refresh_prediction(
        &self,
        user_numbers: &[u8],
        original_request_id: &str,
    ) -> Result<Prediction, ClientError> {
        let _guard = self.try_acquire()?;
        self.state().stats.record_request();

        let result = self
            .run_forced_refresh(user_numbers, original_request_id)
            .await?;

        Ok(Prediction {
            request_id: original_request_id.to_string(),
            result,
            duplicate_algorithms: 0,
            forced_refresh: true,
        })
    }

    /// Cache clear, then delay, then regeneration; strictly in that order.
    /// A failed cache clear does not stop the regeneration.
    async fn run_forced_refresh(
        &self,
        user_numbers: &[u8],
        original_request_id: &str,
    ) -> Result<PredictionResult, ClientError> {
        self.state().stats.record_forced_refresh();

        self.clear_server_cache(original_request_id).await;

        if !self.settings.refresh_delay.is_zero() {
            tokio::time::sleep(self.settings.refresh_delay).await;
        }

        let request = PredictionRequest::new(user_numbers);
        let envelope = CacheBustingEnvelope::generate(&self.settings.envelope_version, true);

        let body = serde_json::to_value(ForceRefreshBody {
            request: &request,
            envelope: &envelope,
            original_request_id,
            force_new_seeds: true,
            clear_cache: true,
        })
        .map_err(|e| TransportError::Decode(e.to_string()))?;

        let response = self
            .transport
            .post_json(
                &self.settings.force_refresh_path,
                &envelope.base_headers(&request.request_id),
                &body,
            )
            .await?;
        let result = parse_prediction(response)?;

        info!(
            original_request_id,
            request_id = %request.request_id,
            algorithms = result.len(),
            "Forced refresh completed"
        );

        Ok(result)
    }

    async fn clear_server_cache(&self, original_request_id: &str) {
        let envelope = CacheBustingEnvelope::generate(&self.settings.envelope_version, true);
        let body = json!({
            "clear_algorithms": self.settings.problematic_algorithms,
            "reason": "duplicate_detection",
        });

        match self
            .transport
            .post_json(
                &self.settings.cache_clear_path,
                &envelope.base_headers(original_request_id),
                &body,
            )
            .await
        {
            Ok(response) if response.get("success").and_then(Value::as_bool) == Some(false) => {
                warn!(original_request_id, "Server refused cache clear, regenerating anyway");
            }
            Ok(_) => {
                debug!(
                    original_request_id,
                    algorithms = ?self.settings.problematic_algorithms,
                    "Server cache cleared"
                );
            }
            Err(e) => {
                warn!(original_request_id, error = %e, "Cache clear failed, regenerating anyway");
            }
        }
    }

    /// Query the API health endpoint
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let request_id = uuid::Uuid::now_v7().to_string();
        let envelope = CacheBustingEnvelope::generate(&self.settings.envelope_version, false);

        let response = self
            .transport
            .get_json(&self.settings.health_path, &envelope.get_headers(&request_id))
            .await?;

        serde_json::from_value(response)
            .map_err(|e| ClientError::Transport(TransportError::Decode(e.to_string())))
    }

    pub fn stats(&self) -> RandomnessStats {
        self.state().stats
    }

    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    /// Snapshot of the accepted results, oldest first
    pub fn history(&self) -> Vec<PredictionResult> {
        let state = self.state();
        state
            .history
            .recent(state.history.capacity())
            .cloned()
            .collect()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Zero the counters and forget the history
    pub fn reset(&self) {
        let mut state = self.state();
        state.stats.reset();
        state.history.clear();
        info!("Randomness stats and history reset");
    }

    fn try_acquire(&self) -> Result<BusyGuard<'_>, ClientError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| ClientError::Busy)
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        // Counters stay meaningful even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_prediction(value: Value) -> Result<PredictionResult, ClientError> {
    let response: ApiResponse<PredictionResult> =
        serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))?;

    if !response.success {
        return Err(ClientError::Rejected(
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    response
        .data
        .ok_or_else(|| TransportError::Decode("response has no data".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};

    /// Records calls in order and replays scripted responses per path
    #[derive(Default)]
    pub(crate) struct MockTransport {
        responses: Mutex<HashMap<String, VecDeque<Result<Value, TransportError>>>>,
        pub calls: Mutex<Vec<(String, String, Value)>>,
    }

    impl MockTransport {
        pub fn respond(&self, path: &str, response: Result<Value, TransportError>) {
            self.responses
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(response);
        }

        pub fn paths(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, path, _)| path.clone())
                .collect()
        }

        fn next(&self, method: &str, path: &str, body: Value) -> Result<Value, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), path.to_string(), body));
            self.responses
                .lock()
                .unwrap()
                .get_mut(path)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(TransportError::Network(format!("nothing scripted for {path}"))))
        }
    }

    #[async_trait]
    impl ApiTransport for MockTransport {
        async fn get_json(
            &self,
            path: &str,
            _headers: &[(String, String)],
        ) -> Result<Value, TransportError> {
            self.next("GET", path, Value::Null)
        }

        async fn post_json(
            &self,
            path: &str,
            _headers: &[(String, String)],
            body: &Value,
        ) -> Result<Value, TransportError> {
            self.next("POST", path, body.clone())
        }
    }

    const PREDICT: &str = "/api/predictions";
    const FORCE: &str = "/api/predictions/force-refresh";
    const CLEAR: &str = "/api/cache/clear";

    pub(crate) fn prediction_body(seed: u8, same_as_base: usize) -> Value {
        let keys = ["frequency", "pattern", "statistical", "neural", "markov"];
        let data: serde_json::Map<String, Value> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let start = if i < same_as_base { 1 + i as u8 } else { seed + i as u8 };
                let numbers: Vec<u8> = (0..6).map(|k| start + k * 6).collect();
                (
                    key.to_string(),
                    json!({
                        "name": key,
                        "confidence_score": 70.0,
                        "priority_numbers": numbers,
                        "description": "",
                    }),
                )
            })
            .collect();

        json!({ "success": true, "data": data })
    }

    fn client(transport: Arc<MockTransport>) -> ReliabilityClient {
        let settings = ReliabilitySettings::builder()
            .refresh_delay(Duration::ZERO)
            .build();
        ReliabilityClient::new(transport, settings)
    }

    #[tokio::test]
    async fn test_unique_prediction_is_recorded() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 0)));

        let client = client(transport.clone());
        let prediction = client.predict(&[]).await.unwrap();

        assert!(!prediction.forced_refresh);
        assert_eq!(prediction.duplicate_algorithms, 0);
        assert_eq!(prediction.result.len(), 5);
        assert_eq!(client.history_len(), 1);

        let stats = client.stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.unique_results, 1);
        assert_eq!(stats.forced_refreshes, 0);
        assert_eq!(transport.paths(), vec![PREDICT]);
    }

    #[tokio::test]
    async fn test_request_body_carries_numbers_and_envelope() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 0)));

        let client = client(transport.clone());
        client.predict(&[1, 7, 13, 25, 31, 42]).await.unwrap();

        let calls = transport.calls.lock().unwrap();
        let body = &calls[0].2;
        assert_eq!(body["user_numbers"], json!([1, 7, 13, 25, 31, 42]));
        assert_eq!(body["force_refresh"], false);
        assert_eq!(body["version"], "2.0");
        assert!(body["seed"].is_u64());
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_triggers_clear_then_force_refresh() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 5)));
        transport.respond(PREDICT, Ok(prediction_body(3, 4)));
        transport.respond(CLEAR, Ok(json!({"success": true})));
        transport.respond(FORCE, Ok(prediction_body(4, 0)));

        let client = client(transport.clone());
        client.predict(&[1, 7, 13, 25, 31, 42]).await.unwrap();
        let prediction = client.predict(&[1, 7, 13, 25, 31, 42]).await.unwrap();

        assert!(prediction.forced_refresh);
        assert_eq!(prediction.duplicate_algorithms, 4);
        assert_eq!(
            serde_json::to_value(&prediction.result).unwrap(),
            prediction_body(4, 0)["data"]
        );

        assert_eq!(transport.paths(), vec![PREDICT, PREDICT, CLEAR, FORCE]);

        let stats = client.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.duplicate_detections, 1);
        assert_eq!(stats.forced_refreshes, 1);
        assert_eq!(stats.unique_results, 1);
        // The duplicated result never lands in history
        assert_eq!(client.history_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regeneration_waits_for_refresh_delay() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(CLEAR, Ok(json!({"success": true})));
        transport.respond(FORCE, Ok(prediction_body(4, 0)));

        let client = Arc::new(ReliabilityClient::new(
            transport.clone(),
            ReliabilitySettings::default(),
        ));
        assert_eq!(client.settings().refresh_delay, Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        let task = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.force_refresh_prediction(&[], "req-delay").await }
        });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(transport.paths(), vec![CLEAR]);
        assert!(client.is_busy());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let prediction = task.await.unwrap().unwrap();

        assert!(prediction.forced_refresh);
        assert_eq!(transport.paths(), vec![CLEAR, FORCE]);
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_force_refresh_request_shape() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(CLEAR, Ok(json!({"success": true})));
        transport.respond(FORCE, Ok(prediction_body(4, 0)));

        let client = client(transport.clone());
        client
            .force_refresh_prediction(&[1, 2, 3, 4, 5, 6], "req-original")
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        let clear_body = &calls[0].2;
        assert_eq!(
            clear_body["clear_algorithms"],
            json!(["frequency_analysis", "pattern_analysis", "statistical_analysis"])
        );
        assert!(clear_body["reason"].is_string());

        let force_body = &calls[1].2;
        assert_eq!(force_body["force_new_seeds"], true);
        assert_eq!(force_body["clear_cache"], true);
        assert_eq!(force_body["force_refresh"], true);
        assert_eq!(force_body["original_request_id"], "req-original");
        assert_eq!(force_body["user_numbers"], json!([1, 2, 3, 4, 5, 6]));

        let stats = client.stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.forced_refreshes, 1);
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 5)));
        transport.respond(PREDICT, Ok(prediction_body(3, 3)));

        let client = client(transport.clone());
        client.predict(&[]).await.unwrap();
        let prediction = client.predict(&[]).await.unwrap();

        // Exactly three repeats is incidental overlap, not a stuck generator
        assert!(!prediction.forced_refresh);
        assert_eq!(prediction.duplicate_algorithms, 3);
        assert_eq!(client.history_len(), 2);
        assert_eq!(transport.paths(), vec![PREDICT, PREDICT]);
    }

    #[tokio::test]
    async fn test_cache_clear_failure_does_not_abort_refresh() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 5)));
        transport.respond(PREDICT, Ok(prediction_body(2, 5)));
        transport.respond(
            CLEAR,
            Err(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        );
        transport.respond(FORCE, Ok(prediction_body(9, 0)));

        let client = client(transport.clone());
        client.predict(&[]).await.unwrap();
        let prediction = client.predict(&[]).await.unwrap();

        assert!(prediction.forced_refresh);
        assert_eq!(transport.paths(), vec![PREDICT, PREDICT, CLEAR, FORCE]);
    }

    #[tokio::test]
    async fn test_force_refresh_failure_propagates() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 5)));
        transport.respond(PREDICT, Ok(prediction_body(2, 5)));
        transport.respond(CLEAR, Ok(json!({"success": true})));
        transport.respond(
            FORCE,
            Err(TransportError::Status {
                status: 502,
                body: String::new(),
            }),
        );

        let client = client(transport.clone());
        client.predict(&[]).await.unwrap();
        let err = client.predict(&[]).await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Transport(TransportError::Status { status: 502, .. })
        ));
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_transport_error_leaves_history_untouched() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Err(TransportError::Network("connection reset".into())));

        let client = client(transport.clone());
        let err = client.predict(&[]).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(TransportError::Network(_))));
        assert_eq!(client.history_len(), 0);
        assert_eq!(client.stats().total_requests, 1);
        assert_eq!(client.stats().unique_results, 0);
        assert_eq!(transport.paths(), vec![PREDICT]);
    }

    #[tokio::test]
    async fn test_rejected_response() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(json!({"success": false, "error": "models warming up"})));

        let client = client(transport);
        let err = client.predict(&[]).await.unwrap_err();

        assert!(matches!(err, ClientError::Rejected(msg) if msg == "models warming up"));
    }

    #[tokio::test]
    async fn test_busy_flag_rejects_overlapping_calls() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 0)));

        let client = client(transport.clone());
        {
            let _in_flight = client.try_acquire().unwrap();
            assert!(client.is_busy());
            assert!(matches!(client.predict(&[]).await, Err(ClientError::Busy)));
            assert!(matches!(
                client.force_refresh_prediction(&[], "x").await,
                Err(ClientError::Busy)
            ));
        }

        assert!(!client.is_busy());
        assert!(client.predict(&[]).await.is_ok());
        // Rejected calls never reached the network or the counters
        assert_eq!(client.stats().total_requests, 1);
        assert_eq!(transport.paths(), vec![PREDICT]);
    }

    #[tokio::test]
    async fn test_history_capped_and_counters_bounded() {
        let transport = Arc::new(MockTransport::default());
        for seed in 0..25u8 {
            transport.respond(PREDICT, Ok(prediction_body(seed + 10, 0)));
        }

        let client = client(transport);
        for _ in 0..25 {
            client.predict(&[]).await.unwrap();
            let stats = client.stats();
            assert!(stats.forced_refreshes <= stats.total_requests);
            assert!(stats.duplicate_detections <= stats.total_requests);
        }

        assert_eq!(client.history_len(), 20);
        assert_eq!(client.stats().total_requests, 25);
    }

    #[tokio::test]
    async fn test_reset_clears_stats_and_history() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(PREDICT, Ok(prediction_body(2, 0)));

        let client = client(transport);
        client.predict(&[]).await.unwrap();
        client.reset();

        assert_eq!(client.stats(), RandomnessStats::default());
        assert_eq!(client.history_len(), 0);
        assert!(client.history().is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let transport = Arc::new(MockTransport::default());
        transport.respond("/api/health", Ok(json!({"status": "healthy", "uptime": 12})));

        let client = client(transport);
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = ClientConfig::default();
        config.duplicate_threshold = 4;
        config.problematic_algorithms = vec!["markov".to_string()];

        let settings = ReliabilitySettings::from(&config);
        assert_eq!(settings.duplicate_threshold, 4);
        assert_eq!(settings.duplicate_window, 10);
        assert_eq!(settings.refresh_delay, Duration::from_millis(500));
        assert_eq!(settings.problematic_algorithms, vec!["markov"]);
    }

    #[test]
    fn test_settings_defaults_match_config_defaults() {
        let from_builder = ReliabilitySettings::default();
        let from_config = ReliabilitySettings::from(&ClientConfig::default());

        assert_eq!(from_builder.predict_path, from_config.predict_path);
        assert_eq!(from_builder.duplicate_window, from_config.duplicate_window);
        assert_eq!(from_builder.duplicate_threshold, from_config.duplicate_threshold);
        assert_eq!(from_builder.refresh_delay, from_config.refresh_delay);
        assert_eq!(
            from_builder.problematic_algorithms,
            from_config.problematic_algorithms
        );
    }
}
