use axum::http::Method;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::classify::{Classifier, RequestClass, cache_key};
use super::entry::{CachedResponse, partition_name, partition_version};
use super::fallback::{accepts_html, api_fallback, offline_page, unavailable};
use super::messages::{ControlMessage, ControlReply};
use super::store::CacheStore;
use super::upstream::{NetworkError, ProxyRequest, Upstream};
use crate::config::OfflineConfig;
use crate::observability::Metrics;

/// Response header naming where the body came from
pub const CACHE_STATUS_HEADER: &str = "x-offline-cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    /// Installed but not yet serving from cache
    Waiting,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Network,
    Hit,
    Stale,
    Fallback,
    Passthrough,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Network => "network",
            CacheStatus::Hit => "hit",
            CacheStatus::Stale => "stale",
            CacheStatus::Fallback => "fallback",
            CacheStatus::Passthrough => "passthrough",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OfflineResponse {
    pub response: CachedResponse,
    pub cache: CacheStatus,
}

impl OfflineResponse {
    fn new(response: CachedResponse, cache: CacheStatus) -> Self {
        Self { response, cache }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrecacheReport {
    pub stored: Vec<String>,
    pub failed: Vec<String>,
}

/// Store access where failures are logged, counted and read as misses
#[derive(Clone)]
struct CacheWriter {
    store: Arc<dyn CacheStore>,
    metrics: Arc<Metrics>,
    max_entry_bytes: usize,
}

impl CacheWriter {
    async fn read(&self, partition: &str, key: &str) -> Option<CachedResponse> {
        match self.store.get(partition, key).await {
            Ok(entry) => entry,
            Err(e) => {
                self.metrics.storage_failure();
                warn!(partition, key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a 2xx response within the size limit; returns whether it was written
    async fn write(&self, partition: &str, key: &str, response: &CachedResponse) -> bool {
        if !response.is_success() {
            return false;
        }

        if response.body.len() > self.max_entry_bytes {
            debug!(
                partition,
                key,
                size = response.body.len(),
                limit = self.max_entry_bytes,
                "Response too large to cache"
            );
            return false;
        }

        match self.store.put(partition, key, &response.stamped()).await {
            Ok(()) => true,
            Err(e) => {
                self.metrics.storage_failure();
                warn!(partition, key, error = %e, "Cache write failed");
                false
            }
        }
    }
}

/// Caching reverse proxy: per-class strategies, offline fallbacks and the
/// install / activate lifecycle of one cache generation
pub struct OfflineService {
    config: OfflineConfig,
    classifier: Classifier,
    cache: CacheWriter,
    upstream: Arc<dyn Upstream>,
    state: RwLock<LifecycleState>,
    revalidations: Mutex<JoinSet<()>>,
}

impl OfflineService {
    pub fn new(
        config: OfflineConfig,
        store: Arc<dyn CacheStore>,
        upstream: Arc<dyn Upstream>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let cache = CacheWriter {
            store,
            metrics,
            max_entry_bytes: config.max_entry_bytes.as_usize(),
        };

        Self {
            classifier: Classifier::from_config(&config),
            config,
            cache,
            upstream,
            state: RwLock::new(LifecycleState::Installing),
            revalidations: Mutex::new(JoinSet::new()),
        }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.cache.metrics
    }

    pub fn partition(&self, class: RequestClass) -> String {
        partition_name(&self.config.partition_prefix, class, &self.config.version)
    }

    /// Precache the manifest, then activate unless configured to wait
    pub async fn install(&self) -> PrecacheReport {
        self.set_state(LifecycleState::Installing);
        let mut report = PrecacheReport::default();

        for url in &self.config.precache {
            let partition = self.partition(self.classifier.classify(url));
            let key = cache_key(Method::GET.as_str(), url);

            let stored = match self.fetch(&ProxyRequest::get(url)).await {
                Ok(response) => {
                    let stored = self.cache.write(&partition, &key, &response).await;
                    if !stored {
                        warn!(url = %url, status = response.status, "Precache entry not stored");
                    }
                    stored
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Precache fetch failed");
                    false
                }
            };

            if stored {
                report.stored.push(url.clone());
            } else {
                report.failed.push(url.clone());
            }
        }

        info!(
            version = %self.config.version,
            stored = report.stored.len(),
            failed = report.failed.len(),
            "Precache complete"
        );

        self.set_state(LifecycleState::Waiting);
        if !self.config.wait_for_activation {
            self.activate().await;
        }

        report
    }

    /// Drop older generations and start serving from cache
    pub async fn activate(&self) -> Vec<String> {
        let removed = self.sweep().await;
        self.set_state(LifecycleState::Active);
        info!(version = %self.config.version, removed = removed.len(), "Offline cache active");
        removed
    }

    /// Remove partitions of ours whose version differs from the current one
    pub async fn sweep(&self) -> Vec<String> {
        let current = self.config.version.as_str();
        self.drop_partitions(|version| version != current).await
    }

    /// Remove every partition of ours, current generation included
    pub async fn clear_all(&self) -> Vec<String> {
        self.drop_partitions(|_| true).await
    }

    async fn drop_partitions(&self, mut matches: impl FnMut(&str) -> bool) -> Vec<String> {
        let partitions = match self.cache.store.partitions().await {
            Ok(partitions) => partitions,
            Err(e) => {
                self.cache.metrics.storage_failure();
                warn!(error = %e, "Failed to list cache partitions");
                return Vec::new();
            }
        };

        let mut dropped = Vec::new();
        for name in partitions {
            let Some(version) = partition_version(&name, &self.config.partition_prefix) else {
                continue;
            };
            if !matches(version) {
                continue;
            }

            match self.cache.store.drop_partition(&name).await {
                Ok(()) => dropped.push(name),
                Err(e) => {
                    self.cache.metrics.storage_failure();
                    warn!(partition = %name, error = %e, "Failed to drop cache partition");
                }
            }
        }

        dropped
    }

    /// Run [`OfflineService::sweep`] every `sweep_interval`
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = self.config.sweep_interval.as_duration();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = service.sweep().await;
                if !removed.is_empty() {
                    info!(removed = ?removed, "Periodic sweep removed old partitions");
                }
            }
        })
    }

    pub async fn handle_message(&self, message: ControlMessage) -> ControlReply {
        debug!(?message, "Control message received");

        match message {
            ControlMessage::GetVersion => ControlReply::Version {
                version: self.config.version.clone(),
            },
            ControlMessage::ClearCache => ControlReply::Cleared {
                cleared: self.clear_all().await,
            },
            ControlMessage::SkipWaiting => {
                if self.state() != LifecycleState::Active {
                    self.activate().await;
                }
                ControlReply::State {
                    state: self.state(),
                }
            }
            ControlMessage::SyncData { payload, cache_key } => {
                self.sync_data(payload, cache_key).await
            }
        }
    }

    /// Push queued data to the origin, then invalidate the API entry it changes
    async fn sync_data(&self, payload: Value, target: Option<String>) -> ControlReply {
        let request = ProxyRequest {
            method: Method::POST,
            path_and_query: self.config.sync_path.clone(),
            headers: vec![(
                "content-type".to_string(),
                mime::APPLICATION_JSON.to_string(),
            )],
            body: Bytes::from(payload.to_string()),
        };

        let synced = match self.fetch(&request).await {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                warn!(status = response.status, "Sync rejected by origin");
                false
            }
            Err(e) => {
                warn!(error = %e, "Sync failed");
                false
            }
        };

        if !synced {
            return ControlReply::Synced {
                synced: false,
                invalidated: false,
            };
        }

        let target = target.unwrap_or_else(|| self.config.sync_invalidate.clone());
        let key = cache_key(Method::GET.as_str(), &target);
        let invalidated = match self
            .cache
            .store
            .remove(&self.partition(RequestClass::Api), &key)
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                self.cache.metrics.storage_failure();
                warn!(key = %key, error = %e, "Failed to invalidate synced entry");
                false
            }
        };

        info!(key = %key, invalidated, "Data synced");
        ControlReply::Synced {
            synced: true,
            invalidated,
        }
    }

    /// Answer a request. Never fails: the worst case is a fallback response.
    pub async fn handle(&self, request: &ProxyRequest) -> OfflineResponse {
        if request.method != Method::GET || self.state() != LifecycleState::Active {
            return self.pass_through(request).await;
        }

        let class = self.classifier.classify(&request.path_and_query);
        let partition = self.partition(class);
        let key = cache_key(request.method.as_str(), &request.path_and_query);

        debug!(path = %request.path_and_query, class = class.as_str(), "Handling request");

        match class {
            RequestClass::Static => self.cache_first(request, &partition, &key).await,
            RequestClass::Api => self.network_first(request, &partition, &key).await,
            RequestClass::Dynamic => self.stale_while_revalidate(request, &partition, &key).await,
        }
    }

    async fn cache_first(&self, request: &ProxyRequest, partition: &str, key: &str) -> OfflineResponse {
        if let Some(entry) = self.cache.read(partition, key).await {
            self.cache.metrics.cache_hit();
            return OfflineResponse::new(entry, CacheStatus::Hit);
        }
        self.cache.metrics.cache_miss();

        match self.fetch(request).await {
            Ok(response) => {
                self.cache.write(partition, key, &response).await;
                OfflineResponse::new(response, CacheStatus::Network)
            }
            Err(_) => self.fallback(request, RequestClass::Static),
        }
    }

    async fn network_first(&self, request: &ProxyRequest, partition: &str, key: &str) -> OfflineResponse {
        match self.fetch(request).await {
            Ok(response) => {
                self.cache.write(partition, key, &response).await;
                OfflineResponse::new(response, CacheStatus::Network)
            }
            Err(_) => match self.cache.read(partition, key).await {
                Some(entry) => {
                    self.cache.metrics.cache_hit();
                    debug!(key, "Origin unreachable, serving cached API response");
                    OfflineResponse::new(entry, CacheStatus::Hit)
                }
                None => {
                    self.cache.metrics.cache_miss();
                    self.fallback(request, RequestClass::Api)
                }
            },
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: &ProxyRequest,
        partition: &str,
        key: &str,
    ) -> OfflineResponse {
        if let Some(entry) = self.cache.read(partition, key).await {
            self.cache.metrics.stale_served();
            self.spawn_revalidation(request.clone(), partition.to_string(), key.to_string())
                .await;
            return OfflineResponse::new(entry, CacheStatus::Stale);
        }
        self.cache.metrics.cache_miss();

        match self.fetch(request).await {
            Ok(response) => {
                self.cache.write(partition, key, &response).await;
                OfflineResponse::new(response, CacheStatus::Network)
            }
            Err(_) => self.fallback(request, RequestClass::Dynamic),
        }
    }

    async fn spawn_revalidation(&self, request: ProxyRequest, partition: String, key: String) {
        let cache = self.cache.clone();
        let upstream = Arc::clone(&self.upstream);

        let mut tasks = self.revalidations.lock().await;
        // Reap finished refreshes so the set does not grow unbounded
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            cache.metrics.revalidation();
            cache.metrics.network_fetch();
            match upstream.fetch(&request).await {
                Ok(fresh) => {
                    if cache.write(&partition, &key, &fresh).await {
                        debug!(key = %key, "Revalidated cache entry");
                    }
                }
                Err(e) => {
                    cache.metrics.network_failure();
                    debug!(key = %key, error = %e, "Background revalidation failed");
                }
            }
        });
    }

    /// Wait for every in-flight background revalidation
    pub async fn settle(&self) {
        let mut tasks = std::mem::take(&mut *self.revalidations.lock().await);
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Revalidation task failed");
            }
        }
    }

    async fn pass_through(&self, request: &ProxyRequest) -> OfflineResponse {
        self.cache.metrics.passthrough();

        match self.fetch(request).await {
            Ok(response) => OfflineResponse::new(response, CacheStatus::Passthrough),
            Err(_) => self.fallback(request, self.classifier.classify(&request.path_and_query)),
        }
    }

    async fn fetch(&self, request: &ProxyRequest) -> Result<CachedResponse, NetworkError> {
        self.cache.metrics.network_fetch();
        self.upstream.fetch(request).await.inspect_err(|e| {
            self.cache.metrics.network_failure();
            debug!(path = %request.path_and_query, error = %e, "Origin fetch failed");
        })
    }

    fn fallback(&self, request: &ProxyRequest, class: RequestClass) -> OfflineResponse {
        self.cache.metrics.fallback();

        // API callers always get JSON, even when they also accept HTML
        let response = if class == RequestClass::Api {
            api_fallback(&request.path_and_query)
        } else if accepts_html(request.header("accept")) {
            offline_page()
        } else {
            unavailable()
        };

        OfflineResponse::new(response, CacheStatus::Fallback)
    }
}
