//! Metrics and tracing setup

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Counters for the offline cache, exposed at `/_offline/metrics`
#[derive(Debug, Default)]
pub struct Metrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    stale_served: AtomicU64,
    network_fetches: AtomicU64,
    network_failures: AtomicU64,
    fallbacks: AtomicU64,
    passthroughs: AtomicU64,
    storage_failures: AtomicU64,
    revalidations: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "cache_hits", "Metric incremented");
    }

    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "cache_misses", "Metric incremented");
    }

    pub fn stale_served(&self) {
        self.stale_served.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "stale_served", "Metric incremented");
    }

    pub fn network_fetch(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "network_fetches", "Metric incremented");
    }

    pub fn network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "network_failures", "Metric incremented");
    }

    pub fn fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fallbacks", "Metric incremented");
    }

    pub fn passthrough(&self) {
        self.passthroughs.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "passthroughs", "Metric incremented");
    }

    pub fn storage_failure(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "storage_failures", "Metric incremented");
    }

    pub fn revalidation(&self) {
        self.revalidations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "revalidations", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            passthroughs: self.passthroughs.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub stale_served: u64,
    pub network_fetches: u64,
    pub network_failures: u64,
    pub fallbacks: u64,
    pub passthroughs: u64,
    pub storage_failures: u64,
    pub revalidations: u64,
}

/// Install the global fmt subscriber; `RUST_LOG` overrides `default_filter`
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
