//! Offline cache: a caching reverse proxy in front of the prediction site
//!
//! Every GET is classified by path and answered with the strategy for its
//! class:
//!
//! - Static assets: cache-first, never revalidated
//! - API calls: network-first, falling back to the last good response
//! - Everything else: stale-while-revalidate
//!
//! When neither origin nor cache can answer, a synthesized fallback is
//! returned (offline HTML page, `offline: true` JSON, or a 503 text body).
//! Store failures count as misses, so every request gets a response.
//!
//! ## Generations
//!
//! Entries live in partitions named `{prefix}-{kind}-{version}`. `install()`
//! fills the current generation from the precache manifest, `activate()`
//! drops every older generation of the same prefix.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lottobox::offline::{HttpUpstream, OfflineService, open_store};
//!
//! let store = open_store(&config.offline.store)?;
//! let upstream = Arc::new(HttpUpstream::new(&config.offline.upstream, http_config)?);
//! let service = OfflineService::new(config.offline.clone(), store, upstream, metrics);
//! service.install().await;
//! let answer = service.handle(&ProxyRequest::get("/static/css/style.css")).await;
//! ```

pub mod classify;
pub mod entry;
pub mod fallback;
pub mod messages;
pub mod service;
pub mod store;
pub mod upstream;

pub use classify::{Classifier, RequestClass, cache_key};
pub use entry::CachedResponse;
pub use messages::{ControlMessage, ControlReply};
pub use service::{
    CACHE_STATUS_HEADER, CacheStatus, LifecycleState, OfflineResponse, OfflineService,
    PrecacheReport,
};
pub use store::{CacheStore, FjallCacheStore, ObjectCacheStore, StoreError, open_store};
pub use upstream::{HttpUpstream, NetworkError, ProxyRequest, Upstream};
