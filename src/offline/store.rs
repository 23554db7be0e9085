//! Partitioned response stores
//!
//! Two backends share the [`CacheStore`] trait:
//!
//! - [`FjallCacheStore`]: durable, one fjall partition per cache partition
//! - [`ObjectCacheStore`]: `object_store` backed, in-memory by default
//!
//! Layout: `{partition}` -> `"{METHOD} {path?query}"` -> [`CachedResponse`] (protobuf)

use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use object_store::{ObjectStore, PutPayload, path::Path as StoragePath};
use prost::Message;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use super::entry::CachedResponse;
use crate::config::{StoreBackend, StoreConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Corrupt cache entry: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>>;

    async fn put(&self, partition: &str, key: &str, entry: &CachedResponse) -> Result<()>;

    /// Returns whether an entry was present
    async fn remove(&self, partition: &str, key: &str) -> Result<bool>;

    /// Names of every partition currently holding data
    async fn partitions(&self) -> Result<Vec<String>>;

    async fn drop_partition(&self, partition: &str) -> Result<()>;
}

/// Build the backend named in config
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn CacheStore>> {
    match config.backend {
        StoreBackend::Fjall => Ok(Arc::new(FjallCacheStore::open(&config.path)?)),
        StoreBackend::Memory => Ok(Arc::new(ObjectCacheStore::in_memory())),
    }
}

/// Fjall-backed persistent store
pub struct FjallCacheStore {
    keyspace: Keyspace,
    handles: RwLock<HashMap<String, PartitionHandle>>,
}

impl FjallCacheStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening offline cache at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        Ok(Self {
            keyspace,
            handles: RwLock::new(HashMap::new()),
        })
    }

    /// Handle for `name`; only created when `create` is set
    fn partition(&self, name: &str, create: bool) -> Result<Option<PartitionHandle>> {
        if let Some(handle) = self
            .handles
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return Ok(Some(handle.clone()));
        }

        if !create && !self.keyspace.partition_exists(name) {
            return Ok(None);
        }

        let handle = self
            .keyspace
            .open_partition(name, PartitionCreateOptions::default())?;
        self.handles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), handle.clone());
        Ok(Some(handle))
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FjallCacheStore {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>> {
        let Some(handle) = self.partition(partition, false)? else {
            return Ok(None);
        };

        match handle.get(key)? {
            Some(value) => Ok(Some(CachedResponse::decode(value.as_ref())?)),
            None => Ok(None),
        }
    }

    async fn put(&self, partition: &str, key: &str, entry: &CachedResponse) -> Result<()> {
        if let Some(handle) = self.partition(partition, true)? {
            handle.insert(key.as_bytes(), entry.encode_to_vec())?;
            debug!(partition, key, size = entry.body.len(), "Stored cache entry");
        }
        Ok(())
    }

    async fn remove(&self, partition: &str, key: &str) -> Result<bool> {
        let Some(handle) = self.partition(partition, false)? else {
            return Ok(false);
        };

        let existed = handle.contains_key(key)?;
        if existed {
            handle.remove(key.as_bytes())?;
        }
        Ok(existed)
    }

    async fn partitions(&self) -> Result<Vec<String>> {
        Ok(self
            .keyspace
            .list_partitions()
            .iter()
            .map(|name| name.to_string())
            .collect())
    }

    async fn drop_partition(&self, partition: &str) -> Result<()> {
        let cached = self
            .handles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(partition);

        let handle = match cached {
            Some(handle) => handle,
            None if self.keyspace.partition_exists(partition) => self
                .keyspace
                .open_partition(partition, PartitionCreateOptions::default())?,
            None => return Ok(()),
        };

        self.keyspace.delete_partition(handle)?;
        info!(partition, "Dropped cache partition");
        Ok(())
    }
}

/// `object_store` backed store, objects at `{partition}/{hex(key)}`
#[derive(Clone)]
pub struct ObjectCacheStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectCacheStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// In-memory store for testing/development
    pub fn in_memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    fn object_path(partition: &str, key: &str) -> StoragePath {
        // Keys contain spaces, '?' and '/', none of which belong in a path segment
        let encoded: String = key.bytes().map(|b| format!("{b:02x}")).collect();
        StoragePath::from_iter([partition, encoded.as_str()])
    }
}

#[async_trait]
impl CacheStore for ObjectCacheStore {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>> {
        let path = Self::object_path(partition, key);

        match self.store.get(&path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(CachedResponse::decode(bytes)?))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, partition: &str, key: &str, entry: &CachedResponse) -> Result<()> {
        let path = Self::object_path(partition, key);
        self.store
            .put(&path, PutPayload::from(entry.encode_to_vec()))
            .await?;
        debug!(partition, key, size = entry.body.len(), "Stored cache entry");
        Ok(())
    }

    async fn remove(&self, partition: &str, key: &str) -> Result<bool> {
        let path = Self::object_path(partition, key);

        match self.store.head(&path).await {
            Ok(_) => {
                self.store.delete(&path).await?;
                Ok(true)
            }
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn partitions(&self) -> Result<Vec<String>> {
        let listing = self.store.list_with_delimiter(None).await?;
        Ok(listing
            .common_prefixes
            .iter()
            .map(|prefix| prefix.as_ref().to_string())
            .collect())
    }

    async fn drop_partition(&self, partition: &str) -> Result<()> {
        let prefix = StoragePath::from(partition);
        let listing = self.store.list_with_delimiter(Some(&prefix)).await?;

        for object in &listing.objects {
            self.store.delete(&object.location).await?;
        }

        info!(partition, removed = listing.objects.len(), "Dropped cache partition");
        Ok(())
    }
}
