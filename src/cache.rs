use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use lru::LruCache;
use tokio::sync::Mutex;
use crate::config::CacheConfig;
use crate::error::{ArchaeologistError, Result};

/// A bounded in-memory cache with per-entry expiry
///
/// Holds at most `capacity` entries; inserting into a full cache evicts the
/// least recently used one. Entries older than the TTL are treated as absent.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    store: Arc<Mutex<LruCache<String, (T, Instant)>>>,
    ttl: Duration,
}

impl<T: Clone + Send + 'static> Cache<T> {
    /// Creates a cache holding up to `capacity` entries for `ttl` each
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| ArchaeologistError::Config("cache capacity must be at least 1".into()))?;
        Ok(Self {
            store: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        })
    }

    /// Creates a cache from the cache section of the configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.capacity, config.ttl())
    }

    /// Retrieves a live value and marks it as recently used
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut store = self.store.lock().await;
        let expired = match store.get(key) {
            Some((value, time)) if time.elapsed() < self.ttl => return Some(value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            store.pop(key);
        }
        None
    }

    /// Stores a value, replacing any previous one under `key`
    pub async fn set(&self, key: &str, value: T) {
        let mut store = self.store.lock().await;
        store.put(key.to_string(), (value, Instant::now()));
    }

    /// Returns the number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Removes expired entries and returns how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.lock().await;
        let expired: Vec<String> = store
            .iter()
            .filter(|(_, (_, time))| time.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            store.pop(key);
        }
        expired.len()
    }
}
