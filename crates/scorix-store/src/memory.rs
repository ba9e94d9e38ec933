//! In-memory store backend.
//!
//! Used by tests and local runs that have no Redis at hand. Semantics
//! match the Redis backend: durable primary entries, cache entries that
//! expire after the configured TTL, `cache_get` falling through to the
//! primary on a miss.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::traits::Store;

#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    stored_at: Instant,
    ttl: Duration,
}

impl CachedEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// DashMap-backed store with lazy TTL expiry on the cache partition.
///
/// `set_available(false)` makes every operation fail with a connection
/// error, so tests can exercise the internal-error path without a real
/// network outage.
pub struct MemoryStore {
    primary: DashMap<String, String>,
    cache: DashMap<String, CachedEntry>,
    ttl: Duration,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            primary: DashMap::new(),
            cache: DashMap::new(),
            ttl,
            available: AtomicBool::new(true),
        }
    }

    /// Toggle the simulated connection state.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    fn probe(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::connection("memory store marked unavailable"))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<String, StoreError> {
        self.probe()?;
        self.primary
            .get(key)
            .map(|entry| entry.clone())
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.probe()?;
        self.primary.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<usize, StoreError> {
        self.probe()?;
        Ok(self.primary.remove(key).map_or(0, |_| 1))
    }

    async fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.probe()?;
        if let Some(entry) = self.cache.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.cache.remove(key);
        }
        Ok(self.primary.get(key).map(|entry| entry.clone()))
    }

    async fn cache_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.probe()?;
        self.cache.insert(
            key.to_string(),
            CachedEntry {
                value: value.to_string(),
                stored_at: Instant::now(),
                ttl: self.ttl,
            },
        );
        Ok(())
    }
}
