/*!
 * In-process cache backend.
 *
 * Entries live in a map guarded by a `parking_lot` lock and carry their own
 * expiry instant. Expired entries are invisible to readers and are dropped
 * lazily on access or by `purge_expired`.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::CacheService;
use crate::errors::TranslationError;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Memory-backed cache for translations and shielded fragments
#[derive(Clone, Default)]
pub struct MemoryCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Number of entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Remove `key` if its entry was already expired at `now`.
    ///
    /// The check runs under the write lock, so an entry stored after `now`
    /// by a concurrent `set` survives.
    fn remove_if_expired(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            true
        } else {
            false
        }
    }

    /// Clear the cache and reset statistics
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Memory cache cleared");
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        let now = Instant::now();

        let found = {
            let entries = self.entries.read();
            entries.get(key).map(|entry| (entry.is_expired(now), entry.value.clone()))
        };

        match found {
            Some((false, value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {}", key);
                Ok(Some(value))
            }
            Some((true, _)) => {
                self.remove_if_expired(key, now);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache entry expired for {}", key);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError> {
        self.entries.write().insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), TranslationError> {
        self.entries.write().remove(key);
        Ok(())
    }
}
