/*!
 * Cache service shared by the shielder and the provider client.
 *
 * The cache is an injected dependency rather than process-global state.
 * Every backend implements `CacheService`; callers treat any
 * `CacheUnavailable` error as a miss, so a broken cache only costs
 * provider calls, never correctness.
 */

use async_trait::async_trait;
use log::warn;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::errors::TranslationError;

pub mod memory;

pub use memory::MemoryCache;

/// Keyed store with per-entry time-to-live
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Fetch a live entry
    async fn get(&self, key: &str) -> Result<Option<String>, TranslationError>;

    /// Insert or overwrite an entry that expires after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError>;

    /// Remove an entry; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), TranslationError>;
}

/// Read from the cache, degrading any backend failure to a miss
pub async fn get_or_miss(cache: &dyn CacheService, key: &str) -> Option<String> {
    match cache.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Cache read failed for {}: {}", key, e);
            None
        }
    }
}

/// Write to the cache, logging and ignoring backend failures
pub async fn set_or_ignore(cache: &dyn CacheService, key: &str, value: &str, ttl: Duration) {
    if let Err(e) = cache.set(key, value, ttl).await {
        warn!("Cache write failed for {}: {}", key, e);
    }
}

/// Delete from the cache, logging and ignoring backend failures
pub async fn delete_or_ignore(cache: &dyn CacheService, key: &str) {
    if let Err(e) = cache.delete(key).await {
        warn!("Cache delete failed for {}: {}", key, e);
    }
}

/// Compute the hex SHA-256 digest of a text
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Key for a cached provider translation: `translation:<sha256>:<source>:<target>`
pub fn translation_key(text: &str, source: &str, target: &str) -> String {
    format!("translation:{}:{}:{}", hash_text(text), source, target)
}

/// Key for a shielded fragment: `shield:<token>`
pub fn shield_key(token: &str) -> String {
    format!("shield:{}", token)
}
