//! Cache store contract and the in-memory implementation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::types::ItemId;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Stored identifier list with its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: Vec<ItemId>,
    pub expires_at: OffsetDateTime,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live entry for `key`; expired entries read as `None`.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Overwrites `key` with `value` for `ttl`.
    async fn set(&self, key: &CacheKey, value: Vec<ItemId>, ttl: Duration)
    -> Result<(), CacheError>;
}

pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(OffsetDateTime::now_utc)
}

/// Process-local cache store with LRU-bounded capacity and passive expiry.
pub struct InMemoryCacheStore {
    entries: RwLock<LruCache<CacheKey, CacheEntry>>,
    clock: Clock,
}

impl InMemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    pub fn with_clock(config: &CacheConfig, clock: Clock) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            clock,
        }
    }

    fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let now = self.now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .cloned())
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Vec<ItemId>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let ttl = time::Duration::try_from(ttl).map_err(CacheError::unavailable)?;
        let expires_at = self
            .now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::unavailable("expiry instant overflows"))?;

        let entry = CacheEntry {
            key: key.clone(),
            value,
            expires_at,
        };

        let displaced = rw_write(&self.entries, SOURCE, "set").push(key.clone(), entry);
        if let Some((evicted, _)) = displaced.filter(|(evicted, _)| evicted != key) {
            debug!(evicted = %evicted, "Evicted least recently used cache entry");
        }
        Ok(())
    }
}
