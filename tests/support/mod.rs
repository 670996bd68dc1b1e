#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use content_digest::application::listing::{FilteredListCache, HitPolicy, ListingCacheConfig};
use content_digest::application::repos::{
    Catalog, CatalogError, CategoryScope, IdPage, ItemQuery,
};
use content_digest::cache::{CacheEntry, CacheError, CacheKey, CacheStore};
use content_digest::domain::entities::ContentTypeRecord;
use content_digest::domain::listing::{HourRange, ListFilter};
use content_digest::domain::types::{ContentStatus, ItemId};

pub fn ids(values: &[u64]) -> Vec<ItemId> {
    values.iter().copied().map(ItemId::new).collect()
}

pub fn filter(page_size: usize) -> ListFilter {
    ListFilter::new(
        ["post", "event"],
        HourRange::new(8, 18).expect("hour range"),
        "featured",
        "News",
        page_size,
    )
    .expect("valid filter")
}

pub fn listing_config(key: &str, policy: HitPolicy) -> ListingCacheConfig {
    ListingCacheConfig {
        cache_key: CacheKey::from(key),
        ttl: Duration::from_secs(300),
        hit_policy: policy,
    }
}

pub fn listing(
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn CacheStore>,
    config: ListingCacheConfig,
) -> FilteredListCache {
    FilteredListCache::new(catalog, store, config)
}

/// Catalog answering the compound filter with a fixed raw page and id lookups
/// from a status table. Every item query is recorded.
#[derive(Default)]
pub struct ScriptedCatalog {
    content_types: Vec<ContentTypeRecord>,
    counts: HashMap<String, u64>,
    filtered: IdPage,
    statuses: Mutex<HashMap<ItemId, ContentStatus>>,
    queries: Mutex<Vec<ItemQuery>>,
    unavailable: AtomicBool,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filtered(mut self, raw: &[u64], total_count: u64) -> Self {
        self.filtered = IdPage {
            ids: ids(raw),
            total_count,
        };
        self.with_published(raw)
    }

    pub fn with_published(self, values: &[u64]) -> Self {
        {
            let mut statuses = self.statuses.lock().expect("statuses lock");
            for id in ids(values) {
                statuses.insert(id, ContentStatus::Published);
            }
        }
        self
    }

    pub fn with_content_type(
        mut self,
        name: &str,
        label: Option<&str>,
        count: Option<u64>,
    ) -> Self {
        self.content_types.push(ContentTypeRecord {
            name: name.to_string(),
            label: label.map(str::to_string),
            public: true,
        });
        if let Some(count) = count {
            self.counts.insert(name.to_string(), count);
        }
        self
    }

    pub fn with_private_content_type(mut self, name: &str, count: u64) -> Self {
        self.content_types.push(ContentTypeRecord {
            name: name.to_string(),
            label: Some(name.to_string()),
            public: false,
        });
        self.counts.insert(name.to_string(), count);
        self
    }

    pub fn set_status(&self, id: u64, status: ContentStatus) {
        self.statuses
            .lock()
            .expect("statuses lock")
            .insert(ItemId::new(id), status);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<ItemQuery> {
        self.queries.lock().expect("queries lock").clone()
    }

    pub fn filtered_query_count(&self) -> usize {
        self.queries()
            .iter()
            .filter(|query| matches!(query, ItemQuery::Filtered(_)))
            .count()
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::unavailable("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    async fn list_content_types(
        &self,
        scope: CategoryScope,
    ) -> Result<Vec<ContentTypeRecord>, CatalogError> {
        self.check_available()?;
        Ok(self
            .content_types
            .iter()
            .filter(|record| scope.admits(record))
            .cloned()
            .collect())
    }

    async fn count_published(&self, key: &str) -> Result<Option<u64>, CatalogError> {
        self.check_available()?;
        Ok(self.counts.get(key).copied())
    }

    async fn query(&self, query: &ItemQuery) -> Result<IdPage, CatalogError> {
        self.check_available()?;
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.clone());

        match query {
            ItemQuery::Filtered(_) => Ok(self.filtered.clone()),
            ItemQuery::ByIds(lookup) => {
                let statuses = self.statuses.lock().expect("statuses lock");
                let found: Vec<ItemId> = lookup
                    .ids
                    .iter()
                    .copied()
                    .filter(|id| match (statuses.get(id), lookup.status) {
                        (None, _) => false,
                        (Some(_), None) => true,
                        (Some(actual), Some(required)) => *actual == required,
                    })
                    .collect();
                Ok(IdPage {
                    total_count: found.len() as u64,
                    ids: found.into_iter().take(lookup.limit).collect(),
                })
            }
        }
    }
}

/// Cache store whose reads and writes always fail.
#[derive(Default)]
pub struct FailingCacheStore {
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
}

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::unavailable("cache backend timed out"))
    }

    async fn set(
        &self,
        _key: &CacheKey,
        _value: Vec<ItemId>,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::unavailable("cache backend timed out"))
    }
}
