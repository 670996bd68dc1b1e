//! Read-through cache over the compound listing query.
//!
//! A miss runs the compound filter, drops the current item, and stores the
//! remaining ids under one well-known key. A hit skips the filter and looks
//! the cached ids up directly, keeping their cached order.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::application::error::DigestError;
use crate::application::repos::{Catalog, FilteredQuery, IdLookup, ItemQuery};
use crate::cache::{CacheKey, CacheStore};
use crate::domain::listing::{ListFilter, ListResult};
use crate::domain::types::{ContentStatus, ItemId};

pub const DEFAULT_CACHE_KEY: &str = "digest:listing:this-hour";
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

const METRIC_CACHE_HIT: &str = "digest_listing_cache_hit_total";
const METRIC_CACHE_MISS: &str = "digest_listing_cache_miss_total";
const METRIC_CACHE_STORE_ERROR: &str = "digest_listing_cache_store_error_total";

/// How cached ids are re-checked when the cache hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitPolicy {
    /// Only ids whose item is still published come back.
    #[default]
    RequirePublished,
    /// Every cached id that still exists comes back, whatever its status.
    TrustCached,
}

impl HitPolicy {
    fn status(self) -> Option<ContentStatus> {
        match self {
            HitPolicy::RequirePublished => Some(ContentStatus::Published),
            HitPolicy::TrustCached => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingCacheConfig {
    pub cache_key: CacheKey,
    pub ttl: Duration,
    pub hit_policy: HitPolicy,
}

impl Default for ListingCacheConfig {
    fn default() -> Self {
        Self {
            cache_key: CacheKey::from(DEFAULT_CACHE_KEY),
            ttl: DEFAULT_TTL,
            hit_policy: HitPolicy::default(),
        }
    }
}

impl From<&crate::config::ListingSettings> for ListingCacheConfig {
    fn from(settings: &crate::config::ListingSettings) -> Self {
        Self {
            cache_key: settings.cache_key.clone(),
            ttl: settings.ttl,
            hit_policy: settings.hit_policy,
        }
    }
}

#[derive(Clone)]
pub struct FilteredListCache {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn CacheStore>,
    config: ListingCacheConfig,
}

impl FilteredListCache {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn CacheStore>,
        config: ListingCacheConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    pub async fn get_filtered_list(
        &self,
        filter: &ListFilter,
        current_id: ItemId,
    ) -> Result<ListResult, DigestError> {
        match self.read_cached().await {
            Some(cached) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                self.reconstruct(cached, current_id).await
            }
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                self.materialize(filter, current_id).await
            }
        }
    }

    /// Store failures read as a miss.
    async fn read_cached(&self) -> Option<Vec<ItemId>> {
        match self.store.get(&self.config.cache_key).await {
            Ok(entry) => entry.map(|entry| entry.value),
            Err(err) => {
                counter!(METRIC_CACHE_STORE_ERROR, "op" => "read").increment(1);
                warn!(
                    target = "application::listing::read_cached",
                    cache_key = %self.config.cache_key,
                    error = %err,
                    "cache read failed; querying catalog"
                );
                None
            }
        }
    }

    async fn materialize(
        &self,
        filter: &ListFilter,
        current_id: ItemId,
    ) -> Result<ListResult, DigestError> {
        let query = ItemQuery::Filtered(FilteredQuery::from(filter));
        let mut raw = self.catalog.query(&query).await?;
        raw.ids.truncate(filter.limit());

        let (result, excluded) = ListResult::excluding(&raw.ids, raw.total_count, current_id);

        if let Err(err) = self
            .store
            .set(&self.config.cache_key, result.ids.clone(), self.config.ttl)
            .await
        {
            counter!(METRIC_CACHE_STORE_ERROR, "op" => "write").increment(1);
            warn!(
                target = "application::listing::materialize",
                cache_key = %self.config.cache_key,
                error = %err,
                "cache write failed; serving uncached listing"
            );
        }

        debug!(
            target = "application::listing::materialize",
            cache_key = %self.config.cache_key,
            hit = false,
            excluded,
            returned = result.len(),
            total = result.total_count,
            "materialized listing"
        );

        Ok(result)
    }

    async fn reconstruct(
        &self,
        cached: Vec<ItemId>,
        current_id: ItemId,
    ) -> Result<ListResult, DigestError> {
        let cached_len = cached.len();
        let ids: Vec<ItemId> = cached.into_iter().filter(|id| *id != current_id).collect();
        let excluded = ids.len() != cached_len;

        // An empty inclusion set would read as "no id constraint" to most catalogs.
        if ids.is_empty() {
            return Ok(ListResult::default());
        }

        let total_count = ids.len() as u64;
        let lookup = IdLookup {
            limit: ids.len(),
            ids,
            status: self.config.hit_policy.status(),
        };
        let page = self.catalog.query(&ItemQuery::ByIds(lookup)).await?;

        debug!(
            target = "application::listing::reconstruct",
            cache_key = %self.config.cache_key,
            hit = true,
            excluded,
            returned = page.ids.len(),
            total = total_count,
            "reconstructed cached listing"
        );

        Ok(ListResult::new(page.ids, total_count))
    }
}
