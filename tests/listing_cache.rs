//! Read-through behaviour of the filtered listing cache.

mod support;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use content_digest::application::error::DigestError;
use content_digest::application::listing::{FilteredListCache, HitPolicy};
use content_digest::application::repos::{CatalogError, ItemQuery};
use content_digest::cache::{CacheConfig, CacheKey, CacheStore, Clock, InMemoryCacheStore};
use content_digest::domain::listing::ListResult;
use content_digest::domain::types::{ContentStatus, ItemId};
use time::OffsetDateTime;
use time::macros::datetime;

use support::{FailingCacheStore, ScriptedCatalog, filter, ids, listing, listing_config};

const KEY: &str = "digest:listing:test";

fn setup(catalog: ScriptedCatalog) -> (Arc<ScriptedCatalog>, Arc<InMemoryCacheStore>, FilteredListCache) {
    let catalog = Arc::new(catalog);
    let store = Arc::new(InMemoryCacheStore::default());
    let cache = listing(
        catalog.clone(),
        store.clone(),
        listing_config(KEY, HitPolicy::RequirePublished),
    );
    (catalog, store, cache)
}

async fn cached_ids(store: &InMemoryCacheStore) -> Option<Vec<ItemId>> {
    store
        .get(&CacheKey::from(KEY))
        .await
        .expect("in-memory store read")
        .map(|entry| entry.value)
}

#[tokio::test]
async fn miss_excludes_current_item_and_caches_remaining_ids() {
    let (catalog, store, cache) =
        setup(ScriptedCatalog::new().with_filtered(&[5, 7, 9, 12, 3, 8], 14));
    let filter = filter(5);

    let result = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("listing");

    assert_eq!(result.ids, ids(&[5, 7, 12, 3, 8]));
    assert_eq!(result.total_count, 13);
    assert!(result.len() <= filter.limit() - 1);
    assert_eq!(cached_ids(&store).await, Some(ids(&[5, 7, 12, 3, 8])));

    let queries = catalog.queries();
    assert_eq!(queries.len(), 1);
    match &queries[0] {
        ItemQuery::Filtered(query) => {
            assert_eq!(query.limit, 6);
            assert_eq!(query.status, ContentStatus::Published);
            assert_eq!(query.tag_slug, "featured");
            assert_eq!(query.category_name, "News");
            assert_eq!(query.hour_range, filter.hour_range());
            assert!(query.kinds.contains("post") && query.kinds.contains("event"));
        }
        other => panic!("expected filtered query, got {other:?}"),
    }
}

#[tokio::test]
async fn miss_drops_every_copy_of_a_repeated_current_id() {
    let (_catalog, store, cache) = setup(ScriptedCatalog::new().with_filtered(&[9, 5, 9], 3));

    let result = cache
        .get_filtered_list(&filter(5), ItemId::new(9))
        .await
        .expect("listing");

    assert_eq!(result, ListResult::new(ids(&[5]), 2));
    assert_eq!(cached_ids(&store).await, Some(ids(&[5])));
}

#[tokio::test]
async fn hit_returns_cached_ids_in_cached_order() {
    let (catalog, store, cache) = setup(ScriptedCatalog::new().with_published(&[3, 5, 7, 8, 12]));
    store
        .set(
            &CacheKey::from(KEY),
            ids(&[5, 7, 12, 3, 8]),
            Duration::from_secs(300),
        )
        .await
        .expect("seed cache");

    let result = cache
        .get_filtered_list(&filter(5), ItemId::new(9))
        .await
        .expect("listing");

    assert_eq!(result, ListResult::new(ids(&[5, 7, 12, 3, 8]), 5));
    assert_eq!(catalog.filtered_query_count(), 0);

    let queries = catalog.queries();
    assert_eq!(queries.len(), 1);
    match &queries[0] {
        ItemQuery::ByIds(lookup) => {
            assert_eq!(lookup.ids, ids(&[5, 7, 12, 3, 8]));
            assert_eq!(lookup.limit, 5);
            assert_eq!(lookup.status, Some(ContentStatus::Published));
        }
        other => panic!("expected id lookup, got {other:?}"),
    }
}

#[tokio::test]
async fn consecutive_calls_within_ttl_are_identical() {
    let (catalog, _store, cache) =
        setup(ScriptedCatalog::new().with_filtered(&[5, 7, 9, 12, 3, 8], 6));
    let filter = filter(5);

    let first = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("first listing");
    let second = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("second listing");
    let third = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("third listing");

    assert_eq!(first.ids, second.ids);
    assert_eq!(second, third);
    assert_eq!(second.total_count, 5);
    assert_eq!(catalog.filtered_query_count(), 1);
}

#[tokio::test]
async fn hit_drops_current_item_cached_for_another_render() {
    let (catalog, store, cache) = setup(ScriptedCatalog::new().with_published(&[5, 7, 12]));
    store
        .set(&CacheKey::from(KEY), ids(&[5, 7, 12]), Duration::from_secs(300))
        .await
        .expect("seed cache");

    let result = cache
        .get_filtered_list(&filter(5), ItemId::new(7))
        .await
        .expect("listing");

    assert_eq!(result.ids, ids(&[5, 12]));
    assert_eq!(result.total_count, 2);
    assert!(!result.ids.contains(&ItemId::new(7)));
    match &catalog.queries()[0] {
        ItemQuery::ByIds(lookup) => {
            assert_eq!(lookup.ids, ids(&[5, 12]));
            assert_eq!(lookup.limit, 2);
        }
        other => panic!("expected id lookup, got {other:?}"),
    }
}

#[tokio::test]
async fn hit_with_nothing_left_skips_the_catalog() {
    let (catalog, store, cache) = setup(ScriptedCatalog::new().with_published(&[7]));
    store
        .set(&CacheKey::from(KEY), ids(&[7]), Duration::from_secs(300))
        .await
        .expect("seed cache");

    let result = cache
        .get_filtered_list(&filter(5), ItemId::new(7))
        .await
        .expect("listing");

    assert_eq!(result, ListResult::default());
    assert!(catalog.queries().is_empty());
}

#[tokio::test]
async fn empty_catalog_result_is_cached_as_empty_listing() {
    let (catalog, store, cache) = setup(ScriptedCatalog::new().with_filtered(&[], 0));
    let filter = filter(5);

    let miss = cache
        .get_filtered_list(&filter, ItemId::new(1))
        .await
        .expect("miss");
    assert!(miss.is_empty());
    assert_eq!(miss.total_count, 0);
    assert_eq!(cached_ids(&store).await, Some(Vec::new()));

    let hit = cache
        .get_filtered_list(&filter, ItemId::new(1))
        .await
        .expect("hit");
    assert_eq!(hit, miss);
    assert_eq!(catalog.queries().len(), 1);
}

#[tokio::test]
async fn failing_cache_store_degrades_to_live_query() {
    let catalog = Arc::new(ScriptedCatalog::new().with_filtered(&[5, 7, 9, 12, 3, 8], 6));
    let store = Arc::new(FailingCacheStore::default());
    let cache = listing(
        catalog.clone(),
        store.clone(),
        listing_config(KEY, HitPolicy::RequirePublished),
    );
    let filter = filter(5);

    let first = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("listing despite cache failure");
    let second = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("listing despite cache failure");

    assert_eq!(first.ids, ids(&[5, 7, 12, 3, 8]));
    assert_eq!(first, second);
    assert_eq!(catalog.filtered_query_count(), 2);
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.set_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn catalog_failure_propagates_on_miss_and_hit() {
    let (catalog, store, cache) =
        setup(ScriptedCatalog::new().with_filtered(&[5, 7, 9], 3));
    let filter = filter(5);

    catalog.set_unavailable(true);
    let err = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect_err("catalog down on miss");
    assert!(matches!(
        err,
        DigestError::Catalog(CatalogError::Unavailable(_))
    ));
    assert_eq!(cached_ids(&store).await, None);

    catalog.set_unavailable(false);
    cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("populate cache");

    catalog.set_unavailable(true);
    let err = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect_err("catalog down on hit");
    assert!(matches!(
        err,
        DigestError::Catalog(CatalogError::Unavailable(_))
    ));
}

#[tokio::test]
async fn page_stays_within_limit_when_current_item_is_absent() {
    let (_catalog, _store, cache) =
        setup(ScriptedCatalog::new().with_filtered(&[1, 2, 3, 4, 5, 6, 7, 8], 20));
    let filter = filter(5);

    let result = cache
        .get_filtered_list(&filter, ItemId::new(99))
        .await
        .expect("listing");

    assert_eq!(result.ids, ids(&[1, 2, 3, 4, 5, 6]));
    assert!(result.len() <= filter.limit());
    assert_eq!(result.total_count, 20);
}

#[tokio::test]
async fn require_published_policy_drops_unpublished_ids_on_hit() {
    let (catalog, _store, cache) =
        setup(ScriptedCatalog::new().with_filtered(&[5, 7, 9, 12, 3, 8], 6));
    let filter = filter(5);

    cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("populate cache");
    catalog.set_status(12, ContentStatus::Draft);

    let hit = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("hit");
    assert_eq!(hit.ids, ids(&[5, 7, 3, 8]));
    assert_eq!(hit.total_count, 5);
}

#[tokio::test]
async fn trust_cached_policy_keeps_unpublished_ids_on_hit() {
    let catalog = Arc::new(ScriptedCatalog::new().with_filtered(&[5, 7, 9, 12, 3, 8], 6));
    let store = Arc::new(InMemoryCacheStore::default());
    let cache = listing(
        catalog.clone(),
        store,
        listing_config(KEY, HitPolicy::TrustCached),
    );
    let filter = filter(5);

    cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("populate cache");
    catalog.set_status(12, ContentStatus::Draft);

    let hit = cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("hit");
    assert_eq!(hit.ids, ids(&[5, 7, 12, 3, 8]));
    match catalog.queries().last() {
        Some(ItemQuery::ByIds(lookup)) => assert_eq!(lookup.status, None),
        other => panic!("expected id lookup, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_entry_runs_the_filter_again() {
    let start = datetime!(2024-05-01 10:00 UTC);
    let now = Arc::new(Mutex::new(start));
    let handle = Arc::clone(&now);
    let clock: Clock = Arc::new(move || -> OffsetDateTime { *handle.lock().expect("clock lock") });

    let catalog = Arc::new(ScriptedCatalog::new().with_filtered(&[5, 7, 9], 3));
    let store = Arc::new(InMemoryCacheStore::with_clock(&CacheConfig::default(), clock));
    let cache = listing(
        catalog.clone(),
        store,
        listing_config(KEY, HitPolicy::RequirePublished),
    );
    let filter = filter(5);

    cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("miss");
    *now.lock().expect("clock lock") = start + time::Duration::minutes(4);
    cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("hit");
    assert_eq!(catalog.filtered_query_count(), 1);

    *now.lock().expect("clock lock") = start + time::Duration::minutes(5);
    cache
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("miss after expiry");
    assert_eq!(catalog.filtered_query_count(), 2);
}

#[tokio::test]
async fn instances_with_distinct_keys_do_not_share_entries() {
    let catalog = Arc::new(ScriptedCatalog::new().with_filtered(&[5, 7, 9], 3));
    let store = Arc::new(InMemoryCacheStore::default());
    let first = listing(
        catalog.clone(),
        store.clone(),
        listing_config("digest:first", HitPolicy::RequirePublished),
    );
    let second = listing(
        catalog.clone(),
        store.clone(),
        listing_config("digest:second", HitPolicy::RequirePublished),
    );
    let filter = filter(5);

    first
        .get_filtered_list(&filter, ItemId::new(9))
        .await
        .expect("first listing");
    second
        .get_filtered_list(&filter, ItemId::new(5))
        .await
        .expect("second listing");

    assert_eq!(catalog.filtered_query_count(), 2);
    assert_eq!(store.len(), 2);
}
