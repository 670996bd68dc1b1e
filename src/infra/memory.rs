//! In-memory catalog backed by a TOML fixture.
//!
//! ```toml
//! [[content_types]]
//! name = "post"
//! label = "Posts"
//!
//! [[items]]
//! id = 5
//! kind = "post"
//! status = "published"
//! published_at = "2024-05-01T09:12:00Z"
//! tags = ["featured"]
//! categories = ["News"]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::application::repos::{
    Catalog, CatalogError, CategoryScope, FilteredQuery, IdLookup, IdPage, ItemQuery,
};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{CatalogItem, ContentTypeRecord};
use crate::domain::types::{ContentStatus, ItemId};
use crate::util::timezone::local_hour;

use super::error::InfraError;

const SOURCE: &str = "infra::memory";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFixture {
    pub content_types: Vec<ContentTypeRecord>,
    pub items: Vec<CatalogItem>,
}

impl CatalogFixture {
    fn validate(&self) -> Result<(), String> {
        let mut names = HashSet::new();
        for record in &self.content_types {
            if !names.insert(record.name.as_str()) {
                return Err(format!("duplicate content type `{}`", record.name));
            }
        }

        let mut ids = HashSet::new();
        for item in &self.items {
            if !ids.insert(item.id) {
                return Err(format!("duplicate item id {}", item.id));
            }
        }

        Ok(())
    }
}

pub struct InMemoryCatalog {
    content_types: Vec<ContentTypeRecord>,
    items: RwLock<Vec<CatalogItem>>,
    timezone: Tz,
}

impl InMemoryCatalog {
    pub fn new(
        content_types: Vec<ContentTypeRecord>,
        items: Vec<CatalogItem>,
        timezone: Tz,
    ) -> Self {
        Self {
            content_types,
            items: RwLock::new(items),
            timezone,
        }
    }

    pub fn from_fixture(fixture: CatalogFixture, timezone: Tz) -> Self {
        Self::new(fixture.content_types, fixture.items, timezone)
    }

    pub fn from_toml_str(source: &str, timezone: Tz) -> Result<Self, String> {
        let fixture: CatalogFixture = toml::from_str(source).map_err(|err| err.to_string())?;
        fixture.validate()?;
        Ok(Self::from_fixture(fixture, timezone))
    }

    pub async fn load(path: &Path, timezone: Tz) -> Result<Self, InfraError> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&source, timezone).map_err(|message| InfraError::fixture(path, message))
    }

    /// Change an item's status in place. Returns false for unknown ids.
    pub fn set_status(&self, id: ItemId, status: ContentStatus) -> bool {
        let mut items = rw_write(&self.items, SOURCE, "set_status");
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.status = status;
                true
            }
            None => false,
        }
    }

    fn run_filtered(&self, query: &FilteredQuery) -> Result<IdPage, CatalogError> {
        if query.limit == 0 {
            return Err(CatalogError::invalid_query("limit must be greater than zero"));
        }

        let items = rw_read(&self.items, SOURCE, "run_filtered");
        let mut matches: Vec<&CatalogItem> = items
            .iter()
            .filter(|item| {
                query.kinds.contains(&item.kind)
                    && item.status == query.status
                    && query
                        .hour_range
                        .contains(local_hour(item.published_at, self.timezone))
                    && item.has_tag(&query.tag_slug)
                    && item.has_category(&query.category_name)
            })
            .collect();

        // Default order: most recent first.
        matches.sort_by(|left, right| {
            right
                .published_at
                .cmp(&left.published_at)
                .then_with(|| right.id.cmp(&left.id))
        });

        Ok(IdPage {
            total_count: matches.len() as u64,
            ids: matches
                .into_iter()
                .take(query.limit)
                .map(|item| item.id)
                .collect(),
        })
    }

    fn run_lookup(&self, lookup: &IdLookup) -> Result<IdPage, CatalogError> {
        let items = rw_read(&self.items, SOURCE, "run_lookup");
        let by_id: HashMap<ItemId, &CatalogItem> =
            items.iter().map(|item| (item.id, item)).collect();

        let mut seen = HashSet::new();
        let found: Vec<ItemId> = lookup
            .ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| by_id.get(id))
            .filter(|item| lookup.status.is_none_or(|status| item.status == status))
            .map(|item| item.id)
            .collect();

        Ok(IdPage {
            total_count: found.len() as u64,
            ids: found.into_iter().take(lookup.limit).collect(),
        })
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn list_content_types(
        &self,
        scope: CategoryScope,
    ) -> Result<Vec<ContentTypeRecord>, CatalogError> {
        Ok(self
            .content_types
            .iter()
            .filter(|record| scope.admits(record))
            .cloned()
            .collect())
    }

    async fn count_published(&self, key: &str) -> Result<Option<u64>, CatalogError> {
        if !self.content_types.iter().any(|record| record.name == key) {
            return Ok(None);
        }

        let items = rw_read(&self.items, SOURCE, "count_published");
        let count = items
            .iter()
            .filter(|item| item.kind == key && item.status == ContentStatus::Published)
            .count();
        Ok(Some(count as u64))
    }

    async fn query(&self, query: &ItemQuery) -> Result<IdPage, CatalogError> {
        match query {
            ItemQuery::Filtered(filtered) => self.run_filtered(filtered),
            ItemQuery::ByIds(lookup) => self.run_lookup(lookup),
        }
    }
}
