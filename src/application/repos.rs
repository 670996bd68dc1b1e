//! Catalog traits describing the host's content store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ContentTypeRecord;
use crate::domain::listing::{HourRange, ListFilter};
use crate::domain::types::{ContentStatus, ItemId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Unavailable(String),
    #[error("invalid catalog query: {message}")]
    InvalidQuery { message: String },
}

impl CatalogError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScope {
    Public,
    All,
}

impl CategoryScope {
    pub fn admits(self, record: &ContentTypeRecord) -> bool {
        match self {
            CategoryScope::Public => record.public,
            CategoryScope::All => true,
        }
    }
}

/// Compound filter sent to the catalog on a cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredQuery {
    pub kinds: BTreeSet<String>,
    pub status: ContentStatus,
    pub hour_range: HourRange,
    pub tag_slug: String,
    pub category_name: String,
    pub limit: usize,
}

impl From<&ListFilter> for FilteredQuery {
    fn from(filter: &ListFilter) -> Self {
        Self {
            kinds: filter.kinds().clone(),
            status: filter.status(),
            hour_range: filter.hour_range(),
            tag_slug: filter.tag().to_string(),
            category_name: filter.category().to_string(),
            limit: filter.limit(),
        }
    }
}

/// Lookup by identifiers, ordered by position in `ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdLookup {
    pub ids: Vec<ItemId>,
    /// When set, ids whose item is not in this status are omitted.
    pub status: Option<ContentStatus>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemQuery {
    Filtered(FilteredQuery),
    ByIds(IdLookup),
}

/// Identifier-only projection of a query result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdPage {
    pub ids: Vec<ItemId>,
    /// Number of matching items before the page limit was applied.
    pub total_count: u64,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_content_types(
        &self,
        scope: CategoryScope,
    ) -> Result<Vec<ContentTypeRecord>, CatalogError>;

    async fn count_published(&self, key: &str) -> Result<Option<u64>, CatalogError>;

    async fn query(&self, query: &ItemQuery) -> Result<IdPage, CatalogError>;
}

/// Supplies the identifier of the item currently being rendered.
pub trait RenderContext: Send + Sync {
    fn current_item_id(&self) -> ItemId;
}

impl RenderContext for ItemId {
    fn current_item_id(&self) -> ItemId {
        *self
    }
}
