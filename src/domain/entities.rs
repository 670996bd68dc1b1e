//! Catalog records as the host exposes them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{ContentStatus, ItemId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    /// Content type name, e.g. `post` or `event`.
    pub kind: String,
    pub status: ContentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    /// Tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category names.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl CatalogItem {
    pub fn has_tag(&self, slug: &str) -> bool {
        self.tags.iter().any(|tag| tag == slug)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category == name)
    }
}

/// Content type metadata as enumerated by the catalog.
///
/// `label` may be absent; it is defaulted when counts are aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeRecord {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_public() -> bool {
    true
}
