//! Published counts per content type.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::entities::ContentTypeRecord;

/// A content type with its display label and published item count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCategory {
    pub key: String,
    pub label: String,
    pub published_count: u64,
}

impl CatalogCategory {
    /// Build from a raw record, substituting `""` and `0` for absent values.
    pub fn from_record(record: ContentTypeRecord, published_count: Option<u64>) -> Self {
        Self {
            key: record.name,
            label: record.label.unwrap_or_default(),
            published_count: published_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub published_count: u64,
}

/// Insertion-ordered mapping from content type key to label and count.
///
/// Serializes as a JSON object whose keys keep catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCountMap {
    entries: Vec<(String, CategoryCount)>,
}

impl CategoryCountMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a category. A repeated key keeps its original position and
    /// takes the newer value.
    pub fn insert(&mut self, category: CatalogCategory) {
        let CatalogCategory {
            key,
            label,
            published_count,
        } = category;
        let count = CategoryCount {
            label,
            published_count,
        };

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = count,
            None => self.entries.push((key, count)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CategoryCount> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, count)| count)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryCount)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogCategory> for CategoryCountMap {
    fn from_iter<I: IntoIterator<Item = CatalogCategory>>(iter: I) -> Self {
        let mut map = Self::new();
        for category in iter {
            map.insert(category);
        }
        map
    }
}

impl Serialize for CategoryCountMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}
