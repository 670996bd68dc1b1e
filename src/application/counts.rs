//! Published counts per public content type.

use std::sync::Arc;

use tracing::debug;

use crate::application::error::DigestError;
use crate::application::repos::{Catalog, CategoryScope};
use crate::domain::counts::{CatalogCategory, CategoryCountMap};

/// Builds the content type -> (label, published count) mapping.
///
/// Always reads live from the catalog.
#[derive(Clone)]
pub struct CountAggregator {
    catalog: Arc<dyn Catalog>,
}

impl CountAggregator {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    pub async fn compute_counts(&self) -> Result<CategoryCountMap, DigestError> {
        let records = self
            .catalog
            .list_content_types(CategoryScope::Public)
            .await?;

        let mut counts = CategoryCountMap::with_capacity(records.len());
        for record in records {
            let published = self.catalog.count_published(&record.name).await?;
            counts.insert(CatalogCategory::from_record(record, published));
        }

        debug!(
            target = "application::counts::compute_counts",
            categories = counts.len(),
            "computed published counts"
        );

        Ok(counts)
    }
}
