//! Render entry point combining counts and the cached listing.

use serde::Serialize;

use crate::application::counts::CountAggregator;
use crate::application::error::DigestError;
use crate::application::listing::FilteredListCache;
use crate::application::repos::RenderContext;
use crate::domain::counts::CategoryCountMap;
use crate::domain::listing::{ListFilter, ListResult};
use crate::domain::types::ItemId;

/// Plain data handed to the templating layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestContext {
    pub current_id: ItemId,
    pub counts: CategoryCountMap,
    pub listing: ListResult,
}

#[derive(Clone)]
pub struct DigestService {
    counts: CountAggregator,
    listing: FilteredListCache,
    filter: ListFilter,
}

impl DigestService {
    pub fn new(counts: CountAggregator, listing: FilteredListCache, filter: ListFilter) -> Self {
        Self {
            counts,
            listing,
            filter,
        }
    }

    pub async fn render(&self, context: &dyn RenderContext) -> Result<DigestContext, DigestError> {
        let current_id = context.current_item_id();
        let counts = self.counts.compute_counts().await?;
        let listing = self
            .listing
            .get_filtered_list(&self.filter, current_id)
            .await?;

        Ok(DigestContext {
            current_id,
            counts,
            listing,
        })
    }
}
