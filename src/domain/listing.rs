//! Filtered listing values: the static compound filter and its result.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::types::{ContentStatus, ItemId};

const LAST_HOUR: u8 = 23;

/// Inclusive hour-of-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HourRange {
    start: u8,
    end: u8,
}

impl HourRange {
    pub fn new(start: u8, end: u8) -> Result<Self, DomainError> {
        if end > LAST_HOUR {
            return Err(DomainError::validation(format!(
                "hour range end {end} is past {LAST_HOUR}"
            )));
        }
        if start > end {
            return Err(DomainError::validation(format!(
                "hour range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn whole_day() -> Self {
        Self {
            start: 0,
            end: LAST_HOUR,
        }
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    pub fn contains(&self, hour: u8) -> bool {
        (self.start..=self.end).contains(&hour)
    }
}

/// Compound listing filter.
///
/// `limit` is one more than the page size so that dropping the current item
/// still leaves a full page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    kinds: BTreeSet<String>,
    hour_range: HourRange,
    tag: String,
    category: String,
    limit: usize,
}

impl ListFilter {
    pub fn new(
        kinds: impl IntoIterator<Item = impl Into<String>>,
        hour_range: HourRange,
        tag: impl Into<String>,
        category: impl Into<String>,
        page_size: usize,
    ) -> Result<Self, DomainError> {
        let kinds: BTreeSet<String> = kinds
            .into_iter()
            .map(Into::into)
            .filter(|kind: &String| !kind.trim().is_empty())
            .collect();
        if kinds.is_empty() {
            return Err(DomainError::validation("at least one content kind is required"));
        }

        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(DomainError::validation("tag slug must not be empty"));
        }

        let category = category.into();
        if category.trim().is_empty() {
            return Err(DomainError::validation("category name must not be empty"));
        }

        if page_size == 0 {
            return Err(DomainError::validation("page size must be greater than zero"));
        }

        Ok(Self {
            kinds,
            hour_range,
            tag,
            category,
            limit: page_size.saturating_add(1),
        })
    }

    pub fn kinds(&self) -> &BTreeSet<String> {
        &self.kinds
    }

    /// Only published items are ever listed.
    pub fn status(&self) -> ContentStatus {
        ContentStatus::Published
    }

    pub fn hour_range(&self) -> HourRange {
        self.hour_range
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn page_size(&self) -> usize {
        self.limit - 1
    }
}

/// Ordered listing result handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListResult {
    pub ids: Vec<ItemId>,
    pub total_count: u64,
}

impl ListResult {
    pub fn new(ids: Vec<ItemId>, total_count: u64) -> Self {
        Self { ids, total_count }
    }

    /// Build a result from a raw page with `current` removed. Returns whether
    /// an id was dropped.
    ///
    /// A repeated id is still one item, so the total drops by at most one.
    pub fn excluding(raw_ids: &[ItemId], raw_total: u64, current: ItemId) -> (Self, bool) {
        let ids: Vec<ItemId> = raw_ids.iter().copied().filter(|id| *id != current).collect();
        if ids.len() == raw_ids.len() {
            return (Self::new(ids, raw_total), false);
        }
        (Self::new(ids, raw_total.saturating_sub(1)), true)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
