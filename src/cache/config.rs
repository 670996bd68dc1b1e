//! Cache store configuration.

use std::num::NonZeroUsize;

const DEFAULT_MAX_ENTRIES: usize = 64;

/// In-memory cache store sizing, resolved from the `[cache]` settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of keys held before least-recently-used eviction.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            max_entries: settings.max_entries.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
