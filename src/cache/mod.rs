//! Cache storage for materialized listings.
//!
//! The listing component owns a single well-known key and writes the
//! post-exclusion identifier list under it with a time-to-live. Entries
//! expire passively: a read at or after the expiry instant sees nothing.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! max_entries = 64
//! ```

mod config;
mod keys;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::CacheKey;
pub use store::{CacheEntry, CacheError, CacheStore, Clock, InMemoryCacheStore, system_clock};
