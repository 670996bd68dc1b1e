//! Domain layer types and invariants.

pub mod counts;
pub mod entities;
pub mod error;
pub mod listing;
pub mod types;
