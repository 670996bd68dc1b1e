//! Application services layer.

pub mod counts;
pub mod digest;
pub mod error;
pub mod listing;
pub mod repos;
