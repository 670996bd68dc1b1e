//! Published counts and cached, self-excluding content listings over a
//! publishing catalog.
//!
//! The catalog and cache are collaborators behind the [`application::repos::Catalog`]
//! and [`cache::CacheStore`] traits; [`application::digest::DigestService`] is
//! the render entry point.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
