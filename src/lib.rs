//! Mini TTL Cache - a bounded in-memory cache with per-entry expiry
//!
//! The [`cache::TtlCache`] core combines LRU eviction with a fixed TTL and can
//! be embedded directly; the `api` and `tasks` modules serve it over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
