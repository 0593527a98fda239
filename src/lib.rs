pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod models;
pub mod service;
pub mod sources;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::Envelope;
pub use api::route::create_router;
pub use cache::{CacheEntry, CacheKey, CacheStore, FileStore, FreshnessPolicy, MemoryStore};
pub use models::CoinStat;
pub use service::{RefreshOrchestrator, Resolution};
pub use sources::{HttpTransport, SourceError};
pub use state::AppState;
pub use validation::{parse_refresh, validate_cache_hours, validate_coin_symbol, validate_secret};
