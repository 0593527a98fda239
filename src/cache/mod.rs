pub mod entry;
pub mod file;
pub mod keys;
pub mod memory;

pub use entry::{CacheEntry, Freshness, FreshnessPolicy};
pub use file::FileStore;
pub use keys::{CacheKey, Dataset};
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Keyed store holding the latest successful fetch per key.
///
/// `put` replaces the whole entry atomically; concurrent writers resolve as
/// last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError>;

    /// Age of the entry; `Duration::MAX` when absent or unreadable.
    async fn age(&self, key: &CacheKey) -> Duration {
        match self.get(key).await {
            Ok(Some(entry)) => entry.age(),
            _ => Duration::MAX,
        }
    }

    /// Short name of the backing medium, for logs.
    fn backing(&self) -> &'static str;
}
