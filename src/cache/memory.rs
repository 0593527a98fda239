//! Process-local cache store using Moka

use super::{CacheEntry, CacheError, CacheKey, CacheStore};
use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

/// In-memory store. Lost on restart, which the freshness tiers absorb.
///
/// No TTL is set: staleness is judged from `fetched_at`, and the capacity
/// only guards against unbounded key growth.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<CacheKey, CacheEntry>,
}

impl MemoryStore {
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();
        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let result = self.cache.get(key).await;
        if result.is_some() {
            debug!("Cache hit for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        Ok(result)
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        self.cache.insert(key.clone(), entry).await;
        debug!("Cached entry for key: {}", key);
        Ok(())
    }

    fn backing(&self) -> &'static str {
        "memory"
    }
}
