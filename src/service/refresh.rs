//! Cache-or-fetch policy shared by every serving endpoint.
//!
//! Per key, the age of the cached entry picks a tier:
//!
//! | tier      | behaviour                                                     |
//! |-----------|---------------------------------------------------------------|
//! | no cache  | fetch; on failure report the error, never placeholder data    |
//! | fresh     | serve cache, no upstream contact                              |
//! | stale     | serve cache flagged stale, optionally refresh in background   |
//! | expired   | fetch; on failure serve the expired entry with the error      |
//!
//! A forced refresh always fetches and falls back like the expired tier.
//! At most one background refresh per key is in flight.
//! Failed fetches never touch the stored entry.

use crate::cache::{CacheEntry, CacheKey, CacheStore, Freshness, FreshnessPolicy};
use crate::sources::SourceError;
use moka::future::Cache;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where the served data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Cache,
    CacheStale,
    FreshFetch,
    /// A refresh was attempted and failed; cached data served instead.
    CacheFallback,
}

/// Outcome of resolving one key.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub entry: Option<CacheEntry>,
    pub origin: Option<Origin>,
    pub age: Duration,
    pub stale: bool,
    pub error: Option<SourceError>,
}

impl Resolution {
    fn fresh_fetch(entry: CacheEntry) -> Self {
        Self {
            entry: Some(entry),
            origin: Some(Origin::FreshFetch),
            age: Duration::ZERO,
            stale: false,
            error: None,
        }
    }

    fn cached(entry: CacheEntry, age: Duration, stale: bool) -> Self {
        Self {
            entry: Some(entry),
            origin: Some(if stale { Origin::CacheStale } else { Origin::Cache }),
            age,
            stale,
            error: None,
        }
    }

    fn fallback(entry: CacheEntry, age: Duration, error: SourceError) -> Self {
        Self {
            entry: Some(entry),
            origin: Some(Origin::CacheFallback),
            age,
            stale: true,
            error: Some(error),
        }
    }

    /// No data at all; carries why.
    pub fn unavailable(error: SourceError) -> Self {
        Self {
            entry: None,
            origin: None,
            age: Duration::MAX,
            stale: false,
            error: Some(error),
        }
    }

    pub fn from_cache(&self) -> bool {
        matches!(
            self.origin,
            Some(Origin::Cache | Origin::CacheStale | Origin::CacheFallback)
        )
    }
}

#[derive(Clone)]
pub struct RefreshOrchestrator {
    store: Arc<dyn CacheStore>,
    background_refresh: bool,
    /// Keys with a background refresh running.
    in_flight: Cache<CacheKey, ()>,
}

impl RefreshOrchestrator {
    pub fn new(store: Arc<dyn CacheStore>, background_refresh: bool) -> Self {
        Self {
            store,
            background_refresh,
            in_flight: Cache::builder().max_capacity(10_000).build(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Serve `key` according to `policy`, calling `fetch` only when the
    /// tier (or `force`) requires it.
    ///
    /// `fetch` is `'static` because a stale hit may hand it to a background task.
    pub async fn resolve<F, Fut>(
        &self,
        key: &CacheKey,
        policy: FreshnessPolicy,
        force: bool,
        fetch: F,
    ) -> Resolution
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<CacheEntry, SourceError>> + Send + 'static,
    {
        let Some(entry) = self.read(key).await else {
            info!("No cached entry for {}, fetching", key);
            return match self.fetch_and_store(key, fetch).await {
                Ok(entry) => Resolution::fresh_fetch(entry),
                Err(e) => {
                    warn!("Fetch for {} failed with no cache to fall back on: {}", key, e);
                    Resolution::unavailable(e)
                }
            };
        };

        let age = entry.age();
        let tier = policy.classify(age);
        debug!("Cache entry for {} is {:?} (age {:?})", key, tier, age);

        if !force {
            match tier {
                Freshness::Fresh => return Resolution::cached(entry, age, false),
                Freshness::Stale => {
                    if self.background_refresh {
                        self.spawn_refresh(key.clone(), fetch).await;
                    }
                    return Resolution::cached(entry, age, true);
                }
                Freshness::Expired => {}
            }
        } else {
            info!("Forced refresh for {}", key);
        }

        match self.fetch_and_store(key, fetch).await {
            Ok(fresh) => Resolution::fresh_fetch(fresh),
            Err(e) => {
                warn!("Refresh for {} failed, serving cached entry: {}", key, e);
                Resolution::fallback(entry, age, e)
            }
        }
    }

    /// Unreadable entries are treated as absent so the next fetch replaces them.
    async fn read(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cache read error for {}: {}", key, e);
                None
            }
        }
    }

    /// A failed write is logged; the fetched data is still served.
    async fn fetch_and_store<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<CacheEntry, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry, SourceError>>,
    {
        let entry = fetch().await?;
        if let Err(e) = self.store.put(key, entry.clone()).await {
            error!("Failed to write {} to {} cache: {}", key, self.store.backing(), e);
        }
        Ok(entry)
    }

    async fn spawn_refresh<F, Fut>(&self, key: CacheKey, fetch: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<CacheEntry, SourceError>> + Send + 'static,
    {
        let claim = self.in_flight.entry(key.clone()).or_insert(()).await;
        if !claim.is_fresh() {
            debug!("Background refresh for {} already running", key);
            return;
        }

        let store = self.store.clone();
        let in_flight = self.in_flight.clone();
        debug!("Spawning background refresh for {}", key);
        tokio::spawn(async move {
            match fetch().await {
                Ok(entry) => match store.put(&key, entry).await {
                    Ok(()) => info!("Background refresh stored {}", key),
                    Err(e) => error!("Background refresh for {} could not be stored: {}", key, e),
                },
                Err(e) => warn!("Background refresh for {} failed: {}", key, e),
            }
            in_flight.invalidate(&key).await;
        });
    }
}
