use crate::cache::{CacheStore, FileStore, MemoryStore};
use crate::config::Config;
use crate::service::RefreshOrchestrator;
use crate::sources::{HttpTransport, ReqwestTransport};
use std::sync::Arc;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub transport: Arc<dyn HttpTransport>,
    /// Per-coin live stats and prices.
    pub live: RefreshOrchestrator,
    /// Whole MinerStat datasets; durable.
    pub datasets: RefreshOrchestrator,
}

impl AppState {
    pub fn new(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        live_store: Arc<dyn CacheStore>,
        dataset_store: Arc<dyn CacheStore>,
    ) -> Self {
        let background = config.stale_background_refresh;
        Self {
            live: RefreshOrchestrator::new(live_store, background),
            datasets: RefreshOrchestrator::new(dataset_store, background),
            config,
            transport,
        }
    }

    /// Build the production state: reqwest transport, file-backed datasets,
    /// and live stats in memory unless configured durable.
    pub async fn from_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config)?);

        let dataset_store: Arc<dyn CacheStore> = Arc::new(FileStore::open(&config.cache_dir).await?);
        let live_store: Arc<dyn CacheStore> = if config.mining_stats_durable {
            dataset_store.clone()
        } else {
            Arc::new(MemoryStore::new(config.cache_max_capacity))
        };

        info!(
            "Cache initialized: live stats in {}, datasets in {}",
            live_store.backing(),
            dataset_store.backing()
        );

        Ok(Self::new(config, transport, live_store, dataset_store))
    }
}
