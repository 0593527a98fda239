//! MinerStat datasets served from the durable cache.

use crate::api::response::{dataset_envelope, Envelope};
use crate::cache::{CacheEntry, CacheKey, Dataset};
use crate::catalog;
use crate::config::Credentials;
use crate::service::Resolution;
use crate::sources::{minerstat, HttpTransport, SourceError};
use crate::state::AppState;
use tracing::info;

/// A validated dataset request.
#[derive(Debug, Clone, Default)]
pub struct DatasetRequest {
    /// Narrow the MinerStat coin map to one symbol.
    pub coin: Option<String>,
    pub refresh: bool,
}

/// Fetch a dataset and shape it as the entry both serving and ingestion store.
pub async fn fetch_dataset(
    transport: &dyn HttpTransport,
    credentials: &Credentials,
    dataset: Dataset,
) -> Result<CacheEntry, SourceError> {
    let entry = match dataset {
        Dataset::MinerstatCoins => {
            let fetched = minerstat::fetch_coins(transport, credentials).await?;
            let count = fetched.coins.len();
            let data = serde_json::to_value(&fetched.coins)
                .map_err(|e| SourceError::upstream(minerstat::PROVIDER, e.to_string()))?;
            CacheEntry::new(data)
                .with_coin_count(count)
                .with_raw_entries(fetched.raw_entries)
        }
        Dataset::Pools => {
            let fetched = minerstat::fetch_pools(transport, credentials).await?;
            CacheEntry::new(fetched.data).with_entry_count(fetched.entry_count)
        }
        Dataset::Hardware => {
            let fetched = minerstat::fetch_hardware(transport, credentials).await?;
            CacheEntry::new(fetched.data).with_entry_count(fetched.entry_count)
        }
    };
    Ok(entry.with_source(format!("{}/v2/{}", minerstat::PROVIDER, endpoint(dataset))))
}

fn endpoint(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::MinerstatCoins => "coins",
        Dataset::Pools => "pools",
        Dataset::Hardware => "hardware",
    }
}

pub async fn resolve_dataset(state: &AppState, dataset: Dataset, force: bool) -> Resolution {
    let transport = state.transport.clone();
    let credentials = state.config.credentials.clone();
    state
        .datasets
        .resolve(
            &CacheKey::Dataset(dataset),
            state.config.dataset_policy(dataset),
            force,
            move || async move { fetch_dataset(transport.as_ref(), &credentials, dataset).await },
        )
        .await
}

pub async fn serve(state: &AppState, dataset: Dataset, request: DatasetRequest) -> Envelope {
    // an unknown symbol cannot be in the dataset; answer without touching the cache
    if let Some(symbol) = &request.coin {
        if dataset == Dataset::MinerstatCoins && catalog::minerstat_lookup(symbol).is_none() {
            let error = SourceError::UnsupportedCoin(symbol.clone());
            return Envelope::unavailable(error.code(), error.to_string());
        }
    }

    info!("Serving {} dataset, refresh: {}", dataset, request.refresh);
    let resolution = resolve_dataset(state, dataset, request.refresh).await;
    dataset_envelope(&resolution, request.coin.as_deref())
}
