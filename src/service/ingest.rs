//! Unconditional fetch-and-store cycles that keep the caches warm.
//!
//! Unlike the serving path these fail loudly: they run unattended and an
//! operator needs to see repeated upstream failures.

use crate::cache::{CacheError, CacheKey, Dataset};
use crate::catalog;
use crate::service::datasets::fetch_dataset;
use crate::service::mining_stats::{coin_stat_entry, resolve_prices};
use crate::sources::{nownodes, SourceError};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{0} not configured")]
    MissingCredential(&'static str),

    #[error("{0}")]
    Upstream(String),

    #[error("Cache write failed: {0}")]
    Store(#[from] CacheError),
}

impl IngestError {
    /// Worth retrying: upstream hiccups and transient storage errors.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MissingCredential(_))
    }
}

impl From<SourceError> for IngestError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::MissingCredential(var) => Self::MissingCredential(var),
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub success: bool,
    pub message: String,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

/// Fetch a dataset and overwrite its cache entry.
pub async fn ingest_dataset(state: &AppState, dataset: Dataset) -> Result<IngestSummary, IngestError> {
    let entry = fetch_dataset(state.transport.as_ref(), &state.config.credentials, dataset).await?;
    let fetched_at = entry.fetched_at;

    let summary = match dataset {
        Dataset::MinerstatCoins => {
            let coins: Vec<String> = entry
                .data
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default();
            IngestSummary {
                success: true,
                message: format!(
                    "Cached {} coins from {} entries",
                    coins.len(),
                    entry.raw_entries.unwrap_or(0)
                ),
                fetched_at,
                coins: Some(coins),
                entry_count: None,
                failures: BTreeMap::new(),
            }
        }
        Dataset::Pools | Dataset::Hardware => {
            let count = entry.entry_count.unwrap_or(0);
            IngestSummary {
                success: true,
                message: format!("Cached {} {} entries", count, dataset),
                fetched_at,
                coins: None,
                entry_count: Some(count),
                failures: BTreeMap::new(),
            }
        }
    };

    state
        .datasets
        .store()
        .put(&CacheKey::Dataset(dataset), entry)
        .await?;
    info!("{}", summary.message);
    Ok(summary)
}

/// Refresh every live coin and the price table.
///
/// Succeeds when at least one coin refreshed; per-coin failures are listed
/// in the summary.
pub async fn ingest_live_coins(state: &AppState) -> Result<IngestSummary, IngestError> {
    if state.config.credentials.nownodes_api_key.is_none() {
        return Err(IngestError::MissingCredential(nownodes::API_KEY_VAR));
    }

    let fetched = join_all(catalog::symbols().map(|symbol| async move {
        let result = nownodes::fetch_coin_stat(
            state.transport.as_ref(),
            &state.config.credentials,
            symbol,
        )
        .await
        .and_then(|stat| coin_stat_entry(&stat));
        (symbol, result)
    }))
    .await;

    let mut coins = Vec::new();
    let mut failures = BTreeMap::new();
    for (symbol, result) in fetched {
        match result {
            Ok(entry) => match state.live.store().put(&CacheKey::coin(symbol), entry).await {
                Ok(()) => coins.push(symbol.to_string()),
                Err(e) => {
                    error!("Live ingestion for {} could not be stored: {}", symbol, e);
                    failures.insert(symbol.to_string(), e.to_string());
                }
            },
            Err(e) => {
                warn!("Live ingestion for {} failed: {}", symbol, e);
                failures.insert(symbol.to_string(), e.to_string());
            }
        }
    }

    if coins.is_empty() {
        let detail = failures
            .iter()
            .map(|(coin, e)| format!("{coin}: {e}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(IngestError::Upstream(format!("all coins failed ({detail})")));
    }

    let prices = resolve_prices(state, true).await;
    if let Some(e) = prices.error {
        warn!("Price refresh during ingestion failed: {}", e);
    }

    let summary = IngestSummary {
        success: true,
        message: format!("Cached {} of {} live coins", coins.len(), catalog::COINS.len()),
        fetched_at: Utc::now(),
        coins: Some(coins),
        entry_count: None,
        failures,
    };
    info!("{}", summary.message);
    Ok(summary)
}

/// Job names used by logs and the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestJob {
    LiveCoins,
    Dataset(Dataset),
}

impl IngestJob {
    pub fn all() -> Vec<IngestJob> {
        let mut jobs = vec![IngestJob::LiveCoins];
        jobs.extend(Dataset::ALL.into_iter().map(IngestJob::Dataset));
        jobs
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LiveCoins => "live-coins",
            Self::Dataset(dataset) => dataset.name(),
        }
    }

    pub async fn run(self, state: &AppState) -> Result<IngestSummary, IngestError> {
        let result = match self {
            Self::LiveCoins => ingest_live_coins(state).await,
            Self::Dataset(dataset) => ingest_dataset(state, dataset).await,
        };
        if let Err(e) = &result {
            error!("Ingestion job {} failed: {}", self.name(), e);
        }
        result
    }
}
