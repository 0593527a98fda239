//! Live per-coin network stats with cached prices.

use crate::api::response::{batch_envelope, single_coin_envelope, Envelope};
use crate::cache::{CacheEntry, CacheKey, FreshnessPolicy};
use crate::catalog;
use crate::models::CoinStat;
use crate::service::Resolution;
use crate::sources::{coingecko, nownodes, SourceError};
use crate::state::AppState;
use futures::future::join_all;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// A validated `/api/mining-stats` request.
#[derive(Debug, Clone, Default)]
pub struct MiningStatsRequest {
    /// Upper-cased symbol; `None` means every supported coin.
    pub coin: Option<String>,
    pub refresh: bool,
    pub cache_hours: Option<f64>,
}

pub fn coin_stat_entry(stat: &CoinStat) -> Result<CacheEntry, SourceError> {
    let data = serde_json::to_value(stat)
        .map_err(|e| SourceError::upstream(stat.source.clone(), format!("unserializable stat: {e}")))?;
    Ok(CacheEntry::new(data)
        .fetched_at(stat.fetched_at)
        .with_coin_count(1)
        .with_source(stat.source.clone()))
}

/// Resolve one coin through the live cache. Unsupported symbols never reach upstream.
pub async fn resolve_coin(
    state: &AppState,
    symbol: &str,
    policy: FreshnessPolicy,
    force: bool,
) -> Resolution {
    if catalog::lookup(symbol).is_none() {
        debug!("Rejecting unsupported coin {}", symbol);
        return Resolution::unavailable(SourceError::UnsupportedCoin(symbol.to_string()));
    }

    let transport = state.transport.clone();
    let credentials = state.config.credentials.clone();
    let owned = symbol.to_string();
    state
        .live
        .resolve(&CacheKey::coin(symbol), policy, force, move || async move {
            let stat = nownodes::fetch_coin_stat(transport.as_ref(), &credentials, &owned).await?;
            coin_stat_entry(&stat)
        })
        .await
}

/// Resolve several coins concurrently; each slot succeeds or fails on its own.
pub async fn resolve_coins(
    state: &AppState,
    symbols: &[String],
    policy: FreshnessPolicy,
    force: bool,
) -> Vec<(String, Resolution)> {
    join_all(symbols.iter().map(|symbol| async move {
        (symbol.clone(), resolve_coin(state, symbol, policy, force).await)
    }))
    .await
}

/// Spot prices share the live store under their own tier.
pub async fn resolve_prices(state: &AppState, force: bool) -> Resolution {
    let transport = state.transport.clone();
    state
        .live
        .resolve(&CacheKey::Prices, state.config.price_policy, force, move || async move {
            let prices = coingecko::fetch_prices(transport.as_ref()).await?;
            let count = prices.len();
            let data = serde_json::to_value(prices)
                .map_err(|e| SourceError::upstream(coingecko::PROVIDER, e.to_string()))?;
            Ok(CacheEntry::new(data)
                .with_coin_count(count)
                .with_source(coingecko::PROVIDER))
        })
        .await
}

/// Effective tiers for a request: `cacheHours` replaces the fresh boundary.
pub fn request_policy(base: FreshnessPolicy, cache_hours: Option<f64>) -> FreshnessPolicy {
    match cache_hours {
        Some(hours) => base.with_fresh_for(Duration::from_secs_f64(hours * 3600.0)),
        None => base,
    }
}

pub async fn serve(state: &AppState, request: MiningStatsRequest) -> Envelope {
    let policy = request_policy(state.config.mining_stats_policy, request.cache_hours);
    let symbols: Vec<String> = match &request.coin {
        Some(symbol) => vec![symbol.clone()],
        None => catalog::symbols().map(str::to_string).collect(),
    };

    info!(
        "Serving mining stats for {} coin(s), refresh: {}",
        symbols.len(),
        request.refresh
    );

    // prices are never force-refreshed by visitors; their own tier governs them
    let (results, prices) = tokio::join!(
        resolve_coins(state, &symbols, policy, request.refresh),
        resolve_prices(state, false),
    );

    let prices = prices
        .entry
        .map(|entry| entry.data)
        .unwrap_or_else(|| Value::Object(Default::default()));
    let cache_hours = policy.fresh_for.as_secs_f64() / 3600.0;

    let envelope = match (&request.coin, results.first()) {
        (Some(_), Some((_, resolution))) => single_coin_envelope(resolution),
        _ => batch_envelope(&results),
    };
    envelope.with_prices(prices, cache_hours)
}
