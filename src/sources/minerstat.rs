//! MinerStat datasets: coins, pools and hardware.

use crate::catalog::{self, MINERSTAT_COINS};
use crate::config::Credentials;
use crate::models::MinerstatCoin;
use crate::sources::{number, HttpTransport, SourceError, UpstreamRequest};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub const API_KEY_VAR: &str = "MINERSTAT_API_KEY";
pub const PROVIDER: &str = "minerstat";

const BASE_URL: &str = "https://api.minerstat.com/v2";

/// Normalized `/v2/coins` response.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerstatCoins {
    pub coins: BTreeMap<String, MinerstatCoin>,
    /// Rows in the upstream response, matched or not.
    pub raw_entries: usize,
}

/// A dataset kept as MinerStat returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    pub data: Value,
    pub entry_count: usize,
}

fn api_key(credentials: &Credentials) -> Result<&str, SourceError> {
    credentials
        .minerstat_api_key
        .as_deref()
        .ok_or(SourceError::MissingCredential(API_KEY_VAR))
}

pub async fn fetch_coins(
    transport: &dyn HttpTransport,
    credentials: &Credentials,
) -> Result<MinerstatCoins, SourceError> {
    let key = api_key(credentials)?;
    let list = MINERSTAT_COINS
        .iter()
        .map(|c| c.symbol)
        .collect::<Vec<_>>()
        .join(",");

    let body = transport
        .send_json(UpstreamRequest::get(
            PROVIDER,
            format!("{BASE_URL}/coins?key={key}&list={list}"),
        ))
        .await?;

    let coins = normalize_coins(&body)?;
    debug!(
        "MinerStat returned {} entries, {} matched",
        coins.raw_entries,
        coins.coins.len()
    );
    Ok(coins)
}

/// Keep the catalog coins whose algorithm matches, converting the reward to
/// per-unit-per-day.
pub fn normalize_coins(body: &Value) -> Result<MinerstatCoins, SourceError> {
    let rows = body
        .as_array()
        .ok_or_else(|| SourceError::upstream(PROVIDER, "expected an array of coins"))?;

    let mut coins = BTreeMap::new();
    for row in rows {
        let Some(symbol) = row.get("coin").and_then(Value::as_str) else {
            continue;
        };
        let Some(meta) = catalog::minerstat_lookup(symbol) else {
            continue;
        };
        // DGB is listed once per algorithm
        if row.get("algorithm").and_then(Value::as_str) != Some(meta.algorithm) {
            continue;
        }

        let raw_reward = number(row.get("reward"));
        coins.insert(
            meta.symbol.to_string(),
            MinerstatCoin {
                coin: meta.symbol.to_string(),
                algorithm: meta.algorithm.to_string(),
                unit: meta.unit.to_string(),
                per_unit: raw_reward.unwrap_or(0.0) * meta.multiplier,
                price: number(row.get("price")).unwrap_or(0.0),
                network_hashrate: number(row.get("network_hashrate")).unwrap_or(0.0),
                difficulty: number(row.get("difficulty")).unwrap_or(0.0),
                reward_block: number(row.get("reward_block")).unwrap_or(0.0),
                raw_reward,
            },
        );
    }

    Ok(MinerstatCoins {
        coins,
        raw_entries: rows.len(),
    })
}

pub async fn fetch_pools(
    transport: &dyn HttpTransport,
    credentials: &Credentials,
) -> Result<RawDataset, SourceError> {
    let key = api_key(credentials)?;
    let body = transport
        .send_json(UpstreamRequest::get(PROVIDER, format!("{BASE_URL}/pools?key={key}")))
        .await?;

    // keyed by pool name
    let entry_count = body
        .as_object()
        .map(|pools| pools.len())
        .ok_or_else(|| SourceError::upstream(PROVIDER, "expected an object of pools"))?;

    Ok(RawDataset {
        data: body,
        entry_count,
    })
}

pub async fn fetch_hardware(
    transport: &dyn HttpTransport,
    credentials: &Credentials,
) -> Result<RawDataset, SourceError> {
    let key = api_key(credentials)?;
    let body = transport
        .send_json(UpstreamRequest::get(PROVIDER, format!("{BASE_URL}/hardware?key={key}")))
        .await?;

    let entry_count = match &body {
        Value::Array(items) => items.len(),
        Value::Object(items) => items.len(),
        _ => return Err(SourceError::upstream(PROVIDER, "expected hardware list")),
    };

    Ok(RawDataset {
        data: body,
        entry_count,
    })
}
