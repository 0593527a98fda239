//! Live network stats from NOWNodes.
//!
//! Blockbook REST for the Bitcoin-family explorers, Kaspa REST, and JSON-RPC
//! for Monero and DigiByte. Each response shape is normalized into a
//! [`CoinStat`] using the constants from [`crate::catalog`].

use crate::catalog::{self, CoinMeta, HashrateSource, Provider};
use crate::config::Credentials;
use crate::models::{CoinStat, HashrateFormula};
use crate::sources::{check_rpc_error, number, require_number, HttpTransport, SourceError, UpstreamRequest};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::debug;

pub const API_KEY_VAR: &str = "NOWNODES_API_KEY";

const BLOCKBOOK: &str = "nownodes-blockbook";
const KASPA: &str = "nownodes-kaspa";
const MONERO: &str = "nownodes-monero";
const DIGIBYTE: &str = "nownodes-digibyte";

/// Fetch and normalize live stats for one coin.
pub async fn fetch_coin_stat(
    transport: &dyn HttpTransport,
    credentials: &Credentials,
    symbol: &str,
) -> Result<CoinStat, SourceError> {
    let meta = catalog::lookup(symbol)
        .ok_or_else(|| SourceError::UnsupportedCoin(symbol.to_string()))?;
    let api_key = credentials
        .nownodes_api_key
        .as_deref()
        .ok_or(SourceError::MissingCredential(API_KEY_VAR))?;

    let request = build_request(meta, api_key);
    debug!("Fetching {} via {}", meta.symbol, request.provider);
    let body = transport.send_json(request).await?;

    normalize(meta, &body, Utc::now())
}

pub fn build_request(meta: &CoinMeta, api_key: &str) -> UpstreamRequest {
    let request = match meta.provider {
        Provider::Blockbook { host } => {
            UpstreamRequest::get(BLOCKBOOK, format!("https://{host}/api/v2"))
        }
        Provider::KaspaRest => UpstreamRequest::get(KASPA, "https://kas.nownodes.io/info/network"),
        Provider::MoneroRpc => UpstreamRequest::post_json(
            MONERO,
            "https://xmr.nownodes.io/json_rpc",
            json!({ "jsonrpc": "2.0", "id": "0", "method": "get_info" }),
        ),
        Provider::DigibyteRpc => UpstreamRequest::post_json(
            DIGIBYTE,
            "https://dgb.nownodes.io",
            json!({ "jsonrpc": "1.0", "id": "dgb-mining", "method": "getmininginfo", "params": [] }),
        ),
    };
    request.header("api-key", api_key)
}

/// Translate a provider response into a [`CoinStat`].
pub fn normalize(
    meta: &CoinMeta,
    body: &Value,
    fetched_at: DateTime<Utc>,
) -> Result<CoinStat, SourceError> {
    let (source, difficulty, reported, height) = match meta.provider {
        Provider::Blockbook { .. } => {
            let difficulty = require_number(body, "/backend/difficulty", BLOCKBOOK)?;
            let height = number(body.pointer("/backend/blocks"));
            (BLOCKBOOK, difficulty, None, height)
        }
        Provider::KaspaRest => {
            let difficulty = require_number(body, "/difficulty", KASPA)?;
            let hashrate = number(body.get("hashrate"));
            let height = number(body.get("blockCount"));
            (KASPA, difficulty, hashrate, height)
        }
        Provider::MoneroRpc => {
            check_rpc_error(body, MONERO)?;
            let difficulty = require_number(body, "/result/difficulty", MONERO)?;
            let height = number(body.pointer("/result/height"));
            (MONERO, difficulty, None, height)
        }
        Provider::DigibyteRpc => {
            check_rpc_error(body, DIGIBYTE)?;
            // getmininginfo carries one figure per algorithm; only sha256d is ours
            let difficulty = require_number(body, "/result/difficulties/sha256d", DIGIBYTE)?;
            let hashrate = number(body.pointer("/result/networkhashesps/sha256d"));
            let height = number(body.pointer("/result/blocks"));
            (DIGIBYTE, difficulty, hashrate, height)
        }
    };

    let (network_hashrate, hashrate_formula) = resolve_hashrate(meta, difficulty, reported);

    Ok(CoinStat {
        coin: meta.symbol.to_string(),
        algorithm: meta.algorithm.to_string(),
        difficulty,
        network_hashrate,
        hashrate_estimated: hashrate_formula.is_some(),
        hashrate_formula,
        block_reward: meta.block_reward,
        block_time: meta.block_time,
        height: height.filter(|h| *h >= 0.0).map(|h| h as u64).unwrap_or(0),
        source: source.to_string(),
        fetched_at,
    })
}

/// Hashrate and, when derived, the formula that produced it.
/// Coins without a validated formula report 0 rather than a guess.
fn resolve_hashrate(
    meta: &CoinMeta,
    difficulty: f64,
    reported: Option<f64>,
) -> (f64, Option<HashrateFormula>) {
    match meta.hashrate {
        HashrateSource::Reported => (reported.filter(|h| *h > 0.0).unwrap_or(0.0), None),
        HashrateSource::Estimated(formula) => {
            let estimate = formula.estimate(difficulty, meta.block_time);
            if estimate > 0.0 {
                (estimate, Some(formula))
            } else {
                (0.0, None)
            }
        }
        HashrateSource::Unavailable => (0.0, None),
    }
}
