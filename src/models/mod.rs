// Normalized records produced by the source adapters and stored in the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Formula used to derive network hashrate from difficulty.
///
/// The formulas are algorithm specific and must not be mixed: applying the
/// 2^32 factor to an Equihash coin overstates its hashrate by a factor of 2^19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashrateFormula {
    /// `difficulty * 2^32 / block_time` (SHA-256d, Scrypt, X11)
    Pow2_32,
    /// `difficulty * 2^13 / block_time` (Equihash)
    Equihash,
    /// `difficulty / block_time` (RandomX, Eaglesong)
    PerBlockTime,
}

impl HashrateFormula {
    pub fn estimate(self, difficulty: f64, block_time: f64) -> f64 {
        if difficulty <= 0.0 || block_time <= 0.0 {
            return 0.0;
        }
        match self {
            Self::Pow2_32 => difficulty * 2f64.powi(32) / block_time,
            Self::Equihash => difficulty * 2f64.powi(13) / block_time,
            Self::PerBlockTime => difficulty / block_time,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Pow2_32 => "difficulty * 2^32 / block_time",
            Self::Equihash => "difficulty * 2^13 / block_time",
            Self::PerBlockTime => "difficulty / block_time",
        }
    }
}

impl fmt::Display for HashrateFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One snapshot of a coin's network state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinStat {
    pub coin: String,
    pub algorithm: String,
    pub difficulty: f64,
    pub network_hashrate: f64,
    pub hashrate_estimated: bool,
    /// Set exactly when `hashrate_estimated` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashrate_formula: Option<HashrateFormula>,
    pub block_reward: f64,
    pub block_time: f64,
    pub height: u64,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// A MinerStat coin entry, reduced to the fields the calculator uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerstatCoin {
    pub coin: String,
    pub algorithm: String,
    pub unit: String,
    /// Reward per `unit` of hashrate per day.
    #[serde(rename = "perUnit")]
    pub per_unit: f64,
    pub price: f64,
    pub network_hashrate: f64,
    pub difficulty: f64,
    pub reward_block: f64,
    /// MinerStat's own figure (per 1 H/s per hour), kept for debugging.
    pub raw_reward: Option<f64>,
}

/// USD prices keyed by coin symbol.
pub type PriceMap = BTreeMap<String, f64>;
