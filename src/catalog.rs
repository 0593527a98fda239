//! Canonical per-coin metadata.
//!
//! Every adapter reads block time, block reward and hashrate policy from
//! here, so a halving only ever needs one edit. The reward and block time
//! values change with network events and are maintained by hand.

use crate::models::HashrateFormula;

/// Upstream provider serving live network stats for a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// NOWNodes Blockbook REST, `https://{host}/api/v2`
    Blockbook { host: &'static str },
    /// NOWNodes Kaspa REST `/info/network`
    KaspaRest,
    /// NOWNodes Monero JSON-RPC `get_info`
    MoneroRpc,
    /// NOWNodes DigiByte JSON-RPC `getmininginfo`
    DigibyteRpc,
}

/// Where a coin's network hashrate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashrateSource {
    /// The provider reports it directly.
    Reported,
    /// Derived from difficulty with a validated formula.
    Estimated(HashrateFormula),
    /// No validated formula and nothing reported; always 0.
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
pub struct CoinMeta {
    pub symbol: &'static str,
    pub name: &'static str,
    pub algorithm: &'static str,
    /// Target seconds per block (per algorithm for multi-algo chains).
    pub block_time: f64,
    /// Miner reward per block in whole coins.
    pub block_reward: f64,
    pub provider: Provider,
    pub hashrate: HashrateSource,
    pub coingecko_id: &'static str,
}

pub static COINS: &[CoinMeta] = &[
    CoinMeta {
        symbol: "BTC",
        name: "Bitcoin",
        algorithm: "SHA-256",
        block_time: 600.0,
        block_reward: 3.125,
        provider: Provider::Blockbook { host: "btcbook.nownodes.io" },
        hashrate: HashrateSource::Estimated(HashrateFormula::Pow2_32),
        coingecko_id: "bitcoin",
    },
    CoinMeta {
        symbol: "LTC",
        name: "Litecoin",
        algorithm: "Scrypt",
        block_time: 150.0,
        block_reward: 6.25,
        provider: Provider::Blockbook { host: "ltcbook.nownodes.io" },
        hashrate: HashrateSource::Estimated(HashrateFormula::Pow2_32),
        coingecko_id: "litecoin",
    },
    CoinMeta {
        symbol: "DOGE",
        name: "Dogecoin",
        algorithm: "Scrypt",
        block_time: 60.0,
        block_reward: 10_000.0,
        provider: Provider::Blockbook { host: "dogebook.nownodes.io" },
        hashrate: HashrateSource::Estimated(HashrateFormula::Pow2_32),
        coingecko_id: "dogecoin",
    },
    CoinMeta {
        symbol: "KAS",
        name: "Kaspa",
        algorithm: "kHeavyHash",
        // 10 blocks per second since the Crescendo hard fork
        block_time: 0.1,
        block_reward: 2.0,
        provider: Provider::KaspaRest,
        hashrate: HashrateSource::Reported,
        coingecko_id: "kaspa",
    },
    CoinMeta {
        symbol: "BCH",
        name: "Bitcoin Cash",
        algorithm: "SHA-256",
        block_time: 600.0,
        block_reward: 3.125,
        provider: Provider::Blockbook { host: "bchbook.nownodes.io" },
        hashrate: HashrateSource::Estimated(HashrateFormula::Pow2_32),
        coingecko_id: "bitcoin-cash",
    },
    CoinMeta {
        symbol: "DASH",
        name: "Dash",
        algorithm: "X11",
        block_time: 150.0,
        block_reward: 0.44,
        provider: Provider::Blockbook { host: "dashbook.nownodes.io" },
        hashrate: HashrateSource::Estimated(HashrateFormula::Pow2_32),
        coingecko_id: "dash",
    },
    CoinMeta {
        symbol: "ETC",
        name: "Ethereum Classic",
        algorithm: "Etchash",
        block_time: 13.0,
        block_reward: 2.048,
        provider: Provider::Blockbook { host: "etcbook.nownodes.io" },
        hashrate: HashrateSource::Unavailable,
        coingecko_id: "ethereum-classic",
    },
    CoinMeta {
        symbol: "RVN",
        name: "Ravencoin",
        algorithm: "KawPow",
        block_time: 60.0,
        block_reward: 1250.0,
        provider: Provider::Blockbook { host: "rvnbook.nownodes.io" },
        hashrate: HashrateSource::Unavailable,
        coingecko_id: "ravencoin",
    },
    CoinMeta {
        symbol: "ZEC",
        name: "Zcash",
        algorithm: "Equihash",
        block_time: 75.0,
        // miner share after the development fund
        block_reward: 1.25,
        provider: Provider::Blockbook { host: "zecbook.nownodes.io" },
        hashrate: HashrateSource::Estimated(HashrateFormula::Equihash),
        coingecko_id: "zcash",
    },
    CoinMeta {
        symbol: "XMR",
        name: "Monero",
        algorithm: "RandomX",
        block_time: 120.0,
        block_reward: 0.6,
        provider: Provider::MoneroRpc,
        hashrate: HashrateSource::Estimated(HashrateFormula::PerBlockTime),
        coingecko_id: "monero",
    },
    CoinMeta {
        symbol: "DGB",
        name: "DigiByte",
        algorithm: "SHA-256",
        // five algorithms share a 15 s target
        block_time: 75.0,
        block_reward: 248.0,
        provider: Provider::DigibyteRpc,
        hashrate: HashrateSource::Reported,
        coingecko_id: "digibyte",
    },
];

/// Look up a live-stats coin by symbol (case-insensitive).
pub fn lookup(symbol: &str) -> Option<&'static CoinMeta> {
    COINS.iter().find(|c| c.symbol.eq_ignore_ascii_case(symbol))
}

pub fn symbols() -> impl Iterator<Item = &'static str> {
    COINS.iter().map(|c| c.symbol)
}

/// A coin served from the MinerStat dataset.
#[derive(Debug, Clone, Copy)]
pub struct MinerstatMeta {
    pub symbol: &'static str,
    /// Only the MinerStat entry with this algorithm is kept.
    pub algorithm: &'static str,
    pub unit: &'static str,
    /// Converts MinerStat's reward per 1 H/s per hour into reward per `unit` per day.
    pub multiplier: f64,
}

pub static MINERSTAT_COINS: &[MinerstatMeta] = &[
    MinerstatMeta { symbol: "ZEC", algorithm: "Equihash", unit: "kSol/s", multiplier: 1e3 * 24.0 },
    MinerstatMeta { symbol: "XMR", algorithm: "RandomX", unit: "KH/s", multiplier: 1e3 * 24.0 },
    MinerstatMeta { symbol: "ALPH", algorithm: "Blake3", unit: "GH/s", multiplier: 1e9 * 24.0 },
    MinerstatMeta { symbol: "DGB", algorithm: "Scrypt", unit: "MH/s", multiplier: 1e6 * 24.0 },
    MinerstatMeta { symbol: "CKB", algorithm: "Eaglesong", unit: "GH/s", multiplier: 1e9 * 24.0 },
    MinerstatMeta { symbol: "SC", algorithm: "Blake2b-Sia", unit: "GH/s", multiplier: 1e9 * 24.0 },
    MinerstatMeta { symbol: "KDA", algorithm: "Blake2s", unit: "GH/s", multiplier: 1e9 * 24.0 },
];

pub fn minerstat_lookup(symbol: &str) -> Option<&'static MinerstatMeta> {
    MINERSTAT_COINS
        .iter()
        .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
}
