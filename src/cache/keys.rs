//! Cache key generation and management

use std::fmt;

/// Datasets cached as a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    MinerstatCoins,
    Pools,
    Hardware,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Self::MinerstatCoins, Self::Pools, Self::Hardware];

    pub fn name(self) -> &'static str {
        match self {
            Self::MinerstatCoins => "minerstat-coins",
            Self::Pools => "minerstat-pools",
            Self::Hardware => "minerstat-hardware",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A structured cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Live network stats for one coin
    Coin(String),
    /// A whole upstream dataset
    Dataset(Dataset),
    /// Spot prices for every live coin
    Prices,
}

impl CacheKey {
    /// Create a coin key; symbols are normalized to upper case
    pub fn coin(symbol: &str) -> Self {
        Self::Coin(symbol.trim().to_ascii_uppercase())
    }

    /// File-system safe name, unique per key
    pub fn storage_name(&self) -> String {
        match self {
            Self::Coin(symbol) => {
                let safe: String = symbol
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                    .collect();
                format!("coin-{safe}")
            }
            Self::Dataset(dataset) => dataset.name().to_string(),
            Self::Prices => "prices".to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coin(symbol) => write!(f, "coin:{}", symbol),
            Self::Dataset(dataset) => write!(f, "dataset:{}", dataset),
            Self::Prices => f.write_str("prices"),
        }
    }
}
