// Configuration for:
// - Server listening address/port
// - Cache backing (directory, capacity)
// - Upstream credentials, timeout and rate limit
// - Freshness tiers per dataset
// - Ingestion secret and in-process schedule

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{Dataset, FreshnessPolicy};

/// API keys for upstream providers. `None` means the variable was unset or blank.
#[derive(Clone, Default)]
pub struct Credentials {
    pub nownodes_api_key: Option<String>,
    pub minerstat_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("nownodes_api_key", &self.nownodes_api_key.as_ref().map(|_| "<set>"))
            .field("minerstat_api_key", &self.minerstat_api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub cache_dir: PathBuf,
    pub cache_max_capacity: u64,
    pub credentials: Credentials,
    pub cron_secret: Option<String>,
    pub upstream_timeout: Duration,
    pub upstream_rate_limit: Option<u32>,
    pub mining_stats_policy: FreshnessPolicy,
    pub mining_stats_durable: bool,
    pub coins_policy: FreshnessPolicy,
    pub pools_policy: FreshnessPolicy,
    pub hardware_policy: FreshnessPolicy,
    pub price_policy: FreshnessPolicy,
    pub stale_background_refresh: bool,
    pub ingest_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = parse_var("SERVER_PORT", 8080);
        let cache_dir = env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("mining-stats-cache"));
        let cache_max_capacity = parse_var("CACHE_MAX_CAPACITY", 1000);

        let credentials = Credentials {
            nownodes_api_key: secret_var("NOWNODES_API_KEY"),
            minerstat_api_key: secret_var("MINERSTAT_API_KEY"),
        };
        let cron_secret = secret_var("CRON_SECRET");

        let upstream_timeout = Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", 5));
        let upstream_rate_limit = env::var("UPSTREAM_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &u32| n > 0);

        let mining_stats_policy = policy_var("MINING_STATS", 60 * 60, 6 * 60 * 60);
        let mining_stats_durable = parse_var("MINING_STATS_DURABLE", false);
        let coins_policy = policy_var("COINS", 4 * 60 * 60, 24 * 60 * 60);
        let pools_policy = policy_var("POOLS", 7 * 24 * 60 * 60, 14 * 24 * 60 * 60);
        let hardware_policy = policy_var("HARDWARE", 30 * 24 * 60 * 60, 60 * 24 * 60 * 60);
        let price_fresh = parse_var("PRICE_FRESH_SECS", 2 * 60 * 60);
        let price_policy = FreshnessPolicy::new(
            Duration::from_secs(price_fresh),
            Duration::from_secs(price_fresh),
        );
        let stale_background_refresh = parse_var("STALE_BACKGROUND_REFRESH", false);
        let ingest_interval = match parse_var::<u64>("INGEST_INTERVAL_SECS", 0) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            server_host,
            server_port,
            cache_dir,
            cache_max_capacity,
            credentials,
            cron_secret,
            upstream_timeout,
            upstream_rate_limit,
            mining_stats_policy,
            mining_stats_durable,
            coins_policy,
            pools_policy,
            hardware_policy,
            price_policy,
            stale_background_refresh,
            ingest_interval,
        }
    }

    /// Freshness tiers for a durable dataset.
    pub fn dataset_policy(&self, dataset: Dataset) -> FreshnessPolicy {
        match dataset {
            Dataset::MinerstatCoins => self.coins_policy,
            Dataset::Pools => self.pools_policy,
            Dataset::Hardware => self.hardware_policy,
        }
    }
}

impl Default for Config {
    /// Defaults without reading the environment: no credentials, no secret.
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            cache_dir: env::temp_dir().join("mining-stats-cache"),
            cache_max_capacity: 1000,
            credentials: Credentials::default(),
            cron_secret: None,
            upstream_timeout: Duration::from_secs(5),
            upstream_rate_limit: None,
            mining_stats_policy: FreshnessPolicy::from_secs(60 * 60, 6 * 60 * 60),
            mining_stats_durable: false,
            coins_policy: FreshnessPolicy::from_secs(4 * 60 * 60, 24 * 60 * 60),
            pools_policy: FreshnessPolicy::from_secs(7 * 24 * 60 * 60, 14 * 24 * 60 * 60),
            hardware_policy: FreshnessPolicy::from_secs(30 * 24 * 60 * 60, 60 * 24 * 60 * 60),
            price_policy: FreshnessPolicy::from_secs(2 * 60 * 60, 2 * 60 * 60),
            stale_background_refresh: false,
            ingest_interval: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn secret_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn policy_var(prefix: &str, fresh_default: u64, expire_default: u64) -> FreshnessPolicy {
    let fresh = parse_var(&format!("{prefix}_FRESH_SECS"), fresh_default);
    let expire = parse_var(&format!("{prefix}_EXPIRE_SECS"), expire_default);
    FreshnessPolicy::from_secs(fresh, expire)
}
