//! Shared fixtures: a scripted upstream transport and state builders.

use crate::{
    cache::{CacheEntry, CacheError, CacheKey, CacheStore, FileStore, MemoryStore},
    config::{Config, Credentials},
    sources::{HttpTransport, SourceError, UpstreamRequest},
    state::AppState,
};
use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "test-cron-secret";

struct Route {
    fragment: String,
    result: Result<Value, SourceError>,
    /// Answers left before the route falls through; `None` never runs out.
    remaining: Option<usize>,
}

/// Answers requests by URL fragment and records every URL it was asked for.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Later registrations for the same fragment take precedence.
    pub fn respond(&self, fragment: &str, body: Value) {
        self.route(fragment, Ok(body), None);
    }

    pub fn fail(&self, fragment: &str, message: &str) {
        self.route(fragment, Err(SourceError::upstream("scripted", message)), None);
    }

    /// Fail the next `times` matching requests, then fall through to older routes.
    pub fn fail_times(&self, fragment: &str, times: usize, message: &str) {
        self.route(fragment, Err(SourceError::upstream("scripted", message)), Some(times));
    }

    fn route(&self, fragment: &str, result: Result<Value, SourceError>, remaining: Option<usize>) {
        self.routes.lock().unwrap().insert(
            0,
            Route {
                fragment: fragment.to_string(),
                result,
                remaining,
            },
        );
    }

    pub fn calls_to(&self, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send_json(&self, request: UpstreamRequest) -> Result<Value, SourceError> {
        self.calls.lock().unwrap().push(request.url.clone());
        let mut routes = self.routes.lock().unwrap();
        let route = routes.iter_mut().find(|route| {
            request.url.contains(route.fragment.as_str()) && route.remaining != Some(0)
        });
        match route {
            Some(route) => {
                if let Some(left) = route.remaining.as_mut() {
                    *left -= 1;
                }
                route.result.clone()
            }
            None => Err(SourceError::upstream(request.provider, "returned HTTP 503")),
        }
    }
}

/// Memory store that refuses writes for chosen keys.
pub struct RejectingStore {
    inner: MemoryStore,
    rejected: HashSet<CacheKey>,
}

impl RejectingStore {
    pub fn new(rejected: impl IntoIterator<Item = CacheKey>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(100),
            rejected: rejected.into_iter().collect(),
        })
    }
}

#[async_trait]
impl CacheStore for RejectingStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        if self.rejected.contains(key) {
            return Err(CacheError::Io(std::io::Error::other("disk full")));
        }
        self.inner.put(key, entry).await
    }

    fn backing(&self) -> &'static str {
        "rejecting"
    }
}

pub fn config_with_keys() -> Config {
    Config {
        credentials: Credentials {
            nownodes_api_key: Some("nownodes-key".to_string()),
            minerstat_api_key: Some("minerstat-key".to_string()),
        },
        cron_secret: Some(SECRET.to_string()),
        ..Config::default()
    }
}

pub struct TestEnv {
    pub state: Arc<AppState>,
    pub transport: Arc<ScriptedTransport>,
    pub live_store: Arc<dyn CacheStore>,
    pub dataset_store: Arc<FileStore>,
    // dropped last: removes the dataset directory
    pub _dir: TempDir,
}

impl TestEnv {
    pub fn new(config: Config) -> Self {
        Self::with_live_store(config, Arc::new(MemoryStore::new(100)))
    }

    pub fn with_live_store(config: Config, live_store: Arc<dyn CacheStore>) -> Self {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        let dataset_store = Arc::new(FileStore::new(dir.path()));
        let state = Arc::new(AppState::new(
            config,
            transport.clone(),
            live_store.clone(),
            dataset_store.clone(),
        ));
        Self {
            state,
            transport,
            live_store,
            dataset_store,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        crate::api::create_router(self.state.clone())
    }
}

pub fn blockbook_body(difficulty: f64, blocks: u64) -> Value {
    json!({
        "blockbook": { "coin": "Test", "inSync": true },
        "backend": { "chain": "main", "blocks": blocks, "difficulty": difficulty.to_string() }
    })
}

pub fn gecko_body() -> Value {
    json!({ "bitcoin": { "usd": 65000.0 }, "litecoin": { "usd": 80.0 } })
}

pub fn minerstat_coins_body() -> Value {
    json!([
        { "coin": "ZEC", "name": "Zcash", "algorithm": "Equihash", "price": 42.0, "reward": 0.0000015, "network_hashrate": 1.3e10, "difficulty": 9.1e7, "reward_block": 1.25 },
        { "coin": "XMR", "name": "Monero", "algorithm": "RandomX", "price": 160.0, "reward": 0.0000004, "network_hashrate": 5.0e9, "difficulty": 6.0e11, "reward_block": 0.6 },
        { "coin": "DGB", "name": "DigiByte", "algorithm": "SHA-256", "price": 0.01, "reward": 1e-12 },
        { "coin": "DGB", "name": "DigiByte", "algorithm": "Scrypt", "price": 0.01, "reward": 2e-9 },
        { "coin": "ETH", "name": "Ethereum", "algorithm": "Ethash", "price": 3000.0 }
    ])
}

pub async fn get(app: &Router, uri: &str) -> (u16, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(app: &Router, request: Request<Body>) -> (u16, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
