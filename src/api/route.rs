use crate::{
    api::{error::ApiError, response::Envelope},
    cache::Dataset,
    service::{
        datasets::{self, DatasetRequest},
        mining_stats::{self, MiningStatsRequest},
        IngestJob, IngestSummary,
    },
    state::AppState,
    validation::{parse_refresh, validate_cache_hours, validate_coin_symbol, validate_secret},
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub const SECRET_HEADER: &str = "x-cron-secret";

// GET /api/mining-stats query parameters
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    coin: Option<String>,
    refresh: Option<String>,
    #[serde(rename = "cacheHours")]
    cache_hours: Option<String>,
}

// GET /api/coins, /api/pools, /api/hardware query parameters
#[derive(Debug, Default, Deserialize)]
pub struct DatasetQuery {
    coin: Option<String>,
    refresh: Option<String>,
}

// /api/update-* query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SecretQuery {
    secret: Option<String>,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/mining-stats", get(get_mining_stats))
        .route("/api/coins", get(get_coins))
        .route("/api/pools", get(get_pools))
        .route("/api/hardware", get(get_hardware))
        .route("/api/update-mining-stats", get(update_mining_stats).post(update_mining_stats))
        .route("/api/update-coins", get(update_coins).post(update_coins))
        .route("/api/update-pools", get(update_pools).post(update_pools))
        .route("/api/update-hardware", get(update_hardware).post(update_hardware))
        .layer(cors)
        .with_state(app_state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// GET /api/mining-stats handler
async fn get_mining_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Envelope, ApiError> {
    let request = MiningStatsRequest {
        coin: validate_coin_symbol(params.coin.as_deref())?,
        refresh: parse_refresh(params.refresh.as_deref()),
        cache_hours: validate_cache_hours(params.cache_hours.as_deref())?,
    };

    Ok(mining_stats::serve(&state, request).await)
}

// GET /api/coins handler
async fn get_coins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DatasetQuery>,
) -> Result<Response, ApiError> {
    let request = DatasetRequest {
        coin: validate_coin_symbol(params.coin.as_deref())?,
        refresh: parse_refresh(params.refresh.as_deref()),
    };

    let envelope = datasets::serve(&state, Dataset::MinerstatCoins, request).await;
    let mut response = envelope.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("s-maxage=300, stale-while-revalidate=600"),
    );
    Ok(response)
}

async fn get_pools(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DatasetQuery>,
) -> Envelope {
    serve_raw_dataset(&state, Dataset::Pools, params).await
}

async fn get_hardware(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DatasetQuery>,
) -> Envelope {
    serve_raw_dataset(&state, Dataset::Hardware, params).await
}

// pools and hardware are not keyed by coin, so `coin` is ignored
async fn serve_raw_dataset(state: &AppState, dataset: Dataset, params: DatasetQuery) -> Envelope {
    let request = DatasetRequest {
        coin: None,
        refresh: parse_refresh(params.refresh.as_deref()),
    };
    datasets::serve(state, dataset, request).await
}

/// Secret from the header, falling back to the `secret` query parameter.
fn authorize(state: &AppState, headers: &HeaderMap, query: &SecretQuery) -> Result<(), ApiError> {
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(query.secret.as_deref());

    if validate_secret(state.config.cron_secret.as_deref(), provided) {
        Ok(())
    } else {
        warn!("Rejected ingestion request with missing or wrong secret");
        Err(ApiError::Unauthorized)
    }
}

async fn run_ingest(
    state: &AppState,
    headers: &HeaderMap,
    query: &SecretQuery,
    job: IngestJob,
) -> Result<Json<IngestSummary>, ApiError> {
    authorize(state, headers, query)?;
    info!("Processing ingestion trigger: {}", job.name());
    let summary = job.run(state).await?;
    Ok(Json(summary))
}

async fn update_mining_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SecretQuery>,
) -> Result<Json<IngestSummary>, ApiError> {
    run_ingest(&state, &headers, &query, IngestJob::LiveCoins).await
}

async fn update_coins(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SecretQuery>,
) -> Result<Json<IngestSummary>, ApiError> {
    run_ingest(&state, &headers, &query, IngestJob::Dataset(Dataset::MinerstatCoins)).await
}

async fn update_pools(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SecretQuery>,
) -> Result<Json<IngestSummary>, ApiError> {
    run_ingest(&state, &headers, &query, IngestJob::Dataset(Dataset::Pools)).await
}

async fn update_hardware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SecretQuery>,
) -> Result<Json<IngestSummary>, ApiError> {
    run_ingest(&state, &headers, &query, IngestJob::Dataset(Dataset::Hardware)).await
}
