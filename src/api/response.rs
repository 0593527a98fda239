//! Uniform response envelope for the serving endpoints.
//!
//! `success` reports whether the request produced data at all. Per-coin
//! failures inside a batch are embedded in that coin's slot and leave
//! `success` true.

use crate::cache::CacheEntry;
use crate::service::{Origin, Resolution};
use crate::sources::SourceError;
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_minutes: u64,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Origin>,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Value>,
}

impl Envelope {
    /// No data could be produced.
    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            source: None,
            data: Value::Null,
            meta: None,
            error: Some(code),
            message: Some(message.into()),
            cache_hours: None,
            prices: None,
        }
    }

    pub fn with_prices(mut self, prices: Value, cache_hours: f64) -> Self {
        self.prices = Some(prices);
        self.cache_hours = Some(cache_hours);
        self
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let json = match serde_json::to_string(&self) {
            Ok(json) => json,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        (StatusCode::OK, headers, json).into_response()
    }
}

pub fn age_minutes(age: Duration) -> u64 {
    (age.as_secs_f64() / 60.0).round() as u64
}

fn meta_for(entry: &CacheEntry, resolution: &Resolution) -> Meta {
    Meta {
        fetched_at: Some(entry.fetched_at),
        age_minutes: age_minutes(resolution.age),
        stale: resolution.stale,
        coin_count: entry.coin_count,
        entry_count: entry.entry_count,
    }
}

/// Message for a resolution that produced no data.
fn unavailable_message(error: &SourceError) -> String {
    match error {
        SourceError::MissingCredential(var) => {
            format!("{var} not configured and no cache available")
        }
        SourceError::Upstream { .. } => format!("No cache available and fetch failed: {error}"),
        SourceError::UnsupportedCoin(_) => error.to_string(),
    }
}

fn unavailable_from(resolution: &Resolution) -> Envelope {
    match &resolution.error {
        Some(e) => Envelope::unavailable(e.code(), unavailable_message(e)),
        None => Envelope::unavailable("no_data", "No data available"),
    }
}

/// Envelope for a whole dataset, optionally narrowed to one coin.
pub fn dataset_envelope(resolution: &Resolution, coin: Option<&str>) -> Envelope {
    let Some(entry) = &resolution.entry else {
        return unavailable_from(resolution);
    };

    let data = match coin {
        None => entry.data.clone(),
        Some(symbol) => match entry.data.get(symbol) {
            Some(value) => value.clone(),
            None => {
                let mut envelope =
                    Envelope::unavailable("no_data", format!("No data for {symbol} in this dataset"));
                envelope.meta = Some(meta_for(entry, resolution));
                return envelope;
            }
        },
    };

    Envelope {
        success: true,
        source: resolution.origin,
        data,
        meta: Some(meta_for(entry, resolution)),
        error: resolution.error.as_ref().map(SourceError::code),
        message: resolution.error.as_ref().map(ToString::to_string),
        cache_hours: None,
        prices: None,
    }
}

/// One coin's slot in a batch: the stat plus freshness flags, or an embedded error.
pub fn coin_result(resolution: &Resolution) -> Value {
    let Some(entry) = &resolution.entry else {
        return match &resolution.error {
            Some(e) => json!({ "error": e.to_string(), "code": e.code() }),
            None => json!({ "error": "No data available", "code": "no_data" }),
        };
    };

    let mut slot = match &entry.data {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other.clone());
            map
        }
    };
    slot.insert("from_cache".to_string(), json!(resolution.from_cache()));
    slot.insert("stale".to_string(), json!(resolution.stale));
    slot.insert("age_minutes".to_string(), json!(age_minutes(resolution.age)));
    if let Some(e) = &resolution.error {
        slot.insert("error".to_string(), json!(e.to_string()));
        slot.insert("code".to_string(), json!(e.code()));
    }
    Value::Object(slot)
}

/// Envelope for a single requested coin.
pub fn single_coin_envelope(resolution: &Resolution) -> Envelope {
    let Some(entry) = &resolution.entry else {
        return unavailable_from(resolution);
    };

    Envelope {
        success: true,
        source: resolution.origin,
        data: coin_result(resolution),
        meta: Some(meta_for(entry, resolution)),
        error: resolution.error.as_ref().map(SourceError::code),
        message: resolution.error.as_ref().map(ToString::to_string),
        cache_hours: None,
        prices: None,
    }
}

/// Envelope for several coins keyed by symbol. Meta reports the oldest data served.
pub fn batch_envelope(results: &[(String, Resolution)]) -> Envelope {
    let mut data = Map::new();
    let mut oldest: Option<DateTime<Utc>> = None;
    let mut max_age = Duration::ZERO;
    let mut stale = false;
    let mut coin_count = 0;

    for (symbol, resolution) in results {
        data.insert(symbol.clone(), coin_result(resolution));
        if let Some(entry) = &resolution.entry {
            coin_count += 1;
            stale |= resolution.stale;
            max_age = max_age.max(resolution.age);
            oldest = Some(match oldest {
                Some(t) => t.min(entry.fetched_at),
                None => entry.fetched_at,
            });
        }
    }

    Envelope {
        success: true,
        source: None,
        data: Value::Object(data),
        meta: Some(Meta {
            fetched_at: oldest,
            age_minutes: age_minutes(max_age),
            stale,
            coin_count: Some(coin_count),
            entry_count: None,
        }),
        error: None,
        message: None,
        cache_hours: None,
        prices: None,
    }
}
