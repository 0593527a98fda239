pub mod client;
pub mod coingecko;
pub mod error;
pub mod minerstat;
pub mod nownodes;

pub use client::{HttpTransport, Method, ReqwestTransport, UpstreamRequest};
pub use error::SourceError;

use serde_json::Value;

/// Reads a JSON number or numeric string. Explorers disagree on which they send.
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

/// Reads a required numeric field by JSON pointer.
pub(crate) fn require_number(
    body: &Value,
    pointer: &str,
    provider: &str,
) -> Result<f64, SourceError> {
    number(body.pointer(pointer))
        .ok_or_else(|| SourceError::upstream(provider, format!("missing field {pointer}")))
}

/// JSON-RPC servers report failures in-band with HTTP 200.
pub(crate) fn check_rpc_error(body: &Value, provider: &str) -> Result<(), SourceError> {
    match body.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(err) => {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            Err(SourceError::upstream(provider, format!("RPC error: {message}")))
        }
    }
}
