//! USD spot prices from CoinGecko's public API (no key required).

use crate::catalog::COINS;
use crate::models::PriceMap;
use crate::sources::{number, HttpTransport, SourceError, UpstreamRequest};
use serde_json::Value;

pub const PROVIDER: &str = "coingecko";

pub async fn fetch_prices(transport: &dyn HttpTransport) -> Result<PriceMap, SourceError> {
    let ids = COINS
        .iter()
        .map(|c| c.coingecko_id)
        .collect::<Vec<_>>()
        .join(",");
    let url = format!("https://api.coingecko.com/api/v3/simple/price?ids={ids}&vs_currencies=usd");

    let body = transport.send_json(UpstreamRequest::get(PROVIDER, url)).await?;
    normalize_prices(&body)
}

/// An empty result is an error so a bad response never replaces known prices.
pub fn normalize_prices(body: &Value) -> Result<PriceMap, SourceError> {
    let prices: PriceMap = COINS
        .iter()
        .filter_map(|coin| {
            let usd = number(body.get(coin.coingecko_id)?.get("usd"))?;
            Some((coin.symbol.to_string(), usd))
        })
        .collect();

    if prices.is_empty() {
        return Err(SourceError::upstream(PROVIDER, "no prices in response"));
    }
    Ok(prices)
}
