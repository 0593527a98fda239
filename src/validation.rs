use thiserror::Error;

/// Longest `cacheHours` a caller may request (30 days).
pub const MAX_CACHE_HOURS: f64 = 720.0;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid coin symbol: {0}")]
    InvalidCoin(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Normalize an optional `coin` parameter. Blank means "all coins".
///
/// Only the shape is checked here; membership in the supported set is
/// reported per coin by the serving layer.
pub fn validate_coin_symbol(coin: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(coin) = coin.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if coin.len() > 12 || !coin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidCoin(coin.to_string()));
    }

    Ok(Some(coin.to_ascii_uppercase()))
}

/// `refresh` is on for any value except an explicit negative or blank.
pub fn parse_refresh(refresh: Option<&str>) -> bool {
    match refresh.map(|r| r.trim().to_ascii_lowercase()) {
        None => false,
        Some(r) => !matches!(r.as_str(), "" | "0" | "false" | "no"),
    }
}

pub fn validate_cache_hours(hours: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = hours.map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(None);
    };

    let hours: f64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidParameter(format!("cacheHours must be a number, got {raw}")))?;

    if !hours.is_finite() || hours <= 0.0 || hours > MAX_CACHE_HOURS {
        return Err(ValidationError::InvalidParameter(format!(
            "cacheHours must be greater than 0 and at most {MAX_CACHE_HOURS}"
        )));
    }

    Ok(Some(hours))
}

/// Compare a provided ingestion secret with the configured one.
/// With no secret configured, nothing is authorized.
pub fn validate_secret(configured: Option<&str>, provided: Option<&str>) -> bool {
    match (configured, provided) {
        (Some(expected), Some(given)) => constant_time_eq(expected.as_bytes(), given.as_bytes()),
        _ => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_symbols_are_uppercased() {
        assert_eq!(validate_coin_symbol(Some(" btc ")).unwrap(), Some("BTC".to_string()));
        assert_eq!(validate_coin_symbol(Some("")).unwrap(), None);
        assert_eq!(validate_coin_symbol(None).unwrap(), None);
        assert!(validate_coin_symbol(Some("../etc")).is_err());
        assert!(validate_coin_symbol(Some("AVERYLONGSYMBOL")).is_err());
    }

    #[test]
    fn refresh_flag_parsing() {
        assert!(!parse_refresh(None));
        assert!(!parse_refresh(Some("")));
        assert!(!parse_refresh(Some("false")));
        assert!(!parse_refresh(Some("0")));
        assert!(parse_refresh(Some("1")));
        assert!(parse_refresh(Some("true")));
        assert!(parse_refresh(Some("yes")));
    }

    #[test]
    fn cache_hours_bounds() {
        assert_eq!(validate_cache_hours(Some("2")).unwrap(), Some(2.0));
        assert_eq!(validate_cache_hours(Some("0.5")).unwrap(), Some(0.5));
        assert_eq!(validate_cache_hours(None).unwrap(), None);
        assert!(validate_cache_hours(Some("0")).is_err());
        assert!(validate_cache_hours(Some("-1")).is_err());
        assert!(validate_cache_hours(Some("1000")).is_err());
        assert!(validate_cache_hours(Some("NaN")).is_err());
        assert!(validate_cache_hours(Some("soon")).is_err());
    }

    #[test]
    fn secrets_must_match_exactly() {
        assert!(validate_secret(Some("s3cret"), Some("s3cret")));
        assert!(!validate_secret(Some("s3cret"), Some("s3cre")));
        assert!(!validate_secret(Some("s3cret"), None));
        assert!(!validate_secret(None, Some("anything")));
        assert!(!validate_secret(None, None));
    }
}
