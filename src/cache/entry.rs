use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// The latest successful fetch for one key. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_entries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
            coin_count: None,
            entry_count: None,
            raw_entries: None,
            source: None,
        }
    }

    pub fn with_coin_count(mut self, count: usize) -> Self {
        self.coin_count = Some(count);
        self
    }

    pub fn with_entry_count(mut self, count: usize) -> Self {
        self.entry_count = Some(count);
        self
    }

    pub fn with_raw_entries(mut self, count: usize) -> Self {
        self.raw_entries = Some(count);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn fetched_at(mut self, at: DateTime<Utc>) -> Self {
        self.fetched_at = at;
        self
    }

    /// Age relative to `now`. A timestamp in the future counts as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

/// Tier boundaries. An age equal to a boundary falls into the later tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub fresh_for: Duration,
    pub expire_after: Duration,
}

impl FreshnessPolicy {
    /// `expire_after` is raised to `fresh_for` if it is shorter.
    pub fn new(fresh_for: Duration, expire_after: Duration) -> Self {
        Self {
            fresh_for,
            expire_after: expire_after.max(fresh_for),
        }
    }

    pub fn from_secs(fresh_for: u64, expire_after: u64) -> Self {
        Self::new(Duration::from_secs(fresh_for), Duration::from_secs(expire_after))
    }

    /// Replace the fresh boundary, keeping the expired one at least as long.
    pub fn with_fresh_for(self, fresh_for: Duration) -> Self {
        Self::new(fresh_for, self.expire_after)
    }

    pub fn classify(&self, age: Duration) -> Freshness {
        if age < self.fresh_for {
            Freshness::Fresh
        } else if age < self.expire_after {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);
    const EPS: Duration = Duration::from_millis(1);

    #[test]
    fn boundaries_belong_to_the_later_tier() {
        let policy = FreshnessPolicy::new(4 * HOUR, 24 * HOUR);

        assert_eq!(policy.classify(Duration::ZERO), Freshness::Fresh);
        assert_eq!(policy.classify(4 * HOUR - EPS), Freshness::Fresh);
        assert_eq!(policy.classify(4 * HOUR), Freshness::Stale);
        assert_eq!(policy.classify(4 * HOUR + EPS), Freshness::Stale);
        assert_eq!(policy.classify(24 * HOUR - EPS), Freshness::Stale);
        assert_eq!(policy.classify(24 * HOUR), Freshness::Expired);
        assert_eq!(policy.classify(24 * HOUR + EPS), Freshness::Expired);
        assert_eq!(policy.classify(Duration::MAX), Freshness::Expired);
    }

    #[test]
    fn equal_boundaries_have_no_stale_tier() {
        let policy = FreshnessPolicy::new(2 * HOUR, HOUR);
        assert_eq!(policy.expire_after, 2 * HOUR);
        assert_eq!(policy.classify(2 * HOUR - EPS), Freshness::Fresh);
        assert_eq!(policy.classify(2 * HOUR), Freshness::Expired);
    }

    #[test]
    fn fresh_override_keeps_expiry_ordering() {
        let policy = FreshnessPolicy::new(HOUR, 6 * HOUR);
        assert_eq!(policy.with_fresh_for(2 * HOUR).expire_after, 6 * HOUR);
        assert_eq!(policy.with_fresh_for(12 * HOUR).expire_after, 12 * HOUR);
    }

    #[test]
    fn future_timestamp_has_zero_age() {
        let now = Utc::now();
        let entry = CacheEntry::new(json!({})).fetched_at(now + TimeDelta::minutes(5));
        assert_eq!(entry.age_at(now), Duration::ZERO);

        let entry = entry.fetched_at(now - TimeDelta::minutes(5));
        assert_eq!(entry.age_at(now), Duration::from_secs(300));
    }

    #[test]
    fn optional_counts_are_omitted() {
        let entry = CacheEntry::new(json!({ "ZEC": {} })).with_coin_count(1);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["coin_count"], 1);
        assert!(value.get("entry_count").is_none());
        assert!(value.get("raw_entries").is_none());
    }
}
