//! Time-bounded store of fetched exchange-rate tables
//!
//! The fetch itself happens outside this crate. The cache records when each
//! table arrived so callers can tell whether a re-fetch is due; valuation
//! keeps using whatever is present regardless of age.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{RateProvider, RateTable};

/// Default time-to-live for cached rate tables
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// What a cached table was fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKey {
    /// Rates captured near a specific snapshot's date
    Snapshot(i64),
    /// Latest known rates
    Current,
}

/// Cache entry
#[derive(Debug, Clone)]
struct CacheEntry {
    table: RateTable,
    fetched_at: DateTime<Utc>,
}

/// Rate table cache with TTL-based staleness
#[derive(Debug, Clone)]
pub struct RateCache {
    entries: HashMap<RateKey, CacheEntry>,
    ttl: Duration,
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MINUTES)
    }
}

impl RateCache {
    /// A TTL beyond what `Duration` can hold saturates at its bounds
    pub fn new(ttl_minutes: i64) -> Self {
        let ttl = Duration::try_minutes(ttl_minutes).unwrap_or(if ttl_minutes < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        });
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Store a freshly fetched table
    pub fn insert(&mut self, key: RateKey, table: RateTable) {
        self.insert_at(key, table, Utc::now());
    }

    /// Store a table fetched at a known instant
    pub fn insert_at(&mut self, key: RateKey, table: RateTable, fetched_at: DateTime<Utc>) {
        debug!("Caching {} rate table for {:?}", table.base(), key);
        self.entries.insert(key, CacheEntry { table, fetched_at });
    }

    /// Cached table, stale or not
    pub fn get(&self, key: &RateKey) -> Option<&RateTable> {
        self.entries.get(key).map(|e| &e.table)
    }

    /// How long ago the table for `key` was fetched, relative to `now`
    pub fn age(&self, key: &RateKey, now: DateTime<Utc>) -> Option<Duration> {
        self.entries
            .get(key)
            .map(|e| now.signed_duration_since(e.fetched_at))
    }

    /// True when the table is missing or older than the TTL
    pub fn is_stale(&self, key: &RateKey, now: DateTime<Utc>) -> bool {
        match self.age(key, now) {
            Some(age) => age >= self.ttl,
            None => true,
        }
    }

    /// Whether the caller should trigger a fetch right now
    pub fn needs_refresh(&self, key: &RateKey) -> bool {
        self.is_stale(key, Utc::now())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        info!("Rate cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateProvider for RateCache {
    fn rate_table(&self, key: &RateKey) -> Option<RateTable> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn table() -> RateTable {
        RateTable::new("EUR", BTreeMap::from([("USD".to_string(), dec!(1.1))]))
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_missing_entry_is_stale() {
        let cache = RateCache::default();
        assert!(cache.is_stale(&RateKey::Current, at(12, 0)));
        assert!(cache.age(&RateKey::Current, at(12, 0)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_out_of_range_ttl_saturates() {
        let mut cache = RateCache::new(i64::MAX);
        cache.insert_at(RateKey::Current, table(), at(10, 0));
        assert!(!cache.is_stale(&RateKey::Current, at(23, 59)));
    }

    #[test]
    fn test_entry_goes_stale_after_ttl() {
        let mut cache = RateCache::new(60);
        cache.insert_at(RateKey::Current, table(), at(10, 0));

        assert!(!cache.is_stale(&RateKey::Current, at(10, 59)));
        assert!(cache.is_stale(&RateKey::Current, at(11, 0)));
        assert_eq!(
            cache.age(&RateKey::Current, at(10, 30)),
            Some(Duration::minutes(30))
        );
    }

    #[test]
    fn test_stale_tables_are_still_served() {
        let mut cache = RateCache::new(1);
        cache.insert_at(RateKey::Snapshot(4), table(), at(0, 0));
        assert!(cache.is_stale(&RateKey::Snapshot(4), at(23, 0)));
        assert_eq!(cache.rate_table(&RateKey::Snapshot(4)), Some(table()));
        assert_eq!(cache.rate_table(&RateKey::Snapshot(5)), None);
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut cache = RateCache::default();
        cache.insert(RateKey::Current, table());
        cache.insert(RateKey::Snapshot(1), table());
        assert_eq!(cache.len(), 2);
        assert!(!cache.needs_refresh(&RateKey::Current));

        cache.clear();
        assert!(cache.is_empty());
    }
}
