//! Cache entries and freshness math.
//!
//! The stateful coordinator lives in the client crate; the entry type and
//! its TTL arithmetic are pure so they can be tested against fabricated
//! timestamps.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// How long a cached load stays valid. One constant for every resource
/// kind; nothing stops a kind from getting its own later.
pub const CACHE_TTL_SECS: i64 = 5 * 60;

/// Resource kinds the cache coordinator tracks, one namespace per backend
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    Goals,
    Transactions,
    Tasks,
    Classes,
    ClassStudents,
    ShopItems,
    Redemptions,
    Children,
    Dashboard,
}

/// One cached load for a (kind, scope) slice.
///
/// Entries are replaced wholesale on refresh, never merged: a load always
/// supersedes whatever was stored before.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub fetched_at: Timestamp,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, fetched_at: Timestamp) -> Self {
        Self { data, fetched_at }
    }

    /// True iff `now − fetched_at < TTL`.
    ///
    /// An entry aged exactly TTL is stale.
    pub fn is_fresh(&self, now: Timestamp) -> bool {
        now.signed_duration_since(self.fetched_at) < chrono::Duration::seconds(CACHE_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_fresh_immediately_after_fetch() {
        let now = Utc::now();
        let entry = CacheEntry::new(vec![1, 2, 3], now);
        assert!(entry.is_fresh(now));
    }

    #[test]
    fn test_fresh_just_inside_ttl() {
        let fetched = Utc::now();
        let entry = CacheEntry::new("data", fetched);
        let now = fetched + Duration::seconds(CACHE_TTL_SECS - 1);
        assert!(entry.is_fresh(now));
    }

    #[test]
    fn test_stale_at_exactly_ttl() {
        let fetched = Utc::now();
        let entry = CacheEntry::new("data", fetched);
        let now = fetched + Duration::seconds(CACHE_TTL_SECS);
        assert!(!entry.is_fresh(now));
    }

    #[test]
    fn test_stale_beyond_ttl() {
        let fetched = Utc::now();
        let entry = CacheEntry::new("data", fetched);
        let now = fetched + Duration::hours(1);
        assert!(!entry.is_fresh(now));
    }

    #[test]
    fn test_ttl_is_five_minutes() {
        assert_eq!(CACHE_TTL_SECS, 300);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&CacheKind::ClassStudents).expect("kind should serialize");
        assert_eq!(json, "\"class_students\"");
    }
}
