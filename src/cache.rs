//! Read-through TTL cache keyed by collection name.
//!
//! Expiry is logical: a `get` past the TTL behaves exactly like a miss, but
//! the storage is not physically deleted on read. `purge_expired` exists as
//! a best-effort cleanup; correctness never depends on it running.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::record::Record;

struct CacheEntry {
    rows: Vec<Record>,
    stamped: Instant,
}

/// Per-collection row cache with a fixed time-to-live.
///
/// One instance is constructed per page/session and shared between
/// controllers of the same entity type (wrap in `Arc<Mutex<_>>`); racing
/// writers resolve last-writer-wins. Tear down with `invalidate_all` on
/// logout so records never leak across sessions.
pub struct TtlCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl TtlCache {
    /// Create a cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached rows for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<Vec<Record>> {
        let entry = self.entries.get(key)?;
        if entry.stamped.elapsed() < self.ttl {
            tracing::debug!(collection = key, rows = entry.rows.len(), "cache hit");
            Some(entry.rows.clone())
        } else {
            tracing::debug!(collection = key, "cache entry expired");
            None
        }
    }

    /// Store rows for `key`, stamping the current time. Overwrites.
    pub fn set(&mut self, key: impl Into<String>, rows: Vec<Record>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                rows,
                stamped: Instant::now(),
            },
        );
    }

    /// Drop the entry for `key`, if any.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop everything. Called on logout/session teardown.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    /// True when `key` holds an unexpired entry.
    pub fn is_valid(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|e| e.stamped.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Physically remove expired entries. Best-effort housekeeping only.
    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.stamped.elapsed() < ttl);
    }

    #[cfg(test)]
    fn backdate(&mut self, key: &str, by: Duration) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stamped -= by;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        vec![Record::new().with_field("id", json!(1))]
    }

    #[test]
    fn test_get_within_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("institutions", rows());

        assert!(cache.is_valid("institutions"));
        assert_eq!(cache.get("institutions"), Some(rows()));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("institutions", rows());
        cache.backdate("institutions", Duration::from_secs(61));

        assert!(!cache.is_valid("institutions"));
        assert_eq!(cache.get("institutions"), None);
    }

    #[test]
    fn test_expiry_is_logical_not_physical() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("institutions", rows());
        cache.backdate("institutions", Duration::from_secs(61));

        // Still physically present until purged, but invisible to readers.
        assert_eq!(cache.entries.len(), 1);
        assert_eq!(cache.get("institutions"), None);

        cache.purge_expired();
        assert_eq!(cache.entries.len(), 0);
    }

    #[test]
    fn test_set_overwrites_and_restamps() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("institutions", rows());
        cache.backdate("institutions", Duration::from_secs(61));

        let newer = vec![Record::new().with_field("id", json!(2))];
        cache.set("institutions", newer.clone());
        assert_eq!(cache.get("institutions"), Some(newer));
    }

    #[test]
    fn test_invalidate() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("institutions", rows());
        cache.set("patients", rows());

        cache.invalidate("institutions");
        assert_eq!(cache.get("institutions"), None);
        assert!(cache.is_valid("patients"));

        cache.invalidate_all();
        assert!(!cache.is_valid("patients"));
    }
}
