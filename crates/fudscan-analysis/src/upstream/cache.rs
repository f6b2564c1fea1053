//! TTL Result Cache
//!
//! In-memory, per-process cache from query key to a timestamped payload.
//! Eviction is purely a TTL comparison at read time; the read that finds an
//! expired entry removes it. No background sweep, no LRU, no persistence.
//! A hit never returns data older than the configured TTL.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a key. Expired entries are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                Some((stored_at, value)) => {
                    if stored_at.elapsed() <= self.ttl {
                        return Some(value.clone());
                    }
                    true
                }
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
            // Re-check under the write lock; a concurrent insert may have
            // refreshed the entry.
            if entries
                .get(key)
                .is_some_and(|(stored_at, _)| stored_at.elapsed() > self.ttl)
            {
                entries.remove(key);
            }
        }

        None
    }

    /// Store a value under a key, replacing any previous entry
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), (Instant::now(), value));
    }

    /// Number of entries, expired ones included until a read evicts them
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a cache key from a query's parts
pub fn query_key(parts: &[&str]) -> String {
    parts.join("\u{1f}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("btc", 42u32);
        assert_eq!(cache.get("btc"), Some(42));
    }

    #[test]
    fn test_miss_for_unknown_key() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("eth"), None);
    }

    #[test]
    fn test_expired_entry_evicted_on_read() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("btc", 42u32);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("btc"), None);
        assert!(cache.is_empty(), "read should have evicted the entry");
    }

    #[test]
    fn test_insert_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("btc", 1u32);
        cache.insert("btc", 2u32);
        assert_eq!(cache.get("btc"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_query_key_distinguishes_parts() {
        assert_ne!(query_key(&["a|b", "c"]), query_key(&["a", "b|c"]));
    }
}
