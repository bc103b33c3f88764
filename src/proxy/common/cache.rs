// Response cache
// Lazy TTL expiry, bounded by entry count

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Upstream path plus caller parameters, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new<'a, I>(path: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort();

        Self {
            path: path.to_string(),
            params,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    expires_at: Instant,
    payload: Value,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    max_entries: usize,
    /// Serializes writers so the capacity check, eviction and insert happen as one step.
    /// Readers never take it.
    write_lock: Mutex<()>,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Live payload for `key`. Expired entries read as absent and stay until overwritten or evicted.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.payload.clone())
    }

    pub fn insert(&self, key: CacheKey, payload: Value, ttl: Duration) {
        // Nothing under the lock panics; a poisoned lock still guards a consistent map
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        self.entries.insert(
            key,
            CacheEntry {
                expires_at: now + ttl,
                payload,
            },
        );
    }

    /// Drop expired entries; if still full, drop the entries closest to expiry
    /// down to the low-water mark (`max - max(max/10, 1)`).
    /// Caller holds `write_lock`.
    fn make_room(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.is_live(now));

        let low_water = self.max_entries - (self.max_entries / 10).max(1);
        let excess = self.entries.len().saturating_sub(low_water);
        if excess == 0 {
            return;
        }

        let mut by_expiry: Vec<(Instant, CacheKey)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().expires_at, entry.key().clone()))
            .collect();
        if excess < by_expiry.len() {
            by_expiry.select_nth_unstable_by_key(excess, |(expires_at, _)| *expires_at);
        }

        tracing::debug!(
            "Cache full ({} entries), evicting {} closest to expiry",
            self.max_entries,
            excess
        );
        for (_, key) in by_expiry.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
