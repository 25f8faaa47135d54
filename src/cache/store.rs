//! Key/value store with a fixed time-to-live.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_CACHE_HIT: &str = "folio_cache_hit_total";
const METRIC_CACHE_MISS: &str = "folio_cache_miss_total";
const METRIC_CACHE_SWEPT: &str = "folio_cache_swept_total";

/// Whether an entry stored at `stored_at` is still valid at `now`.
///
/// Reads and sweeps share this predicate, so an entry is served up to but
/// not including `stored_at + ttl`.
pub fn is_fresh(stored_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(stored_at) < ttl
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Process-wide memo of remote reads.
///
/// Advisory only: callers treat a miss as "go to the remote".
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value for `key` if it is still fresh; stale entries are dropped.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                Some(entry) if is_fresh(entry.stored_at, now, self.ttl) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    counter!(METRIC_CACHE_MISS).increment(1);
                    return None;
                }
            }
        }

        // Re-check under the write lock; a concurrent `set` may have refreshed it.
        let mut entries = rw_write(&self.entries, SOURCE, "get_evict");
        let stale = entries
            .get(key)
            .is_some_and(|entry| !is_fresh(entry.stored_at, now, self.ttl));
        if stale {
            entries.remove(key);
        }
        counter!(METRIC_CACHE_MISS).increment(1);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        rw_write(&self.entries, SOURCE, "set").insert(key.into(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        rw_write(&self.entries, SOURCE, "invalidate").remove(key);
    }

    pub fn clear(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        let dropped = entries.len();
        entries.clear();
        debug!(target: "folio::cache", dropped, "cache cleared");
    }

    /// Remove every stale entry, accessed or not. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "sweep");
        let before = entries.len();
        entries.retain(|_, entry| is_fresh(entry.stored_at, now, self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            counter!(METRIC_CACHE_SWEPT).increment(removed as u64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
