//! Listing cache storage.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;

use crate::application::listing::ListingPage;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_CACHE_HIT: &str = "scaffale_cache_hit_total";
const METRIC_CACHE_MISS: &str = "scaffale_cache_miss_total";
const METRIC_CACHE_EXPIRED: &str = "scaffale_cache_expired_total";
const METRIC_CACHE_EVICT: &str = "scaffale_cache_evict_total";

struct CacheEntry {
    value: ListingPage,
    expires_at: Instant,
}

enum Lookup {
    Live(ListingPage),
    Stale,
    Missing,
}

/// Bounded TTL cache from listing key to result envelope.
///
/// Expiry is lazy: a stale entry is dropped on the access that finds it,
/// never served. Capacity eviction is least-recently-used.
pub struct ListingCache {
    ttl: Duration,
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl ListingCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    /// Fetch a live entry, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<ListingPage> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let now = Instant::now();

        let lookup = match entries.get(key) {
            Some(entry) if now < entry.expires_at => Lookup::Live(entry.value.clone()),
            Some(_) => Lookup::Stale,
            None => Lookup::Missing,
        };

        match lookup {
            Lookup::Live(value) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(value)
            }
            Lookup::Stale => {
                entries.pop(key);
                counter!(METRIC_CACHE_EXPIRED).increment(1);
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
            Lookup::Missing => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Insert or overwrite under the configured TTL. At capacity the
    /// least-recently-used entry makes room for a new key.
    pub fn insert(&self, key: String, value: ListingPage) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };

        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        if let Some((evicted_key, _)) = entries.push(key.clone(), entry)
            && evicted_key != key
        {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
