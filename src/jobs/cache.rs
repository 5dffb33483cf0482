//! Content-addressed result cache with TTL and LRU eviction.
//!
//! Keys are SHA-256 digests over an operation id and the input bytes, so
//! re-running an extraction stage on identical input is a cache hit no
//! matter which document it came from. Expiry is checked lazily on read.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::JobConfig;

struct CacheEntry {
    data: Vec<u8>,
    created: Instant,
    last_access: Instant,
    access_count: u64,
}

pub struct ExtractionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_bytes: usize,
    ttl: Option<Duration>,
}

impl ExtractionCache {
    pub fn new(config: &JobConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_bytes: config.cache_max_bytes,
            ttl: config.cache_ttl_secs.map(Duration::from_secs),
        }
    }

    /// Cache key for one operation over one input.
    pub fn key(operation: &str, input: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_bytes());
        hasher.update([0u8]);
        hasher.update(input);
        format!("{:x}", hasher.finalize())
    }

    /// Look up a key. Expired entries are removed and count as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let expired = match (entries.get(key), self.ttl) {
            (Some(entry), Some(ttl)) => entry.created.elapsed() > ttl,
            _ => false,
        };
        if expired {
            entries.remove(key);
            debug!(key, "Cache entry expired");
            return None;
        }
        let entry = entries.get_mut(key)?;
        entry.last_access = Instant::now();
        entry.access_count += 1;
        Some(entry.data.clone())
    }

    /// Store a value, evicting least-recently-used entries until it fits.
    /// Values larger than the whole cache are not stored.
    pub fn put(&self, key: &str, data: Vec<u8>) {
        if data.len() > self.max_bytes {
            debug!(key, size = data.len(), "Value exceeds cache capacity, skipped");
            return;
        }
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.remove(key);

        let mut used: usize = entries.values().map(|e| e.data.len()).sum();
        while used + data.len() > self.max_bytes {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            let Some(oldest) = oldest else { break };
            if let Some(evicted) = entries.remove(&oldest) {
                used -= evicted.data.len();
                debug!(key = oldest, "Cache entry evicted");
            }
        }

        let now = Instant::now();
        entries.insert(
            key.to_string(),
            CacheEntry { data, created: now, last_access: now, access_count: 0 },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> usize {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .values()
            .map(|e| e.data.len())
            .sum()
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }
}
