//! Response caching with moka
//!
//! In-memory cache of archive result rows, keyed by the digests from
//! `archivist_core::cache::key` or by document id.
//!
//! # Expiry
//!
//! - **Session** (default): entries live as long as the cache instance and
//!   are removed only by [`ResponseCache::clear`]
//! - **TTL**: with a configured time-to-live, entries older than it are
//!   treated as absent
//!
//! Errors are never cached; only successful result rows are stored.

use std::time::Duration;

use archivist_domain::ResultRow;
use moka::sync::Cache;
use tracing::debug;

/// Default max capacity for the response cache
pub const DEFAULT_RESPONSE_CACHE_MAX_CAPACITY: u64 = 10_000;

/// In-memory store for archive result rows
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, Vec<ResultRow>>,
}

impl ResponseCache {
    /// Create a cache; `ttl` of `None` keeps entries for the session.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self::with_capacity(ttl, DEFAULT_RESPONSE_CACHE_MAX_CAPACITY)
    }

    pub fn with_capacity(ttl: Option<Duration>, max_capacity: u64) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        tracing::info!(
            ttl_seconds = ttl.map(|ttl| ttl.as_secs()),
            max_capacity,
            "Response cache configured"
        );

        Self { entries: builder.build() }
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<ResultRow>> {
        let hit = self.entries.get(key);
        debug!(key, hit = hit.is_some(), "response cache lookup");
        hit
    }

    pub fn set(&self, key: impl Into<String>, rows: Vec<ResultRow>) {
        let key = key.into();
        debug!(key = %key, rows = rows.len(), "response cache updated");
        self.entries.insert(key, rows);
    }

    /// Remove one entry, or every entry when `key` is `None`.
    pub fn clear(&self, key: Option<&str>) {
        match key {
            Some(key) => self.entries.invalidate(key),
            None => self.entries.invalidate_all(),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(None)
    }
}
