//! TTL cache for idempotent `GET` results.
//!
//! Keyed by URL plus the serialized request options, so the same path fetched
//! with different options caches separately. Entries live for a fixed TTL
//! (default 5 minutes) and are never invalidated by writes. Above
//! `max_entries` the oldest entry is evicted.
//!
//! Every fetch logs the running hit and miss counts at debug level.
//!
//! Time comes from [`tokio::time::Instant`] so tests can drive expiry with a
//! paused clock.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parley_core::Result;
use parley_settings::CacheSettings;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::api::ChatApi;

/// Options that distinguish otherwise identical requests.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: &'static str,
    /// Whether the request carries credentials.
    pub authenticated: bool,
}

impl RequestOptions {
    /// Authenticated `GET`.
    pub fn authed_get() -> Self {
        Self {
            method: "GET",
            authenticated: true,
        }
    }
}

/// Build the cache key `"{url}_{options}"`.
pub fn cache_key(url: &str, options: &RequestOptions) -> String {
    let options = serde_json::to_string(options).unwrap_or_default();
    format!("{url}_{options}")
}

struct CacheEntry {
    body: Value,
    stored_at: Instant,
}

/// Request result cache.
pub struct RequestCache {
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl RequestCache {
    /// Cache with the given TTL and capacity.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            ttl,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Cache configured from settings.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(Duration::from_millis(settings.ttl_ms), settings.max_entries)
    }

    /// Fresh cached body for `key`; expired entries are dropped and count as
    /// a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() < self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };
        if !fresh {
            self.remove(key);
            self.misses += 1;
            return None;
        }
        self.hits += 1;
        self.entries.get(key).map(|e| e.body.clone())
    }

    /// Store a body, stamped now.
    pub fn insert(&mut self, key: String, body: Value) {
        self.remove(&key);
        while self.entries.len() >= self.max_entries {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            drop(self.entries.remove(&oldest));
        }
        self.insertion_order.push_back(key.clone());
        drop(self.entries.insert(
            key,
            CacheEntry {
                body,
                stored_at: Instant::now(),
            },
        ));
    }

    /// Return the cached body for `path` or fetch it through `api`.
    pub async fn fetch(
        &mut self,
        api: &dyn ChatApi,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value> {
        let key = cache_key(&api.url(path), options);
        if let Some(body) = self.get(&key) {
            debug!(path, hits = self.hits, misses = self.misses, "request cache hit");
            return Ok(body);
        }
        debug!(path, hits = self.hits, misses = self.misses, "request cache miss");
        let body = api.get_json(path).await?;
        self.insert(key, body.clone());
        Ok(body)
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        debug!(
            entries = self.entries.len(),
            hits = self.hits,
            misses = self.misses,
            "request cache cleared"
        );
        self.entries.clear();
        self.insertion_order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.insertion_order.retain(|k| k != key);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
