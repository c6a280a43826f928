//! Time-bounded response cache.
//!
//! The service depends on the [`ResponseCache`] capability rather than a
//! global map, so request handling stays a function of (inputs, cache state)
//! and tests can swap in [`NoCache`] or a short-TTL [`MokaCache`].
//! Concurrent writers for the same key simply overwrite each other.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;

// ---

/// Cache key: query coordinates plus the optional city override.
///
/// Coordinates are normalised to four decimal places (about 11 m) so that
/// the same location requested with different float noise shares an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e4: i64,
    lon_e4: i64,
    city: Option<String>,
}

impl CacheKey {
    pub fn new(lat: f64, lon: f64, city: Option<&str>) -> Self {
        // ---
        Self {
            lat_e4: (lat * 10_000.0).round() as i64,
            lon_e4: (lon * 10_000.0).round() as i64,
            city: city
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_lowercase),
        }
    }
}

/// Get/put capability with a fixed expiry window.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Value>;
    async fn put(&self, key: CacheKey, value: Value);
}

/// In-memory cache backed by moka with a time-to-live.
#[derive(Clone)]
pub struct MokaCache {
    inner: Cache<CacheKey, Value>,
}

impl MokaCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        // ---
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl ResponseCache for MokaCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        self.inner.get(key).await
    }

    async fn put(&self, key: CacheKey, value: Value) {
        self.inner.insert(key, value).await;
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl ResponseCache for NoCache {
    async fn get(&self, _key: &CacheKey) -> Option<Value> {
        None
    }

    async fn put(&self, _key: CacheKey, _value: Value) {}
}
