//! Cache backend: disabled, local (DashMap) or Redis.

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Expired local entries are swept once per this many inserts.
const LOCAL_SWEEP_INTERVAL: usize = 256;

/// A cached entry with TTL support.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// In-process entry map.
///
/// Entries that are never read again would otherwise outlive their TTL, so
/// every [`LOCAL_SWEEP_INTERVAL`]th insert drops everything that has expired.
#[derive(Debug, Default)]
pub struct LocalCache {
    entries: DashMap<String, CachedEntry>,
    inserts: AtomicUsize,
}

impl LocalCache {
    fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Some(Arc::clone(&entry.data));
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    fn insert(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CachedEntry::new(value, ttl));
        let inserts = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts % LOCAL_SWEEP_INTERVAL == 0 {
            let removed = self.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = self.entries.len(), "swept expired cache entries");
            }
        }
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes expired entries and returns how many were dropped.
    fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Where cached entries live.
///
/// ## Cache Modes
///
/// - **Disabled**: every read misses, writes are no-ops
/// - **Local**: single-instance mode using a DashMap
/// - **Redis**: shared across instances. There is no local tier, so an
///   invalidation on one instance is visible to all of them.
///
/// Every operation is awaited by the caller and none of them fail: backend
/// errors are logged and reported as a miss or ignored.
#[derive(Clone)]
pub enum CacheBackend {
    Disabled,

    /// Single-instance: local DashMap only
    Local(Arc<LocalCache>),

    /// Multi-instance: Redis only
    Redis(Pool),
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(LocalCache::default()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool) -> Self {
        CacheBackend::Redis(redis_pool)
    }

    /// Name of the active mode for logs and health output.
    pub fn mode(&self) -> &'static str {
        match self {
            CacheBackend::Disabled => "disabled",
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis(_) => "redis",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheBackend::Disabled)
    }

    /// Get raw bytes from the cache.
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        match self {
            CacheBackend::Disabled => None,
            CacheBackend::Local(local) => {
                let hit = local.get(key);
                if hit.is_some() {
                    tracing::debug!(key = %key, "cache hit (local)");
                } else {
                    tracing::debug!(key = %key, "cache miss");
                }
                hit
            }
            CacheBackend::Redis(redis) => match redis.get().await {
                Ok(mut conn) => match conn.get::<_, Option<Vec<u8>>>(key).await {
                    Ok(Some(data)) => {
                        tracing::debug!(key = %key, "cache hit (redis)");
                        Some(Arc::new(data))
                    }
                    Ok(None) => {
                        tracing::debug!(key = %key, "cache miss");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis GET error");
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to get Redis connection");
                    None
                }
            },
        }
    }

    /// Set raw bytes in the cache with TTL.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        match self {
            CacheBackend::Disabled => {}
            CacheBackend::Local(local) => local.insert(key, value, ttl),
            CacheBackend::Redis(redis) => {
                let ttl_secs = ttl.as_secs().max(1);
                match redis.get().await {
                    Ok(mut conn) => {
                        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl_secs).await {
                            tracing::warn!(key = %key, error = %e, "Redis SET error");
                        } else {
                            tracing::debug!(key = %key, ttl_secs = %ttl_secs, "cache set (redis)");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to get Redis connection"),
                }
            }
        }
    }

    /// Remove an entry. Completes before returning.
    pub async fn invalidate(&self, key: &str) {
        match self {
            CacheBackend::Disabled => {}
            CacheBackend::Local(local) => {
                local.remove(key);
                tracing::debug!(key = %key, "cache invalidated (local)");
            }
            CacheBackend::Redis(redis) => match redis.get().await {
                Ok(mut conn) => {
                    if let Err(e) = conn.del::<_, ()>(key).await {
                        tracing::warn!(key = %key, error = %e, "Redis DEL error");
                    } else {
                        tracing::debug!(key = %key, "cache invalidated (redis)");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to get Redis connection"),
            },
        }
    }

    /// Reads and decodes a JSON entry.
    ///
    /// An entry that fails to decode is logged, dropped and reported as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.get(key).await?;
        match serde_json::from_slice(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding malformed cache entry");
                self.invalidate(key).await;
                None
            }
        }
    }

    /// Encodes `value` as JSON and stores it.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_vec(value) {
            Ok(data) => self.set(key, data, ttl).await,
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to encode cache entry"),
        }
    }

    /// Drops expired local entries now. Redis expires keys on its own.
    pub fn cleanup_expired(&self) -> usize {
        match self {
            CacheBackend::Local(local) => local.cleanup_expired(),
            _ => 0,
        }
    }

    /// Number of live local entries (always 0 for other modes).
    pub fn local_len(&self) -> usize {
        match self {
            CacheBackend::Local(local) => local.len(),
            _ => 0,
        }
    }

    /// Check if Redis is reachable (for health checks).
    pub async fn is_redis_available(&self) -> bool {
        match self {
            CacheBackend::Redis(redis) => redis.get().await.is_ok(),
            _ => false,
        }
    }
}

impl std::fmt::Debug for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBackend")
            .field("mode", &self.mode())
            .finish()
    }
}
