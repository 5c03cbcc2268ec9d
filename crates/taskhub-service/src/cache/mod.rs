//! Best-effort read-through cache around the storage traits.
//!
//! The cache is never the system of record. Reads fall back to storage on a
//! miss, a decode failure or a backend error; writes go to storage first and
//! then remove the affected keys before returning.
//!
//! Keys:
//!
//! | key | value |
//! |---|---|
//! | `user:<id>` | an `Account` |
//! | `todo:<id>` | a `Task` |
//! | `todos:user:<owner>` | every `Task` of `owner` |

mod backend;
mod config;
mod storage;

use std::time::Duration;

use uuid::Uuid;

pub use backend::{CacheBackend, CachedEntry, LocalCache};
pub use config::{CacheConfig, RedisConfig};
pub use storage::{CachedAccountStorage, CachedTaskStorage};

pub fn account_key(id: Uuid) -> String {
    format!("user:{id}")
}

pub fn task_key(id: Uuid) -> String {
    format!("todo:{id}")
}

pub fn task_list_key(owner: Uuid) -> String {
    format!("todos:user:{owner}")
}

/// Builds the cache backend described by the configuration.
///
/// Uses Redis when enabled and reachable, otherwise a local in-process
/// cache. Returns [`CacheBackend::Disabled`] when caching is turned off.
pub async fn create_cache_backend(cache: &CacheConfig, redis: &RedisConfig) -> CacheBackend {
    if !cache.enabled {
        tracing::info!("Cache disabled");
        return CacheBackend::Disabled;
    }

    if !redis.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return CacheBackend::new_local();
    }

    tracing::info!(url = %mask_redis_url(&redis.url), "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&redis.url);
    let pool_config = redis_config
        .pool
        .get_or_insert_with(|| deadpool_redis::PoolConfig::new(redis.pool_size));
    pool_config.max_size = redis.pool_size;
    pool_config.timeouts.wait = Some(Duration::from_millis(redis.timeout_ms));
    pool_config.timeouts.create = Some(Duration::from_millis(redis.timeout_ms));
    pool_config.timeouts.recycle = Some(Duration::from_millis(redis.timeout_ms));

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to local cache."
            );
            return CacheBackend::new_local();
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis successfully");
            CacheBackend::new_redis(pool)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache."
            );
            CacheBackend::new_local()
        }
    }
}

/// Hides the password part of a Redis URL.
fn mask_redis_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end + 3 => {
            let userinfo = &url[scheme_end + 3..at];
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{}{}:****{}", &url[..scheme_end + 3], user, &url[at..])
        }
        _ => url.to_string(),
    }
}
