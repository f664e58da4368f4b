//! Redis-backed history store using deadpool-redis
//!
//! Accepts standard (`redis://`, `rediss://`) URLs; Sentinel URLs are
//! rejected at connect time. Histories are stored without expiry.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, Runtime};

use super::backend::HistoryBackend;
use super::error::HistoryError;

/// Redis-backed history store
///
/// Owns a small connection pool. The pool is opened and validated by
/// [`RedisHistoryStore::connect`] and closed when the store is dropped.
pub struct RedisHistoryStore {
    pool: Pool,
}

impl RedisHistoryStore {
    /// Open a pool for `redis_url` and check it answers `PING`
    pub async fn connect(redis_url: &str) -> Result<Self, HistoryError> {
        let sanitized_url = sanitize_redis_url(redis_url);
        if is_sentinel_url(redis_url) {
            return Err(HistoryError::Config(format!(
                "Redis Sentinel is not supported, use a redis:// or rediss:// URL: {sanitized_url}"
            )));
        }

        let mut config = Config::from_url(redis_url);
        // One report run touches a handful of keys
        config.pool = Some(deadpool_redis::PoolConfig {
            max_size: 4,
            timeouts: deadpool_redis::Timeouts {
                wait: Some(Duration::from_secs(5)),
                create: Some(Duration::from_secs(5)),
                recycle: Some(Duration::from_secs(5)),
            },
            ..Default::default()
        });
        let pool = config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            HistoryError::Connection(format!(
                "Failed to create Redis pool for {sanitized_url}: {e}"
            ))
        })?;

        let store = Self { pool };
        store.ping().await.map_err(|e| {
            HistoryError::Connection(format!("Redis PING failed for {sanitized_url}: {e}"))
        })?;

        tracing::debug!(url = %sanitized_url, "Redis history store connected");

        Ok(store)
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        let mut conn = self.pool.get().await?;
        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await?;
        Ok(())
    }
}

impl Drop for RedisHistoryStore {
    fn drop(&mut self) {
        self.pool.close();
        tracing::trace!("Redis pool closed");
    }
}

/// Whether the URL asks for a Sentinel-managed deployment
fn is_sentinel_url(url: &str) -> bool {
    url.starts_with("redis+sentinel://") || url.starts_with("rediss+sentinel://")
}

/// Mask the password of a Redis URL for logging
fn sanitize_redis_url(url: &str) -> String {
    // The last '@' ends the credentials; passwords may contain '@'
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    if scheme_end > at_pos {
        return url.to_string();
    }
    match url[scheme_end..at_pos].find(':') {
        Some(colon) => {
            let user_end = scheme_end + colon + 1;
            format!("{}***{}", &url[..user_end], &url[at_pos..])
        }
        None => url.to_string(),
    }
}

#[async_trait]
impl HistoryBackend for RedisHistoryStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, HistoryError> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), HistoryError> {
        let mut conn = self.pool.get().await?;
        let size = value.len();
        let _: () = conn.set(key, value).await?;
        tracing::debug!(key, size, "History stored in Redis");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), HistoryError> {
        self.ping()
            .await
            .map_err(|e| HistoryError::Connection(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
