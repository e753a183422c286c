//! Redis key/value client.

use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;

/// Number of keys requested per `SCAN` step.
const SCAN_COUNT: usize = 500;

/// Redis-backed [`CacheStore`].
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `dsn` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use objcache_core::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), CacheError> {
    ///     let store = RedisCache::connect("redis://localhost:6379").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(dsn: &str) -> CacheResult<Self> {
        let client = Client::open(dsn).map_err(|e| CacheError::InvalidUrl(e.to_string()))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self { connection })
    }

    /// Get the underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}

/// Expiry in milliseconds for `PSETEX`; `None` means no expiry.
///
/// Sub-millisecond TTLs round up to one millisecond.
pub(crate) fn expiry_millis(ttl: Option<Duration>) -> Option<u64> {
    ttl.filter(|ttl| !ttl.is_zero())
        .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
}

/// Escape glob metacharacters so `prefix` matches literally in `SCAN MATCH`.
pub(crate) fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection.clone();

        match expiry_millis(ttl) {
            Some(millis) => {
                let _: () = conn.pset_ex(key, value, millis).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn clear_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut conn = self.connection.clone();
        let pattern = match_pattern(prefix);
        let mut cursor: u64 = 0;
        let mut removed = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                removed += count;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn tag(&self, tag: &str, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: u64 = conn.sadd(tag, key).await?;
        Ok(())
    }

    async fn untag(&self, tag: &str, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: u64 = conn.srem(tag, key).await?;
        Ok(())
    }

    async fn tagged_keys(&self, tag: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.smembers(tag).await?;
        Ok(keys)
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_pattern_escapes_globs() {
        assert_eq!(match_pattern("wp_cache:"), "wp_cache:*");
        assert_eq!(match_pattern("a*b?[c]"), "a\\*b\\?\\[c\\]*");
    }

    #[test]
    fn test_expiry_keeps_sub_second_ttls() {
        assert_eq!(expiry_millis(None), None);
        assert_eq!(expiry_millis(Some(Duration::ZERO)), None);
        assert_eq!(expiry_millis(Some(Duration::from_millis(250))), Some(250));
        assert_eq!(expiry_millis(Some(Duration::from_micros(10))), Some(1));
        assert_eq!(expiry_millis(Some(Duration::from_secs(60))), Some(60_000));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_dsn() {
        let result = RedisCache::connect("not-a-url").await;
        assert!(matches!(result, Err(CacheError::InvalidUrl(_))));
    }
}
