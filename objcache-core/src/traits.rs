//! Remote key/value client trait.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value client for remote backends.
///
/// Values are JSON strings. Keys are used verbatim; namespacing is the
/// caller's job.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a JSON value from the store.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(value))` if the key exists, `Ok(None)` if not found,
    /// or an error if the backend could not be reached.
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a JSON value.
    ///
    /// # Arguments
    ///
    /// * `key` - The store key
    /// * `value` - The JSON string value
    /// * `ttl` - Optional time-to-live duration
    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key. Returns whether the key existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Delete every key starting with `prefix`.
    ///
    /// Returns the number of keys removed.
    async fn clear_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Record `key` as a member of the set stored at `tag`.
    async fn tag(&self, tag: &str, key: &str) -> CacheResult<()>;

    /// Drop `key` from the set stored at `tag`.
    async fn untag(&self, tag: &str, key: &str) -> CacheResult<()>;

    /// Members of the set stored at `tag`.
    async fn tagged_keys(&self, tag: &str) -> CacheResult<Vec<String>>;

    /// Delete multiple keys.
    ///
    /// Returns the number of keys that existed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use objcache_core::*;
    /// # async fn example(store: &impl CacheStore) -> CacheResult<()> {
    /// let keys = vec!["wp_cache:a".to_string(), "wp_cache:b".to_string()];
    /// let removed = store.delete_many(&keys).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.delete(key));
        let removed = try_join_all(futures).await?;
        Ok(removed.into_iter().filter(|existed| *existed).count() as u64)
    }
}
