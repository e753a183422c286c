//! Typed helpers over any [`CacheFacade`].

use crate::error::{CacheError, CacheResult};
use crate::facade::CacheFacade;
use crate::key::CacheKey;
use serde::{Serialize, de::DeserializeOwned};

/// Get a typed value from the cache.
///
/// A miss is `Ok(None)`; a stored value that does not deserialize into `T`
/// is an error.
pub async fn get<C, T>(cache: &C, key: impl Into<CacheKey>, group: &str) -> CacheResult<Option<T>>
where
    C: CacheFacade + ?Sized,
    T: DeserializeOwned,
{
    match cache.get(key.into(), group, false).await {
        Some(value) => {
            let value: T = serde_json::from_value(value)
                .map_err(|e| CacheError::Deserialization(e.to_string()))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Set a typed value in the cache.
///
/// Returns the facade's success flag; serialization failures are errors.
pub async fn set<C, T>(
    cache: &C,
    key: impl Into<CacheKey>,
    value: &T,
    group: &str,
    expire: u64,
) -> CacheResult<bool>
where
    C: CacheFacade + ?Sized,
    T: Serialize + ?Sized,
{
    let value =
        serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(cache.set(key.into(), value, group, expire).await)
}

/// Remember a value.
///
/// If the key exists, returns the cached value.
/// If not, calls the factory function, caches the result, and returns it.
///
/// # Examples
///
/// ```
/// use objcache_core::*;
///
/// # async fn example() -> CacheResult<()> {
/// let cache = ObjectCache::new(LocalStoreAdapter::in_memory());
///
/// let count: u64 = helpers::remember(&cache, "post_count", "stats", 300, || async {
///     Ok(42)
/// })
/// .await?;
/// assert_eq!(count, 42);
/// # Ok(())
/// # }
/// ```
pub async fn remember<C, T, F, Fut>(
    cache: &C,
    key: impl Into<CacheKey>,
    group: &str,
    expire: u64,
    factory: F,
) -> CacheResult<T>
where
    C: CacheFacade + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = CacheResult<T>>,
{
    let key = key.into();
    if let Some(value) = get(cache, key.clone(), group).await? {
        return Ok(value);
    }

    let value = factory().await?;
    set(cache, key, &value, group, expire).await?;
    Ok(value)
}
