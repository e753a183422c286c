//! Builds the configured adapter and wraps it in a facade.

use crate::adapter::CacheAdapter;
use crate::config::{AdapterKind, CacheConfig, ConfigProvider, EnvConfigProvider};
use crate::error::CacheResult;
use crate::facade::{CacheFacade, ObjectCache};
use crate::local::LocalStoreAdapter;
use std::sync::Arc;
use tracing::info;

/// Hook that may substitute or wrap the constructed adapter.
pub type AdapterFilter = Box<dyn Fn(Arc<dyn CacheAdapter>) -> Arc<dyn CacheAdapter> + Send + Sync>;

/// Hook that may substitute or wrap the constructed facade.
pub type FacadeFilter = Box<dyn Fn(Arc<dyn CacheFacade>) -> Arc<dyn CacheFacade> + Send + Sync>;

/// Creates the process's cache from configuration.
///
/// # Examples
///
/// ```
/// use objcache_core::*;
/// use serde_json::json;
///
/// # async fn example() -> CacheResult<()> {
/// let provider = MapConfigProvider::new().with("WP_SYMFONY_CACHE_ADAPTER", "wordpress");
/// let cache = CacheFactory::new(provider).create().await?;
///
/// assert!(cache.set("k".into(), json!(1), "g", 0).await);
/// # Ok(())
/// # }
/// ```
pub struct CacheFactory {
    provider: Box<dyn ConfigProvider>,
    adapter_filter: Option<AdapterFilter>,
    facade_filter: Option<FacadeFilter>,
}

impl CacheFactory {
    /// Factory reading options from `provider`.
    pub fn new(provider: impl ConfigProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            adapter_filter: None,
            facade_filter: None,
        }
    }

    /// Factory reading options from the process environment.
    pub fn from_env() -> Self {
        Self::new(EnvConfigProvider)
    }

    /// Install the adapter hook.
    pub fn with_adapter_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Arc<dyn CacheAdapter>) -> Arc<dyn CacheAdapter> + Send + Sync + 'static,
    {
        self.adapter_filter = Some(Box::new(filter));
        self
    }

    /// Install the facade hook.
    pub fn with_facade_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Arc<dyn CacheFacade>) -> Arc<dyn CacheFacade> + Send + Sync + 'static,
    {
        self.facade_filter = Some(Box::new(filter));
        self
    }

    /// Resolve and validate the configuration.
    ///
    /// Run before [`create`](Self::create) to fail fast on setup errors such
    /// as a malformed DSN.
    pub fn autoload(&self) -> CacheResult<CacheConfig> {
        let config = CacheConfig::from_provider(self.provider.as_ref());
        config.validate()?;
        Ok(config)
    }

    /// Build the adapter selected by `config`.
    pub async fn create_adapter(config: &CacheConfig) -> CacheResult<Arc<dyn CacheAdapter>> {
        match config.adapter {
            AdapterKind::Redis => Self::create_redis_adapter(config).await,
            AdapterKind::Local => Ok(Arc::new(LocalStoreAdapter::in_memory())),
        }
    }

    #[cfg(feature = "redis")]
    async fn create_redis_adapter(config: &CacheConfig) -> CacheResult<Arc<dyn CacheAdapter>> {
        let adapter =
            crate::remote::RemoteStoreAdapter::connect(&config.dsn, config.namespace.clone())
                .await?;
        Ok(Arc::new(adapter))
    }

    #[cfg(not(feature = "redis"))]
    async fn create_redis_adapter(_config: &CacheConfig) -> CacheResult<Arc<dyn CacheAdapter>> {
        Err(crate::error::CacheError::Config(
            "redis adapter requested but redis support is not compiled in".to_string(),
        ))
    }

    /// Build the cache: adapter, adapter hook, facade, facade hook.
    pub async fn create(&self) -> CacheResult<Arc<dyn CacheFacade>> {
        let config = self.autoload()?;
        info!(
            adapter = %config.adapter,
            namespace = %config.namespace,
            "Creating object cache"
        );

        let mut adapter = Self::create_adapter(&config).await?;
        if let Some(filter) = &self.adapter_filter {
            adapter = filter(adapter);
        }

        let mut cache: Arc<dyn CacheFacade> = Arc::new(ObjectCache::from_arc(adapter));
        if let Some(filter) = &self.facade_filter {
            cache = filter(cache);
        }

        Ok(cache)
    }
}
