//! Cache configuration types.
//!
//! Configuration lookup is a plain `name -> value` provider supplied by the
//! host. [`CacheConfig::from_provider`] resolves the options the factory
//! needs into a typed value.

use crate::error::{CacheError, CacheResult};
use crate::key::KeyGrammar;
use std::collections::HashMap;
use std::fmt;

/// Option selecting the adapter type (`"wordpress"` or `"redis"`).
pub const ADAPTER_OPTION: &str = "WP_SYMFONY_CACHE_ADAPTER";

/// Option holding the Redis connection string.
pub const REDIS_DSN_OPTION: &str = "WP_SYMFONY_CACHE_REDIS_DSN";

/// Option holding the identifier namespace.
pub const NAMESPACE_OPTION: &str = "WP_SYMFONY_CACHE_NAMESPACE";

/// Redis-specific namespace option; wins over [`NAMESPACE_OPTION`].
pub const REDIS_NAMESPACE_OPTION: &str = "WP_SYMFONY_CACHE_REDIS_NAMESPACE";

/// Adapter used when nothing is configured.
pub const DEFAULT_ADAPTER: &str = "wordpress";

/// Connection string used when none is configured.
pub const DEFAULT_REDIS_DSN: &str = "redis://localhost:6379";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "wp_cache";

const REDIS_SCHEMES: &[&str] = &["redis", "rediss", "redis+unix", "unix"];

/// Source of configuration options.
///
/// Empty values are treated as unset and resolve to `default`.
pub trait ConfigProvider: Send + Sync {
    /// Look up `name`, falling back to `default`.
    fn get_config_option(&self, name: &str, default: Option<&str>) -> Option<String>;
}

impl<F> ConfigProvider for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn get_config_option(&self, name: &str, default: Option<&str>) -> Option<String> {
        resolve(self(name), default)
    }
}

fn resolve(value: Option<String>, default: Option<&str>) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => default.map(str::to_string),
    }
}

/// Reads options from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigProvider;

impl ConfigProvider for EnvConfigProvider {
    fn get_config_option(&self, name: &str, default: Option<&str>) -> Option<String> {
        resolve(std::env::var(name).ok(), default)
    }
}

/// Reads options from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MapConfigProvider {
    options: HashMap<String, String>,
}

impl MapConfigProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

impl ConfigProvider for MapConfigProvider {
    fn get_config_option(&self, name: &str, default: Option<&str>) -> Option<String> {
        resolve(self.options.get(name).cloned(), default)
    }
}

/// Backend adapter selected by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterKind {
    /// In-process object store
    Local,
    /// Redis-backed remote store
    Redis,
}

impl AdapterKind {
    /// Map a configured adapter name; anything but `"redis"` is local.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "redis" => AdapterKind::Redis,
            _ => AdapterKind::Local,
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterKind::Local => write!(f, "wordpress"),
            AdapterKind::Redis => write!(f, "redis"),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Adapter type
    pub adapter: AdapterKind,

    /// Remote connection string
    pub dsn: String,

    /// Namespace scoping every remote identifier
    pub namespace: String,
}

impl CacheConfig {
    /// Configuration for the in-process store.
    pub fn local() -> Self {
        Self {
            adapter: AdapterKind::Local,
            dsn: DEFAULT_REDIS_DSN.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Configuration for a Redis store.
    ///
    /// # Examples
    ///
    /// ```
    /// use objcache_core::CacheConfig;
    ///
    /// let config = CacheConfig::redis("redis://localhost:6379").with_namespace("blog");
    /// assert_eq!(config.namespace, "blog");
    /// ```
    pub fn redis(dsn: impl Into<String>) -> Self {
        Self {
            adapter: AdapterKind::Redis,
            dsn: dsn.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Resolve the configuration from a provider.
    pub fn from_provider(provider: &dyn ConfigProvider) -> Self {
        let adapter = provider
            .get_config_option(ADAPTER_OPTION, Some(DEFAULT_ADAPTER))
            .map(|name| AdapterKind::from_name(&name))
            .unwrap_or(AdapterKind::Local);

        let dsn = provider
            .get_config_option(REDIS_DSN_OPTION, Some(DEFAULT_REDIS_DSN))
            .unwrap_or_else(|| DEFAULT_REDIS_DSN.to_string());

        let mut namespace = provider
            .get_config_option(NAMESPACE_OPTION, Some(DEFAULT_NAMESPACE))
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        if adapter == AdapterKind::Redis
            && let Some(redis_namespace) = provider.get_config_option(REDIS_NAMESPACE_OPTION, None)
        {
            namespace = redis_namespace;
        }

        Self {
            adapter,
            dsn,
            namespace,
        }
    }

    /// Check the configuration for setup errors.
    ///
    /// Only the Redis adapter uses the namespace and connection string, so
    /// nothing is checked for the local adapter.
    pub fn validate(&self) -> CacheResult<()> {
        if self.adapter == AdapterKind::Redis {
            if let Some(c) = self
                .namespace
                .chars()
                .find(|c| KeyGrammar::default().is_reserved(*c))
            {
                return Err(CacheError::Config(format!(
                    "namespace '{}' contains reserved character '{}'",
                    self.namespace, c
                )));
            }

            let url = url::Url::parse(&self.dsn)
                .map_err(|e| CacheError::InvalidUrl(format!("{}: {}", self.dsn, e)))?;
            if !REDIS_SCHEMES.contains(&url.scheme()) {
                return Err(CacheError::InvalidUrl(format!(
                    "unsupported scheme '{}' in {}",
                    url.scheme(),
                    self.dsn
                )));
            }
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::local()
    }
}
