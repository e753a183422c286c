//! Object cache with group-namespaced keys and swappable backends.
//!
//! Call sites speak one contract, [`CacheFacade`]: `(key, group)` pairs,
//! add/set/replace/get/delete, numeric increments and flushes. Behind it an
//! [`ObjectCache`] normalizes every pair into a single identifier with a
//! [`KeyCodec`] and drives a [`CacheAdapter`]:
//!
//! - [`LocalStoreAdapter`] - an in-process, group-aware object store with
//!   multisite (blog) scoping and global groups
//! - [`RemoteStoreAdapter`] - a namespaced key/value store such as Redis,
//!   with group flushes backed by tag sets
//!
//! # Features
//!
//! - `redis` - Enable the Redis backend (enabled by default)
//!
//! # Examples
//!
//! ## Local store
//!
//! ```
//! use objcache_core::*;
//! use serde_json::json;
//!
//! # async fn example() {
//! let cache = ObjectCache::new(LocalStoreAdapter::in_memory());
//!
//! cache.add_global_groups(&["users".to_string()]);
//! cache.set(CacheKey::Int(42), json!({"name": "Alice"}), "users", 0).await;
//!
//! cache.switch_to_blog(2);
//! assert!(cache.get(CacheKey::Int(42), "users", false).await.is_some());
//! # }
//! ```
//!
//! ## Configured from the environment
//!
//! ```no_run
//! use objcache_core::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CacheError> {
//!     // WP_SYMFONY_CACHE_ADAPTER=redis WP_SYMFONY_CACHE_REDIS_DSN=redis://localhost:6379
//!     global::init(&CacheFactory::from_env()).await?;
//!
//!     if let Some(cache) = global::instance() {
//!         cache.flush_group("posts").await;
//!     }
//!
//!     global::shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod facade;
pub mod factory;
pub mod global;
pub mod helpers;
pub mod item;
pub mod key;
pub mod local;
pub mod memory;
pub mod remote;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use adapter::{CacheAdapter, Capabilities, GroupAware};
pub use config::{AdapterKind, CacheConfig, ConfigProvider, EnvConfigProvider, MapConfigProvider};
pub use error::{CacheError, CacheResult};
pub use facade::{CacheFacade, Feature, ObjectCache};
pub use factory::CacheFactory;
pub use item::CacheItem;
pub use key::{CacheKey, KeyCodec, KeyGrammar};
pub use local::{InMemoryObjectStore, LocalStoreAdapter, ObjectStore};
pub use memory::InMemoryCache;
pub use remote::RemoteStoreAdapter;
pub use traits::CacheStore;

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::adapter::{CacheAdapter, GroupAware};
    pub use crate::config::{CacheConfig, ConfigProvider, MapConfigProvider};
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::facade::{CacheFacade, Feature, ObjectCache};
    pub use crate::factory::CacheFactory;
    pub use crate::key::CacheKey;
    pub use crate::local::LocalStoreAdapter;
    pub use crate::remote::RemoteStoreAdapter;

    #[cfg(feature = "redis")]
    pub use crate::redis_cache::RedisCache;
}
