// objcache - An object cache for CMS-style hosts
//
// This library exposes a single cache contract over an in-process object store
// or a namespaced remote store such as Redis.

// Re-export core functionality
pub use objcache_core::*;

// Prelude for common imports
pub mod prelude {
    pub use objcache_core::prelude::*;
    pub use objcache_core::{CacheItem, InMemoryCache, KeyCodec, global, helpers};
}
