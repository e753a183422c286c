//! Process-wide cache instance.
//!
//! Hosts call [`init`] once during bootstrap and [`shutdown`] on exit; code
//! in between reaches the cache through [`instance`].

use crate::error::CacheResult;
use crate::facade::CacheFacade;
use crate::factory::CacheFactory;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

static INSTANCE: Lazy<RwLock<Option<Arc<dyn CacheFacade>>>> = Lazy::new(|| RwLock::new(None));

/// Create the cache from `factory` and install it, replacing any previous one.
pub async fn init(factory: &CacheFactory) -> CacheResult<()> {
    let cache = factory.create().await?;
    install(cache);
    Ok(())
}

/// Install an already built cache.
pub fn install(cache: Arc<dyn CacheFacade>) {
    let previous = INSTANCE.write().replace(cache);
    if previous.is_some() {
        debug!("Replaced global object cache");
    } else {
        info!("Installed global object cache");
    }
}

/// The installed cache, if any.
pub fn instance() -> Option<Arc<dyn CacheFacade>> {
    INSTANCE.read().clone()
}

/// Close and remove the installed cache.
///
/// Returns `true` when nothing was installed.
pub async fn shutdown() -> bool {
    let cache = INSTANCE.write().take();
    match cache {
        Some(cache) => {
            info!("Shutting down global object cache");
            cache.close().await
        }
        None => true,
    }
}
