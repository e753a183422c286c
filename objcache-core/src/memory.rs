//! In-process [`CacheStore`], a stand-in for a remote backend.

use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory key/value store with tag sets.
///
/// Clones share the same data, which lets several adapters (or a test and
/// an adapter) observe one "remote" backend.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry>>>,
    tags: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<tokio::time::Instant>,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.expires_at
            .is_none_or(|exp| exp > tokio::time::Instant::now())
    }
}

impl InMemoryCache {
    /// Create new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        self.data
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live())
            .count()
    }

    /// Whether no live keys remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone()))
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl
            .filter(|d| !d.is_zero())
            .map(|d| tokio::time::Instant::now() + d);
        let entry = CacheEntry { value, expires_at };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = self.data.write().await.remove(key);
        let tag_removed = self.tags.write().await.remove(key).is_some();
        Ok(removed.is_some_and(|entry| entry.is_live()) || tag_removed)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.get_json(key).await.map(|v| v.is_some())
    }

    async fn clear_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut data = self.data.write().await;
        let before = data.len();
        data.retain(|key, _| !key.starts_with(prefix));
        let mut removed = (before - data.len()) as u64;

        let mut tags = self.tags.write().await;
        let before = tags.len();
        tags.retain(|key, _| !key.starts_with(prefix));
        removed += (before - tags.len()) as u64;

        Ok(removed)
    }

    async fn tag(&self, tag: &str, key: &str) -> CacheResult<()> {
        self.tags
            .write()
            .await
            .entry(tag.to_string())
            .or_default()
            .insert(key.to_string());
        Ok(())
    }

    async fn untag(&self, tag: &str, key: &str) -> CacheResult<()> {
        let mut tags = self.tags.write().await;
        if let Some(keys) = tags.get_mut(tag) {
            keys.remove(key);
            if keys.is_empty() {
                tags.remove(tag);
            }
        }
        Ok(())
    }

    async fn tagged_keys(&self, tag: &str) -> CacheResult<Vec<String>> {
        let tags = self.tags.read().await;
        Ok(tags
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }
}
