//! Adapter over a remote key/value [`CacheStore`].

use crate::adapter::CacheAdapter;
use crate::error::{CacheError, CacheResult};
use crate::item::CacheItem;
use crate::key::KeyGrammar;
use crate::memory::InMemoryCache;
use crate::traits::CacheStore;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Adapter storing items in a remote store under a namespace.
///
/// Every identifier is stored at `{namespace}:{id}` with its value encoded
/// as JSON. With tagging on, each save also records the stored key in the
/// set at `{namespace}:tags:{group}`, which is what makes group flushes
/// possible. Identifiers never contain `:`, so tag sets cannot collide with
/// entries. Deletes through [`delete_item_in`](CacheAdapter::delete_item_in)
/// drop the key from its tag set; members whose entry merely expired stay
/// until the group or the namespace is flushed.
pub struct RemoteStoreAdapter<S: CacheStore> {
    store: S,
    namespace: String,
    tagging: bool,
}

impl RemoteStoreAdapter<InMemoryCache> {
    /// Adapter over a fresh [`InMemoryCache`].
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(InMemoryCache::new(), namespace)
    }
}

#[cfg(feature = "redis")]
impl RemoteStoreAdapter<crate::redis_cache::RedisCache> {
    /// Connect to Redis and build a tagging adapter.
    pub async fn connect(dsn: &str, namespace: impl Into<String>) -> CacheResult<Self> {
        let store = crate::redis_cache::RedisCache::connect(dsn).await?;
        Ok(Self::new(store, namespace))
    }
}

impl<S: CacheStore> RemoteStoreAdapter<S> {
    /// Wrap a store; tagging is on.
    pub fn new(store: S, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        debug!(namespace = %namespace, "Creating remote store adapter");
        Self {
            store,
            namespace,
            tagging: true,
        }
    }

    /// Stop recording group tags; group clears become full clears.
    pub fn without_tags(mut self) -> Self {
        self.tagging = false;
        self
    }

    /// Namespace prefixing every key.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store key for an identifier.
    pub fn build_key(&self, id: &str) -> String {
        format!("{}:{}", self.namespace, id)
    }

    /// Store key of the tag set for a group.
    pub fn tag_key(&self, group: &str) -> String {
        format!("{}:tags:{}", self.namespace, group)
    }

    fn namespace_prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    async fn clear_all(&self) -> CacheResult<bool> {
        let removed = self.store.clear_prefix(&self.namespace_prefix()).await?;
        debug!(namespace = %self.namespace, removed, "Cleared remote namespace");
        Ok(true)
    }

    async fn clear_group(&self, group: &str) -> CacheResult<bool> {
        let tag = self.tag_key(group);
        let mut keys = self.store.tagged_keys(&tag).await?;
        keys.push(tag);
        let removed = self.store.delete_many(&keys).await?;
        debug!(namespace = %self.namespace, group, removed, "Invalidated remote group");
        Ok(true)
    }
}

#[async_trait]
impl<S: CacheStore> CacheAdapter for RemoteStoreAdapter<S> {
    async fn has_item(&self, id: &str) -> CacheResult<bool> {
        self.store.exists(&self.build_key(id)).await
    }

    async fn get_item(&self, id: &str) -> CacheResult<CacheItem> {
        match self.store.get_json(&self.build_key(id)).await? {
            Some(json) => {
                let value: Value = serde_json::from_str(&json)
                    .map_err(|e| CacheError::Deserialization(e.to_string()))?;
                Ok(CacheItem::hit(id, value))
            }
            None => Ok(CacheItem::miss(id)),
        }
    }

    async fn save(&self, item: CacheItem) -> CacheResult<bool> {
        let key = self.build_key(item.key());
        let json = serde_json::to_string(item.value())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.store.set_json(&key, json, item.expiry()).await?;

        if self.tagging
            && let Some(group) = item.group().filter(|group| !group.is_empty())
        {
            self.store.tag(&self.tag_key(group), &key).await?;
        }

        Ok(true)
    }

    async fn delete_item(&self, id: &str) -> CacheResult<bool> {
        self.store.delete(&self.build_key(id)).await
    }

    async fn clear(&self, prefix: &str) -> CacheResult<bool> {
        if prefix.is_empty() || !self.tagging {
            self.clear_all().await
        } else {
            self.clear_group(prefix).await
        }
    }

    async fn delete_item_in(&self, id: &str, group: &str) -> CacheResult<bool> {
        let key = self.build_key(id);
        let existed = self.store.delete(&key).await?;
        if self.tagging && !group.is_empty() {
            self.store.untag(&self.tag_key(group), &key).await?;
        }
        Ok(existed)
    }

    fn key_grammar(&self) -> KeyGrammar {
        KeyGrammar::strict()
    }

    fn supports_group_flush(&self) -> bool {
        self.tagging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_key_layout() {
        let adapter = RemoteStoreAdapter::in_memory("blog");
        assert_eq!(adapter.build_key("k__g"), "blog:k__g");
        assert_eq!(adapter.tag_key("g"), "blog:tags:g");
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let adapter = RemoteStoreAdapter::in_memory("ns");
        let mut item = adapter.get_item("flag").await.unwrap();
        assert!(!item.is_hit());

        item.set(json!(false));
        assert!(adapter.save(item).await.unwrap());

        let item = adapter.get_item("flag").await.unwrap();
        assert!(item.is_hit());
        assert_eq!(item.value(), &json!(false));
        assert_eq!(
            adapter.store().get_json("ns:flag").await.unwrap(),
            Some("false".to_string())
        );
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let shared = InMemoryCache::new();
        let one = RemoteStoreAdapter::new(shared.clone(), "one");
        let two = RemoteStoreAdapter::new(shared.clone(), "two");

        one.save(CacheItem::hit("k", json!(1))).await.unwrap();
        assert!(one.has_item("k").await.unwrap());
        assert!(!two.has_item("k").await.unwrap());

        two.save(CacheItem::hit("k", json!(2))).await.unwrap();
        one.clear("").await.unwrap();
        assert!(!one.has_item("k").await.unwrap());
        assert!(two.has_item("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_group_clear_uses_tags() {
        let adapter = RemoteStoreAdapter::in_memory("ns");
        adapter
            .save(CacheItem::hit("a__posts", json!(1)).with_group("posts"))
            .await
            .unwrap();
        adapter
            .save(CacheItem::hit("b__terms", json!(2)).with_group("terms"))
            .await
            .unwrap();

        assert!(adapter.supports_group_flush());
        assert!(adapter.clear("posts").await.unwrap());
        assert!(!adapter.has_item("a__posts").await.unwrap());
        assert!(adapter.has_item("b__terms").await.unwrap());
        assert!(
            adapter
                .store()
                .tagged_keys("ns:tags:posts")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_without_tags_group_clear_is_full_clear() {
        let adapter = RemoteStoreAdapter::in_memory("ns").without_tags();
        adapter
            .save(CacheItem::hit("a__posts", json!(1)).with_group("posts"))
            .await
            .unwrap();
        adapter
            .save(CacheItem::hit("b__terms", json!(2)).with_group("terms"))
            .await
            .unwrap();

        assert!(!adapter.supports_group_flush());
        assert!(adapter.clear("posts").await.unwrap());
        assert!(adapter.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let adapter = RemoteStoreAdapter::in_memory("ns");
        assert!(!adapter.delete_item("k").await.unwrap());
        adapter.save(CacheItem::hit("k", json!("v"))).await.unwrap();
        assert!(adapter.delete_item("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_grouped_delete_untags() {
        let adapter = RemoteStoreAdapter::in_memory("ns");
        adapter
            .save(CacheItem::hit("a__posts", json!(1)).with_group("posts"))
            .await
            .unwrap();
        adapter
            .save(CacheItem::hit("b__posts", json!(2)).with_group("posts"))
            .await
            .unwrap();

        assert!(adapter.delete_item_in("a__posts", "posts").await.unwrap());
        assert_eq!(
            adapter.store().tagged_keys("ns:tags:posts").await.unwrap(),
            vec!["ns:b__posts".to_string()]
        );

        assert!(adapter.delete_item_in("b__posts", "posts").await.unwrap());
        assert!(adapter.store().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_forwarded() {
        let adapter = RemoteStoreAdapter::in_memory("ns");
        let mut item = CacheItem::hit("k", json!(1));
        item.expires_after(Some(Duration::from_secs(2)));
        adapter.save(item).await.unwrap();

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!adapter.has_item("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_an_error() {
        let adapter = RemoteStoreAdapter::in_memory("ns");
        adapter
            .store()
            .set_json("ns:bad", "{not json".to_string(), None)
            .await
            .unwrap();
        assert!(matches!(
            adapter.get_item("bad").await,
            Err(CacheError::Deserialization(_))
        ));
    }
}
