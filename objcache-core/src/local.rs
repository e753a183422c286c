//! In-process object store and its adapter.
//!
//! [`ObjectStore`] is the boundary to a per-process store addressed by
//! `(key, group)` under a current site. [`InMemoryObjectStore`] is the
//! bundled implementation; [`LocalStoreAdapter`] maps identifiers produced by
//! the [`KeyCodec`](crate::key::KeyCodec) back onto it.

use crate::adapter::{CacheAdapter, GroupAware};
use crate::error::{CacheError, CacheResult};
use crate::item::CacheItem;
use crate::key::{DEFAULT_GROUP_SEPARATOR, KeyCodec, KeyGrammar};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Group used when a caller passes none.
pub const DEFAULT_GROUP: &str = "default";

/// Site scope a fresh store starts in.
pub const DEFAULT_BLOG_ID: i64 = 1;

/// In-process key/value store addressed by `(key, group)`.
pub trait ObjectStore: Send + Sync {
    /// Look up an entry. `None` is a miss.
    fn get(&self, key: &str, group: &str, force: bool) -> Option<Value>;

    /// Store an entry, replacing any previous one.
    fn set(&self, key: &str, value: Value, group: &str, expire: Option<Duration>) -> bool;

    /// Remove an entry; `true` if one was removed.
    fn delete(&self, key: &str, group: &str) -> bool;

    /// Remove every entry.
    fn flush(&self) -> bool;

    /// Remove every entry of `group`.
    fn flush_group(&self, group: &str) -> bool;

    /// Whether [`flush_group`](Self::flush_group) is implemented.
    fn supports_group_flush(&self) -> bool {
        true
    }

    /// Register groups shared across sites.
    fn add_global_groups(&self, groups: &[String]);

    /// Switch the current site.
    fn switch_to_blog(&self, blog_id: i64);
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|exp| exp > Instant::now())
    }
}

#[derive(Debug)]
struct StoreState {
    groups: HashMap<String, HashMap<String, Entry>>,
    global_groups: HashSet<String>,
    blog_id: i64,
}

impl StoreState {
    fn scoped_key(&self, key: &str, group: &str) -> String {
        if self.global_groups.contains(group) {
            key.to_string()
        } else {
            format!("{}:{}", self.blog_id, key)
        }
    }
}

fn group_or_default(group: &str) -> &str {
    if group.is_empty() { DEFAULT_GROUP } else { group }
}

/// Per-process object store with site scoping.
///
/// Keys in non-global groups are prefixed with the current site id, so
/// switching sites hides entries of other sites without touching them.
#[derive(Debug)]
pub struct InMemoryObjectStore {
    state: RwLock<StoreState>,
}

impl InMemoryObjectStore {
    /// Create an empty store scoped to [`DEFAULT_BLOG_ID`].
    pub fn new() -> Self {
        Self::for_blog(DEFAULT_BLOG_ID)
    }

    /// Create an empty store scoped to `blog_id`.
    pub fn for_blog(blog_id: i64) -> Self {
        Self {
            state: RwLock::new(StoreState {
                groups: HashMap::new(),
                global_groups: HashSet::new(),
                blog_id,
            }),
        }
    }

    /// Current site scope.
    pub fn blog_id(&self) -> i64 {
        self.state.read().blog_id
    }

    /// Number of live entries across all groups and sites.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .groups
            .values()
            .flat_map(|entries| entries.values())
            .filter(|entry| entry.is_live())
            .count()
    }

    /// Whether the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let mut state = self.state.write();
        for entries in state.groups.values_mut() {
            entries.retain(|_, entry| entry.is_live());
        }
        state.groups.retain(|_, entries| !entries.is_empty());
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get(&self, key: &str, group: &str, _force: bool) -> Option<Value> {
        let group = group_or_default(group);
        let state = self.state.read();
        let key = state.scoped_key(key, group);

        state
            .groups
            .get(group)
            .and_then(|entries| entries.get(&key))
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: Value, group: &str, expire: Option<Duration>) -> bool {
        let group = group_or_default(group);
        let mut state = self.state.write();
        let key = state.scoped_key(key, group);
        let expires_at = expire.map(|ttl| Instant::now() + ttl);

        state
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(key, Entry { value, expires_at });
        true
    }

    fn delete(&self, key: &str, group: &str) -> bool {
        let group = group_or_default(group);
        let mut state = self.state.write();
        let key = state.scoped_key(key, group);

        state
            .groups
            .get_mut(group)
            .and_then(|entries| entries.remove(&key))
            .is_some_and(|entry| entry.is_live())
    }

    fn flush(&self) -> bool {
        self.state.write().groups.clear();
        true
    }

    fn flush_group(&self, group: &str) -> bool {
        self.state.write().groups.remove(group_or_default(group));
        true
    }

    fn add_global_groups(&self, groups: &[String]) {
        let mut state = self.state.write();
        state.global_groups.extend(groups.iter().cloned());
    }

    fn switch_to_blog(&self, blog_id: i64) {
        self.state.write().blog_id = blog_id;
    }
}

/// Adapter over an in-process [`ObjectStore`].
///
/// Entries are stored under the caller's group name as given, so
/// [`clear`](CacheAdapter::clear) and global group registration see the same
/// name. The group-aware calls strip the normalized group suffix off the
/// identifier to recover the key. The plain calls split the identifier at
/// the last group separator instead; an identifier without one belongs to
/// [`DEFAULT_GROUP`].
pub struct LocalStoreAdapter<S: ObjectStore = InMemoryObjectStore> {
    store: S,
    codec: KeyCodec,
}

impl LocalStoreAdapter<InMemoryObjectStore> {
    /// Adapter over a fresh [`InMemoryObjectStore`].
    pub fn in_memory() -> Self {
        Self::new(InMemoryObjectStore::new())
    }
}

impl<S: ObjectStore> LocalStoreAdapter<S> {
    /// Wrap an object store.
    pub fn new(store: S) -> Self {
        debug!(
            group_separator = DEFAULT_GROUP_SEPARATOR,
            "Creating local store adapter"
        );
        Self {
            store,
            codec: KeyCodec::default(),
        }
    }

    /// Override the separators.
    pub fn with_separators(
        mut self,
        group_separator: impl Into<String>,
        key_separator: impl Into<String>,
    ) -> Self {
        self.codec = KeyCodec::new(group_separator, key_separator, KeyGrammar::default());
        self
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn split<'a>(&self, id: &'a str) -> (&'a str, &'a str) {
        match id.rsplit_once(self.codec.group_separator()) {
            Some((key, group)) if !group.is_empty() => (key, group),
            _ => (id, DEFAULT_GROUP),
        }
    }

    fn locate<'a>(&self, id: &'a str, group: &'a str) -> (&'a str, &'a str) {
        if group.is_empty() {
            return (id, DEFAULT_GROUP);
        }
        let suffix = format!(
            "{}{}",
            self.codec.group_separator(),
            self.codec.sanitize(group)
        );
        (id.strip_suffix(suffix.as_str()).unwrap_or(id), group)
    }

    fn lookup(&self, key: &str, group: &str) -> CacheItem {
        let item = match self.store.get(key, group, false) {
            Some(value) => CacheItem::hit(key, value),
            None => CacheItem::miss(key),
        };
        item.with_group(group)
    }
}

#[async_trait]
impl<S: ObjectStore> CacheAdapter for LocalStoreAdapter<S> {
    async fn has_item(&self, id: &str) -> CacheResult<bool> {
        Ok(self.get_item(id).await?.is_hit())
    }

    async fn get_item(&self, id: &str) -> CacheResult<CacheItem> {
        let (key, group) = self.split(id);
        Ok(self.lookup(key, group))
    }

    async fn save(&self, item: CacheItem) -> CacheResult<bool> {
        let (key, group) = match item.group() {
            Some(group) => (item.key(), group),
            None => self.split(item.key()),
        };
        Ok(self
            .store
            .set(key, item.value().clone(), group, item.expiry()))
    }

    async fn delete_item(&self, id: &str) -> CacheResult<bool> {
        let (key, group) = self.split(id);
        Ok(self.store.delete(key, group))
    }

    async fn clear(&self, prefix: &str) -> CacheResult<bool> {
        if prefix.is_empty() {
            return Ok(self.store.flush());
        }
        if !self.store.supports_group_flush() {
            return Err(CacheError::Unsupported(format!(
                "object store cannot flush group '{}'",
                prefix
            )));
        }
        debug!(group = prefix, "Flushing local group");
        Ok(self.store.flush_group(prefix))
    }

    async fn has_item_in(&self, id: &str, group: &str) -> CacheResult<bool> {
        let (key, group) = self.locate(id, group);
        Ok(self.store.get(key, group, false).is_some())
    }

    async fn get_item_in(&self, id: &str, group: &str) -> CacheResult<CacheItem> {
        let (key, group) = self.locate(id, group);
        Ok(self.lookup(key, group))
    }

    async fn delete_item_in(&self, id: &str, group: &str) -> CacheResult<bool> {
        let (key, group) = self.locate(id, group);
        Ok(self.store.delete(key, group))
    }

    fn supports_group_flush(&self) -> bool {
        self.store.supports_group_flush()
    }

    fn as_group_aware(&self) -> Option<&dyn GroupAware> {
        Some(self)
    }
}

impl<S: ObjectStore> GroupAware for LocalStoreAdapter<S> {
    fn add_global_groups(&self, groups: &[String]) {
        self.store.add_global_groups(groups);
    }

    fn add_non_persistent_groups(&self, _groups: &[String]) {
        // Everything in this store is non-persistent already.
    }

    fn switch_to_blog(&self, blog_id: i64) {
        self.store.switch_to_blog(blog_id);
    }

    fn group_separator(&self) -> &str {
        self.codec.group_separator()
    }

    fn key_separator(&self) -> &str {
        self.codec.key_separator()
    }
}
