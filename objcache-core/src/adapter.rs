//! Backend adapter traits.
//!
//! [`CacheAdapter`] is the primitive item contract the facade is written
//! against. Adapters that understand groups and site scoping also expose a
//! [`GroupAware`] view; the facade inspects it once, when it is built.

use crate::error::CacheResult;
use crate::item::CacheItem;
use crate::key::{DEFAULT_GROUP_SEPARATOR, DEFAULT_KEY_SEPARATOR, KeyGrammar};
use async_trait::async_trait;

/// Primitive item operations every backend provides.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// Check whether an identifier holds an entry.
    async fn has_item(&self, id: &str) -> CacheResult<bool>;

    /// Fetch an item. Misses are items with `is_hit() == false`, not errors.
    async fn get_item(&self, id: &str) -> CacheResult<CacheItem>;

    /// Persist an item previously obtained from [`get_item`](Self::get_item).
    ///
    /// Returns `false` when the backend refused the write.
    async fn save(&self, item: CacheItem) -> CacheResult<bool>;

    /// Remove an entry.
    ///
    /// Returns `true` only if an entry existed and was removed.
    async fn delete_item(&self, id: &str) -> CacheResult<bool>;

    /// Remove entries.
    ///
    /// An empty `prefix` clears everything the adapter owns. A group name
    /// clears that group where the backend can; see
    /// [`supports_group_flush`](Self::supports_group_flush).
    async fn clear(&self, prefix: &str) -> CacheResult<bool>;

    /// [`has_item`](Self::has_item) for an identifier normalized from `group`.
    ///
    /// The facade always calls the `_in` variants with the caller's group
    /// name as given. Adapters that key entries on the group override them.
    async fn has_item_in(&self, id: &str, _group: &str) -> CacheResult<bool> {
        self.has_item(id).await
    }

    /// [`get_item`](Self::get_item) for an identifier normalized from `group`.
    async fn get_item_in(&self, id: &str, _group: &str) -> CacheResult<CacheItem> {
        self.get_item(id).await
    }

    /// [`delete_item`](Self::delete_item) for an identifier normalized from `group`.
    async fn delete_item_in(&self, id: &str, _group: &str) -> CacheResult<bool> {
        self.delete_item(id).await
    }

    /// Characters this backend refuses in identifiers.
    fn key_grammar(&self) -> KeyGrammar {
        KeyGrammar::default()
    }

    /// Whether [`clear`](Self::clear) with a group name only touches that group.
    fn supports_group_flush(&self) -> bool {
        false
    }

    /// Group and site scoping, when the backend understands them.
    fn as_group_aware(&self) -> Option<&dyn GroupAware> {
        None
    }
}

/// Group and site scoping operations.
pub trait GroupAware: Send + Sync {
    /// Register groups shared by every site.
    fn add_global_groups(&self, groups: &[String]);

    /// Register groups whose entries need not outlive the process.
    fn add_non_persistent_groups(&self, groups: &[String]);

    /// Switch the current site scope.
    fn switch_to_blog(&self, blog_id: i64);

    /// Separator placed between key and group.
    fn group_separator(&self) -> &str {
        DEFAULT_GROUP_SEPARATOR
    }

    /// Replacement for reserved key characters.
    fn key_separator(&self) -> &str {
        DEFAULT_KEY_SEPARATOR
    }
}

/// Optional behaviors of an adapter, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Adapter exposes [`GroupAware`]
    pub group_aware: bool,
    /// Group-scoped clearing is available
    pub flush_group: bool,
}

impl Capabilities {
    /// Inspect an adapter.
    pub fn of(adapter: &dyn CacheAdapter) -> Self {
        Self {
            group_aware: adapter.as_group_aware().is_some(),
            flush_group: adapter.supports_group_flush(),
        }
    }
}
