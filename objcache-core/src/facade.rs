//! The public cache operation surface.
//!
//! [`CacheFacade`] is the contract call sites use. [`ObjectCache`] implements
//! it once against any [`CacheAdapter`]: keys are normalized through a
//! [`KeyCodec`], compound operations (add, replace, incr, decr) are built on
//! the adapter's primitives, and adapter errors become failure results.
//!
//! # Examples
//!
//! ```
//! use objcache_core::*;
//! use serde_json::json;
//!
//! # async fn example() {
//! let cache = ObjectCache::new(LocalStoreAdapter::in_memory());
//!
//! cache.set("counter".into(), json!(10), "stats", 0).await;
//! assert_eq!(cache.incr("counter".into(), 1, "stats").await, Some(11));
//! assert_eq!(cache.get("counter".into(), "stats", false).await, Some(json!(11)));
//!
//! // A stored `false` is still found.
//! cache.set("flag".into(), json!(false), "", 0).await;
//! assert_eq!(cache.get("flag".into(), "", false).await, Some(json!(false)));
//! assert_eq!(cache.get("missing".into(), "stats", false).await, None);
//! # }
//! ```

use crate::adapter::{CacheAdapter, Capabilities};
use crate::error::CacheResult;
use crate::item::CacheItem;
use crate::key::{CacheKey, KeyCodec};
use async_trait::async_trait;
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Optional features a host may check for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// `add_multiple`
    AddMultiple,
    /// `set_multiple`
    SetMultiple,
    /// `get_multiple`
    GetMultiple,
    /// `delete_multiple`
    DeleteMultiple,
    /// `flush_runtime`
    FlushRuntime,
    /// `flush_group`
    FlushGroup,
}

impl Feature {
    /// Host-facing name of the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::AddMultiple => "add_multiple",
            Feature::SetMultiple => "set_multiple",
            Feature::GetMultiple => "get_multiple",
            Feature::DeleteMultiple => "delete_multiple",
            Feature::FlushRuntime => "flush_runtime",
            Feature::FlushGroup => "flush_group",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_multiple" => Ok(Feature::AddMultiple),
            "set_multiple" => Ok(Feature::SetMultiple),
            "get_multiple" => Ok(Feature::GetMultiple),
            "delete_multiple" => Ok(Feature::DeleteMultiple),
            "flush_runtime" => Ok(Feature::FlushRuntime),
            "flush_group" => Ok(Feature::FlushGroup),
            other => Err(format!("unknown cache feature: {}", other)),
        }
    }
}

/// Cache operations exposed to call sites.
///
/// `group` `""` means ungrouped; `expire` is in seconds with `0` meaning no
/// expiration. Operations never fail with an error: backend failures are
/// reported as `false` / `None`.
#[async_trait]
pub trait CacheFacade: Send + Sync {
    /// Store `value` only if `(key, group)` is absent.
    async fn add(&self, key: CacheKey, value: Value, group: &str, expire: u64) -> bool;

    /// Store `value`, overwriting any existing entry.
    async fn set(&self, key: CacheKey, value: Value, group: &str, expire: u64) -> bool;

    /// Store `value` only if `(key, group)` is present.
    async fn replace(&self, key: CacheKey, value: Value, group: &str, expire: u64) -> bool;

    /// Fetch a value. `None` means not found; a stored `false` is
    /// `Some(Value::Bool(false))`.
    ///
    /// `force` asks to bypass local freshness shortcuts; adapters without a
    /// local/remote split ignore it.
    async fn get(&self, key: CacheKey, group: &str, force: bool) -> Option<Value>;

    /// Remove an entry. `true` only if one existed and was removed.
    async fn delete(&self, key: CacheKey, group: &str) -> bool;

    /// Add `offset` to a numeric entry and return the new value.
    async fn incr(&self, key: CacheKey, offset: i64, group: &str) -> Option<i64>;

    /// Subtract `offset` from a numeric entry and return the new value.
    async fn decr(&self, key: CacheKey, offset: i64, group: &str) -> Option<i64>;

    /// Remove every entry.
    async fn flush(&self) -> bool;

    /// Remove the entries of one group.
    ///
    /// Check [`supports`](Self::supports) with [`Feature::FlushGroup`] first;
    /// the call is not guarded.
    async fn flush_group(&self, group: &str) -> bool;

    /// Release backend resources.
    async fn close(&self) -> bool {
        true
    }

    /// Register groups shared across sites.
    fn add_global_groups(&self, groups: &[String]);

    /// Register groups whose entries need not persist.
    fn add_non_persistent_groups(&self, groups: &[String]);

    /// Switch the site scope subsequent operations observe.
    fn switch_to_blog(&self, blog_id: i64);

    /// Separator between key and group.
    fn group_separator(&self) -> &str;

    /// Replacement for reserved key characters.
    fn key_separator(&self) -> &str;

    /// Whether `feature` is available.
    fn supports(&self, feature: Feature) -> bool;

    /// Alias for [`flush`](Self::flush).
    async fn flush_runtime(&self) -> bool {
        self.flush().await
    }

    /// [`add`](Self::add) each item, in order.
    async fn add_multiple(
        &self,
        items: Vec<(CacheKey, Value)>,
        group: &str,
        expire: u64,
    ) -> Vec<(CacheKey, bool)> {
        let mut results = Vec::with_capacity(items.len());
        for (key, value) in items {
            let stored = self.add(key.clone(), value, group, expire).await;
            results.push((key, stored));
        }
        results
    }

    /// [`set`](Self::set) each item, in order.
    async fn set_multiple(
        &self,
        items: Vec<(CacheKey, Value)>,
        group: &str,
        expire: u64,
    ) -> Vec<(CacheKey, bool)> {
        let mut results = Vec::with_capacity(items.len());
        for (key, value) in items {
            let stored = self.set(key.clone(), value, group, expire).await;
            results.push((key, stored));
        }
        results
    }

    /// [`get`](Self::get) each key, in order.
    async fn get_multiple(
        &self,
        keys: Vec<CacheKey>,
        group: &str,
        force: bool,
    ) -> Vec<(CacheKey, Option<Value>)> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key.clone(), group, force).await;
            results.push((key, value));
        }
        results
    }

    /// [`delete`](Self::delete) each key, in order.
    async fn delete_multiple(&self, keys: Vec<CacheKey>, group: &str) -> Vec<(CacheKey, bool)> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let removed = self.delete(key.clone(), group).await;
            results.push((key, removed));
        }
        results
    }
}

/// A number read from the cache, kept in its stored kind.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    /// Numeric reading of a stored value: numbers and numeric strings.
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Numeric::Int)
                .or_else(|| n.as_f64().map(Numeric::Float)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().map(Numeric::Int).ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(Numeric::Float)
                })
            }
            _ => None,
        }
    }

    fn offset(self, delta: i64) -> Option<Self> {
        match self {
            Numeric::Int(i) => i.checked_add(delta).map(Numeric::Int),
            Numeric::Float(f) => Some(f + delta as f64)
                .filter(|f| f.is_finite())
                .map(Numeric::Float),
        }
    }

    fn to_value(self) -> Option<Value> {
        match self {
            Numeric::Int(i) => Some(Value::from(i)),
            Numeric::Float(f) => Number::from_f64(f).map(Value::Number),
        }
    }

    /// Integer reading; `None` for floats outside the `i64` range.
    fn as_i64(self) -> Option<i64> {
        match self {
            Numeric::Int(i) => Some(i),
            Numeric::Float(f) => {
                let f = f.trunc();
                // i64::MAX as f64 rounds up to 2^63, which is out of range
                (f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
            }
        }
    }
}

/// [`CacheFacade`] over a [`CacheAdapter`].
///
/// Separators and capabilities are read from the adapter once, here; the
/// facade itself keeps no per-call state.
pub struct ObjectCache {
    adapter: Arc<dyn CacheAdapter>,
    codec: KeyCodec,
    capabilities: Capabilities,
}

impl ObjectCache {
    /// Wrap an adapter.
    pub fn new<A: CacheAdapter + 'static>(adapter: A) -> Self {
        Self::from_arc(Arc::new(adapter))
    }

    /// Wrap a shared adapter.
    pub fn from_arc(adapter: Arc<dyn CacheAdapter>) -> Self {
        let capabilities = Capabilities::of(adapter.as_ref());
        let grammar = adapter.key_grammar();
        let codec = match adapter.as_group_aware() {
            Some(group_aware) => KeyCodec::new(
                group_aware.group_separator(),
                group_aware.key_separator(),
                grammar,
            ),
            None => KeyCodec::with_grammar(grammar),
        };

        Self {
            adapter,
            codec,
            capabilities,
        }
    }

    /// The wrapped adapter.
    pub fn adapter(&self) -> &Arc<dyn CacheAdapter> {
        &self.adapter
    }

    /// Capabilities resolved at construction.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Identifier for `(key, group)`.
    pub fn normalize(&self, key: &CacheKey, group: &str) -> String {
        self.codec.normalize(key, group)
    }

    async fn try_store(&self, id: &str, value: Value, group: &str, expire: u64) -> CacheResult<bool> {
        let mut item = self.adapter.get_item_in(id, group).await?;
        if item.group().is_none() && !group.is_empty() {
            item = item.with_group(group);
        }
        item.set(value);
        if expire > 0 {
            item.expires_after(Some(Duration::from_secs(expire)));
        }
        self.adapter.save(item).await
    }

    async fn try_add(&self, id: &str, value: Value, group: &str, expire: u64) -> CacheResult<bool> {
        if self.adapter.has_item_in(id, group).await? {
            return Ok(false);
        }
        self.try_store(id, value, group, expire).await
    }

    async fn try_replace(
        &self,
        id: &str,
        value: Value,
        group: &str,
        expire: u64,
    ) -> CacheResult<bool> {
        if !self.adapter.has_item_in(id, group).await? {
            return Ok(false);
        }
        self.try_store(id, value, group, expire).await
    }

    async fn try_get(&self, id: &str, group: &str) -> CacheResult<Option<Value>> {
        Ok(self.adapter.get_item_in(id, group).await?.into_value())
    }

    async fn offset(&self, key: CacheKey, delta: i64, group: &str) -> Option<i64> {
        let current = Numeric::parse(&self.get(key.clone(), group, false).await?)?;
        let Some((updated, result)) = current
            .offset(delta)
            .and_then(|updated| Some((updated, updated.as_i64()?)))
        else {
            warn!(key = %key, group, delta, "Counter overflow");
            return None;
        };
        let value = updated.to_value()?;

        self.set(key, value, group, 0).await.then_some(result)
    }
}

/// Unwrap an adapter result, logging failures.
fn settle<T>(op: &'static str, id: &str, result: CacheResult<T>, failed: T) -> T {
    result.unwrap_or_else(|e| {
        warn!(op, id, error = %e, "Cache backend operation failed");
        failed
    })
}

#[async_trait]
impl CacheFacade for ObjectCache {
    async fn add(&self, key: CacheKey, value: Value, group: &str, expire: u64) -> bool {
        let id = self.normalize(&key, group);
        settle("add", &id, self.try_add(&id, value, group, expire).await, false)
    }

    async fn set(&self, key: CacheKey, value: Value, group: &str, expire: u64) -> bool {
        let id = self.normalize(&key, group);
        settle("set", &id, self.try_store(&id, value, group, expire).await, false)
    }

    async fn replace(&self, key: CacheKey, value: Value, group: &str, expire: u64) -> bool {
        let id = self.normalize(&key, group);
        settle(
            "replace",
            &id,
            self.try_replace(&id, value, group, expire).await,
            false,
        )
    }

    async fn get(&self, key: CacheKey, group: &str, _force: bool) -> Option<Value> {
        let id = self.normalize(&key, group);
        settle("get", &id, self.try_get(&id, group).await, None)
    }

    async fn delete(&self, key: CacheKey, group: &str) -> bool {
        let id = self.normalize(&key, group);
        settle(
            "delete",
            &id,
            self.adapter.delete_item_in(&id, group).await,
            false,
        )
    }

    async fn incr(&self, key: CacheKey, offset: i64, group: &str) -> Option<i64> {
        self.offset(key, offset, group).await
    }

    async fn decr(&self, key: CacheKey, offset: i64, group: &str) -> Option<i64> {
        self.offset(key, offset.checked_neg()?, group).await
    }

    async fn flush(&self) -> bool {
        settle("flush", "", self.adapter.clear("").await, false)
    }

    async fn flush_group(&self, group: &str) -> bool {
        settle("flush_group", group, self.adapter.clear(group).await, false)
    }

    fn add_global_groups(&self, groups: &[String]) {
        if let Some(group_aware) = self.adapter.as_group_aware() {
            group_aware.add_global_groups(groups);
        }
    }

    fn add_non_persistent_groups(&self, groups: &[String]) {
        if let Some(group_aware) = self.adapter.as_group_aware() {
            group_aware.add_non_persistent_groups(groups);
        }
    }

    fn switch_to_blog(&self, blog_id: i64) {
        if let Some(group_aware) = self.adapter.as_group_aware() {
            group_aware.switch_to_blog(blog_id);
        }
    }

    fn group_separator(&self) -> &str {
        self.codec.group_separator()
    }

    fn key_separator(&self) -> &str {
        self.codec.key_separator()
    }

    fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::FlushGroup => self.capabilities.flush_group,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::local::LocalStoreAdapter;
    use crate::remote::RemoteStoreAdapter;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    // Plain key/value adapter without group awareness.
    #[derive(Default)]
    struct MockAdapter {
        data: RwLock<HashMap<String, Value>>,
        fail: bool,
    }

    impl MockAdapter {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn check(&self) -> CacheResult<()> {
            if self.fail {
                Err(CacheError::Connection("backend down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CacheAdapter for MockAdapter {
        async fn has_item(&self, id: &str) -> CacheResult<bool> {
            self.check()?;
            Ok(self.data.read().await.contains_key(id))
        }

        async fn get_item(&self, id: &str) -> CacheResult<CacheItem> {
            self.check()?;
            Ok(match self.data.read().await.get(id) {
                Some(value) => CacheItem::hit(id, value.clone()),
                None => CacheItem::miss(id),
            })
        }

        async fn save(&self, item: CacheItem) -> CacheResult<bool> {
            self.check()?;
            self.data
                .write()
                .await
                .insert(item.key().to_string(), item.value().clone());
            Ok(true)
        }

        async fn delete_item(&self, id: &str) -> CacheResult<bool> {
            self.check()?;
            Ok(self.data.write().await.remove(id).is_some())
        }

        async fn clear(&self, _prefix: &str) -> CacheResult<bool> {
            self.check()?;
            self.data.write().await.clear();
            Ok(true)
        }
    }

    fn key(k: &str) -> CacheKey {
        CacheKey::from(k)
    }

    fn local() -> ObjectCache {
        ObjectCache::new(LocalStoreAdapter::in_memory())
    }

    #[tokio::test]
    async fn test_set_get_false() {
        let cache = local();
        assert!(cache.set("flag".into(), json!(false), "opts", 0).await);
        assert_eq!(cache.get("flag".into(), "opts", false).await, Some(json!(false)));
        assert_eq!(cache.get("missing".into(), "opts", false).await, None);
    }

    #[tokio::test]
    async fn test_add_does_not_overwrite() {
        let cache = local();
        assert!(cache.add("k".into(), json!(1), "g", 0).await);
        assert!(!cache.add("k".into(), json!(2), "g", 0).await);
        assert_eq!(cache.get("k".into(), "g", false).await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_replace_requires_presence() {
        let cache = local();
        assert!(!cache.replace("k".into(), json!(1), "g", 0).await);
        assert_eq!(cache.get("k".into(), "g", false).await, None);

        cache.set("k".into(), json!(1), "g", 0).await;
        assert!(cache.replace("k".into(), json!(2), "g", 0).await);
        assert_eq!(cache.get("k".into(), "g", false).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let cache = local();
        assert!(!cache.delete("k".into(), "g").await);

        cache.set("k".into(), json!("v"), "g", 0).await;
        assert!(cache.delete("k".into(), "g").await);
        assert_eq!(cache.get("k".into(), "g", false).await, None);
    }

    #[tokio::test]
    async fn test_groups_isolate_keys() {
        let cache = local();
        cache.set("id".into(), json!("post"), "posts", 0).await;
        cache.set("id".into(), json!("term"), "terms", 0).await;
        cache.set("id".into(), json!("plain"), "", 0).await;

        assert_eq!(cache.get("id".into(), "posts", false).await, Some(json!("post")));
        assert_eq!(cache.get("id".into(), "terms", false).await, Some(json!("term")));
        assert_eq!(cache.get("id".into(), "", false).await, Some(json!("plain")));
    }

    #[tokio::test]
    async fn test_incr_and_decr() {
        let cache = local();
        cache.set("counter".into(), json!(10), "stats", 0).await;

        assert_eq!(cache.incr("counter".into(), 5, "stats").await, Some(15));
        assert_eq!(cache.get("counter".into(), "stats", false).await, Some(json!(15)));
        assert_eq!(cache.decr("counter".into(), 20, "stats").await, Some(-5));
        assert_eq!(cache.get("counter".into(), "stats", false).await, Some(json!(-5)));
    }

    #[tokio::test]
    async fn test_incr_rejects_missing_and_non_numeric() {
        let cache = local();
        assert_eq!(cache.incr("absent".into(), 1, "stats").await, None);
        assert_eq!(cache.get("absent".into(), "stats", false).await, None);

        cache.set("name".into(), json!("alice"), "stats", 0).await;
        assert_eq!(cache.incr("name".into(), 1, "stats").await, None);
        assert_eq!(cache.get("name".into(), "stats", false).await, Some(json!("alice")));

        cache.set("flag".into(), json!(true), "stats", 0).await;
        assert_eq!(cache.decr("flag".into(), 1, "stats").await, None);
    }

    #[tokio::test]
    async fn test_incr_numeric_strings_and_floats() {
        let cache = local();
        cache.set("s".into(), json!("41"), "", 0).await;
        assert_eq!(cache.incr("s".into(), 1, "").await, Some(42));
        assert_eq!(cache.get("s".into(), "", false).await, Some(json!(42)));

        cache.set("f".into(), json!(1.5), "", 0).await;
        assert_eq!(cache.incr("f".into(), 1, "").await, Some(2));
        assert_eq!(cache.get("f".into(), "", false).await, Some(json!(2.5)));
    }

    #[tokio::test]
    async fn test_incr_overflow_fails() {
        let cache = local();
        cache.set("max".into(), json!(i64::MAX), "", 0).await;
        assert_eq!(cache.incr("max".into(), 1, "").await, None);
        assert_eq!(cache.get("max".into(), "", false).await, Some(json!(i64::MAX)));
        assert_eq!(cache.decr("max".into(), i64::MIN, "").await, None);
    }

    #[tokio::test]
    async fn test_incr_float_out_of_range_fails() {
        let cache = local();
        cache.set("huge".into(), json!(1.0e19), "", 0).await;
        assert_eq!(cache.incr("huge".into(), 1, "").await, None);
        assert_eq!(cache.get("huge".into(), "", false).await, Some(json!(1.0e19)));

        cache.set("tiny".into(), json!(-1.0e19), "", 0).await;
        assert_eq!(cache.decr("tiny".into(), 1, "").await, None);
        assert_eq!(cache.get("tiny".into(), "", false).await, Some(json!(-1.0e19)));
    }

    #[tokio::test]
    async fn test_bulk_preserves_order_and_results() {
        let cache = local();
        cache.set("b".into(), json!(0), "g", 0).await;

        let added = cache
            .add_multiple(
                vec![("a".into(), json!(1)), ("b".into(), json!(2))],
                "g",
                0,
            )
            .await;
        assert_eq!(added, vec![(key("a"), true), (key("b"), false)]);

        let set = cache
            .set_multiple(
                vec![("a".into(), json!(1)), ("b".into(), json!(2))],
                "g",
                0,
            )
            .await;
        assert_eq!(set, vec![(key("a"), true), (key("b"), true)]);

        let got = cache
            .get_multiple(vec!["b".into(), "missing".into(), "a".into()], "g", false)
            .await;
        assert_eq!(
            got,
            vec![
                (key("b"), Some(json!(2))),
                (key("missing"), None),
                (key("a"), Some(json!(1))),
            ]
        );

        let deleted = cache
            .delete_multiple(vec!["a".into(), "missing".into()], "g")
            .await;
        assert_eq!(deleted, vec![(key("a"), true), (key("missing"), false)]);
    }

    #[tokio::test]
    async fn test_flush_and_flush_group() {
        let cache = local();
        cache.set("a".into(), json!(1), "g1", 0).await;
        cache.set("b".into(), json!(2), "g2", 0).await;

        assert!(cache.supports(Feature::FlushGroup));
        assert!(cache.flush_group("g1").await);
        assert_eq!(cache.get("a".into(), "g1", false).await, None);
        assert_eq!(cache.get("b".into(), "g2", false).await, Some(json!(2)));

        assert!(cache.flush().await);
        assert_eq!(cache.get("b".into(), "g2", false).await, None);
    }

    #[tokio::test]
    async fn test_switch_to_blog_and_global_groups() {
        let cache = local();
        cache.add_global_groups(&["users".to_string()]);
        cache.add_non_persistent_groups(&["counts".to_string()]);
        cache.set("k".into(), json!("site 1"), "posts", 0).await;
        cache.set("u".into(), json!("everyone"), "users", 0).await;

        cache.switch_to_blog(2);
        assert_eq!(cache.get("k".into(), "posts", false).await, None);
        assert_eq!(cache.get("u".into(), "users", false).await, Some(json!("everyone")));

        cache.switch_to_blog(1);
        assert_eq!(cache.get("k".into(), "posts", false).await, Some(json!("site 1")));
    }

    #[tokio::test]
    async fn test_reserved_characters_in_keys() {
        let cache = local();
        assert!(cache.set("post:1".into(), json!("a"), "site/transient", 0).await);
        assert_eq!(
            cache.get("post:1".into(), "site/transient", false).await,
            Some(json!("a"))
        );
        assert_eq!(
            cache.normalize(&"post:1".into(), "site/transient"),
            "post--1__site--transient"
        );
    }

    #[tokio::test]
    async fn test_plain_adapter_defaults() {
        let cache = ObjectCache::new(MockAdapter::default());
        assert!(!cache.capabilities().group_aware);
        assert!(!cache.supports(Feature::FlushGroup));
        assert!(cache.supports(Feature::GetMultiple));
        assert_eq!(cache.group_separator(), "__");
        assert_eq!(cache.key_separator(), "--");

        // grouping setters are no-ops
        cache.add_global_groups(&["g".to_string()]);
        cache.switch_to_blog(9);

        assert!(cache.set(7i64.into(), json!([1, 2]), "g", 0).await);
        assert_eq!(cache.get(7i64.into(), "g", false).await, Some(json!([1, 2])));
        assert!(cache.delete(7i64.into(), "g").await);
        assert!(cache.close().await);
    }

    #[tokio::test]
    async fn test_backend_failure_is_false() {
        let cache = ObjectCache::new(MockAdapter::failing());
        assert!(!cache.set("k".into(), json!(1), "", 0).await);
        assert!(!cache.add("k".into(), json!(1), "", 0).await);
        assert!(!cache.replace("k".into(), json!(1), "", 0).await);
        assert_eq!(cache.get("k".into(), "", false).await, None);
        assert!(!cache.delete("k".into(), "").await);
        assert_eq!(cache.incr("k".into(), 1, "").await, None);
        assert!(!cache.flush().await);
        assert!(!cache.flush_group("g").await);

        let results = cache
            .set_multiple(vec![("a".into(), json!(1)), ("b".into(), json!(2))], "", 0)
            .await;
        assert_eq!(results, vec![(key("a"), false), (key("b"), false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_is_applied() {
        let cache = local();
        cache.set("t".into(), json!(1), "g", 30).await;
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get("t".into(), "g", false).await, None);

        cache.set("t".into(), json!(1), "g", 0).await;
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cache.get("t".into(), "g", false).await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_remote_group_flush() {
        let cache = ObjectCache::new(RemoteStoreAdapter::in_memory("ns"));
        cache.set("a".into(), json!(1), "posts", 0).await;
        cache.set("b".into(), json!(2), "terms", 0).await;

        assert!(cache.supports(Feature::FlushGroup));
        assert!(cache.flush_group("posts").await);
        assert_eq!(cache.get("a".into(), "posts", false).await, None);
        assert_eq!(cache.get("b".into(), "terms", false).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_remote_sanitizes_whitespace() {
        let cache = ObjectCache::new(RemoteStoreAdapter::in_memory("ns"));
        assert_eq!(cache.normalize(&"a b".into(), "g"), "a--b__g");
        assert!(cache.set("a b".into(), json!(1), "g", 0).await);
        assert_eq!(cache.get("a b".into(), "g", false).await, Some(json!(1)));
    }

    #[test]
    fn test_feature_names() {
        assert_eq!("flush_group".parse::<Feature>(), Ok(Feature::FlushGroup));
        assert_eq!(Feature::AddMultiple.to_string(), "add_multiple");
        assert!("flush_everything".parse::<Feature>().is_err());
    }

    #[test]
    fn test_numeric_parse() {
        assert_eq!(Numeric::parse(&json!(3)), Some(Numeric::Int(3)));
        assert_eq!(Numeric::parse(&json!(" 12 ")), Some(Numeric::Int(12)));
        assert_eq!(Numeric::parse(&json!("1e2")), Some(Numeric::Float(100.0)));
        assert_eq!(Numeric::parse(&json!("nan")), None);
        assert_eq!(Numeric::parse(&json!(null)), None);
        assert_eq!(Numeric::parse(&json!({"n": 1})), None);
    }
}
