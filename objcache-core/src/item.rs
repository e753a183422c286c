//! Cache items exchanged between the facade and backend adapters.

use serde_json::Value;
use std::time::Duration;

/// One entry as seen by an adapter.
///
/// The hit flag is the only existence signal: a stored `false` is a hit
/// whose value is `Value::Bool(false)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    key: String,
    value: Value,
    is_hit: bool,
    expiry: Option<Duration>,
    group: Option<String>,
}

impl CacheItem {
    /// A miss for `key`.
    pub fn miss(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Value::Null,
            is_hit: false,
            expiry: None,
            group: None,
        }
    }

    /// A hit for `key` holding `value`.
    pub fn hit(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            is_hit: true,
            expiry: None,
            group: None,
        }
    }

    /// Attach group metadata.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Key the adapter addresses this item by.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Group metadata, if the adapter tracks it.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Whether the lookup found an entry.
    pub fn is_hit(&self) -> bool {
        self.is_hit
    }

    /// Current value (`Null` on a miss).
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value, only if the lookup was a hit.
    pub fn into_value(self) -> Option<Value> {
        self.is_hit.then_some(self.value)
    }

    /// Replace the value to be saved.
    pub fn set(&mut self, value: Value) -> &mut Self {
        self.value = value;
        self
    }

    /// Relative expiration; `None` keeps the entry until evicted.
    pub fn expiry(&self) -> Option<Duration> {
        self.expiry
    }

    /// Expire the entry `ttl` after it is saved.
    pub fn expires_after(&mut self, ttl: Option<Duration>) -> &mut Self {
        self.expiry = ttl;
        self
    }
}
