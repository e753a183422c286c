//! Key normalization.
//!
//! A caller addresses an entry with a [`CacheKey`] and an optional group.
//! [`KeyCodec`] folds the pair into the single identifier a backend stores,
//! rewriting any character the backend's [`KeyGrammar`] reserves instead of
//! rejecting the key.

use std::borrow::Cow;
use std::fmt;

/// Separator placed between key and group.
pub const DEFAULT_GROUP_SEPARATOR: &str = "__";

/// Replacement for reserved characters.
pub const DEFAULT_KEY_SEPARATOR: &str = "--";

/// Characters PSR-6 style stores reserve in their key grammar.
pub const RESERVED_CHARACTERS: &str = "{}()/\\@:";

/// Caller-supplied cache key, either integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Integer key
    Int(i64),
    /// String key
    Str(String),
}

impl CacheKey {
    /// String form of the key.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            CacheKey::Int(i) => Cow::Owned(i.to_string()),
            CacheKey::Str(s) => Cow::Borrowed(s),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Int(i) => write!(f, "{}", i),
            CacheKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::Str(key.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey::Str(key)
    }
}

impl From<&String> for CacheKey {
    fn from(key: &String) -> Self {
        CacheKey::Str(key.clone())
    }
}

macro_rules! impl_int_key {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CacheKey {
                fn from(key: $t) -> Self {
                    CacheKey::Int(i64::from(key))
                }
            }
        )*
    };
}

impl_int_key!(i8, i16, i32, i64, u8, u16, u32);

/// Characters a backend refuses in identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGrammar {
    reserved: Cow<'static, str>,
    forbid_whitespace: bool,
}

impl KeyGrammar {
    /// Grammar with a custom reserved set.
    pub fn new(reserved: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reserved: reserved.into(),
            forbid_whitespace: false,
        }
    }

    /// PSR-6 reserved characters plus whitespace and control characters.
    pub fn strict() -> Self {
        Self::default().forbid_whitespace()
    }

    /// Also reject whitespace and control characters.
    pub fn forbid_whitespace(mut self) -> Self {
        self.forbid_whitespace = true;
        self
    }

    /// Whether `c` may not appear in an identifier.
    pub fn is_reserved(&self, c: char) -> bool {
        self.reserved.contains(c)
            || (self.forbid_whitespace && (c.is_whitespace() || c.is_control()))
    }

    /// Whether `id` satisfies the grammar.
    pub fn is_valid(&self, id: &str) -> bool {
        !id.chars().any(|c| self.is_reserved(c))
    }
}

impl Default for KeyGrammar {
    fn default() -> Self {
        Self::new(RESERVED_CHARACTERS)
    }
}

/// Composes `(key, group)` pairs into backend identifiers.
///
/// # Examples
///
/// ```
/// use objcache_core::{CacheKey, KeyCodec};
///
/// let codec = KeyCodec::default();
/// assert_eq!(codec.normalize(&"counter".into(), "stats"), "counter__stats");
/// assert_eq!(codec.normalize(&CacheKey::Int(42), ""), "42");
/// assert_eq!(codec.normalize(&"a:b".into(), "posts"), "a--b__posts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    group_separator: String,
    key_separator: String,
    grammar: KeyGrammar,
}

impl KeyCodec {
    /// Create a codec with explicit separators and grammar.
    pub fn new(
        group_separator: impl Into<String>,
        key_separator: impl Into<String>,
        grammar: KeyGrammar,
    ) -> Self {
        Self {
            group_separator: group_separator.into(),
            key_separator: key_separator.into(),
            grammar,
        }
    }

    /// Default separators with the given grammar.
    pub fn with_grammar(grammar: KeyGrammar) -> Self {
        Self::new(DEFAULT_GROUP_SEPARATOR, DEFAULT_KEY_SEPARATOR, grammar)
    }

    /// Separator between key and group.
    pub fn group_separator(&self) -> &str {
        &self.group_separator
    }

    /// Replacement for reserved characters.
    pub fn key_separator(&self) -> &str {
        &self.key_separator
    }

    /// Grammar identifiers are checked against.
    pub fn grammar(&self) -> &KeyGrammar {
        &self.grammar
    }

    /// Fold `key` and `group` into one identifier.
    ///
    /// An empty group leaves the stringified key alone. Identifiers that
    /// violate the grammar have every reserved character replaced by the
    /// key separator.
    pub fn normalize(&self, key: &CacheKey, group: &str) -> String {
        let id = if group.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", key, self.group_separator, group)
        };

        if self.is_valid(&id) {
            id
        } else {
            self.sanitize(&id)
        }
    }

    /// Whether `id` can be stored as is.
    pub fn is_valid(&self, id: &str) -> bool {
        self.grammar.is_valid(id)
    }

    /// Replace every reserved character in `id` with the key separator.
    pub fn sanitize(&self, id: &str) -> String {
        let mut out = String::with_capacity(id.len());
        for c in id.chars() {
            if self.grammar.is_reserved(c) {
                out.push_str(&self.key_separator);
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::with_grammar(KeyGrammar::default())
    }
}
