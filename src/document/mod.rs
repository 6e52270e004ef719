//! Generic document tree shared by every file format.
//!
//! Configuration, plan and state files all end up as a [`Document`]: a map of
//! string keys to [`Value`]s. Parsers may attach position metadata under keys
//! starting with [`RESERVED_PREFIX`]; those keys are removed by
//! [`Document::sanitize`] before anything reaches an output row.

pub mod canonical;

pub use canonical::canonicalize;

use serde::Serialize;
use std::collections::BTreeMap;

/// Prefix reserved for internal metadata keys.
pub const RESERVED_PREFIX: &str = "_tfi";

/// Key holding the `[start, end]` line pair of a block, injected by the HCL adapter.
pub const LINES_KEY: &str = "_tfi_lines";

/// A node of the generic tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(serde_json::Number),
    /// String scalar (unresolved expressions are kept as `${...}` strings)
    String(String),
    /// Ordered sequence
    Sequence(Vec<Value>),
    /// Nested document
    Mapping(Document),
}

impl Value {
    /// Short name of the value's shape, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "list",
            Self::Mapping(_) => "map",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Document> {
        match self {
            Self::Mapping(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Convert back into a `serde_json::Value`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Mapping(doc) => doc.to_json(),
        }
    }

    fn strip_reserved(&mut self) {
        match self {
            Self::Mapping(doc) => doc.sanitize(),
            Self::Sequence(items) => items.iter_mut().for_each(Self::strip_reserved),
            _ => {}
        }
    }

    fn has_reserved_keys(&self) -> bool {
        match self {
            Self::Mapping(doc) => doc.has_reserved_keys(),
            Self::Sequence(items) => items.iter().any(Self::has_reserved_keys),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Self::Mapping(value)
    }
}

/// String-keyed mapping; key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nested document under `key`, if that key holds a mapping.
    #[must_use]
    pub fn mapping(&self, key: &str) -> Option<&Self> {
        self.get(key).and_then(Value::as_mapping)
    }

    /// String under `key`, if that key holds a string.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Remove every key carrying [`RESERVED_PREFIX`], at every depth.
    pub fn sanitize(&mut self) {
        self.0.retain(|key, _| !key.starts_with(RESERVED_PREFIX));
        self.0.values_mut().for_each(Value::strip_reserved);
    }

    /// Owned variant of [`Document::sanitize`].
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    /// True if any key at any depth carries [`RESERVED_PREFIX`].
    #[must_use]
    pub fn has_reserved_keys(&self) -> bool {
        self.0
            .iter()
            .any(|(key, value)| key.starts_with(RESERVED_PREFIX) || value.has_reserved_keys())
    }

    /// Record the 1-based line range a block was declared on.
    pub fn set_declared_lines(&mut self, start: usize, end: usize) {
        let line = |n: usize| Value::Number(serde_json::Number::from(n as u64));
        self.0.insert(LINES_KEY.to_string(), Value::Sequence(vec![line(start), line(end)]));
    }

    /// Line range previously stored by [`Document::set_declared_lines`].
    #[must_use]
    pub fn declared_lines(&self) -> Option<(usize, usize)> {
        let pair = self.get(LINES_KEY)?.as_sequence()?;
        let line = |v: &Value| match v {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            _ => None,
        };
        match pair {
            [start, end] => Some((line(start)?, line(end)?)),
            _ => None,
        }
    }

    /// Convert into a `serde_json::Value::Object`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
