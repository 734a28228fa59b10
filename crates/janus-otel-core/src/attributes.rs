//! Flat, scalar-only telemetry attributes.
//!
//! Span events only carry scalar attributes. [`flatten`] lifts the first
//! level of an event payload into a [`FlatAttributeSet`]:
//!
//! | JSON value      | Attribute                      |
//! |-----------------|--------------------------------|
//! | object / array  | `"<object>"` / `"<array>"`     |
//! | string          | copied                         |
//! | integer         | `u64` (negatives wrap)         |
//! | real            | `f64`                          |
//! | `true`/`false`  | `1` / `0`                      |
//! | `null`          | `""`                           |
//!
//! Keys are normalized by replacing every `-` with `_`. Deeper levels are
//! never expanded.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Serialize;
use serde_json::Value;

use crate::event::coerce_u64;

/// Placeholder for a nested object value.
pub const OBJECT_MARKER: &str = "<object>";
/// Placeholder for a nested array value.
pub const ARRAY_MARKER: &str = "<array>";

/// A single scalar attribute value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Text.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Float(f64),
}

impl AttrValue {
    /// The string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The unsigned value, if this is an unsigned integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// The signed value, if this is a signed integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The float value, if this is a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Attribute set keyed by normalized name, iterated in key order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatAttributeSet(BTreeMap<String, AttrValue>);

impl FlatAttributeSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an attribute, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.remove(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, AttrValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FlatAttributeSet {
    type Item = (&'a String, &'a AttrValue);
    type IntoIter = btree_map::Iter<'a, String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for FlatAttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Replace every `-` in `key` with `_`.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Flatten the first level of `payload` into `base`.
///
/// The generic `event` attribute is dropped first since the payload
/// supersedes it. Payload keys overwrite base keys they collide with. A
/// payload that is not an object contributes nothing.
#[must_use]
pub fn flatten(mut base: FlatAttributeSet, payload: &Value) -> FlatAttributeSet {
    let _ = base.remove("event");
    let Value::Object(fields) = payload else {
        return base;
    };
    for (key, value) in fields {
        let _ = base.insert(normalize_key(key), coerce(value));
    }
    base
}

fn coerce(value: &Value) -> AttrValue {
    match value {
        Value::Object(_) => OBJECT_MARKER.into(),
        Value::Array(_) => ARRAY_MARKER.into(),
        Value::String(s) => AttrValue::String(s.clone()),
        Value::Number(n) if n.is_f64() => AttrValue::Float(n.as_f64().unwrap_or_default()),
        Value::Number(_) => AttrValue::UInt(coerce_u64(value)),
        Value::Bool(b) => AttrValue::UInt(u64::from(*b)),
        Value::Null => AttrValue::String(String::new()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
