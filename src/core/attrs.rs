//! Attribute storage for component metadata.
//!
//! Animation data lives in named dictionaries of string keys on each
//! component. [`AttributeStore`] is the seam to the host; [`MemoryStore`] is a
//! plain in-memory implementation that also round-trips through JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Num(f64),
    Str(String),
    Array(Vec<f64>),
}

impl AttrValue {
    /// Text form of a scalar value. Arrays have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Num(n) => Some(n.to_string()),
            Self::Array(_) => None,
        }
    }

    /// Numeric form of a scalar value.
    ///
    /// Strings are parsed after trimming; empty or non-numeric text gives
    /// `None`, and so do infinities and NaN.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Self::Num(n) => *n,
            Self::Str(s) => s.trim().parse().ok()?,
            Self::Array(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Borrow the elements of an array value.
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
            Self::Array(v) => write!(f, "{:?}", v),
        }
    }
}

/// Get/set/delete access to one component's attribute dictionaries.
pub trait AttributeStore {
    /// Read a value. `None` when the key (or dictionary) is absent.
    fn get(&self, dict: &str, key: &str) -> Option<AttrValue>;

    /// Write a value, creating the dictionary if needed.
    fn set(&mut self, dict: &str, key: &str, value: AttrValue);

    /// Remove a key entirely. Removing an absent key is a no-op.
    fn delete(&mut self, dict: &str, key: &str);

    /// Check if a key is present.
    fn contains(&self, dict: &str, key: &str) -> bool {
        self.get(dict, key).is_some()
    }

    /// Read a scalar value as text.
    fn get_text(&self, dict: &str, key: &str) -> Option<String> {
        self.get(dict, key).and_then(|v| v.as_text())
    }
}

/// In-memory attribute store: dictionary name -> key -> value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    dicts: BTreeMap<String, BTreeMap<String, AttrValue>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store from its JSON form.
    pub fn from_json(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize the store as pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Iterate over the keys of a dictionary in sorted order.
    pub fn keys<'a>(&'a self, dict: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.dicts
            .get(dict)
            .into_iter()
            .flat_map(|d| d.keys().map(String::as_str))
    }

    /// Number of keys in a dictionary.
    pub fn len(&self, dict: &str) -> usize {
        self.dicts.get(dict).map_or(0, BTreeMap::len)
    }

    /// Check if a dictionary is empty or absent.
    pub fn is_empty(&self, dict: &str) -> bool {
        self.len(dict) == 0
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self, dict: &str, key: &str) -> Option<AttrValue> {
        self.dicts.get(dict).and_then(|d| d.get(key)).cloned()
    }

    fn set(&mut self, dict: &str, key: &str, value: AttrValue) {
        self.dicts
            .entry(dict.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn delete(&mut self, dict: &str, key: &str) {
        if let Some(d) = self.dicts.get_mut(dict) {
            d.remove(key);
            if d.is_empty() {
                self.dicts.remove(dict);
            }
        }
    }
}
