use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Read access to a string-keyed set of values.
///
/// Implemented for [`Set`] and for plain `BTreeMap<String, String>` so that
/// object metadata labels can be matched without copying.
pub trait Labels {
    /// Returns `true` if the key is present (with any value, including empty).
    fn has(&self, key: &str) -> bool;

    /// Returns the value stored for the key, if any.
    fn get(&self, key: &str) -> Option<&str>;
}

/// An ordered set of key/value pairs.
///
/// Used both for labels and for the selectable fields extracted from a
/// resource. Ordering is by key, so `Display` output is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set(BTreeMap<String, String>);

impl Set {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a key/value pair, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`Self::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Labels for Set {
    fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl Labels for BTreeMap<String, String> {
    fn has(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for Set {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Set {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}
