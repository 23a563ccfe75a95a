//! String-keyed attribute tables attached to field records.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keys holding bulk arrays; never listed as displayable columns.
pub const BULK_KEYS: [&str; 4] = ["values", "bitmap", "pv", "mask"];

/// Ordered key/value table. Values are kept as the strings the message
/// store produced; interpretation happens at comparison time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    entries: BTreeMap<String, String>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value for `key`, or the empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry from `other` whose key is not present yet.
    ///
    /// Bulk array keys are skipped. Existing values win, so bootstrap keys
    /// such as `index` survive a later full dump.
    pub fn merge_missing(&mut self, other: &AttributeTable) {
        for (key, value) in other.iter() {
            if BULK_KEYS.contains(&key) {
                continue;
            }
            self.entries
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    /// Order two tables by one key, numeric-aware; absent keys compare as "".
    pub fn compare_by(&self, other: &AttributeTable, key: &str) -> Ordering {
        compare_attribute_values(self.get_or_empty(key), other.get_or_empty(key))
    }
}

impl FromIterator<(String, String)> for AttributeTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parse an attribute value as a number.
///
/// Surrounding whitespace is allowed; anything else after the number is not.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Total order over attribute values: numeric when both sides parse as
/// numbers, plain string order otherwise.
pub fn compare_attribute_values(a: &str, b: &str) -> Ordering {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}
