//! Multi-valued document metadata attached to each crawl item.
//!
//! A `Metadata` instance maps case-sensitive field names to ordered lists of
//! string values. It is written by upstream stages (fetchers, parsers) and is
//! read-only while the router evaluates it. Looking up an absent key returns
//! "no values", never an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known metadata key carrying a pre-resolved IP address.
pub const IP_METADATA_KEY: &str = "ip";

/// Multi-valued mapping from field name to string values.
///
/// Values under a key keep insertion order and may contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    fields: HashMap<String, Vec<String>>,
}

impl Metadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under the given key, preserving insertion order.
    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces all values under the given key.
    pub fn set_values(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.fields.insert(key.into(), values);
    }

    /// Returns all values stored under `key`, or `None` if the key is absent.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.fields.get(key).map(Vec::as_slice)
    }

    /// Returns the first value stored under `key`, or `None` if absent.
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over all key/values pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_returns_no_values() {
        let metadata = Metadata::new();
        assert!(metadata.values("missing").is_none());
        assert!(metadata.first_value("missing").is_none());
    }

    #[test]
    fn values_keep_insertion_order_and_duplicates() {
        let mut metadata = Metadata::new();
        metadata.add_value("key", "a");
        metadata.add_value("key", "b");
        metadata.add_value("key", "a");
        assert_eq!(
            metadata.values("key").unwrap(),
            ["a".to_string(), "b".to_string(), "a".to_string()]
        );
        assert_eq!(metadata.first_value("key"), Some("a"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut metadata = Metadata::new();
        metadata.add_value("Key", "val");
        assert!(metadata.values("key").is_none());
        assert!(metadata.values("Key").is_some());
    }
}
