//! Declarative filter configuration.
//!
//! Two JSON forms are accepted. The structured form carries an optional
//! `operation` (`AND`/`OR`, case-insensitive, default `OR`) and a `filters`
//! map whose entries are either literal field leaves or, under a reserved
//! key prefix, nested filter objects following the same schema:
//!
//! ```json
//! {
//!   "operation": "AND",
//!   "filters": {
//!     "key": "val",
//!     "nested_filter_1": {
//!       "operation": "OR",
//!       "filters": { "key2": "val2", "key3": "val3" }
//!     }
//!   }
//! }
//! ```
//!
//! The legacy flat form is an object with no `operation`/`filters` markers;
//! its entries become the leaves of an implicit top-level `OR`.
//!
//! The reserved prefix exists only at this JSON boundary so one mapping can
//! carry both leaves and sub-trees. The in-memory tree uses explicit tagged
//! nodes and needs no synthetic keys.

use crate::error::RouterError;
use crate::filter::node::{FilterNode, FilterOp, FilterTree};
use serde_json::{Map, Value};
use tracing::warn;

/// Reserved key prefix marking a nested filter object inside a `filters` map.
pub const NESTED_KEY_PREFIX: &str = "nested_filter_";

/// Configuration key selecting the boolean operation of a filter object.
pub const OPERATION_KEY: &str = "operation";

/// Configuration key holding the leaf/sub-tree map of a filter object.
pub const FILTERS_KEY: &str = "filters";

impl FilterTree {
    /// Builds a filter tree from its JSON configuration.
    ///
    /// Fails only on structurally invalid input; a semantically empty
    /// configuration (`{}`, or a `filters` map with no entries) yields an
    /// empty tree that admits every item.
    pub fn from_json(config: &Value) -> Result<FilterTree, RouterError> {
        let object = config.as_object().ok_or_else(|| {
            RouterError::ConfigurationError(
                "filter configuration must be a JSON object".to_string(),
            )
        })?;
        let root = build_branch(object)?;
        match &root {
            FilterNode::Branch { children, .. } if children.is_empty() => Ok(FilterTree::empty()),
            _ => Ok(FilterTree::new(root)),
        }
    }

    /// Serializes the tree back to its structured JSON configuration form.
    ///
    /// Nested branches are written under the reserved prefix with the lowest
    /// unused counter suffix, so sibling sub-trees never overwrite each
    /// other.
    pub fn to_json(&self) -> Value {
        match self.root() {
            Some(root) => node_to_json(root),
            None => Value::Object(Map::new()),
        }
    }
}

fn build_branch(object: &Map<String, Value>) -> Result<FilterNode, RouterError> {
    let mut op = FilterOp::Or;
    let mut children = Vec::new();

    // Legacy flat form: no markers present, every entry is a leaf.
    if !object.contains_key(OPERATION_KEY) && !object.contains_key(FILTERS_KEY) {
        for (key, value) in object {
            children.push(leaf_from(key, value)?);
        }
    }

    if let Some(op_value) = object.get(OPERATION_KEY) {
        let name = op_value.as_str().ok_or_else(|| {
            RouterError::ConfigurationError(format!(
                "'{OPERATION_KEY}' must be a string, got: {op_value}"
            ))
        })?;
        match FilterOp::parse(name) {
            Some(parsed) => op = parsed,
            None => warn!("Unknown filter operation '{}', keeping OR", name),
        }
    }

    if let Some(filters_value) = object.get(FILTERS_KEY) {
        let filters = filters_value.as_object().ok_or_else(|| {
            RouterError::ConfigurationError(format!(
                "'{FILTERS_KEY}' must be a JSON object, got: {filters_value}"
            ))
        })?;
        for (key, value) in filters {
            if key.starts_with(NESTED_KEY_PREFIX) {
                let nested = value.as_object().ok_or_else(|| {
                    RouterError::ConfigurationError(format!(
                        "nested filter '{key}' must be a JSON object, got: {value}"
                    ))
                })?;
                children.push(build_branch(nested)?);
            } else {
                children.push(leaf_from(key, value)?);
            }
        }
    }

    Ok(FilterNode::Branch { op, children })
}

fn leaf_from(key: &str, value: &Value) -> Result<FilterNode, RouterError> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => {
            return Err(RouterError::ConfigurationError(format!(
                "filter entry '{key}' must be a scalar value, got: {value}"
            )))
        }
    };
    Ok(FilterNode::leaf(key, text))
}

fn node_to_json(node: &FilterNode) -> Value {
    match node {
        FilterNode::Leaf { key, value } => {
            // A bare leaf serializes as a single-entry implicit OR.
            let mut filters = Map::new();
            filters.insert(key.clone(), Value::String(value.clone()));
            wrap(FilterOp::Or, filters)
        }
        FilterNode::Branch { op, children } => {
            let mut filters = Map::new();
            for child in children {
                match child {
                    FilterNode::Leaf { key, value } => {
                        filters.insert(key.clone(), Value::String(value.clone()));
                    }
                    FilterNode::Branch { .. } => {
                        let key = next_nested_key(&filters);
                        filters.insert(key, node_to_json(child));
                    }
                }
            }
            wrap(*op, filters)
        }
    }
}

fn wrap(op: FilterOp, filters: Map<String, Value>) -> Value {
    let mut object = Map::new();
    object.insert(
        OPERATION_KEY.to_string(),
        Value::String(op.as_str().to_string()),
    );
    object.insert(FILTERS_KEY.to_string(), Value::Object(filters));
    Value::Object(object)
}

// Lowest unused counter suffix within this map.
fn next_nested_key(filters: &Map<String, Value>) -> String {
    let mut counter = 1usize;
    loop {
        let key = format!("{NESTED_KEY_PREFIX}{counter}");
        if !filters.contains_key(&key) {
            return key;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_flat_form_builds_implicit_or() {
        let flat = FilterTree::from_json(&json!({"key": "val", "key2": "val2"})).unwrap();
        let structured = FilterTree::from_json(&json!({
            "filters": {"key": "val", "key2": "val2"}
        }))
        .unwrap();
        assert_eq!(flat, structured);
        assert_eq!(
            flat,
            FilterTree::new(FilterNode::branch(
                FilterOp::Or,
                vec![FilterNode::leaf("key", "val"), FilterNode::leaf("key2", "val2")],
            ))
        );
    }

    #[test]
    fn operation_is_case_insensitive_with_or_default() {
        let config = json!({"operation": "and", "filters": {"key": "val"}});
        let tree = FilterTree::from_json(&config).unwrap();
        assert_eq!(
            tree,
            FilterTree::new(FilterNode::branch(
                FilterOp::And,
                vec![FilterNode::leaf("key", "val")],
            ))
        );

        let defaulted = FilterTree::from_json(&json!({"filters": {"key": "val"}})).unwrap();
        assert_eq!(
            defaulted,
            FilterTree::new(FilterNode::branch(
                FilterOp::Or,
                vec![FilterNode::leaf("key", "val")],
            ))
        );
    }

    #[test]
    fn nested_configuration_matches_hand_built_tree() {
        // key=val OR (key2=val2 AND key3=val3)
        let config = json!({
            "operation": "OR",
            "filters": {
                "key": "val",
                "nested_filter_1": {
                    "operation": "AND",
                    "filters": {"key2": "val2", "key3": "val3"}
                }
            }
        });
        let tree = FilterTree::from_json(&config).unwrap();
        let expected = FilterTree::new(FilterNode::branch(
            FilterOp::Or,
            vec![
                FilterNode::leaf("key", "val"),
                FilterNode::branch(
                    FilterOp::And,
                    vec![FilterNode::leaf("key2", "val2"), FilterNode::leaf("key3", "val3")],
                ),
            ],
        ));
        assert_eq!(tree, expected);
    }

    #[test]
    fn empty_configuration_yields_empty_tree() {
        assert!(FilterTree::from_json(&json!({})).unwrap().is_empty());
        assert!(FilterTree::from_json(&json!({"filters": {}}))
            .unwrap()
            .is_empty());
        // But an explicit operation with an empty filters map is still empty:
        // no rule was configured, nothing to evaluate.
        assert!(FilterTree::from_json(&json!({"operation": "AND", "filters": {}}))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn structurally_invalid_configuration_is_rejected() {
        assert!(FilterTree::from_json(&json!("not an object")).is_err());
        assert!(FilterTree::from_json(&json!({"filters": "not a map"})).is_err());
        assert!(FilterTree::from_json(&json!({"filters": {"key": ["array"]}})).is_err());
        assert!(FilterTree::from_json(&json!({
            "filters": {"nested_filter_1": "not an object"}
        }))
        .is_err());
        assert!(FilterTree::from_json(&json!({"operation": 3})).is_err());
    }

    #[test]
    fn sibling_branches_serialize_under_distinct_counters() {
        let tree = FilterTree::new(FilterNode::branch(
            FilterOp::And,
            vec![
                FilterNode::leaf("key", "val"),
                FilterNode::branch(FilterOp::Or, vec![FilterNode::leaf("key2", "val2")]),
                FilterNode::branch(FilterOp::Or, vec![FilterNode::leaf("key3", "val3")]),
            ],
        ));
        let config = tree.to_json();
        let filters = config.get(FILTERS_KEY).unwrap().as_object().unwrap();
        assert!(filters.contains_key("nested_filter_1"));
        assert!(filters.contains_key("nested_filter_2"));

        let reparsed = FilterTree::from_json(&config).unwrap();
        assert_eq!(reparsed, tree);
    }
}
