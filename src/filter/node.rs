//! Boolean predicate tree evaluated against item metadata.
//!
//! The tree is an explicit tagged structure: terminal [`FilterNode::Leaf`]
//! field matches and [`FilterNode::Branch`] combinators that nest to
//! arbitrary depth. It is constructed top-down from configuration, never
//! mutated afterwards, and is safe to share across any number of concurrent
//! evaluations.

use crate::metadata::Metadata;

/// Boolean combinator applied to a branch's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// True iff every child matches. Vacuously true with no children.
    And,
    /// True iff at least one child matches. Vacuously false with no children.
    Or,
}

impl FilterOp {
    /// Parses an operation name, ignoring case. Returns `None` for anything
    /// other than `AND`/`OR`.
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("and") {
            Some(FilterOp::And)
        } else if name.eq_ignore_ascii_case("or") {
            Some(FilterOp::Or)
        } else {
            None
        }
    }

    /// Configuration-form name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::And => "AND",
            FilterOp::Or => "OR",
        }
    }
}

/// One node of the rule tree.
#[derive(Debug, Clone)]
pub enum FilterNode {
    /// Matches when any value stored under `key` equals `value`, ignoring
    /// case. A key with no stored values never matches.
    Leaf {
        /// Metadata field to inspect.
        key: String,
        /// Expected value, compared case-insensitively.
        value: String,
    },
    /// Combines child nodes under a boolean operation.
    Branch {
        /// Combinator applied to the children.
        op: FilterOp,
        /// Child nodes, leaves and branches freely mixed.
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Creates a leaf matching `key` against `value`.
    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterNode::Leaf {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a branch over the given children.
    pub fn branch(op: FilterOp, children: Vec<FilterNode>) -> Self {
        FilterNode::Branch { op, children }
    }

    /// Evaluates this node against the given metadata.
    ///
    /// Pure: same inputs always produce the same output, and the metadata is
    /// never modified. Branch evaluation short-circuits, which does not
    /// change the result.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            FilterNode::Leaf { key, value } => metadata.values(key).is_some_and(|values| {
                values
                    .iter()
                    .any(|candidate| candidate.to_lowercase() == value.to_lowercase())
            }),
            FilterNode::Branch { op, children } => match op {
                FilterOp::And => children.iter().all(|child| child.matches(metadata)),
                FilterOp::Or => children.iter().any(|child| child.matches(metadata)),
            },
        }
    }
}

// Equality treats branch children as unordered collections: two trees are
// equal iff their operations match and their children match as multisets.
impl PartialEq for FilterNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                FilterNode::Leaf { key, value },
                FilterNode::Leaf {
                    key: other_key,
                    value: other_value,
                },
            ) => key == other_key && value == other_value,
            (
                FilterNode::Branch { op, children },
                FilterNode::Branch {
                    op: other_op,
                    children: other_children,
                },
            ) => op == other_op && unordered_eq(children, other_children),
            _ => false,
        }
    }
}

impl Eq for FilterNode {}

fn unordered_eq(left: &[FilterNode], right: &[FilterNode]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut unmatched: Vec<&FilterNode> = right.iter().collect();
    for node in left {
        match unmatched.iter().position(|candidate| *candidate == node) {
            Some(position) => {
                unmatched.swap_remove(position);
            }
            None => return false,
        }
    }
    true
}

/// Top-level rule tree plus the "no rule configured" state.
///
/// An empty tree bypasses evaluation entirely and admits every item. This is
/// distinct from a configured branch with zero children, which evaluates
/// under the vacuous identity of its operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTree {
    root: Option<FilterNode>,
}

impl FilterTree {
    /// Creates a tree with no rule configured.
    pub fn empty() -> Self {
        Self { root: None }
    }

    /// Creates a tree from a root node.
    pub fn new(root: FilterNode) -> Self {
        Self { root: Some(root) }
    }

    /// True when no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the root node, if a rule is configured.
    pub fn root(&self) -> Option<&FilterNode> {
        self.root.as_ref()
    }

    /// Decides whether an item with the given metadata is rejected.
    ///
    /// The tree encodes disqualifying conditions: a match means rejection.
    /// Items with empty metadata, and any item when no rule is configured,
    /// are always admitted without evaluating the tree.
    pub fn rejects(&self, metadata: &Metadata) -> bool {
        if metadata.is_empty() {
            return false;
        }
        match &self.root {
            Some(root) => root.matches(metadata),
            None => false,
        }
    }
}
