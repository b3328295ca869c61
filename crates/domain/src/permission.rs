//! Permission trees and the merge rules applied across roles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use silat_core::{AppError, AppResult};

/// Root-level key that short-circuits a merged tree to all permissions.
pub const ALL_ACCESS_KEY: &str = "all_access";

/// One node of a permission tree.
///
/// Mirrors the dynamically-shaped permission objects of the association
/// platform: boolean leaves grant or deny an action, numeric leaves carry a
/// ceiling (for example a payment-approval limit), groups nest further nodes
/// under dotted path segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionNode {
    /// Boolean grant leaf.
    Grant(bool),
    /// Numeric ceiling leaf.
    Limit(i64),
    /// Nested group of named nodes.
    Group(BTreeMap<String, PermissionNode>),
}

impl PermissionNode {
    /// Merges two nodes into the most permissive combination.
    ///
    /// Boolean leaves combine with OR, numeric leaves with MAX and groups
    /// key-wise. A falsy leaf (`false` or `0`) is the identity element; a
    /// truthy leaf merged with a node of another shape grants the whole
    /// subtree. The operation is commutative and associative.
    #[must_use]
    pub fn merge(self, other: PermissionNode) -> PermissionNode {
        match (self, other) {
            (PermissionNode::Grant(left), PermissionNode::Grant(right)) => {
                PermissionNode::Grant(left || right)
            }
            (PermissionNode::Limit(left), PermissionNode::Limit(right)) => {
                PermissionNode::Limit(left.max(right))
            }
            (PermissionNode::Group(left), PermissionNode::Group(right)) => {
                let mut merged = left;
                for (key, node) in right {
                    let combined = match merged.remove(&key) {
                        Some(existing) => existing.merge(node),
                        None => node,
                    };
                    merged.insert(key, combined);
                }
                PermissionNode::Group(merged)
            }
            (left, right) => {
                if left.is_falsy_leaf() {
                    right
                } else if right.is_falsy_leaf() {
                    left
                } else {
                    PermissionNode::Grant(true)
                }
            }
        }
    }

    /// Returns whether a leaf grants access on its own.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            PermissionNode::Grant(granted) => *granted,
            PermissionNode::Limit(ceiling) => *ceiling != 0,
            PermissionNode::Group(_) => false,
        }
    }

    fn is_falsy_leaf(&self) -> bool {
        matches!(
            self,
            PermissionNode::Grant(false) | PermissionNode::Limit(0)
        )
    }
}

/// A role's permission tree, keyed by dotted path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTree(BTreeMap<String, PermissionNode>);

impl PermissionTree {
    /// Creates an empty tree granting nothing.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parses a tree from the JSON shape stored by the platform.
    pub fn from_value(value: Value) -> AppResult<Self> {
        serde_json::from_value(value).map_err(|error| {
            AppError::Validation(format!("permission tree has an invalid shape: {error}"))
        })
    }

    /// Returns the stored JSON shape of the tree.
    pub fn to_value(&self) -> AppResult<Value> {
        serde_json::to_value(self).map_err(|error| {
            AppError::Internal(format!("failed to serialize permission tree: {error}"))
        })
    }

    /// Inserts a node under a root key.
    pub fn insert(&mut self, key: impl Into<String>, node: PermissionNode) {
        self.0.insert(key.into(), node);
    }

    /// Merges another tree into this one, most permissive leaf winning.
    #[must_use]
    pub fn merge(self, other: PermissionTree) -> PermissionTree {
        match PermissionNode::Group(self.0).merge(PermissionNode::Group(other.0)) {
            PermissionNode::Group(merged) => PermissionTree(merged),
            // Root nodes are groups, so the merge of two groups stays a group.
            _ => PermissionTree::new(),
        }
    }

    /// Returns whether the tree grants every permission outright.
    #[must_use]
    pub fn grants_all_access(&self) -> bool {
        self.0
            .get(ALL_ACCESS_KEY)
            .map(PermissionNode::is_truthy)
            .unwrap_or(false)
    }

    /// Tests truthiness at a dotted path.
    ///
    /// A truthy `all_access` root leaf grants every path. A truthy leaf
    /// reached before the path is exhausted grants the remaining subtree.
    /// Absent paths and group nodes are `false`, never an error.
    #[must_use]
    pub fn is_granted(&self, path: &str) -> bool {
        if self.grants_all_access() {
            return true;
        }

        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return false;
        };

        let mut node = match self.0.get(first) {
            Some(node) => node,
            None => return false,
        };

        for segment in segments {
            match node {
                PermissionNode::Group(children) => match children.get(segment) {
                    Some(child) => node = child,
                    None => return false,
                },
                leaf => return leaf.is_truthy(),
            }
        }

        node.is_truthy()
    }

    /// Returns whether the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::{PermissionNode, PermissionTree};

    fn tree(value: serde_json::Value) -> PermissionTree {
        PermissionTree::from_value(value).unwrap_or_default()
    }

    #[test]
    fn parses_nested_json_shapes() {
        let parsed = PermissionTree::from_value(json!({
            "members": { "view": true, "edit": false },
            "payments": { "approve_limit": 5000 },
        }));
        assert!(parsed.is_ok());
    }

    #[test]
    fn rejects_non_integer_numeric_leaves() {
        let parsed = PermissionTree::from_value(json!({ "payments": { "approve_limit": 0.5 } }));
        assert!(parsed.is_err());
    }

    #[test]
    fn boolean_leaves_merge_with_or() {
        let merged = tree(json!({ "members": { "view": true, "edit": false } }))
            .merge(tree(json!({ "members": { "edit": true } })));

        assert!(merged.is_granted("members.view"));
        assert!(merged.is_granted("members.edit"));
    }

    #[test]
    fn numeric_leaves_merge_with_max() {
        let merged = tree(json!({ "payments": { "approve_limit": 1000 } }))
            .merge(tree(json!({ "payments": { "approve_limit": 5000 } })));

        assert_eq!(
            merged,
            tree(json!({ "payments": { "approve_limit": 5000 } }))
        );
    }

    #[test]
    fn all_access_grants_every_path() {
        let merged = tree(json!({ "all_access": true }))
            .merge(tree(json!({ "members": { "view": false } })));

        assert!(merged.is_granted("members.view"));
        assert!(merged.is_granted("events.publish.anything"));
    }

    #[test]
    fn absent_paths_are_false() {
        let permissions = tree(json!({ "members": { "view": true } }));

        assert!(!permissions.is_granted("members.edit"));
        assert!(!permissions.is_granted("payments"));
        assert!(!permissions.is_granted("members.view.extra.deep"));
    }

    #[test]
    fn truthy_ancestor_grants_subtree() {
        let permissions = tree(json!({ "members": true }));
        assert!(permissions.is_granted("members.view"));
    }

    #[test]
    fn group_nodes_are_not_grants() {
        let permissions = tree(json!({ "members": { "view": true } }));
        assert!(!permissions.is_granted("members"));
    }

    #[test]
    fn zero_limits_do_not_grant() {
        let permissions = tree(json!({ "payments": { "approve_limit": 0 } }));
        assert!(!permissions.is_granted("payments.approve_limit"));
    }

    fn node_strategy() -> impl Strategy<Value = PermissionNode> {
        let leaf = prop_oneof![
            any::<bool>().prop_map(PermissionNode::Grant),
            (0i64..10_000).prop_map(PermissionNode::Limit),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            proptest::collection::btree_map("[a-d]{1,3}", inner, 0..4).prop_map(PermissionNode::Group)
        })
    }

    fn tree_strategy() -> impl Strategy<Value = PermissionTree> {
        proptest::collection::btree_map("[a-d]{1,3}", node_strategy(), 0..4).prop_map(|nodes| {
            let mut tree = PermissionTree::new();
            for (key, node) in nodes {
                tree.insert(key, node);
            }
            tree
        })
    }

    proptest! {
        #[test]
        fn merge_is_commutative(left in tree_strategy(), right in tree_strategy()) {
            prop_assert_eq!(left.clone().merge(right.clone()), right.merge(left));
        }

        #[test]
        fn merge_is_associative(
            first in tree_strategy(),
            second in tree_strategy(),
            third in tree_strategy(),
        ) {
            let grouped_left = first.clone().merge(second.clone()).merge(third.clone());
            let grouped_right = first.merge(second.merge(third));
            prop_assert_eq!(grouped_left, grouped_right);
        }

        #[test]
        fn merge_is_idempotent(permissions in tree_strategy()) {
            prop_assert_eq!(permissions.clone().merge(permissions.clone()), permissions);
        }

        #[test]
        fn merge_never_revokes(left in tree_strategy(), right in tree_strategy(), path in "[a-d]{1,3}") {
            let granted_before = left.is_granted(path.as_str());
            let merged = left.merge(right);
            prop_assert!(!granted_before || merged.is_granted(path.as_str()));
        }
    }
}
