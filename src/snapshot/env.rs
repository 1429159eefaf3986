//! Environment tree of one snapshot
//!
//! Environments arrive as a flat list with parent links. [`EnvTree`] validates
//! the links (unknown parents, duplicates, cycles) and groups the nodes into
//! levels by depth, each level sorted by creation order.

use super::raw::RawValue;
use crate::error::LayoutError;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;

/// Creation-ordered environment identifier
///
/// Ids produced by the evaluator are counters rendered as strings. Two ids
/// that are both numeric compare numerically, anything else compares as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct EnvId(pub String);

impl EnvId {
    pub fn new(id: impl Into<String>) -> Self {
        EnvId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for EnvId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            _ => self
                .0
                .len()
                .cmp(&other.0.len())
                .then_with(|| self.0.cmp(&other.0)),
        }
    }
}

impl PartialOrd for EnvId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name/value pair as emitted by the evaluator
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawBinding {
    pub name: String,
    pub value: RawValue,
}

/// One environment (frame) of the machine
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvNode {
    pub id: EnvId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<EnvId>,
    #[serde(default)]
    pub bindings: Vec<RawBinding>,
}

impl EnvNode {
    pub fn new(id: &str, name: &str, parent: Option<&str>) -> Self {
        EnvNode {
            id: EnvId::new(id),
            name: name.to_string(),
            parent: parent.map(EnvId::new),
            bindings: Vec::new(),
        }
    }

    /// Builder used by tests and demos
    pub fn bind(mut self, name: &str, value: RawValue) -> Self {
        self.bindings.push(RawBinding {
            name: name.to_string(),
            value,
        });
        self
    }

    /// Label drawn above the frame
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// Validated environment tree
#[derive(Debug, Clone)]
pub struct EnvTree {
    nodes: Vec<EnvNode>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depths: Vec<usize>,
    index: FxHashMap<EnvId, usize>,
}

impl EnvTree {
    pub fn new(nodes: Vec<EnvNode>) -> Result<Self, LayoutError> {
        let mut index = FxHashMap::default();
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(LayoutError::DuplicateEnvironment {
                    env: node.id.to_string(),
                });
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let parent = match &node.parent {
                Some(parent_id) => Some(*index.get(parent_id).ok_or_else(|| {
                    LayoutError::UnknownParent {
                        env: node.id.to_string(),
                        parent: parent_id.to_string(),
                    }
                })?),
                None => None,
            };
            parents.push(parent);
        }

        // Depth by bounded pointer chase; a chain longer than the node count
        // can only be a cycle.
        let mut depths = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let mut depth = 0;
            let mut cursor = parents[i];
            while let Some(p) = cursor {
                depth += 1;
                if depth > nodes.len() {
                    return Err(LayoutError::CyclicEnvironment {
                        env: node.id.to_string(),
                    });
                }
                cursor = parents[p];
            }
            depths.push(depth);
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by(|&a, &b| nodes[a].id.cmp(&nodes[b].id));
        for &i in &order {
            if let Some(p) = parents[i] {
                children[p].push(i);
            }
        }

        Ok(EnvTree {
            nodes,
            parents,
            children,
            depths,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &EnvNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[EnvNode] {
        &self.nodes
    }

    pub fn index_of(&self, id: &EnvId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }

    /// Children in creation order
    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    pub fn depth(&self, index: usize) -> usize {
        self.depths[index]
    }

    /// Node indices grouped by depth, each level in creation order
    pub fn levels(&self) -> Vec<Vec<usize>> {
        let max_depth = self.depths.iter().copied().max().map_or(0, |d| d + 1);
        let mut levels = vec![Vec::new(); max_depth];
        for (i, &depth) in self.depths.iter().enumerate() {
            levels[depth].push(i);
        }
        for level in &mut levels {
            level.sort_by(|&a, &b| self.nodes[a].id.cmp(&self.nodes[b].id));
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_compare_numerically() {
        assert!(EnvId::new("9") < EnvId::new("10"));
        assert!(EnvId::new("b") < EnvId::new("aa"));
    }

    #[test]
    fn test_ordering_agrees_with_equality() {
        let padded = EnvId::new("010");
        let plain = EnvId::new("10");
        assert_ne!(padded, plain);
        assert_ne!(padded.cmp(&plain), Ordering::Equal);
        assert!(EnvId::new("9") < padded);

        let keys: std::collections::BTreeSet<EnvId> = [padded, plain].into_iter().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_levels_sorted_by_creation() {
        let tree = EnvTree::new(vec![
            EnvNode::new("0", "global", None),
            EnvNode::new("12", "g", Some("0")),
            EnvNode::new("3", "f", Some("0")),
        ])
        .unwrap();
        let levels = tree.levels();
        assert_eq!(levels.len(), 2);
        let names: Vec<&str> = levels[1].iter().map(|&i| tree.node(i).label()).collect();
        assert_eq!(names, vec!["f", "g"]);
        assert_eq!(tree.children(0), &[2, 1]);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let err = EnvTree::new(vec![EnvNode::new("1", "f", Some("0"))]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownParent {
                env: "1".to_string(),
                parent: "0".to_string()
            }
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = EnvTree::new(vec![
            EnvNode::new("1", "a", Some("2")),
            EnvNode::new("2", "b", Some("1")),
        ])
        .unwrap_err();
        assert!(matches!(err, LayoutError::CyclicEnvironment { .. }));
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let err = EnvTree::new(vec![
            EnvNode::new("1", "a", None),
            EnvNode::new("1", "b", None),
        ])
        .unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateEnvironment { .. }));
    }
}
