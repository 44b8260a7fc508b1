//! The node tree: packages, classes and their fold, filter and layout state.
//!
//! Nodes live in an arena indexed by [`NodeId`]; the root is always
//! `NodeId::ROOT` and is its own parent so that upward traversals need no
//! special case. The set of children of a node comes in three flavours:
//!
//! - original children: fixed at construction,
//! - filtered children: the original children that pass the node filters,
//! - current children: the filtered children, or nothing if the node is folded.

mod filtering;
mod placement;

use crate::events::GraphEvent;
use crate::geometry::{Circle, Vector};
use crate::types::{JsonNode, NodeKind};
use log::{debug, trace};
use std::collections::HashMap;

/// Index of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A package or class of the analyzed code base
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    full_name: String,
    kind: NodeKind,
    parent: NodeId,
    original_children: Vec<NodeId>,
    filtered_children: Vec<NodeId>,
    is_folded: bool,
    is_filtered_in: bool,
    /// Centre relative to the parent's centre, plus radius
    circle: Circle,
    absolute_center: Vector,
    label_offset: f64,
    label_on_rim: bool,
    z_index: u64,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }

    pub fn is_package(&self) -> bool {
        self.kind.is_package()
    }

    pub fn original_children(&self) -> &[NodeId] {
        &self.original_children
    }

    pub fn filtered_children(&self) -> &[NodeId] {
        &self.filtered_children
    }

    /// Filtered children, or none if folded
    pub fn current_children(&self) -> &[NodeId] {
        if self.is_folded {
            &[]
        } else {
            &self.filtered_children
        }
    }

    /// A node without any original children; can never be folded
    pub fn is_leaf(&self) -> bool {
        self.original_children.is_empty()
    }

    /// Nothing visible inside, because it is folded or everything is filtered out
    pub fn is_currently_leaf(&self) -> bool {
        self.current_children().is_empty()
    }

    pub fn is_folded(&self) -> bool {
        self.is_folded
    }

    /// Whether the node passes the node filters (itself or via descendants)
    pub fn is_filtered_in(&self) -> bool {
        self.is_filtered_in
    }

    /// Circle relative to the parent's centre
    pub fn relative_circle(&self) -> Circle {
        self.circle
    }

    pub fn radius(&self) -> f64 {
        self.circle.r
    }

    pub fn absolute_center(&self) -> Vector {
        self.absolute_center
    }

    pub fn absolute_circle(&self) -> Circle {
        Circle::new(self.absolute_center, self.circle.r)
    }

    /// Vertical offset of the label baseline relative to the centre
    pub fn label_offset(&self) -> f64 {
        self.label_offset
    }

    pub fn z_index(&self) -> u64 {
        self.z_index
    }
}

/// Arena of all nodes of a report.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    by_full_name: HashMap<String, NodeId>,
    z_counter: u64,
    pending_events: Vec<GraphEvent>,
}

impl NodeTree {
    /// Build the tree from the report's JSON node; the top-level node becomes the root.
    pub fn from_json(root: &JsonNode) -> Self {
        let mut tree = NodeTree {
            nodes: Vec::new(),
            by_full_name: HashMap::new(),
            z_counter: 0,
            pending_events: Vec::new(),
        };
        tree.add_node(root, NodeId::ROOT, true);
        tree.z_counter = tree.nodes.len() as u64;
        debug!("built node tree with {} nodes", tree.nodes.len());
        tree
    }

    fn add_node(&mut self, json: &JsonNode, parent: NodeId, is_root: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        let kind = if is_root {
            NodeKind::Root
        } else {
            NodeKind::from_json_type(&json.node_type)
        };
        self.nodes.push(Node {
            id,
            name: json.name.clone(),
            full_name: json.full_name.clone(),
            kind,
            parent: if is_root { id } else { parent },
            original_children: Vec::new(),
            filtered_children: Vec::new(),
            is_folded: false,
            is_filtered_in: true,
            circle: Circle::default(),
            absolute_center: Vector::ZERO,
            label_offset: 0.0,
            label_on_rim: false,
            z_index: id.0 as u64,
        });
        if !is_root {
            self.by_full_name.insert(json.full_name.clone(), id);
        }

        let children: Vec<NodeId> = json
            .children
            .iter()
            .map(|child| self.add_node(child, id, false))
            .collect();
        let node = &mut self.nodes[id.0];
        node.filtered_children = children.clone();
        node.original_children = children;
        id
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order (parents before children), root first
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn find(&self, full_name: &str) -> Option<NodeId> {
        self.by_full_name.get(full_name).copied()
    }

    pub fn require(&self, full_name: &str) -> Result<NodeId, String> {
        self.find(full_name)
            .ok_or_else(|| format!("unknown node '{}'", full_name))
    }

    /// Events queued by mutations since the last call
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub(crate) fn push_event(&mut self, event: GraphEvent) {
        self.pending_events.push(event);
    }

    // ========================================================================
    // Ancestry
    // ========================================================================

    /// The node itself followed by all of its ancestors up to and including the root
    pub fn self_and_predecessors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while current != NodeId::ROOT {
            current = self.get(current).parent;
            chain.push(current);
        }
        chain
    }

    /// The node and its ancestors up to, but excluding, `until`.
    ///
    /// Fails if `until` is not an ancestor of `id`.
    pub fn self_and_predecessors_until_exclusively(
        &self,
        id: NodeId,
        until: NodeId,
    ) -> Result<Vec<NodeId>, String> {
        let chain = self.self_and_predecessors(id);
        match chain.iter().position(|&n| n == until) {
            Some(position) if position > 0 => Ok(chain[..position].to_vec()),
            _ => Err(format!(
                "'{}' is not a predecessor of '{}'",
                self.get(until).full_name,
                self.get(id).full_name
            )),
        }
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        id != ancestor && self.self_and_predecessors(id).contains(&ancestor)
    }

    /// All descendants of a node (original children, recursively), pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.get(id).original_children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.get(current).original_children.iter().rev().copied());
        }
        result
    }

    /// Nodes that are currently drawn: reachable from the root via current children
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.root().current_children().iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.get(current).current_children().iter().rev().copied());
        }
        result
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        id == NodeId::ROOT
            || self
                .self_and_predecessors(id)
                .windows(2)
                .all(|pair| self.get(pair[1]).current_children().contains(&pair[0]))
    }

    /// Visible nodes without visible children
    pub fn current_leaves(&self) -> Vec<NodeId> {
        self.visible_nodes()
            .into_iter()
            .filter(|&id| self.get(id).is_currently_leaf())
            .collect()
    }

    /// The visible node that represents `id`: the node itself if visible,
    /// otherwise its outermost folded ancestor.
    pub fn visible_representative(&self, id: NodeId) -> NodeId {
        let chain = self.self_and_predecessors(id);
        chain
            .iter()
            .rev()
            .copied()
            .find(|&n| n != NodeId::ROOT && self.get(n).is_folded)
            .unwrap_or(id)
    }

    // ========================================================================
    // Folding
    // ========================================================================

    /// Fold an inner node. Folding a leaf or an already folded node does nothing.
    ///
    /// Returns whether the fold state changed.
    pub fn fold(&mut self, id: NodeId) -> bool {
        let node = self.get(id);
        if node.is_root() || node.is_leaf() || node.is_folded {
            return false;
        }
        self.get_mut(id).is_folded = true;
        trace!("folded {}", self.get(id).full_name);
        let full_name = self.get(id).full_name.clone();
        self.push_event(GraphEvent::Fold {
            node: full_name,
            folded: true,
        });
        true
    }

    /// Unfold a folded node. Nodes whose descendants are all filtered out stay
    /// folded until the filter relaxes.
    pub fn unfold(&mut self, id: NodeId) -> bool {
        let node = self.get(id);
        if !node.is_folded || node.filtered_children.is_empty() {
            return false;
        }
        self.get_mut(id).is_folded = false;
        trace!("unfolded {}", self.get(id).full_name);
        let full_name = self.get(id).full_name.clone();
        self.push_event(GraphEvent::Fold {
            node: full_name,
            folded: false,
        });
        true
    }

    pub fn toggle_fold(&mut self, id: NodeId) -> bool {
        if self.get(id).is_folded {
            self.unfold(id)
        } else {
            self.fold(id)
        }
    }

    /// Fold every inner node; only the per-node fold events are queued.
    pub fn fold_all(&mut self) -> Vec<NodeId> {
        let ids: Vec<NodeId> = (1..self.nodes.len()).map(NodeId).collect();
        ids.into_iter().filter(|&id| self.fold(id)).collect()
    }

    /// Fold while loading; queues `InitialFold` instead of `Fold`.
    pub fn fold_initially(&mut self, id: NodeId) -> bool {
        if !self.fold(id) {
            return false;
        }
        self.pending_events.pop();
        let full_name = self.get(id).full_name.clone();
        self.push_event(GraphEvent::InitialFold { node: full_name });
        true
    }

    /// Full names of all folded nodes
    pub fn folded_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_folded)
            .map(|n| n.id)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a tree from `(full_name, type)` pairs; parents are derived from
    /// the longest matching name prefix and must be listed first.
    pub(crate) fn tree_of(entries: &[(&str, &str)]) -> NodeTree {
        fn build(prefix: Option<&str>, entries: &[(&str, &str)]) -> Vec<JsonNode> {
            entries
                .iter()
                .filter(|(name, _)| parent_of(name, entries) == prefix)
                .map(|(name, node_type)| JsonNode {
                    name: simple_name(name).to_string(),
                    full_name: name.to_string(),
                    node_type: node_type.to_string(),
                    children: build(Some(*name), entries),
                })
                .collect()
        }
        fn parent_of<'a>(name: &str, entries: &[(&'a str, &str)]) -> Option<&'a str> {
            entries
                .iter()
                .map(|(candidate, _)| *candidate)
                .filter(|candidate| {
                    *candidate != name && crate::types::is_self_or_descendant_name(name, candidate)
                })
                .max_by_key(|candidate| candidate.len())
        }
        fn simple_name(name: &str) -> &str {
            name.rsplit(|c: char| c == '.' || c == '$').next().unwrap_or(name)
        }
        let root = JsonNode {
            name: "default".to_string(),
            full_name: "default".to_string(),
            node_type: "package".to_string(),
            children: build(None, entries),
        };
        NodeTree::from_json(&root)
    }

    pub(crate) fn sample_tree() -> NodeTree {
        tree_of(&[
            ("my", "package"),
            ("my.company", "package"),
            ("my.company.SomeClass", "class"),
            ("my.company.SomeClass$SomeInnerClass", "class"),
            ("my.company.OtherClass", "class"),
            ("my.company.SomeInterface", "interface"),
        ])
    }

    fn names(tree: &NodeTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| tree.get(id).full_name().to_string()).collect()
    }

    #[test]
    fn test_tree_structure() {
        let tree = sample_tree();
        let company = tree.require("my.company").unwrap();
        assert_eq!(tree.get(company).original_children().len(), 3);
        assert_eq!(tree.root().parent(), NodeId::ROOT);
        assert!(tree.require("nope").is_err());
    }

    #[test]
    fn test_fold_leaf_is_noop() {
        let mut tree = sample_tree();
        let leaf = tree.require("my.company.OtherClass").unwrap();
        assert!(!tree.fold(leaf));
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn test_unfold_unfolded_is_noop() {
        let mut tree = sample_tree();
        let company = tree.require("my.company").unwrap();
        assert!(!tree.unfold(company));
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn test_fold_unfold_round_trip() {
        let mut tree = sample_tree();
        let company = tree.require("my.company").unwrap();
        let before = tree.get(company).current_children().to_vec();
        assert!(tree.fold(company));
        assert!(tree.get(company).current_children().is_empty());
        assert!(tree.unfold(company));
        assert_eq!(tree.get(company).current_children(), before.as_slice());
        assert_eq!(
            tree.take_events(),
            vec![
                GraphEvent::Fold { node: "my.company".to_string(), folded: true },
                GraphEvent::Fold { node: "my.company".to_string(), folded: false },
            ]
        );
    }

    #[test]
    fn test_nested_fold_scenario() {
        let mut tree = sample_tree();
        let some_class = tree.require("my.company.SomeClass").unwrap();
        let company = tree.require("my.company").unwrap();

        tree.toggle_fold(some_class);
        let leaves = names(&tree, &tree.current_leaves());
        assert!(leaves.contains(&"my.company.SomeClass".to_string()));
        assert!(!leaves.contains(&"my.company.SomeClass$SomeInnerClass".to_string()));

        tree.toggle_fold(company);
        assert_eq!(names(&tree, &tree.current_leaves()), vec!["my.company"]);

        tree.toggle_fold(company);
        assert!(names(&tree, &tree.current_leaves()).contains(&"my.company.SomeClass".to_string()));
        assert!(tree.get(some_class).is_folded());
    }

    #[test]
    fn test_predecessors_until_exclusively() {
        let tree = sample_tree();
        let inner = tree.require("my.company.SomeClass$SomeInnerClass").unwrap();
        let my = tree.require("my").unwrap();
        let chain = tree.self_and_predecessors_until_exclusively(inner, my).unwrap();
        assert_eq!(
            names(&tree, &chain),
            vec!["my.company.SomeClass$SomeInnerClass", "my.company.SomeClass", "my.company"]
        );
        let other = tree.require("my.company.OtherClass").unwrap();
        assert!(tree.self_and_predecessors_until_exclusively(inner, other).is_err());
        assert!(tree.self_and_predecessors_until_exclusively(inner, inner).is_err());
    }

    #[test]
    fn test_visible_representative() {
        let mut tree = sample_tree();
        let inner = tree.require("my.company.SomeClass$SomeInnerClass").unwrap();
        let some_class = tree.require("my.company.SomeClass").unwrap();
        let company = tree.require("my.company").unwrap();
        assert_eq!(tree.visible_representative(inner), inner);
        tree.fold(some_class);
        assert_eq!(tree.visible_representative(inner), some_class);
        tree.fold(company);
        assert_eq!(tree.visible_representative(inner), company);
        assert!(!tree.is_visible(inner));
        assert!(tree.is_visible(company));
    }

    #[test]
    fn test_fold_all_and_initial_fold() {
        let mut tree = sample_tree();
        let folded = tree.fold_all();
        assert_eq!(names(&tree, &folded), vec!["my", "my.company", "my.company.SomeClass"]);
        assert_eq!(tree.take_events().len(), 3);

        let mut tree = sample_tree();
        let company = tree.require("my.company").unwrap();
        assert!(tree.fold_initially(company));
        assert_eq!(
            tree.take_events(),
            vec![GraphEvent::InitialFold { node: "my.company".to_string() }]
        );
    }
}
