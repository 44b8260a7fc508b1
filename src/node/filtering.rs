//! Applying node filters to the tree.
//!
//! A class-like node is kept if it matches the filters itself or if any of
//! its descendants is kept. A package is kept only through its descendants,
//! its own name never keeps it. Fold state is left untouched: a folded node
//! that loses all descendants becomes a current leaf and gets its old
//! children back once the filter relaxes.

use super::{Node, NodeId, NodeTree};
use log::debug;
use std::collections::HashSet;

impl NodeTree {
    /// Which nodes survive a filter, indexed by `NodeId::index`.
    ///
    /// `own_match` tells whether a class-like node matches by itself.
    pub fn evaluate_filter(&self, own_match: impl Fn(&Node) -> bool) -> Vec<bool> {
        let mut kept = vec![false; self.nodes.len()];
        // Children always have a greater index than their parent
        for node in self.nodes.iter().rev() {
            let has_kept_child = node.original_children.iter().any(|c| kept[c.0]);
            kept[node.id.0] = if node.is_root() {
                true
            } else if node.is_package() {
                has_kept_child
            } else {
                has_kept_child || own_match(node)
            };
        }
        kept
    }

    /// Recompute the filtered children of every node.
    pub fn apply_filters(&mut self, own_match: impl Fn(&Node) -> bool) {
        let kept = self.evaluate_filter(own_match);
        for node in self.nodes.iter_mut() {
            node.is_filtered_in = kept[node.id.0];
            node.filtered_children = node
                .original_children
                .iter()
                .copied()
                .filter(|c| kept[c.0])
                .collect();
        }
        debug!(
            "node filters applied, {} of {} nodes kept",
            kept.iter().filter(|k| **k).count(),
            kept.len()
        );
    }

    /// Full names of the nodes (root excluded) surviving a filter
    pub fn names_kept_by(&self, own_match: impl Fn(&Node) -> bool) -> HashSet<String> {
        let kept = self.evaluate_filter(own_match);
        self.nodes
            .iter()
            .filter(|n| !n.is_root() && kept[n.id.0])
            .map(|n| n.full_name.clone())
            .collect()
    }

    /// Full names of all nodes currently filtered in (root excluded)
    pub fn filtered_in_names(&self) -> HashSet<String> {
        self.nodes
            .iter()
            .filter(|n| !n.is_root() && n.is_filtered_in)
            .map(|n| n.full_name.clone())
            .collect()
    }

    pub fn is_filtered_in(&self, id: NodeId) -> bool {
        self.get(id).is_filtered_in
    }
}

#[cfg(test)]
mod tests {
    use crate::node::tests::{sample_tree, tree_of};
    use crate::types::NodeKind;

    #[test]
    fn test_package_kept_only_through_descendants() {
        let mut tree = sample_tree();
        tree.apply_filters(|n| n.full_name().ends_with("SomeInnerClass"));

        let company = tree.require("my.company").unwrap();
        let some_class = tree.require("my.company.SomeClass").unwrap();
        assert!(tree.is_filtered_in(company));
        assert!(tree.is_filtered_in(some_class));
        assert_eq!(tree.get(company).filtered_children(), &[some_class]);
    }

    #[test]
    fn test_package_without_matching_descendants_is_removed() {
        let mut tree = tree_of(&[
            ("a", "package"),
            ("a.Foo", "class"),
            ("b", "package"),
            ("b.Bar", "class"),
        ]);
        // "b" matches by its own name, but nothing inside it does
        tree.apply_filters(|n| n.full_name() == "b" || n.full_name() == "a.Foo");
        let a = tree.require("a").unwrap();
        let b = tree.require("b").unwrap();
        assert!(tree.is_filtered_in(a));
        assert!(!tree.is_filtered_in(b));
        assert_eq!(tree.root().filtered_children(), &[a]);
    }

    #[test]
    fn test_filtered_out_folded_node_keeps_fold_state() {
        let mut tree = sample_tree();
        let some_class = tree.require("my.company.SomeClass").unwrap();
        tree.fold(some_class);
        tree.apply_filters(|n| !n.full_name().contains("Inner"));

        assert!(tree.get(some_class).is_folded());
        assert!(tree.get(some_class).is_currently_leaf());
        assert!(!tree.unfold(some_class));

        tree.apply_filters(|_| true);
        assert!(tree.get(some_class).is_folded());
        assert!(tree.unfold(some_class));
        assert_eq!(tree.get(some_class).current_children().len(), 1);
    }

    #[test]
    fn test_interfaces_filtered_by_kind() {
        let tree = sample_tree();
        let kept = tree.names_kept_by(|n| n.kind() != NodeKind::Interface);
        assert!(!kept.contains("my.company.SomeInterface"));
        assert!(kept.contains("my.company.OtherClass"));
        assert!(kept.contains("my"));
    }
}
