//! Fold transformers: moving dependency ends onto folded nodes.

use super::DependencyBase;
use crate::node::{NodeId, NodeTree};
use crate::types::is_self_or_descendant_name;
use log::trace;

/// The folded nodes whose transformer has to run for `dependencies`.
///
/// A folded node is a candidate if an end of one of the dependencies lies
/// strictly inside it. Candidates are taken shortest name first and dropped if
/// they lie within an already selected one, so a folded node within another
/// folded node never contributes a transformer of its own.
pub fn select_fold_transformers(tree: &NodeTree, dependencies: &[DependencyBase]) -> Vec<NodeId> {
    let mut candidates: Vec<NodeId> = tree
        .folded_nodes()
        .into_iter()
        .filter(|&id| {
            let name = tree.get(id).full_name();
            dependencies.iter().any(|d| {
                is_strict_descendant_name(&d.from, name) || is_strict_descendant_name(&d.to, name)
            })
        })
        .collect();
    candidates.sort_by_key(|&id| tree.get(id).full_name().len());

    let mut selected: Vec<NodeId> = Vec::new();
    for candidate in candidates {
        let name = tree.get(candidate).full_name();
        let absorbed = selected
            .iter()
            .any(|&kept| is_self_or_descendant_name(name, tree.get(kept).full_name()));
        if !absorbed {
            selected.push(candidate);
        }
    }
    selected
}

fn is_strict_descendant_name(name: &str, ancestor: &str) -> bool {
    name != ancestor && is_self_or_descendant_name(name, ancestor)
}

/// Move every end inside `folded_name` onto the folded node itself.
///
/// The origin pass keeps everything. The target pass drops the dependencies it
/// turns into self-references; a dependency that was a self-reference before
/// the target pass and is not touched by it stays.
pub fn apply_fold_transformer(dependencies: Vec<DependencyBase>, folded_name: &str) -> Vec<DependencyBase> {
    let origin_folded = dependencies.into_iter().map(|mut d| {
        if is_self_or_descendant_name(&d.from, folded_name) {
            d.from = folded_name.to_string();
        }
        d
    });

    origin_folded
        .filter_map(|mut d| {
            if !is_self_or_descendant_name(&d.to, folded_name) {
                return Some(d);
            }
            d.to = folded_name.to_string();
            if d.from == d.to {
                trace!("dropping self dependency of folded node {}", folded_name);
                None
            } else {
                Some(d)
            }
        })
        .collect()
}

/// Run all selected transformers, in order.
pub fn apply_fold_transformers(
    tree: &NodeTree,
    transformers: &[NodeId],
    dependencies: Vec<DependencyBase>,
) -> Vec<DependencyBase> {
    transformers.iter().fold(dependencies, |deps, &id| {
        apply_fold_transformer(deps, tree.get(id).full_name())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::sample_tree;

    fn dep(from: &str, to: &str) -> DependencyBase {
        DependencyBase::new(from, to, "METHOD_CALL")
    }

    fn pairs(dependencies: &[DependencyBase]) -> Vec<(String, String)> {
        dependencies
            .iter()
            .map(|d| (d.from.clone(), d.to.clone()))
            .collect()
    }

    #[test]
    fn test_origin_is_shifted_to_folded_package() {
        let result = apply_fold_transformer(vec![dep("p.A", "q.B")], "p");
        assert_eq!(pairs(&result), vec![("p".to_string(), "q.B".to_string())]);
    }

    #[test]
    fn test_target_is_shifted_to_folded_class() {
        let result = apply_fold_transformer(vec![dep("q.B", "p.A$Inner")], "p.A");
        assert_eq!(pairs(&result), vec![("q.B".to_string(), "p.A".to_string())]);
    }

    #[test]
    fn test_dependencies_within_folded_node_disappear() {
        let result = apply_fold_transformer(vec![dep("p.A", "p.B"), dep("p.A", "q.C")], "p");
        assert_eq!(pairs(&result), vec![("p".to_string(), "q.C".to_string())]);
    }

    #[test]
    fn test_untouched_dependencies_pass_through() {
        let result = apply_fold_transformer(vec![dep("pX.A", "q.B")], "p");
        assert_eq!(pairs(&result), vec![("pX.A".to_string(), "q.B".to_string())]);
    }

    #[test]
    fn test_nested_folded_node_is_absorbed() {
        let mut tree = sample_tree();
        let class = tree.find("my.company.SomeClass").unwrap();
        let company = tree.find("my.company").unwrap();
        tree.fold(class);
        tree.fold(company);
        let deps = vec![dep("my.company.SomeClass$SomeInnerClass", "my.company.OtherClass")];

        let transformers = select_fold_transformers(&tree, &deps);
        assert_eq!(transformers, vec![company]);
        assert!(apply_fold_transformers(&tree, &transformers, deps).is_empty());
    }

    #[test]
    fn test_folded_node_without_dependencies_is_not_selected() {
        let mut tree = sample_tree();
        let class = tree.find("my.company.SomeClass").unwrap();
        tree.fold(class);
        let deps = vec![dep("my.company.OtherClass", "my.company.SomeInterface")];
        assert!(select_fold_transformers(&tree, &deps).is_empty());
    }
}
