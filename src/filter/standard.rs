//! The filters of a graph and the state they read.

use super::FilterGroup;
use crate::dependency::ElementaryDependency;
use crate::node::Node;
use crate::types::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Predicate over full names, e.g. a compiled [`super::pattern::NamePattern`]
pub type NamePredicate = Box<dyn Fn(&str) -> bool>;

/// What the node filters read
pub struct NodeFilterContext {
    pub name_predicate: NamePredicate,
    pub show_interfaces: bool,
    pub show_classes: bool,
    pub only_violations: bool,
    /// Classes that are an end of a visible violation
    pub violating_nodes: HashSet<String>,
}

impl Default for NodeFilterContext {
    fn default() -> Self {
        Self {
            name_predicate: Box::new(|_| true),
            show_interfaces: true,
            show_classes: true,
            only_violations: false,
            violating_nodes: HashSet::new(),
        }
    }
}

impl std::fmt::Debug for NodeFilterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFilterContext")
            .field("show_interfaces", &self.show_interfaces)
            .field("show_classes", &self.show_classes)
            .field("only_violations", &self.only_violations)
            .field("violating_nodes", &self.violating_nodes.len())
            .finish()
    }
}

/// Which dependency types are shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeFilterConfig {
    /// Types mapped to `false` are hidden, all others are shown
    pub types: BTreeMap<String, bool>,
    pub show_dependencies_between_class_and_its_inner_classes: bool,
}

impl Default for TypeFilterConfig {
    fn default() -> Self {
        Self {
            types: BTreeMap::new(),
            show_dependencies_between_class_and_its_inner_classes: true,
        }
    }
}

impl TypeFilterConfig {
    pub fn matches(&self, dependency: &ElementaryDependency) -> bool {
        if self.types.get(dependency.dependency_type()) == Some(&false) {
            return false;
        }
        self.show_dependencies_between_class_and_its_inner_classes
            || !is_class_and_inner_class(dependency.from(), dependency.to())
    }
}

fn is_class_and_inner_class(a: &str, b: &str) -> bool {
    let nested = |outer: &str, inner: &str| {
        inner
            .strip_prefix(outer)
            .map(|rest| rest.starts_with('$'))
            .unwrap_or(false)
    };
    nested(a, b) || nested(b, a)
}

/// What the dependency filters read
#[derive(Debug, Clone, Default)]
pub struct DependencyFilterContext {
    pub type_filter: TypeFilterConfig,
    /// Nodes passing the node type and name filters
    pub type_and_name_nodes: HashSet<String>,
    pub only_violations: bool,
    /// Nodes passing all node filters
    pub visible_nodes: HashSet<String>,
}

pub fn node_filters() -> FilterGroup<Node, NodeFilterContext> {
    FilterGroup::builder("nodes")
        .add_static_filter("type", |node: &Node, c: &NodeFilterContext| match node.kind() {
            NodeKind::Interface => c.show_interfaces,
            NodeKind::Class => c.show_classes,
            NodeKind::Root | NodeKind::Package => true,
        })
        .add_dynamic_filter("name", |node: &Node, c: &NodeFilterContext| (c.name_predicate)(node.full_name()), &[])
        .add_dynamic_filter(
            "violations",
            |node: &Node, c: &NodeFilterContext| !c.only_violations || c.violating_nodes.contains(node.full_name()),
            &["dependencies.type", "dependencies.nodeTypeAndName", "dependencies.violations"],
        )
        .build()
}

pub fn dependency_filters() -> FilterGroup<ElementaryDependency, DependencyFilterContext> {
    FilterGroup::builder("dependencies")
        .add_static_filter("type", |d: &ElementaryDependency, c: &DependencyFilterContext| {
            c.type_filter.matches(d)
        })
        .add_dynamic_filter(
            "nodeTypeAndName",
            |d: &ElementaryDependency, c: &DependencyFilterContext| {
                c.type_and_name_nodes.contains(d.from()) && c.type_and_name_nodes.contains(d.to())
            },
            &["nodes.type", "nodes.name"],
        )
        .add_dynamic_filter(
            "violations",
            |d: &ElementaryDependency, c: &DependencyFilterContext| !c.only_violations || d.is_violation(),
            &[],
        )
        .add_dynamic_filter(
            "visibleNodes",
            |d: &ElementaryDependency, c: &DependencyFilterContext| {
                c.visible_nodes.contains(d.from()) && c.visible_nodes.contains(d.to())
            },
            &["nodes.violations"],
        )
        .build()
}

/// Which group a fully qualified filter key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Nodes,
    Dependencies,
}

/// The node and dependency filters of one graph
pub struct FilterCollection {
    pub nodes: FilterGroup<Node, NodeFilterContext>,
    pub dependencies: FilterGroup<ElementaryDependency, DependencyFilterContext>,
}

impl Default for FilterCollection {
    fn default() -> Self {
        Self {
            nodes: node_filters(),
            dependencies: dependency_filters(),
        }
    }
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `nodes.name` into its group and filter key.
    pub fn resolve<'a>(&self, qualified_key: &'a str) -> Result<(FilterTarget, &'a str), String> {
        let (group, key) = qualified_key
            .split_once('.')
            .ok_or_else(|| format!("filter key '{}' is not qualified", qualified_key))?;
        let target = if group == self.nodes.key() && self.nodes.has_filter(key) {
            FilterTarget::Nodes
        } else if group == self.dependencies.key() && self.dependencies.has_filter(key) {
            FilterTarget::Dependencies
        } else {
            return Err(format!("unknown filter '{}'", qualified_key));
        };
        Ok((target, key))
    }

    /// Run the filter named by a fully qualified key over its elements.
    pub fn update_filter(
        &mut self,
        qualified_key: &str,
        nodes: (&[Node], &NodeFilterContext),
        dependencies: (&[ElementaryDependency], &DependencyFilterContext),
    ) -> Result<(), String> {
        match self.resolve(qualified_key)? {
            (FilterTarget::Nodes, key) => self.nodes.update_filter(key, nodes.0, nodes.1),
            (FilterTarget::Dependencies, key) => self.dependencies.update_filter(key, dependencies.0, dependencies.1),
        }
    }

    /// Filters declaring `qualified_key` as dependency, in both groups
    pub fn dependents_of(&self, qualified_key: &str) -> Vec<String> {
        let mut dependents = self.nodes.dependents_of(qualified_key);
        dependents.extend(self.dependencies.dependents_of(qualified_key));
        dependents
    }

    /// Fully qualified keys the named filter declares as dependencies
    pub fn depends_on(&self, qualified_key: &str) -> Result<Vec<String>, String> {
        let declared = match self.resolve(qualified_key)? {
            (FilterTarget::Nodes, key) => self.nodes.filters().iter().find(|f| f.key() == key).map(|f| f.depends_on().to_vec()),
            (FilterTarget::Dependencies, key) => self
                .dependencies
                .filters()
                .iter()
                .find(|f| f.key() == key)
                .map(|f| f.depends_on().to_vec()),
        };
        Ok(declared.unwrap_or_default())
    }

    /// `qualified_key` followed by everything that transitively depends on
    /// it, each filter after all of its updated dependencies.
    pub fn update_order(&self, qualified_key: &str) -> Result<Vec<String>, String> {
        self.resolve(qualified_key)?;
        let mut affected = vec![qualified_key.to_string()];
        let mut next = 0;
        while next < affected.len() {
            for dependent in self.dependents_of(&affected[next]) {
                if !affected.contains(&dependent) {
                    affected.push(dependent);
                }
            }
            next += 1;
        }

        let mut order: Vec<String> = Vec::new();
        while order.len() < affected.len() {
            let mut progressed = false;
            for key in &affected {
                if order.contains(key) {
                    continue;
                }
                let ready = self
                    .depends_on(key)?
                    .iter()
                    .all(|d| !affected.contains(d) || order.contains(d));
                if ready {
                    order.push(key.clone());
                    progressed = true;
                }
            }
            if !progressed {
                return Err(format!("cyclic filter dependencies below '{}'", qualified_key));
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let filters = FilterCollection::new();
        assert_eq!(filters.resolve("nodes.name").unwrap(), (FilterTarget::Nodes, "name"));
        assert_eq!(
            filters.resolve("dependencies.visibleNodes").unwrap(),
            (FilterTarget::Dependencies, "visibleNodes")
        );
        assert!(filters.resolve("nodes.unknown").is_err());
        assert!(filters.resolve("name").is_err());
    }

    #[test]
    fn test_update_order_follows_dependencies_transitively() {
        let filters = FilterCollection::new();
        assert_eq!(
            filters.update_order("dependencies.violations").unwrap(),
            vec!["dependencies.violations", "nodes.violations", "dependencies.visibleNodes"]
        );
        assert_eq!(
            filters.update_order("nodes.name").unwrap(),
            vec![
                "nodes.name",
                "dependencies.nodeTypeAndName",
                "nodes.violations",
                "dependencies.visibleNodes"
            ]
        );
        assert_eq!(
            filters.update_order("dependencies.type").unwrap(),
            vec!["dependencies.type", "nodes.violations", "dependencies.visibleNodes"]
        );
    }

    #[test]
    fn test_type_filter_config() {
        let inner = ElementaryDependency::new("p.A", "p.A$Inner", "FIELD_ACCESS", "");
        let plain = ElementaryDependency::new("p.A", "p.AB", "METHOD_CALL", "");
        let mut config = TypeFilterConfig::default();
        assert!(config.matches(&inner) && config.matches(&plain));

        config.show_dependencies_between_class_and_its_inner_classes = false;
        assert!(!config.matches(&inner));
        assert!(config.matches(&plain));

        config.types.insert("METHOD_CALL".to_string(), false);
        assert!(!config.matches(&plain));
    }

    #[test]
    fn test_partial_type_filter_config() {
        let config: TypeFilterConfig = serde_json::from_str(r#"{"types": {"INHERITANCE": false}}"#).unwrap();
        assert!(config.show_dependencies_between_class_and_its_inner_classes);
        assert_eq!(config.types.get("INHERITANCE"), Some(&false));
    }
}
