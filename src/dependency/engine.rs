//! Recomputing the visible dependencies of a node tree.

use super::{
    apply_fold_transformers, calculate_endpoints, combined_type, select_fold_transformers,
    single_styled_dependency_type, DependencyBase, DependencyCache, DependencyId,
    ElementaryDependency, GroupedDependency,
};
use crate::node::NodeTree;
use crate::settings::GraphSettings;
use crate::types::{is_self_or_descendant_name, JsonDependency, ViolationGroup};
use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// How the visible set changed in a [`DependencyEngine::recreate_visible`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleDiff {
    /// Visible now, hidden before
    pub shown: Vec<DependencyId>,
    /// Visible before, hidden now
    pub hidden: Vec<DependencyId>,
    /// Visible before and now
    pub kept: Vec<DependencyId>,
}

impl VisibleDiff {
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.hidden.is_empty()
    }
}

/// A weighted edge between two visible nodes for an overview of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    /// Number of elementary dependencies behind the link
    pub weight: usize,
}

/// Owns the elementary dependencies and derives the grouped ones from them.
#[derive(Debug, Clone)]
pub struct DependencyEngine {
    elementary: Vec<ElementaryDependency>,
    cache: DependencyCache,
    visible: Vec<DependencyId>,
    /// Indices of the elementary dependencies that passed the filters last time
    filtered: Vec<usize>,
    shown_violations: Vec<ViolationGroup>,
    colored_types: HashSet<String>,
    dashed_types: HashSet<String>,
}

impl DependencyEngine {
    pub fn new(dependencies: &[JsonDependency], settings: &GraphSettings) -> Self {
        let elementary: Vec<ElementaryDependency> =
            dependencies.iter().map(ElementaryDependency::from_json).collect();
        debug!("loaded {} elementary dependencies", elementary.len());
        Self {
            filtered: (0..elementary.len()).collect(),
            elementary,
            cache: DependencyCache::new(),
            visible: Vec::new(),
            shown_violations: Vec::new(),
            colored_types: settings.colored_dependency_types.iter().cloned().collect(),
            dashed_types: settings.dashed_dependency_types.iter().cloned().collect(),
        }
    }

    pub fn elementary(&self) -> &[ElementaryDependency] {
        &self.elementary
    }

    pub fn cache(&self) -> &DependencyCache {
        &self.cache
    }

    pub fn get(&self, id: DependencyId) -> &GroupedDependency {
        self.cache.get(id)
    }

    pub fn visible(&self) -> &[DependencyId] {
        &self.visible
    }

    pub fn visible_dependencies(&self) -> impl Iterator<Item = &GroupedDependency> + '_ {
        self.visible.iter().map(move |&id| self.cache.get(id))
    }

    /// The visible dependency between two nodes, if any
    pub fn find_visible(&self, from: &str, to: &str) -> Option<DependencyId> {
        self.cache
            .find(from, to)
            .filter(|id| self.visible.contains(id))
    }

    /// Elementary dependencies that passed the filters in the last recomputation
    pub fn filtered(&self) -> impl Iterator<Item = &ElementaryDependency> + '_ {
        self.filtered.iter().map(move |&i| &self.elementary[i])
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    /// The grouped dependency for a pair, updated to represent `members`.
    ///
    /// Without members the dependency has an empty type and is no violation;
    /// it keeps its identity and is updated once members show up.
    pub fn get_unique_dependency(&mut self, from: &str, to: &str, members: &[DependencyBase]) -> DependencyId {
        let id = self.cache.get_or_create(from, to);
        let types = || members.iter().map(|m| m.dependency_type.as_str());
        let dependency_type = combined_type(types());
        let colored_type = single_styled_dependency_type(types(), &self.colored_types);
        let dashed_type = single_styled_dependency_type(types(), &self.dashed_types);

        let grouped = self.cache.get_mut(id);
        grouped.base.dependency_type = dependency_type;
        grouped.base.is_violation = members.iter().any(|m| m.is_violation);
        grouped.colored_type = colored_type;
        grouped.dashed_type = dashed_type;
        id
    }

    /// Recompute the visible dependencies for the current fold and filter state.
    ///
    /// `matches_filters` tells for an elementary dependency index whether it
    /// passes all dependency filters.
    pub fn recreate_visible(&mut self, tree: &NodeTree, matches_filters: impl Fn(usize) -> bool) -> VisibleDiff {
        self.filtered = (0..self.elementary.len()).filter(|&i| matches_filters(i)).collect();
        let filtered: Vec<DependencyBase> = self
            .filtered
            .iter()
            .map(|&i| self.elementary[i].base().clone())
            .collect();

        let transformers = select_fold_transformers(tree, &filtered);
        trace!("{} fold transformers active", transformers.len());
        let transformed = apply_fold_transformers(tree, &transformers, filtered);

        let mut order: Vec<(String, String)> = Vec::new();
        let mut groups: HashMap<(String, String), Vec<DependencyBase>> = HashMap::new();
        for dependency in transformed {
            let pair = (dependency.from.clone(), dependency.to.clone());
            groups
                .entry(pair.clone())
                .or_insert_with(|| {
                    order.push(pair);
                    Vec::new()
                })
                .push(dependency);
        }

        let visible: Vec<DependencyId> = order
            .iter()
            .map(|pair| {
                let members = groups.get(pair).map(Vec::as_slice).unwrap_or(&[]);
                self.get_unique_dependency(&pair.0, &pair.1, members)
            })
            .collect();

        for &id in &visible {
            let grouped = self.cache.get(id);
            let must_share = groups.contains_key(&(grouped.to().to_string(), grouped.from().to_string()));
            self.cache.get_mut(id).must_share_nodes = must_share;
        }

        let before: HashSet<DependencyId> = self.visible.iter().copied().collect();
        let now: HashSet<DependencyId> = visible.iter().copied().collect();
        let diff = VisibleDiff {
            shown: visible.iter().copied().filter(|id| !before.contains(id)).collect(),
            hidden: self.visible.iter().copied().filter(|id| !now.contains(id)).collect(),
            kept: visible.iter().copied().filter(|id| before.contains(id)).collect(),
        };
        self.visible = visible;
        debug!(
            "{} visible dependencies ({} shown, {} hidden)",
            self.visible.len(),
            diff.shown.len(),
            diff.hidden.len()
        );
        diff
    }

    // ========================================================================
    // Positioning
    // ========================================================================

    /// Recompute line endpoints and container end nodes of all visible
    /// dependencies from the current node positions.
    ///
    /// Returns the dependencies whose container end node changed; their line
    /// has to be moved into the container's drawing group.
    pub fn update_positions(&mut self, tree: &NodeTree) -> Vec<DependencyId> {
        let mut moved = Vec::new();
        for &id in &self.visible {
            let grouped = self.cache.get(id);
            let (from, to) = match (tree.find(grouped.from()), tree.find(grouped.to())) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    warn!("dependency {} refers to unknown nodes", grouped.base().key());
                    continue;
                }
            };
            let container = if tree.is_in_front_of(from, to) { from } else { to };
            let endpoints = calculate_endpoints(
                grouped.must_share_nodes(),
                &tree.get(from).absolute_circle(),
                &tree.get(to).absolute_circle(),
            );
            let origin = tree.get(container).absolute_center();
            let container_name = tree.get(container).full_name();

            let grouped = self.cache.get_mut(id);
            if grouped.container_end_node.as_deref() != Some(container_name) {
                grouped.container_end_node = Some(container_name.to_string());
                moved.push(id);
            }
            grouped.visual_data.endpoints = endpoints;
            grouped.visual_data.relative_start = endpoints.start_point.sub(origin);
            grouped.visual_data.relative_end = endpoints.end_point.sub(origin);
        }
        moved
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Descriptions of the elementary dependencies behind the visible
    /// dependency `from -> to`, without duplicates.
    ///
    /// An end that is a package, or shows nothing inside because it is folded
    /// or all its children are filtered out, stands for everything inside it.
    pub fn detailed_descriptions(&self, tree: &NodeTree, from: &str, to: &str) -> Vec<String> {
        let stands_for_descendants = |name: &str| {
            tree.find(name)
                .map(|id| {
                    let node = tree.get(id);
                    node.is_package() || node.is_currently_leaf()
                })
                .unwrap_or(false)
        };
        let from_expands = stands_for_descendants(from);
        let to_expands = stands_for_descendants(to);
        let end_matches = |end: &str, requested: &str, expands: bool| {
            if expands {
                is_self_or_descendant_name(end, requested)
            } else {
                end == requested
            }
        };

        let mut seen = HashSet::new();
        self.filtered()
            .filter(|d| end_matches(d.from(), from, from_expands) && end_matches(d.to(), to, to_expands))
            .map(|d| d.description().to_string())
            .filter(|description| seen.insert(description.clone()))
            .collect()
    }

    /// All filtered dependencies collapsed onto the visible nodes, weighted by
    /// the number of elementary dependencies. Self links are left out.
    pub fn get_all_links(&self, tree: &NodeTree) -> Vec<Link> {
        let representative = |name: &str| {
            tree.find(name)
                .map(|id| tree.get(tree.visible_representative(id)).full_name().to_string())
        };
        let mut links: Vec<Link> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();
        for dependency in self.filtered() {
            let (source, target) = match (representative(dependency.from()), representative(dependency.to())) {
                (Some(source), Some(target)) if source != target => (source, target),
                _ => continue,
            };
            match index.get(&(source.clone(), target.clone())) {
                Some(&i) => links[i].weight += 1,
                None => {
                    index.insert((source.clone(), target.clone()), links.len());
                    links.push(Link {
                        source,
                        target,
                        weight: 1,
                    });
                }
            }
        }
        links
    }

    // ========================================================================
    // Violations
    // ========================================================================

    /// Mark the dependencies of a rule's violations; takes effect on the next
    /// `recreate_visible`.
    pub fn show_violations(&mut self, group: &ViolationGroup) {
        if !self.shown_violations.iter().any(|g| g.rule == group.rule) {
            self.shown_violations.push(group.clone());
        }
        self.refresh_violation_flags();
    }

    pub fn hide_violations(&mut self, group: &ViolationGroup) {
        self.shown_violations.retain(|g| g.rule != group.rule);
        self.refresh_violation_flags();
    }

    pub fn shown_violations(&self) -> &[ViolationGroup] {
        &self.shown_violations
    }

    fn refresh_violation_flags(&mut self) {
        let descriptions: HashSet<String> = self
            .shown_violations
            .iter()
            .flat_map(|g| g.violations.iter().cloned())
            .collect();
        for dependency in self.elementary.iter_mut() {
            let is_violation = descriptions.contains(dependency.description());
            dependency.set_violation(is_violation);
        }
        debug!(
            "{} rules shown, {} dependencies are violations",
            self.shown_violations.len(),
            self.elementary.iter().filter(|d| d.is_violation()).count()
        );
    }

    /// Full names of the ends of all violations accepted by `matches`
    pub fn nodes_involved_in_violations(&self, matches: impl Fn(usize) -> bool) -> HashSet<String> {
        self.elementary
            .iter()
            .enumerate()
            .filter(|(i, d)| d.is_violation() && matches(*i))
            .flat_map(|(_, d)| [d.from().to_string(), d.to().to_string()])
            .collect()
    }
}
