//! Dependencies between nodes.
//!
//! [`ElementaryDependency`] is one dependency from the report. What is drawn
//! is a [`GroupedDependency`]: all elementary dependencies that end up between
//! the same two visible nodes once folded nodes have absorbed their
//! descendants. Grouped dependencies live in a [`DependencyCache`] so there is
//! at most one of them per ordered pair of nodes, and regrouping updates that
//! one in place.

mod endpoints;
mod engine;
mod transform;

pub use endpoints::{calculate_endpoints, one_circle_is_completely_within_the_other, Endpoints, LINE_DISTANCE};
pub use engine::{DependencyEngine, Link, VisibleDiff};
pub use transform::{apply_fold_transformer, apply_fold_transformers, select_fold_transformers};

use crate::geometry::Vector;
use crate::types::JsonDependency;
use serde::Serialize;
use std::collections::HashMap;

/// Type label of a grouped dependency whose members have different types
pub const SEVERAL_TYPES: &str = "several";

/// Fields shared by elementary and grouped dependencies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyBase {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub dependency_type: String,
    pub is_violation: bool,
}

impl DependencyBase {
    pub fn new(from: &str, to: &str, dependency_type: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            dependency_type: dependency_type.to_string(),
            is_violation: false,
        }
    }

    /// Cache key of the ordered pair
    pub fn key(&self) -> String {
        dependency_key(&self.from, &self.to)
    }
}

pub fn dependency_key(from: &str, to: &str) -> String {
    format!("{}-{}", from, to)
}

/// One dependency of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementaryDependency {
    #[serde(flatten)]
    base: DependencyBase,
    description: String,
}

impl ElementaryDependency {
    pub fn new(from: &str, to: &str, dependency_type: &str, description: &str) -> Self {
        Self {
            base: DependencyBase::new(from, to, dependency_type),
            description: description.to_string(),
        }
    }

    pub fn from_json(json: &JsonDependency) -> Self {
        Self::new(
            &json.origin_class,
            &json.target_class,
            &json.dependency_type,
            &json.description,
        )
    }

    pub fn base(&self) -> &DependencyBase {
        &self.base
    }

    pub fn from(&self) -> &str {
        &self.base.from
    }

    pub fn to(&self) -> &str {
        &self.base.to
    }

    pub fn dependency_type(&self) -> &str {
        &self.base.dependency_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_violation(&self) -> bool {
        self.base.is_violation
    }

    pub(crate) fn set_violation(&mut self, is_violation: bool) {
        self.base.is_violation = is_violation;
    }
}

/// Index of a grouped dependency in its [`DependencyCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyId(usize);

impl DependencyId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Line geometry of a visible dependency
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyVisualData {
    /// Absolute coordinates
    pub endpoints: Endpoints,
    /// Start point relative to the container end node
    pub relative_start: Vector,
    /// End point relative to the container end node
    pub relative_end: Vector,
}

/// A drawn dependency between two visible nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedDependency {
    #[serde(flatten)]
    base: DependencyBase,
    must_share_nodes: bool,
    container_end_node: Option<String>,
    colored_type: Option<String>,
    dashed_type: Option<String>,
    visual_data: DependencyVisualData,
}

impl GroupedDependency {
    fn new(from: &str, to: &str) -> Self {
        Self {
            base: DependencyBase::new(from, to, ""),
            must_share_nodes: false,
            container_end_node: None,
            colored_type: None,
            dashed_type: None,
            visual_data: DependencyVisualData::default(),
        }
    }

    pub fn base(&self) -> &DependencyBase {
        &self.base
    }

    pub fn from(&self) -> &str {
        &self.base.from
    }

    pub fn to(&self) -> &str {
        &self.base.to
    }

    /// The members' type, `""` without members or [`SEVERAL_TYPES`] on conflict
    pub fn dependency_type(&self) -> &str {
        &self.base.dependency_type
    }

    pub fn is_violation(&self) -> bool {
        self.base.is_violation
    }

    /// Whether the dependency in the opposite direction is visible as well
    pub fn must_share_nodes(&self) -> bool {
        self.must_share_nodes
    }

    /// The end node drawn in front; the line is drawn relative to it
    pub fn container_end_node(&self) -> Option<&str> {
        self.container_end_node.as_deref()
    }

    pub fn colored_type(&self) -> Option<&str> {
        self.colored_type.as_deref()
    }

    pub fn dashed_type(&self) -> Option<&str> {
        self.dashed_type.as_deref()
    }

    pub fn visual_data(&self) -> &DependencyVisualData {
        &self.visual_data
    }

    pub fn endpoints(&self) -> Endpoints {
        self.visual_data.endpoints
    }

    /// CSS classes of the drawn line
    pub fn css_classes(&self) -> Vec<String> {
        let mut classes = vec!["dependency".to_string()];
        if self.is_violation() {
            classes.push("violation".to_string());
        }
        if let Some(colored) = &self.colored_type {
            classes.push(format!("dependency-color-{}", colored.to_lowercase()));
        }
        if let Some(dashed) = &self.dashed_type {
            classes.push(format!("dependency-dashed-{}", dashed.to_lowercase()));
        }
        classes
    }
}

/// The one grouped dependency per ordered pair of full names.
#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    entries: Vec<GroupedDependency>,
    by_key: HashMap<String, DependencyId>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached dependency for the pair, created with an empty type and no
    /// violation if this is the first request.
    pub fn get_or_create(&mut self, from: &str, to: &str) -> DependencyId {
        let key = dependency_key(from, to);
        if let Some(id) = self.by_key.get(&key) {
            return *id;
        }
        let id = DependencyId(self.entries.len());
        self.entries.push(GroupedDependency::new(from, to));
        self.by_key.insert(key, id);
        id
    }

    pub fn find(&self, from: &str, to: &str) -> Option<DependencyId> {
        self.by_key.get(&dependency_key(from, to)).copied()
    }

    pub fn get(&self, id: DependencyId) -> &GroupedDependency {
        &self.entries[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: DependencyId) -> &mut GroupedDependency {
        &mut self.entries[id.0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Combined type label of a group of dependency types
pub fn combined_type<'a>(types: impl IntoIterator<Item = &'a str>) -> String {
    let mut result: Option<&str> = None;
    for t in types {
        match result {
            None => result = Some(t),
            Some(existing) if existing != t => return SEVERAL_TYPES.to_string(),
            Some(_) => {}
        }
    }
    result.unwrap_or("").to_string()
}

/// The one styled type among `types`, if there is exactly one.
///
/// With an empty `styled` set this is always `None`.
pub fn single_styled_dependency_type<'a>(
    types: impl IntoIterator<Item = &'a str>,
    styled: &std::collections::HashSet<String>,
) -> Option<String> {
    let mut found: Option<&str> = None;
    for t in types.into_iter().filter(|t| styled.contains(*t)) {
        match found {
            None => found = Some(t),
            Some(existing) if existing != t => return None,
            Some(_) => {}
        }
    }
    found.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cache_returns_one_instance_per_pair() {
        let mut cache = DependencyCache::new();
        let first = cache.get_or_create("a", "b");
        let reverse = cache.get_or_create("b", "a");
        assert_ne!(first, reverse);
        assert_eq!(cache.get_or_create("a", "b"), first);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.find("a", "b"), Some(first));
        assert_eq!(cache.find("a", "c"), None);
    }

    #[test]
    fn test_new_grouped_dependency_is_empty() {
        let mut cache = DependencyCache::new();
        let id = cache.get_or_create("a", "b");
        let dependency = cache.get(id);
        assert_eq!(dependency.dependency_type(), "");
        assert!(!dependency.is_violation());
        assert!(!dependency.must_share_nodes());
    }

    #[test]
    fn test_combined_type() {
        assert_eq!(combined_type(Vec::<&str>::new()), "");
        assert_eq!(combined_type(vec!["FIELD_ACCESS", "FIELD_ACCESS"]), "FIELD_ACCESS");
        assert_eq!(combined_type(vec!["FIELD_ACCESS", "INHERITANCE"]), SEVERAL_TYPES);
    }

    #[test]
    fn test_single_styled_dependency_type() {
        let none = HashSet::new();
        assert_eq!(single_styled_dependency_type(vec!["A"], &none), None);

        let styled: HashSet<String> = ["INHERITANCE".to_string()].into_iter().collect();
        assert_eq!(
            single_styled_dependency_type(vec!["METHOD_CALL", "INHERITANCE"], &styled),
            Some("INHERITANCE".to_string())
        );
        let styled: HashSet<String> = ["A".to_string(), "B".to_string()].into_iter().collect();
        assert_eq!(single_styled_dependency_type(vec!["A", "B"], &styled), None);
    }

    #[test]
    fn test_elementary_dependency_from_json() {
        let json = JsonDependency {
            origin_class: "my.A".to_string(),
            target_class: "my.B".to_string(),
            dependency_type: "METHOD_CALL".to_string(),
            description: "my.A.run() calls my.B.go()".to_string(),
        };
        let dependency = ElementaryDependency::from_json(&json);
        assert_eq!(dependency.from(), "my.A");
        assert_eq!(dependency.to(), "my.B");
        assert_eq!(dependency.base().key(), "my.A-my.B");
        assert!(!dependency.is_violation());
    }
}
