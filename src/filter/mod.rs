//! Composable named filters with cached per-element results.
//!
//! A [`FilterGroup`] owns the filters for one kind of element (nodes or
//! dependencies). Elements are addressed by their index in the slice handed
//! to the group, and every filter keeps one cached boolean per element.
//!
//! Static filters are re-run on every [`FilterGroup::apply_filters`]. Dynamic
//! filters only run when updated explicitly or when a filter they declare as
//! dependency has been updated; the latter is resolved by the caller through
//! [`FilterCollection::update_order`].

pub mod pattern;
mod standard;

pub use standard::{
    dependency_filters, node_filters, DependencyFilterContext, FilterCollection, FilterTarget,
    NamePredicate, NodeFilterContext, TypeFilterConfig,
};

use log::trace;

type Predicate<T, C> = Box<dyn Fn(&T, &C) -> bool>;

/// One named predicate and its cached results
pub struct Filter<T, C> {
    key: String,
    is_static: bool,
    depends_on: Vec<String>,
    predicate: Predicate<T, C>,
    matches: Vec<bool>,
}

impl<T, C> Filter<T, C> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Fully qualified keys of the filters this one has to follow
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    fn run(&mut self, elements: &[T], context: &C) {
        self.matches = elements
            .iter()
            .map(|element| (self.predicate)(element, context))
            .collect();
    }

    /// Elements that have not been evaluated yet match
    fn matches(&self, index: usize) -> bool {
        self.matches.get(index).copied().unwrap_or(true)
    }
}

/// Filters of one element type, sharing a key prefix (e.g. `nodes`)
pub struct FilterGroup<T, C> {
    key: String,
    filters: Vec<Filter<T, C>>,
}

/// Builder returned by [`FilterGroup::builder`]
pub struct FilterGroupBuilder<T, C> {
    key: String,
    filters: Vec<Filter<T, C>>,
}

impl<T, C> FilterGroupBuilder<T, C> {
    /// A filter re-run on every `apply_filters`
    pub fn add_static_filter(
        mut self,
        key: &str,
        predicate: impl Fn(&T, &C) -> bool + 'static,
    ) -> Self {
        self.filters.push(Filter {
            key: key.to_string(),
            is_static: true,
            depends_on: Vec::new(),
            predicate: Box::new(predicate),
            matches: Vec::new(),
        });
        self
    }

    /// A filter only re-run when it or one of `depends_on` (fully qualified keys) is updated
    pub fn add_dynamic_filter(
        mut self,
        key: &str,
        predicate: impl Fn(&T, &C) -> bool + 'static,
        depends_on: &[&str],
    ) -> Self {
        self.filters.push(Filter {
            key: key.to_string(),
            is_static: false,
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            predicate: Box::new(predicate),
            matches: Vec::new(),
        });
        self
    }

    pub fn build(self) -> FilterGroup<T, C> {
        FilterGroup {
            key: self.key,
            filters: self.filters,
        }
    }
}

impl<T, C> FilterGroup<T, C> {
    pub fn builder(key: &str) -> FilterGroupBuilder<T, C> {
        FilterGroupBuilder {
            key: key.to_string(),
            filters: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn filters(&self) -> &[Filter<T, C>] {
        &self.filters
    }

    /// `nodes` + `name` -> `nodes.name`
    pub fn qualified_key(&self, key: &str) -> String {
        format!("{}.{}", self.key, key)
    }

    fn filter_mut(&mut self, key: &str) -> Result<&mut Filter<T, C>, String> {
        let group = self.key.clone();
        self.filters
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| format!("unknown filter '{}.{}'", group, key))
    }

    /// Run one filter over all elements, eagerly, and cache the results.
    pub fn update_filter(&mut self, key: &str, elements: &[T], context: &C) -> Result<(), String> {
        let filter = self.filter_mut(key)?;
        filter.run(elements, context);
        trace!(
            "filter {} updated: {} of {} match",
            key,
            filter.matches.iter().filter(|m| **m).count(),
            elements.len()
        );
        Ok(())
    }

    /// Re-run all static filters.
    pub fn apply_filters(&mut self, elements: &[T], context: &C) {
        for filter in self.filters.iter_mut().filter(|f| f.is_static) {
            filter.run(elements, context);
        }
    }

    /// Run every filter, static or not; used to initialize the caches.
    pub fn update_all(&mut self, elements: &[T], context: &C) {
        for filter in self.filters.iter_mut() {
            filter.run(elements, context);
        }
    }

    pub fn matches_filter(&self, key: &str, index: usize) -> Result<bool, String> {
        self.filters
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.matches(index))
            .ok_or_else(|| format!("unknown filter '{}'", self.qualified_key(key)))
    }

    /// Whether the element at `index` passes every filter of the group
    pub fn matches_all_filters(&self, index: usize) -> bool {
        self.filters.iter().all(|f| f.matches(index))
    }

    /// Whether the element passes all of the named filters
    pub fn matches_filters(&self, keys: &[&str], index: usize) -> bool {
        self.filters
            .iter()
            .filter(|f| keys.contains(&f.key.as_str()))
            .all(|f| f.matches(index))
    }

    /// Fully qualified keys of the filters of this group that depend on `qualified_key`
    pub fn dependents_of(&self, qualified_key: &str) -> Vec<String> {
        self.filters
            .iter()
            .filter(|f| f.depends_on.iter().any(|d| d == qualified_key))
            .map(|f| self.qualified_key(&f.key))
            .collect()
    }

    pub fn has_filter(&self, key: &str) -> bool {
        self.filters.iter().any(|f| f.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Limits {
        min: i32,
        max: i32,
    }

    fn group() -> FilterGroup<i32, Limits> {
        FilterGroup::builder("numbers")
            .add_static_filter("min", |n: &i32, c: &Limits| *n >= c.min)
            .add_dynamic_filter("max", |n: &i32, c: &Limits| *n <= c.max, &["numbers.min"])
            .build()
    }

    #[test]
    fn test_static_filters_run_on_apply() {
        let mut group = group();
        let elements = [1, 5, 10];
        group.apply_filters(&elements, &Limits { min: 5, max: 0 });
        assert!(!group.matches_all_filters(0));
        assert!(group.matches_all_filters(1));
        // the dynamic filter has not run yet
        assert!(group.matches_filter("max", 2).unwrap());
    }

    #[test]
    fn test_dynamic_filters_only_run_when_updated() {
        let mut group = group();
        let elements = [1, 5, 10];
        let limits = Limits { min: 0, max: 5 };
        group.apply_filters(&elements, &limits);
        assert!(group.matches_all_filters(2));
        group.update_filter("max", &elements, &limits).unwrap();
        assert!(!group.matches_all_filters(2));
        assert!(group.matches_filters(&["min"], 2));
    }

    #[test]
    fn test_unknown_filter() {
        let mut group = group();
        assert!(group.update_filter("nope", &[], &Limits { min: 0, max: 0 }).is_err());
        assert!(group.matches_filter("nope", 0).is_err());
    }

    #[test]
    fn test_dependents() {
        let group = group();
        assert_eq!(group.dependents_of("numbers.min"), vec!["numbers.max".to_string()]);
        assert!(group.dependents_of("numbers.max").is_empty());
    }
}
