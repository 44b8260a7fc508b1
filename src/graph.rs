//! The interactive graph: node tree, dependencies and filters drawn onto a
//! [`DrawingSurface`].
//!
//! Every public mutation updates the model right away and queues the work that
//! brings the drawing up to date on the [`Scheduler`]. That work runs in
//! [`Graph::tick`], one job at a time, each job only after the transitions of
//! the previous one have finished. Events are published to subscribers at the
//! end of each mutation and each tick.

use crate::dependency::{DependencyEngine, DependencyId, GroupedDependency, Link};
use crate::events::{EventBus, GraphEvent, SubscriptionId};
use crate::filter::pattern::NamePattern;
use crate::filter::{
    DependencyFilterContext, FilterCollection, FilterTarget, NamePredicate, NodeFilterContext, TypeFilterConfig,
};
use crate::geometry::Vector;
use crate::node::{NodeId, NodeTree};
use crate::schedule::{Job, Scheduler};
use crate::settings::{GraphSettings, VisualizationStyles};
use crate::types::{Report, ViolationGroup};
use crate::view::{
    DetailPopup, DrawingSurface, ElementId, EstimatedTextWidth, Geometry, InteractionKind, PopupChange,
    PopupContent, TextClass, TextMeasure, TransitionId,
};
use log::{debug, info, trace};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Upper bound of ticks in [`Graph::run_until_settled`]
const MAX_SETTLE_TICKS: usize = 10_000;

/// Space around the text of the dependency popup
const POPUP_PADDING: f64 = 5.0;

/// Filters reading the node type and name only
const TYPE_AND_NAME_FILTERS: [&str; 2] = ["type", "name"];

/// Dependency filters deciding which violations count as visible
const VIOLATION_SOURCE_FILTERS: [&str; 3] = ["type", "nodeTypeAndName", "violations"];

#[derive(Debug, Clone, Copy)]
struct NodeElements {
    group: ElementId,
    circle: ElementId,
    label: ElementId,
}

pub struct Graph<S: DrawingSurface> {
    tree: NodeTree,
    engine: DependencyEngine,
    filters: FilterCollection,
    node_context: NodeFilterContext,
    dependency_context: DependencyFilterContext,
    settings: GraphSettings,
    violation_groups: Vec<ViolationGroup>,
    surface: S,
    measure: Box<dyn TextMeasure>,
    scheduler: Scheduler,
    events: EventBus,
    popup: DetailPopup,
    popup_content: Option<PopupContent>,
    node_elements: Vec<NodeElements>,
    dependency_lines: HashMap<DependencyId, ElementId>,
}

impl<S: DrawingSurface> Graph<S> {
    /// Build the graph and draw it in its initial state, with label widths
    /// estimated from the font size.
    pub fn new(report: Report, settings: GraphSettings, surface: S) -> Result<Self, String> {
        Self::with_text_measure(report, settings, surface, Box::new(EstimatedTextWidth))
    }

    pub fn with_text_measure(
        report: Report,
        settings: GraphSettings,
        surface: S,
        measure: Box<dyn TextMeasure>,
    ) -> Result<Self, String> {
        let tree = NodeTree::from_json(&report.root);
        let engine = DependencyEngine::new(&report.dependencies, &settings);
        let popup = DetailPopup::new(
            Duration::from_millis(settings.popup_show_delay_ms),
            Duration::from_millis(settings.popup_hide_delay_ms),
        );
        let mut graph = Self {
            tree,
            engine,
            filters: FilterCollection::new(),
            node_context: NodeFilterContext::default(),
            dependency_context: DependencyFilterContext {
                type_filter: TypeFilterConfig {
                    show_dependencies_between_class_and_its_inner_classes: settings
                        .show_dependencies_between_class_and_its_inner_classes,
                    ..TypeFilterConfig::default()
                },
                ..DependencyFilterContext::default()
            },
            settings,
            violation_groups: report.violations,
            surface,
            measure,
            scheduler: Scheduler::new(),
            events: EventBus::new(),
            popup,
            popup_content: None,
            node_elements: Vec::new(),
            dependency_lines: HashMap::new(),
        };

        graph.create_node_elements();
        graph.fold_initially()?;
        graph.initialize_filters();
        graph.redraw(false);
        info!(
            "graph ready: {} nodes, {} dependencies",
            graph.tree.len().saturating_sub(1),
            graph.engine.elementary().len()
        );
        Ok(graph)
    }

    fn create_node_elements(&mut self) {
        let root_element = self.surface.root();
        for index in 0..self.tree.len() {
            let node = &self.tree.nodes()[index];
            let parent_group = if node.is_root() {
                root_element
            } else {
                self.node_elements[node.parent().index()].group
            };
            let group = self.surface.add_group(parent_group, node.full_name());
            self.surface.set_class(group, "node", true);
            self.surface.set_class(group, node.kind().css_class(), true);
            let circle = self.surface.add_circle(group);
            let label = self.surface.add_text(group, node.name());
            if node.is_root() {
                self.surface.set_visible(label, false);
            } else {
                self.surface.listen(circle, InteractionKind::Click);
                self.surface.listen(circle, InteractionKind::Drag);
            }
            self.node_elements.push(NodeElements { group, circle, label });
        }
    }

    fn fold_initially(&mut self) -> Result<(), String> {
        if self.settings.fold_all_initially {
            for index in 1..self.tree.len() {
                let id = self.tree.nodes()[index].id();
                self.tree.fold_initially(id);
            }
        }
        for name in self.settings.initially_folded.clone() {
            let id = self.tree.require(&name)?;
            self.tree.fold_initially(id);
        }
        Ok(())
    }

    fn initialize_filters(&mut self) {
        self.filters.nodes.update_all(self.tree.nodes(), &self.node_context);
        self.apply_node_filters_to_tree();
        self.refresh_dependency_context();
        self.filters
            .dependencies
            .update_all(self.engine.elementary(), &self.dependency_context);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn dependencies(&self) -> &DependencyEngine {
        &self.engine
    }

    pub fn filters(&self) -> &FilterCollection {
        &self.filters
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn styles(&self) -> &VisualizationStyles {
        &self.settings.styles
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn violation_groups(&self) -> &[ViolationGroup] {
        &self.violation_groups
    }

    /// The visible dependencies, in a stable order
    pub fn visible_dependencies(&self) -> Vec<&GroupedDependency> {
        self.engine.visible_dependencies().collect()
    }

    pub fn visible_dependency(&self, from: &str, to: &str) -> Option<&GroupedDependency> {
        self.engine.find_visible(from, to).map(|id| self.engine.get(id))
    }

    /// Drawing group of a node
    pub fn node_element(&self, full_name: &str) -> Result<ElementId, String> {
        let id = self.tree.require(full_name)?;
        Ok(self.node_elements[id.index()].group)
    }

    /// Line of a dependency that has been visible at least once
    pub fn dependency_element(&self, from: &str, to: &str) -> Option<ElementId> {
        self.engine
            .cache()
            .find(from, to)
            .and_then(|id| self.dependency_lines.get(&id).copied())
    }

    pub fn node_matches_filter(&self, full_name: &str, key: &str) -> Result<bool, String> {
        let id = self.tree.require(full_name)?;
        self.filters.nodes.matches_filter(key, id.index())
    }

    pub fn node_matches_all_filters(&self, full_name: &str) -> Result<bool, String> {
        let id = self.tree.require(full_name)?;
        Ok(self.filters.nodes.matches_all_filters(id.index()))
    }

    /// Links between visible nodes for an overview of the whole graph
    pub fn get_all_links(&self) -> Vec<Link> {
        self.engine.get_all_links(&self.tree)
    }

    pub fn detailed_descriptions(&self, from: &str, to: &str) -> Vec<String> {
        self.engine.detailed_descriptions(&self.tree, from, to)
    }

    /// No job queued and no transition running
    pub fn is_settled(&self) -> bool {
        self.scheduler.is_idle()
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Events queued while building the graph (`InitialFold`, the first
    /// `SizeChanged` and `LayoutChanged`) reach subscribers on the next tick.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn publish_events(&mut self) {
        let events = self.tree.take_events();
        self.events.publish_all(events);
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Fold or unfold a node as the user clicking it would.
    ///
    /// Queues one relayout, then `FoldFinished` once it has settled. Clicking
    /// a leaf does nothing.
    pub fn click_node(&mut self, full_name: &str) -> Result<(), String> {
        let id = self.tree.require(full_name)?;
        if !self.tree.toggle_fold(id) {
            trace!("click on {} changes nothing", full_name);
            self.publish_events();
            return Ok(());
        }
        if !self.tree.get(id).is_folded() {
            self.bring_to_front(id);
        }
        self.update_fold_class(id);
        self.scheduler.request_relayout();
        self.scheduler.enqueue(Job::FoldFinished(full_name.to_string()));
        self.publish_events();
        Ok(())
    }

    /// Fold every inner node; queues a single relayout.
    pub fn fold_all_nodes(&mut self) {
        let folded = self.tree.fold_all();
        debug!("folded {} nodes", folded.len());
        for id in folded {
            self.update_fold_class(id);
        }
        self.scheduler.request_relayout();
        self.publish_events();
    }

    /// Move a node by `(dx, dy)`; ancestors grow to keep containing it.
    ///
    /// The drawing follows right away. A relayout that is still queued puts
    /// the node back into its layout position when it runs.
    pub fn drag_node(&mut self, full_name: &str, dx: f64, dy: f64) -> Result<(), String> {
        let id = self.tree.require(full_name)?;
        if self.scheduler.has_pending_layout() {
            debug!("{} dragged while a relayout is queued", full_name);
        }
        let changed = self.tree.drag(id, dx, dy, &self.settings.styles)?;
        self.surface.raise(self.node_elements[id.index()].group);

        let ancestors = self.tree.self_and_predecessors(id);
        // Descendants keep their place relative to the dragged node
        for node in changed.into_iter().filter(|n| ancestors.contains(n)) {
            let elements = self.node_elements[node.index()];
            if node == id {
                let center = self.tree.get(node).relative_circle().center;
                self.surface.jump(elements.group, Geometry::Translate(center));
            } else {
                self.jump_rim(node);
            }
        }
        self.jump_rim(NodeId::ROOT);
        let root_radius = self.tree.root().radius();
        self.surface.resize(root_radius, root_radius);

        self.position_dependencies(false);
        self.publish_events();
        Ok(())
    }

    /// Move the circle and label of a node to its current radius.
    fn jump_rim(&mut self, id: NodeId) {
        let elements = self.node_elements[id.index()];
        let node = self.tree.get(id);
        self.surface.jump(elements.circle, Geometry::Radius(node.radius()));
        self.surface
            .jump(elements.label, Geometry::TextPosition(Vector::new(0.0, node.label_offset())));
    }

    /// Bring both ends of a dependency to the front.
    pub fn focus_dependency(&mut self, from: &str, to: &str) -> Result<(), String> {
        let from_id = self.tree.require(from)?;
        let to_id = self.tree.require(to)?;
        self.bring_to_front(from_id);
        self.bring_to_front(to_id);
        self.position_dependencies(false);
        self.tree.push_event(GraphEvent::NodesFocused {
            nodes: vec![from.to_string(), to.to_string()],
        });
        self.publish_events();
        Ok(())
    }

    /// Raise a node with all of its ancestors, in the model and in the drawing.
    fn bring_to_front(&mut self, id: NodeId) {
        let chain = self.tree.self_and_predecessors(id);
        for &node in chain.iter().rev().filter(|&&n| n != NodeId::ROOT) {
            self.tree.bring_to_front(node);
            self.surface.raise(self.node_elements[node.index()].group);
        }
    }

    // ========================================================================
    // Styles
    // ========================================================================

    /// Replace the visualization styles; always relayouts.
    pub fn set_styles(&mut self, styles: VisualizationStyles) {
        self.settings.styles = styles;
        self.scheduler.force_relayout();
    }

    /// Request a relayout; requests made before it runs are merged.
    pub fn request_relayout(&mut self) {
        self.scheduler.request_relayout();
    }

    pub fn force_relayout(&mut self) {
        self.scheduler.force_relayout();
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Show only classes matching the pattern (and the packages containing them).
    pub fn set_name_filter(&mut self, pattern: &str) -> Result<(), String> {
        let pattern = NamePattern::parse(pattern)?;
        debug!("name filter '{}'", pattern.source());
        self.set_name_predicate(pattern.into_predicate())
    }

    /// Filter class names with an arbitrary predicate.
    pub fn set_name_predicate(&mut self, predicate: NamePredicate) -> Result<(), String> {
        self.node_context.name_predicate = predicate;
        self.update_filter("nodes.name")
    }

    pub fn set_node_type_filter(&mut self, show_interfaces: bool, show_classes: bool) -> Result<(), String> {
        self.node_context.show_interfaces = show_interfaces;
        self.node_context.show_classes = show_classes;
        self.update_filter("nodes.type")
    }

    pub fn change_type_filter(&mut self, config: TypeFilterConfig) -> Result<(), String> {
        self.dependency_context.type_filter = config;
        self.update_filter("dependencies.type")
    }

    /// Show only violations and the classes they connect.
    pub fn set_only_violations(&mut self, only_violations: bool) -> Result<(), String> {
        self.node_context.only_violations = only_violations;
        self.dependency_context.only_violations = only_violations;
        self.update_filter("dependencies.violations")
    }

    pub fn show_violations(&mut self, group: &ViolationGroup) -> Result<(), String> {
        self.engine.show_violations(group);
        self.update_filter("dependencies.violations")
    }

    pub fn hide_violations(&mut self, group: &ViolationGroup) -> Result<(), String> {
        self.engine.hide_violations(group);
        self.update_filter("dependencies.violations")
    }

    /// Show the violations of every rule of the report.
    pub fn show_all_violations(&mut self) -> Result<(), String> {
        for group in self.violation_groups.clone() {
            self.engine.show_violations(&group);
        }
        self.update_filter("dependencies.violations")
    }

    /// Re-run a filter (fully qualified key) and everything depending on it,
    /// then queue a filter application.
    pub fn update_filter(&mut self, qualified_key: &str) -> Result<(), String> {
        for key in self.filters.update_order(qualified_key)? {
            match self.filters.resolve(&key)?.0 {
                FilterTarget::Nodes => self.refresh_node_context(),
                FilterTarget::Dependencies => self.refresh_dependency_context(),
            }
            self.filters.update_filter(
                &key,
                (self.tree.nodes(), &self.node_context),
                (self.engine.elementary(), &self.dependency_context),
            )?;
        }
        self.scheduler.request_apply_filters();
        Ok(())
    }

    fn refresh_node_context(&mut self) {
        let dependencies = &self.filters.dependencies;
        self.node_context.violating_nodes = self
            .engine
            .nodes_involved_in_violations(|i| dependencies.matches_filters(&VIOLATION_SOURCE_FILTERS, i));
    }

    fn refresh_dependency_context(&mut self) {
        let nodes = &self.filters.nodes;
        self.dependency_context.type_and_name_nodes = self
            .tree
            .names_kept_by(|n| nodes.matches_filters(&TYPE_AND_NAME_FILTERS, n.id().index()));
        self.dependency_context.visible_nodes = self
            .tree
            .names_kept_by(|n| nodes.matches_all_filters(n.id().index()));
    }

    fn apply_node_filters_to_tree(&mut self) {
        let nodes = &self.filters.nodes;
        self.tree
            .apply_filters(|n| nodes.matches_all_filters(n.id().index()));
    }

    // ========================================================================
    // Dependency popup
    // ========================================================================

    pub fn hover_dependency(&mut self, from: &str, to: &str) {
        self.popup.hover(from, to);
    }

    pub fn hover_popup(&mut self) {
        self.popup.hover_popup();
    }

    pub fn leave_dependency(&mut self) {
        self.popup.leave();
    }

    pub fn fix_popup(&mut self) {
        self.popup.fix();
    }

    pub fn unfix_popup(&mut self) {
        self.popup.unfix();
    }

    /// The content of the popup while it is shown
    pub fn popup_content(&self) -> Option<&PopupContent> {
        self.popup_content.as_ref()
    }

    fn create_popup_content(&self, from: &str, to: &str) -> PopupContent {
        let styles = &self.settings.styles;
        let title = format!("{} -> {}", from, to);
        let lines = self.detailed_descriptions(from, to);
        let title_width = self.measure.text_width(&title, TextClass::DependencyTitle, styles);
        let widest_line = lines
            .iter()
            .map(|l| self.measure.text_width(l, TextClass::DependencyDetail, styles))
            .fold(0.0, f64::max);
        let height = TextClass::DependencyTitle.font_size(styles)
            + lines.len() as f64 * TextClass::DependencyDetail.font_size(styles)
            + 2.0 * POPUP_PADDING;
        PopupContent {
            title,
            lines,
            width: title_width.max(widest_line) + 2.0 * POPUP_PADDING,
            height,
        }
    }

    // ========================================================================
    // Running queued work
    // ========================================================================

    /// Let time pass: advance transitions and the popup, then run every
    /// queued job whose predecessor has settled.
    pub fn tick(&mut self, elapsed: Duration) {
        self.surface.advance(elapsed);
        match self.popup.advance(elapsed) {
            Some(PopupChange::Shown { from, to }) => {
                self.popup_content = Some(self.create_popup_content(&from, &to));
            }
            Some(PopupChange::Hidden) => self.popup_content = None,
            None => {}
        }

        loop {
            let surface = &self.surface;
            let job = match self.scheduler.next_job(|t| surface.is_finished(t)) {
                Some(job) => job,
                None => break,
            };
            self.run_job(job);
        }
        self.publish_events();
    }

    /// Tick in steps of the transition duration until nothing is left to do.
    pub fn run_until_settled(&mut self) {
        self.tick(Duration::ZERO);
        let step = self.settings.styles.transition_duration().max(Duration::from_millis(1));
        let mut ticks = 0;
        while !self.scheduler.is_idle() && ticks < MAX_SETTLE_TICKS {
            self.tick(step);
            ticks += 1;
        }
    }

    fn run_job(&mut self, job: Job) {
        match job {
            Job::Relayout => {
                let transitions = self.redraw(true);
                self.scheduler.track(transitions);
            }
            Job::ApplyFilters => {
                self.filters.nodes.apply_filters(self.tree.nodes(), &self.node_context);
                self.filters
                    .dependencies
                    .apply_filters(self.engine.elementary(), &self.dependency_context);
                self.apply_node_filters_to_tree();
                let transitions = self.redraw(true);
                self.scheduler.track(transitions);
            }
            Job::FoldFinished(node) => {
                self.tree.push_event(GraphEvent::FoldFinished { node });
            }
        }
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Bring the drawing in line with the model: recompute the visible
    /// dependencies and the layout, then move everything into place.
    fn redraw(&mut self, animate: bool) -> Vec<TransitionId> {
        let dependencies = &self.filters.dependencies;
        let diff = self
            .engine
            .recreate_visible(&self.tree, |i| dependencies.matches_all_filters(i));

        let measure = &self.measure;
        let styles = &self.settings.styles;
        let size_changed = self
            .tree
            .relayout(styles, &|text: &str| measure.text_width(text, TextClass::NodeLabel, styles));
        if size_changed || !animate {
            let radius = self.tree.root().radius();
            self.surface.resize(radius, radius);
        }

        let mut transitions = self.draw_nodes(animate);

        for id in diff.hidden {
            if let Some(&line) = self.dependency_lines.get(&id) {
                self.surface.set_visible(line, false);
            }
        }
        transitions.extend(self.position_dependencies(animate));

        self.tree.push_event(GraphEvent::LayoutChanged);
        trace!("redraw started {} transitions", transitions.len());
        transitions
    }

    fn draw_nodes(&mut self, animate: bool) -> Vec<TransitionId> {
        let duration = self.settings.styles.transition_duration();
        let violating: HashSet<String> = {
            let dependencies = &self.filters.dependencies;
            self.engine
                .nodes_involved_in_violations(|i| dependencies.matches_all_filters(i))
        };
        let mut transitions = Vec::new();
        for index in 0..self.tree.len() {
            let node = &self.tree.nodes()[index];
            let id = node.id();
            let elements = self.node_elements[index];
            let shown = node.is_root() || self.tree.get(node.parent()).current_children().contains(&id);
            self.surface.set_visible(elements.group, shown);
            self.surface.set_class(elements.group, "folded", node.is_folded());
            self.surface
                .set_class(elements.group, "violation", violating.contains(node.full_name()));

            let targets = [
                (elements.group, Geometry::Translate(node.relative_circle().center)),
                (elements.circle, Geometry::Radius(node.radius())),
                (
                    elements.label,
                    Geometry::TextPosition(Vector::new(0.0, node.label_offset())),
                ),
            ];
            for (element, geometry) in targets {
                if animate && shown {
                    transitions.push(self.surface.transition(element, geometry, duration));
                } else {
                    self.surface.jump(element, geometry);
                }
            }
        }
        transitions
    }

    /// Recompute the dependency lines and move them, creating lines for
    /// dependencies shown for the first time.
    fn position_dependencies(&mut self, animate: bool) -> Vec<TransitionId> {
        let duration = self.settings.styles.transition_duration();
        let moved: HashSet<DependencyId> = self.engine.update_positions(&self.tree).into_iter().collect();
        let mut transitions = Vec::new();

        for &id in self.engine.visible() {
            let dependency = self.engine.get(id);
            let container = match dependency
                .container_end_node()
                .and_then(|name| self.tree.find(name))
            {
                Some(container) => self.node_elements[container.index()].group,
                None => continue,
            };
            let line = match self.dependency_lines.get(&id) {
                Some(&line) => {
                    if moved.contains(&id) {
                        self.surface.reparent(line, container);
                    }
                    line
                }
                None => {
                    let line = self.surface.add_line(container);
                    self.surface.listen(line, InteractionKind::Hover);
                    self.dependency_lines.insert(id, line);
                    line
                }
            };
            self.surface.set_class(line, "violation", dependency.is_violation());
            for class in dependency.css_classes().iter().filter(|c| *c != "violation") {
                self.surface.set_class(line, class, true);
            }
            self.surface.set_visible(line, true);

            let visual = dependency.visual_data();
            let geometry = Geometry::Line {
                start: visual.relative_start,
                end: visual.relative_end,
            };
            // Lines that just changed their group would slide in from the wrong origin
            if animate && !moved.contains(&id) {
                transitions.push(self.surface.transition(line, geometry, duration));
            } else {
                self.surface.jump(line, geometry);
            }
        }
        transitions
    }

    fn update_fold_class(&mut self, id: NodeId) {
        let group = self.node_elements[id.index()].group;
        self.surface.set_class(group, "folded", self.tree.get(id).is_folded());
    }
}

impl Graph<crate::svg::SvgScene> {
    /// The current drawing as a standalone SVG document
    pub fn to_svg(&self, colors: &crate::svg::GraphColors, font: &str) -> String {
        crate::svg::render_scene(&self.surface, colors, font, false)
    }
}

impl<S: DrawingSurface> std::fmt::Debug for Graph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.tree.len())
            .field("dependencies", &self.engine.elementary().len())
            .field("visible_dependencies", &self.engine.visible().len())
            .field("pending_jobs", &self.scheduler.pending_jobs())
            .finish()
    }
}
