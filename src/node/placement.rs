//! Geometry of the tree: relayout, absolute positions, dragging and z-order.

use super::{NodeId, NodeTree};
use crate::events::GraphEvent;
use crate::geometry::{Circle, Shape, Vector};
use crate::layout::{layout_inner, layout_leaf, layout_root};
use crate::settings::VisualizationStyles;
use log::{debug, trace};

const CONTAINMENT_TOLERANCE: f64 = 1e-6;

impl NodeTree {
    /// Lay out every visible node bottom-up and refresh absolute positions.
    ///
    /// `label_width` measures a node label. Queues `SizeChanged` if the root
    /// radius changed; returns whether it did.
    pub fn relayout(&mut self, styles: &VisualizationStyles, label_width: &dyn Fn(&str) -> f64) -> bool {
        let old_radius = self.root().radius();
        self.layout_subtree(NodeId::ROOT, styles, label_width);
        self.update_absolute_positions();

        let radius = self.root().radius();
        debug!("relayout finished, root radius {:.1}", radius);
        if (radius - old_radius).abs() > f64::EPSILON {
            self.push_event(GraphEvent::SizeChanged {
                half_width: radius,
                half_height: radius,
            });
            return true;
        }
        false
    }

    fn layout_subtree(&mut self, id: NodeId, styles: &VisualizationStyles, label_width: &dyn Fn(&str) -> f64) {
        let children = self.get(id).current_children().to_vec();
        for &child in &children {
            self.layout_subtree(child, styles, label_width);
        }

        let radii: Vec<f64> = children.iter().map(|&c| self.get(c).radius()).collect();
        let layout = if id == NodeId::ROOT {
            layout_root(&radii, styles)
        } else {
            let width = label_width(self.get(id).name());
            if children.is_empty() {
                layout_leaf(width, styles)
            } else {
                layout_inner(&radii, width, styles)
            }
        };

        let enclosing = Circle::new(Vector::ZERO, layout.radius);
        for ((&child, center), r) in children.iter().zip(layout.child_centers).zip(radii) {
            let mut circle = Circle::new(center, r);
            enclosing.translate_enclosed_circle_into(&mut circle, styles.circle_padding);
            self.get_mut(child).circle = circle;
        }

        let node = self.get_mut(id);
        node.circle.r = layout.radius;
        node.label_offset = layout.label_offset;
        node.label_on_rim = children.len() > 1;
        trace!("laid out {} with radius {:.1}", node.full_name, layout.radius);
    }

    /// Recompute the absolute centre of every node from the relative ones.
    pub fn update_absolute_positions(&mut self) {
        // Arena order is pre-order, so parents are always updated first
        for index in 0..self.nodes.len() {
            let node = &self.nodes[index];
            let absolute = if node.is_root() {
                node.circle.center
            } else {
                self.nodes[node.parent.0].absolute_center.add(node.circle.center)
            };
            self.nodes[index].absolute_center = absolute;
        }
    }

    // ========================================================================
    // Dragging
    // ========================================================================

    /// Move a node by `(dx, dy)` relative to its parent.
    ///
    /// Ancestors that no longer contain the moved node grow their radius just
    /// enough to enclose it again (queuing `NodeRimChanged`); if the root has
    /// to grow, `SizeExpanded` is queued. Returns the nodes whose absolute
    /// circle changed.
    pub fn drag(&mut self, id: NodeId, dx: f64, dy: f64, styles: &VisualizationStyles) -> Result<Vec<NodeId>, String> {
        if id == NodeId::ROOT {
            return Ok(Vec::new());
        }
        let delta = Vector::try_new(dx, dy)?;
        let chain = self.self_and_predecessors_until_exclusively(id, NodeId::ROOT)?;

        let node = self.get_mut(id);
        node.circle.center = node.circle.center.add(delta);
        let full_name = node.full_name.clone();
        self.bring_to_front(id);
        self.push_event(GraphEvent::Drag { node: full_name });

        let mut changed = vec![id];
        changed.extend(self.descendants(id));

        let padding = styles.circle_padding;
        for &child in &chain {
            let parent = self.get(child).parent;
            let child_circle = self.get(child).circle;
            let parent_radius = self.get(parent).radius();
            // Tolerate rounding noise from the layout, which places children exactly on the rim
            let parent_shape = Circle::new(Vector::ZERO, parent_radius + CONTAINMENT_TOLERANCE);
            if parent_shape.contains_relative_circle(&child_circle, padding) {
                break;
            }

            let needed = child_circle.center.length() + child_circle.r + padding;
            let parent_node = self.get_mut(parent);
            parent_node.circle.r = needed;
            if parent_node.label_on_rim {
                parent_node.label_offset = -(needed - styles.node_font_size);
            }
            trace!("{} grows to radius {:.1}", parent_node.full_name, needed);

            if parent == NodeId::ROOT {
                self.push_event(GraphEvent::SizeExpanded {
                    half_width: needed,
                    half_height: needed,
                });
            } else {
                let parent_name = self.get(parent).full_name.clone();
                self.push_event(GraphEvent::NodeRimChanged { node: parent_name });
                changed.push(parent);
            }
        }

        self.update_absolute_positions();
        Ok(changed)
    }

    // ========================================================================
    // Z-order
    // ========================================================================

    /// Draw the node above all of its siblings.
    pub fn bring_to_front(&mut self, id: NodeId) {
        self.z_counter += 1;
        let z = self.z_counter;
        self.get_mut(id).z_index = z;
    }

    /// Whether `a` is drawn in front of `b`. Descendants are always in front
    /// of their ancestors; otherwise the z-index of the two diverging
    /// ancestors below the common ancestor decides.
    pub fn is_in_front_of(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let mut chain_a = self.self_and_predecessors(a);
        let mut chain_b = self.self_and_predecessors(b);
        if chain_a.contains(&b) {
            return true;
        }
        if chain_b.contains(&a) {
            return false;
        }
        chain_a.reverse();
        chain_b.reverse();
        let diverging = chain_a
            .iter()
            .zip(chain_b.iter())
            .find(|(x, y)| x != y);
        match diverging {
            Some((&x, &y)) => self.get(x).z_index > self.get(y).z_index,
            None => false,
        }
    }

    /// Current children sorted back to front
    pub fn children_in_draw_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.get(id).current_children().to_vec();
        children.sort_by_key(|&c| self.get(c).z_index);
        children
    }
}

#[cfg(test)]
mod tests {
    use crate::events::GraphEvent;
    use crate::node::tests::{sample_tree, tree_of};
    use crate::node::{NodeId, NodeTree};
    use crate::settings::VisualizationStyles;

    fn label_width(text: &str) -> f64 {
        text.len() as f64 * 6.0
    }

    fn assert_layout_invariants(tree: &NodeTree, padding: f64) {
        for id in tree.visible_nodes() {
            let node = tree.get(id);
            let parent = tree.get(node.parent());
            let distance = node.absolute_center().distance_to(parent.absolute_center());
            assert!(
                distance + node.radius() + padding <= parent.radius() + 1e-6,
                "{} leaves {}",
                node.full_name(),
                parent.full_name()
            );
            for &sibling in parent.current_children() {
                if sibling <= id {
                    continue;
                }
                let other = tree.get(sibling);
                let gap = node.absolute_center().distance_to(other.absolute_center());
                assert!(
                    gap + 1e-3 >= node.radius() + other.radius() + 2.0 * padding,
                    "{} overlaps {}",
                    node.full_name(),
                    other.full_name()
                );
            }
        }
    }

    fn wide_tree() -> NodeTree {
        tree_of(&[
            ("com", "package"),
            ("com.a", "package"),
            ("com.a.Alpha", "class"),
            ("com.a.Beta", "class"),
            ("com.a.Gamma", "interface"),
            ("com.a.Gamma$Inner", "class"),
            ("com.b", "package"),
            ("com.b.Delta", "class"),
            ("com.b.Epsilon", "class"),
            ("com.b.VeryLongClassNameForTesting", "class"),
            ("com.c", "package"),
            ("com.c.Zeta", "class"),
            ("org", "package"),
            ("org.Eta", "class"),
        ])
    }

    #[test]
    fn test_relayout_satisfies_containment_and_non_overlap() {
        let styles = VisualizationStyles::default();
        let mut tree = wide_tree();
        tree.relayout(&styles, &label_width);
        assert_layout_invariants(&tree, styles.circle_padding);
        assert!(tree
            .take_events()
            .iter()
            .any(|e| matches!(e, GraphEvent::SizeChanged { .. })));
    }

    #[test]
    fn test_relayout_after_fold_keeps_invariants() {
        let styles = VisualizationStyles::default();
        let mut tree = wide_tree();
        tree.relayout(&styles, &label_width);
        let unfolded_radius = tree.root().radius();
        let a = tree.require("com.a").unwrap();
        let b = tree.require("com.b").unwrap();
        tree.fold(a);
        tree.fold(b);
        tree.relayout(&styles, &label_width);
        assert_layout_invariants(&tree, styles.circle_padding);
        assert!(tree.root().radius() < unfolded_radius);
    }

    #[test]
    fn test_drag_grows_ancestors() {
        let styles = VisualizationStyles::default();
        let mut tree = wide_tree();
        tree.relayout(&styles, &label_width);
        tree.take_events();

        let alpha = tree.require("com.a.Alpha").unwrap();
        let a = tree.require("com.a").unwrap();
        let changed = tree.drag(alpha, 500.0, 0.0, &styles).unwrap();
        assert!(changed.contains(&a));
        assert_layout_containment(&tree, styles.circle_padding);

        let events = tree.take_events();
        assert_eq!(events[0], GraphEvent::Drag { node: "com.a.Alpha".to_string() });
        assert!(events.contains(&GraphEvent::NodeRimChanged { node: "com.a".to_string() }));
        assert!(events.iter().any(|e| matches!(e, GraphEvent::SizeExpanded { .. })));
    }

    fn assert_layout_containment(tree: &NodeTree, padding: f64) {
        for id in tree.visible_nodes() {
            let node = tree.get(id);
            let parent = tree.get(node.parent());
            let distance = node.absolute_center().distance_to(parent.absolute_center());
            assert!(distance + node.radius() + padding <= parent.radius() + 1e-6);
        }
    }

    #[test]
    fn test_small_drag_changes_nothing_else() {
        let styles = VisualizationStyles::default();
        let mut tree = sample_tree();
        tree.relayout(&styles, &label_width);
        tree.take_events();
        let inner = tree.require("my.company.SomeClass$SomeInnerClass").unwrap();
        let before = tree.get(inner).absolute_center();
        let changed = tree.drag(inner, 0.0, 0.0, &styles).unwrap();
        assert_eq!(changed, vec![inner]);
        assert_eq!(tree.get(inner).absolute_center(), before);
        assert_eq!(
            tree.take_events(),
            vec![GraphEvent::Drag { node: "my.company.SomeClass$SomeInnerClass".to_string() }]
        );
    }

    #[test]
    fn test_drag_rejects_non_finite_offsets() {
        let styles = VisualizationStyles::default();
        let mut tree = sample_tree();
        let my = tree.require("my").unwrap();
        assert!(tree.drag(my, f64::NAN, 0.0, &styles).is_err());
        assert!(tree.drag(NodeId::ROOT, 1.0, 1.0, &styles).unwrap().is_empty());
    }

    #[test]
    fn test_z_order() {
        let mut tree = sample_tree();
        let some_class = tree.require("my.company.SomeClass").unwrap();
        let inner = tree.require("my.company.SomeClass$SomeInnerClass").unwrap();
        let other = tree.require("my.company.OtherClass").unwrap();
        let company = tree.require("my.company").unwrap();

        assert!(tree.is_in_front_of(inner, some_class));
        assert!(!tree.is_in_front_of(company, inner));
        assert!(tree.is_in_front_of(other, inner));

        tree.bring_to_front(some_class);
        assert!(tree.is_in_front_of(inner, other));
        assert!(!tree.is_in_front_of(other, some_class));
        assert_eq!(*tree.children_in_draw_order(company).last().unwrap(), some_class);
    }
}
