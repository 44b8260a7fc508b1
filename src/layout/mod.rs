//! Circle layout of a single node given the sizes of its visible children.
//!
//! The node tree runs these functions bottom-up: children first, so that
//! their radii are known when the parent packs them. All returned positions
//! are relative to the centre of the node being laid out.

pub mod pack;

use crate::geometry::Vector;
use crate::settings::VisualizationStyles;
use pack::{pack_siblings, PackCircle};

/// Upper bound for the radius search of single-child nodes.
const MAX_LABEL_FIT_ITERATIONS: usize = 2_000;

/// Result of laying out one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub radius: f64,
    /// Centres of the children, in the order the radii were given
    pub child_centers: Vec<Vector>,
    /// Vertical offset of the label baseline from the node centre
    pub label_offset: f64,
}

/// A leaf: the label is centred, the radius is driven by the label width.
pub fn layout_leaf(label_width: f64, styles: &VisualizationStyles) -> NodeLayout {
    let radius = (label_width / 2.0 + styles.circle_padding / 2.0).max(styles.min_leaf_radius);
    NodeLayout {
        radius,
        child_centers: Vec::new(),
        label_offset: 0.0,
    }
}

/// An inner node with at least one visible child.
pub fn layout_inner(
    child_radii: &[f64],
    label_width: f64,
    styles: &VisualizationStyles,
) -> NodeLayout {
    match child_radii {
        [] => layout_leaf(label_width, styles),
        [single] => layout_single_child(*single, label_width, styles),
        _ => layout_packed(child_radii, label_width, styles),
    }
}

/// The root has no label; it just encloses its packed children.
pub fn layout_root(child_radii: &[f64], styles: &VisualizationStyles) -> NodeLayout {
    if child_radii.is_empty() {
        return NodeLayout {
            radius: styles.circle_padding,
            child_centers: Vec::new(),
            label_offset: 0.0,
        };
    }
    let (child_centers, radius) = pack_with_padding(child_radii, styles.circle_padding);
    NodeLayout {
        radius,
        child_centers,
        label_offset: 0.0,
    }
}

/// Pack the children inflated by the padding, so that siblings keep twice the
/// padding between each other and the padding to the enclosing rim.
fn pack_with_padding(child_radii: &[f64], padding: f64) -> (Vec<Vector>, f64) {
    let mut circles: Vec<PackCircle> = child_radii
        .iter()
        .map(|r| PackCircle::with_radius(r + padding))
        .collect();
    let radius = pack_siblings(&mut circles);
    let centers = circles.iter().map(|c| Vector::new(c.x, c.y)).collect();
    (centers, radius)
}

fn layout_packed(child_radii: &[f64], label_width: f64, styles: &VisualizationStyles) -> NodeLayout {
    let (child_centers, enclosing) = pack_with_padding(child_radii, styles.circle_padding);
    let font_size = styles.node_font_size;

    // The label sits on the top rim; the chord there has to be wide enough
    let radius = enclosing.max(rim_radius_for_label(label_width, font_size));
    NodeLayout {
        radius,
        child_centers,
        label_offset: -(radius - font_size),
    }
}

/// Smallest radius whose chord at one font size below the top is `label_width` wide
fn rim_radius_for_label(label_width: f64, font_size: f64) -> f64 {
    if font_size <= 0.0 {
        return label_width / 2.0;
    }
    (label_width * label_width / 4.0 + font_size * font_size) / (2.0 * font_size)
}

/// A single child is pushed down (at most half the radius) to make room for
/// the label directly above it.
fn layout_single_child(child_radius: f64, label_width: f64, styles: &VisualizationStyles) -> NodeLayout {
    let font_size = styles.node_font_size;
    let enclosed = child_radius + styles.circle_padding;
    let gap = font_size * 0.25;

    let mut radius = enclosed + font_size + gap;
    let mut offset = child_offset(radius, enclosed);
    let mut label_offset = offset - child_radius - gap;
    for _ in 0..MAX_LABEL_FIT_ITERATIONS {
        offset = child_offset(radius, enclosed);
        label_offset = offset - child_radius - gap;
        let text_top = label_offset - font_size;
        let text_middle = label_offset - font_size / 2.0;
        let half_chord = (radius * radius - text_middle * text_middle).max(0.0).sqrt();
        if text_top >= -radius && half_chord >= label_width / 2.0 {
            break;
        }
        radius = radius * 1.02 + 1.0;
    }

    NodeLayout {
        radius,
        child_centers: vec![Vector::new(0.0, offset)],
        label_offset,
    }
}

fn child_offset(radius: f64, enclosed: f64) -> f64 {
    (radius - enclosed).min(radius / 2.0).max(0.0)
}
