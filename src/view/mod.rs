//! The drawing surface the graph is rendered onto.
//!
//! The graph never draws itself. It creates elements on a [`DrawingSurface`],
//! tags them with classes and moves them around, either instantly with
//! [`DrawingSurface::jump`] or animated with [`DrawingSurface::transition`].
//! Time is driven from the outside through [`DrawingSurface::advance`].

mod popup;

pub use popup::{DetailPopup, PopupChange, PopupContent, PopupState};

use crate::geometry::Vector;
use crate::settings::VisualizationStyles;
use std::time::Duration;

/// Handle of an element created on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Handle of a running transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub usize);

/// User interactions an element can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Click,
    Drag,
    Hover,
}

/// Target geometry of a jump or transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Position of a group relative to its parent group
    Translate(Vector),
    /// Radius of a circle
    Radius(f64),
    /// Both ends of a line, relative to the line's group
    Line { start: Vector, end: Vector },
    /// Position of a text relative to its group
    TextPosition(Vector),
}

pub trait DrawingSurface {
    /// The top level group
    fn root(&self) -> ElementId;

    fn add_group(&mut self, parent: ElementId, label: &str) -> ElementId;
    fn add_circle(&mut self, parent: ElementId) -> ElementId;
    fn add_line(&mut self, parent: ElementId) -> ElementId;
    fn add_text(&mut self, parent: ElementId, text: &str) -> ElementId;

    fn set_class(&mut self, element: ElementId, class: &str, enabled: bool);
    fn set_visible(&mut self, element: ElementId, visible: bool);

    /// Move an element (with its children) into another group, keeping it last
    fn reparent(&mut self, element: ElementId, parent: ElementId);
    /// Draw an element after its siblings
    fn raise(&mut self, element: ElementId);

    fn listen(&mut self, element: ElementId, kind: InteractionKind);

    /// Apply a geometry immediately, cancelling a running transition of the same kind
    fn jump(&mut self, element: ElementId, geometry: Geometry);
    /// Animate towards a geometry
    fn transition(&mut self, element: ElementId, geometry: Geometry, duration: Duration) -> TransitionId;
    fn is_finished(&self, transition: TransitionId) -> bool;
    /// Let time pass for all running transitions
    fn advance(&mut self, elapsed: Duration);

    /// The drawing area, centred on the root's centre
    fn resize(&mut self, half_width: f64, half_height: f64);
}

/// Text styles the graph measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextClass {
    NodeLabel,
    DependencyTitle,
    DependencyDetail,
}

impl TextClass {
    pub fn font_size(self, styles: &VisualizationStyles) -> f64 {
        match self {
            TextClass::NodeLabel | TextClass::DependencyDetail => styles.node_font_size,
            TextClass::DependencyTitle => styles.dependency_title_font_size,
        }
    }
}

pub trait TextMeasure {
    /// Rendered width of `text` in px
    fn text_width(&self, text: &str, class: TextClass, styles: &VisualizationStyles) -> f64;
}

/// Width estimated from average glyph widths, for surfaces without a real
/// font engine
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTextWidth;

impl TextMeasure for EstimatedTextWidth {
    fn text_width(&self, text: &str, class: TextClass, styles: &VisualizationStyles) -> f64 {
        let weight = match class {
            TextClass::DependencyTitle => 600,
            TextClass::NodeLabel | TextClass::DependencyDetail => 400,
        };
        crate::svg::estimate_text_width(text, class.font_size(styles), weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_width_grows_with_text_and_font() {
        let styles = VisualizationStyles::default();
        let measure = EstimatedTextWidth;
        let short = measure.text_width("Foo", TextClass::NodeLabel, &styles);
        let long = measure.text_width("FooBarBaz", TextClass::NodeLabel, &styles);
        assert!(long > short && short > 0.0);
        let title = measure.text_width("Foo", TextClass::DependencyTitle, &styles);
        assert!(title > short);
        assert_eq!(measure.text_width("", TextClass::NodeLabel, &styles), 0.0);
    }
}
