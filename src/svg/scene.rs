//! In-memory drawing surface that records elements and animates them in
//! virtual time, to be written out as SVG with [`super::render_scene`].

use crate::geometry::Vector;
use crate::view::{DrawingSurface, ElementId, Geometry, InteractionKind, TransitionId};
use log::trace;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Group { label: String },
    Circle,
    Line,
    Text { text: String },
}

/// One recorded element and its current geometry
#[derive(Debug, Clone, PartialEq)]
pub struct SceneElement {
    pub kind: ElementKind,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub classes: Vec<String>,
    pub visible: bool,
    pub translate: Vector,
    pub radius: f64,
    pub line: (Vector, Vector),
    pub text_position: Vector,
    pub listeners: Vec<InteractionKind>,
}

impl SceneElement {
    fn new(kind: ElementKind, parent: Option<ElementId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            classes: Vec::new(),
            visible: true,
            translate: Vector::ZERO,
            radius: 0.0,
            line: (Vector::ZERO, Vector::ZERO),
            text_position: Vector::ZERO,
            listeners: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn geometry_of_same_kind(&self, geometry: &Geometry) -> Geometry {
        match geometry {
            Geometry::Translate(_) => Geometry::Translate(self.translate),
            Geometry::Radius(_) => Geometry::Radius(self.radius),
            Geometry::Line { .. } => Geometry::Line {
                start: self.line.0,
                end: self.line.1,
            },
            Geometry::TextPosition(_) => Geometry::TextPosition(self.text_position),
        }
    }

    fn apply(&mut self, geometry: Geometry) {
        match geometry {
            Geometry::Translate(v) => self.translate = v,
            Geometry::Radius(r) => self.radius = r,
            Geometry::Line { start, end } => self.line = (start, end),
            Geometry::TextPosition(v) => self.text_position = v,
        }
    }
}

#[derive(Debug, Clone)]
struct Transition {
    id: TransitionId,
    element: ElementId,
    from: Geometry,
    to: Geometry,
    elapsed: Duration,
    duration: Duration,
}

fn same_kind(a: &Geometry, b: &Geometry) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn lerp(a: Vector, b: Vector, t: f64) -> Vector {
    a.add(b.sub(a).scale(t))
}

fn interpolate(from: &Geometry, to: &Geometry, t: f64) -> Geometry {
    match (from, to) {
        (Geometry::Translate(a), Geometry::Translate(b)) => Geometry::Translate(lerp(*a, *b, t)),
        (Geometry::Radius(a), Geometry::Radius(b)) => Geometry::Radius(a + (b - a) * t),
        (Geometry::Line { start: s1, end: e1 }, Geometry::Line { start: s2, end: e2 }) => Geometry::Line {
            start: lerp(*s1, *s2, t),
            end: lerp(*e1, *e2, t),
        },
        (Geometry::TextPosition(a), Geometry::TextPosition(b)) => Geometry::TextPosition(lerp(*a, *b, t)),
        _ => *to,
    }
}

/// A [`DrawingSurface`] that keeps everything in memory
#[derive(Debug, Clone)]
pub struct SvgScene {
    elements: Vec<SceneElement>,
    running: Vec<Transition>,
    next_transition: usize,
    half_width: f64,
    half_height: f64,
}

impl Default for SvgScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgScene {
    pub fn new() -> Self {
        Self {
            elements: vec![SceneElement::new(
                ElementKind::Group {
                    label: String::new(),
                },
                None,
            )],
            running: Vec::new(),
            next_transition: 0,
            half_width: 0.0,
            half_height: 0.0,
        }
    }

    pub fn element(&self, id: ElementId) -> &SceneElement {
        &self.elements[id.0]
    }

    pub fn elements(&self) -> &[SceneElement] {
        &self.elements
    }

    pub fn size(&self) -> (f64, f64) {
        (self.half_width, self.half_height)
    }

    pub fn running_transitions(&self) -> usize {
        self.running.len()
    }

    /// The group created with the given label
    pub fn find_group(&self, label: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| matches!(&e.kind, ElementKind::Group { label: l } if l == label))
            .map(ElementId)
    }

    /// Absolute position of an element: the sum of its and all enclosing translations
    pub fn absolute_translation(&self, id: ElementId) -> Vector {
        let mut position = Vector::ZERO;
        let mut current = Some(id);
        while let Some(element) = current {
            position = position.add(self.elements[element.0].translate);
            current = self.elements[element.0].parent;
        }
        position
    }

    fn add(&mut self, parent: ElementId, kind: ElementKind) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(SceneElement::new(kind, Some(parent)));
        self.elements[parent.0].children.push(id);
        id
    }

    fn cancel(&mut self, element: ElementId, geometry: &Geometry) {
        self.running
            .retain(|t| !(t.element == element && same_kind(&t.to, geometry)));
    }
}

impl DrawingSurface for SvgScene {
    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn add_group(&mut self, parent: ElementId, label: &str) -> ElementId {
        self.add(
            parent,
            ElementKind::Group {
                label: label.to_string(),
            },
        )
    }

    fn add_circle(&mut self, parent: ElementId) -> ElementId {
        self.add(parent, ElementKind::Circle)
    }

    fn add_line(&mut self, parent: ElementId) -> ElementId {
        self.add(parent, ElementKind::Line)
    }

    fn add_text(&mut self, parent: ElementId, text: &str) -> ElementId {
        self.add(
            parent,
            ElementKind::Text {
                text: text.to_string(),
            },
        )
    }

    fn set_class(&mut self, element: ElementId, class: &str, enabled: bool) {
        let classes = &mut self.elements[element.0].classes;
        let present = classes.iter().any(|c| c == class);
        if enabled && !present {
            classes.push(class.to_string());
        } else if !enabled && present {
            classes.retain(|c| c != class);
        }
    }

    fn set_visible(&mut self, element: ElementId, visible: bool) {
        self.elements[element.0].visible = visible;
    }

    fn reparent(&mut self, element: ElementId, parent: ElementId) {
        if let Some(old) = self.elements[element.0].parent {
            self.elements[old.0].children.retain(|c| *c != element);
        }
        self.elements[element.0].parent = Some(parent);
        self.elements[parent.0].children.push(element);
    }

    fn raise(&mut self, element: ElementId) {
        if let Some(parent) = self.elements[element.0].parent {
            let children = &mut self.elements[parent.0].children;
            children.retain(|c| *c != element);
            children.push(element);
        }
    }

    fn listen(&mut self, element: ElementId, kind: InteractionKind) {
        let listeners = &mut self.elements[element.0].listeners;
        if !listeners.contains(&kind) {
            listeners.push(kind);
        }
    }

    fn jump(&mut self, element: ElementId, geometry: Geometry) {
        self.cancel(element, &geometry);
        self.elements[element.0].apply(geometry);
    }

    fn transition(&mut self, element: ElementId, geometry: Geometry, duration: Duration) -> TransitionId {
        self.cancel(element, &geometry);
        let id = TransitionId(self.next_transition);
        self.next_transition += 1;
        if duration.is_zero() {
            self.elements[element.0].apply(geometry);
            return id;
        }
        let from = self.elements[element.0].geometry_of_same_kind(&geometry);
        self.running.push(Transition {
            id,
            element,
            from,
            to: geometry,
            elapsed: Duration::ZERO,
            duration,
        });
        id
    }

    fn is_finished(&self, transition: TransitionId) -> bool {
        !self.running.iter().any(|t| t.id == transition)
    }

    fn advance(&mut self, elapsed: Duration) {
        for transition in self.running.iter_mut() {
            transition.elapsed = (transition.elapsed + elapsed).min(transition.duration);
            let t = transition.elapsed.as_secs_f64() / transition.duration.as_secs_f64();
            let geometry = interpolate(&transition.from, &transition.to, t);
            self.elements[transition.element.0].apply(geometry);
        }
        let before = self.running.len();
        self.running.retain(|t| t.elapsed < t.duration);
        if before != self.running.len() {
            trace!("{} transitions finished", before - self.running.len());
        }
    }

    fn resize(&mut self, half_width: f64, half_height: f64) {
        self.half_width = half_width;
        self.half_height = half_height;
    }
}
