//! Shapes that can enclose node circles.
//!
//! Each shape answers two questions about a circle given relative to the
//! shape's own centre: does it fit (keeping a padding to the border), and
//! where does it have to go to fit.

use super::Vector;
use serde::{Deserialize, Serialize};

/// Capabilities a shape needs to act as the container of node circles.
pub trait Shape {
    /// Whether `inner` (centre relative to this shape's centre) fits completely,
    /// keeping `padding` distance to the border.
    fn contains_relative_circle(&self, inner: &Circle, padding: f64) -> bool;

    /// Move `inner` the shortest way back inside if it does not fit.
    fn translate_enclosed_circle_into(&self, inner: &mut Circle, padding: f64);
}

/// A circle; for nodes the centre is relative to the parent's centre.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vector,
    pub r: f64,
}

impl Circle {
    pub const fn new(center: Vector, r: f64) -> Self {
        Self { center, r }
    }

    pub fn overlaps_with(&self, other: &Circle) -> bool {
        self.center.distance_to(other.center) <= self.r + other.r
    }

    pub fn contains_point(&self, point: Vector) -> bool {
        self.center.distance_to(point) <= self.r
    }

    /// Same circle, centre shifted by `offset`
    pub fn translated(&self, offset: Vector) -> Circle {
        Circle::new(self.center.add(offset), self.r)
    }
}

impl Shape for Circle {
    fn contains_relative_circle(&self, inner: &Circle, padding: f64) -> bool {
        inner.center.length() + inner.r + padding <= self.r
    }

    fn translate_enclosed_circle_into(&self, inner: &mut Circle, padding: f64) {
        if !self.contains_relative_circle(inner, padding) {
            let max_distance = (self.r - inner.r - padding).max(0.0);
            inner.center = inner.center.norm(max_distance);
        }
    }
}

/// An axis aligned rectangle centred at the origin; used for the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub half_width: f64,
    pub half_height: f64,
}

impl Rect {
    pub const fn new(half_width: f64, half_height: f64) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    /// Smallest rectangle around the origin containing `circle`
    pub fn enclosing(circle: &Circle) -> Self {
        Self::new(
            circle.center.x.abs() + circle.r,
            circle.center.y.abs() + circle.r,
        )
    }
}

impl Shape for Rect {
    fn contains_relative_circle(&self, inner: &Circle, padding: f64) -> bool {
        inner.center.x.abs() + inner.r + padding <= self.half_width
            && inner.center.y.abs() + inner.r + padding <= self.half_height
    }

    fn translate_enclosed_circle_into(&self, inner: &mut Circle, padding: f64) {
        let max_x = (self.half_width - inner.r - padding).max(0.0);
        let max_y = (self.half_height - inner.r - padding).max(0.0);
        inner.center = Vector::new(
            inner.center.x.clamp(-max_x, max_x),
            inner.center.y.clamp(-max_y, max_y),
        );
    }
}

/// The invisible shape around the root node: encloses everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZeroShape;

impl Shape for ZeroShape {
    fn contains_relative_circle(&self, _inner: &Circle, _padding: f64) -> bool {
        true
    }

    fn translate_enclosed_circle_into(&self, _inner: &mut Circle, _padding: f64) {}
}
