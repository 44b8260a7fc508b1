//! Geometry primitives shared by the layout engine and the edge anchoring.
//!
//! Everything here works in a y-down screen coordinate system, the same one
//! the SVG surface renders into. Circle centres of nodes are always stored
//! relative to the centre of the parent node.

mod shapes;
mod vector;

pub use shapes::{Circle, Rect, Shape, ZeroShape};
pub use vector::{Vector, DEFAULT_DIRECTION};
