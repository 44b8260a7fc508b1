//! SVG output - an in-memory drawing surface and its serialization.
//!
//! [`SvgScene`] implements [`crate::view::DrawingSurface`]; once the graph has
//! settled, [`render_scene`] turns it into a standalone SVG document themed
//! through CSS custom properties.
//!
//! Pure string building, no DOM manipulation.

mod renderer;
mod scene;
mod styles;
mod theme;

pub use renderer::{escape_xml, render_scene};
pub use scene::{ElementKind, SceneElement, SvgScene};
pub use styles::estimate_text_width;
pub use theme::{GraphColors, Theme};
