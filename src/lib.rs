//! archgraph - Layout and consistency engine for interactive dependency graphs
//!
//! This library turns a static-analysis report (a tree of packages and
//! classes plus the dependencies between classes) into a graph of nested
//! circles. Nodes can be folded, dragged and filtered; the drawn dependencies
//! follow every change, grouped onto the nodes that are actually visible.
//!
//! # Example
//!
//! ```rust
//! let nodes = r#"{"name": "default", "fullName": "default", "type": "package", "children": [
//!     {"name": "A", "fullName": "A", "type": "class", "children": []},
//!     {"name": "B", "fullName": "B", "type": "class", "children": []}
//! ]}"#;
//! let dependencies = r#"[{"originClass": "A", "targetClass": "B", "type": "METHOD_CALL", "description": "A calls B"}]"#;
//!
//! let svg = archgraph::render_report_to_svg(nodes, dependencies, None, None).unwrap();
//! assert!(svg.contains("<line"));
//! ```
//!
//! # Architecture
//!
//! - `geometry`, `layout`: vectors, circles and circle packing
//! - `node`: the tree with fold, filter and drag state
//! - `filter`: named filters over nodes and dependencies, and the name pattern language
//! - `dependency`: elementary and grouped dependencies and their line endpoints
//! - `graph`: ties everything together and drives a `view::DrawingSurface`
//! - `svg`: an in-memory drawing surface written out as SVG

pub mod dependency;
pub mod events;
pub mod filter;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod node;
pub mod parser;
pub mod schedule;
pub mod settings;
pub mod svg;
pub mod types;
pub mod view;

pub use events::GraphEvent;
pub use graph::Graph;
pub use parser::parse_report;
pub use settings::{GraphSettings, VisualizationStyles};
pub use types::*;

/// Lay out a report and render it to SVG text.
///
/// # Arguments
/// * `nodes` - JSON class tree
/// * `dependencies` - JSON array of elementary dependencies
/// * `violations` - optional JSON array of violation groups; all of them are shown
/// * `settings` - optional JSON graph settings
pub fn render_report_to_svg(
    nodes: &str,
    dependencies: &str,
    violations: Option<&str>,
    settings: Option<&str>,
) -> Result<String, String> {
    let report = parse_report(nodes, dependencies, violations)?;
    let settings = match settings {
        Some(json) => GraphSettings::from_json(json)?,
        None => GraphSettings::default(),
    };
    let mut graph = Graph::new(report, settings, svg::SvgScene::new())?;
    graph.show_all_violations()?;
    graph.run_until_settled();
    Ok(graph.to_svg(&svg::GraphColors::default(), "Inter"))
}
