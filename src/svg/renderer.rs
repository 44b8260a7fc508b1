//! SVG renderer - writes an [`SvgScene`] as a standalone SVG document.
//!
//! Pure string building. Elements are written in scene order, so later
//! siblings are drawn on top. Hidden elements are left out.

use super::scene::{ElementKind, SceneElement, SvgScene};
use super::styles::{ArrowHead, StrokeWidths, TEXT_BASELINE_SHIFT};
use super::theme::{build_style_block, svg_open_tag, GraphColors};
use crate::view::{DrawingSurface, ElementId};

/// Render the current state of a scene as an SVG string.
pub fn render_scene(scene: &SvgScene, colors: &GraphColors, font: &str, transparent: bool) -> String {
    let (half_width, half_height) = scene.size();
    let mut parts: Vec<String> = Vec::new();

    parts.push(svg_open_tag(half_width, half_height, colors, transparent));
    parts.push(build_style_block(font));
    parts.push("<defs>".to_string());
    parts.push(arrow_marker_defs());
    parts.push("</defs>".to_string());

    for &child in &scene.element(scene.root()).children {
        render_element(scene, child, 1, &mut parts);
    }

    parts.push("</svg>".to_string());
    parts.join("\n")
}

// ============================================================================
// Arrow marker definitions
// ============================================================================

fn arrow_marker_defs() -> String {
    let w = ArrowHead::WIDTH;
    let h = ArrowHead::HEIGHT;
    format!(
        r#"  <marker id="arrowhead" markerWidth="{w}" markerHeight="{h}" refX="{w}" refY="{half_h}" orient="auto">
    <polygon points="0 0, {w} {half_h}, 0 {h}" fill="var(--_arrow)" />
  </marker>"#,
        w = w,
        h = h,
        half_h = h / 2.0
    )
}

// ============================================================================
// Elements
// ============================================================================

fn render_element(scene: &SvgScene, id: ElementId, depth: usize, parts: &mut Vec<String>) {
    let element = scene.element(id);
    if !element.visible {
        return;
    }
    let indent = "  ".repeat(depth);
    match &element.kind {
        ElementKind::Group { label } => {
            parts.push(format!(
                r#"{}<g{} data-name="{}" transform="translate({},{})">"#,
                indent,
                class_attribute(element),
                escape_xml(label),
                fmt_num(element.translate.x),
                fmt_num(element.translate.y)
            ));
            for &child in &element.children {
                render_element(scene, child, depth + 1, parts);
            }
            parts.push(format!("{}</g>", indent));
        }
        ElementKind::Circle => parts.push(format!(
            r#"{}<circle{} cx="0" cy="0" r="{}" stroke-width="{}" />"#,
            indent,
            class_attribute(element),
            fmt_num(element.radius),
            StrokeWidths::NODE
        )),
        ElementKind::Line => {
            let (start, end) = element.line;
            parts.push(format!(
                r#"{}<line{} x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="{}" marker-end="url(#arrowhead)" />"#,
                indent,
                class_attribute(element),
                fmt_num(start.x),
                fmt_num(start.y),
                fmt_num(end.x),
                fmt_num(end.y),
                StrokeWidths::DEPENDENCY
            ))
        }
        ElementKind::Text { text } => parts.push(format!(
            r#"{}<text{} x="{}" y="{}" text-anchor="middle" dy="{}">{}</text>"#,
            indent,
            class_attribute(element),
            fmt_num(element.text_position.x),
            fmt_num(element.text_position.y),
            TEXT_BASELINE_SHIFT,
            escape_xml(text)
        )),
    }
}

fn class_attribute(element: &SceneElement) -> String {
    if element.classes.is_empty() {
        String::new()
    } else {
        format!(r#" class="{}""#, escape_xml(&element.classes.join(" ")))
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Escape special XML characters in text content
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Format a coordinate with at most three decimals, without trailing zeros.
fn fmt_num(n: f64) -> String {
    let s = format!("{:.3}", n);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector;
    use crate::view::Geometry;

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(1.25), "1.25");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(2.0 / 3.0), "0.667");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b> & \"c\""), "a&lt;b&gt; &amp; &quot;c&quot;");
    }

    #[test]
    fn test_render_nested_groups_and_skip_hidden() {
        let mut scene = SvgScene::new();
        scene.resize(50.0, 50.0);
        let root = scene.root();
        let group = scene.add_group(root, "my.Foo");
        scene.set_class(group, "class", true);
        scene.jump(group, Geometry::Translate(Vector::new(10.0, -5.5)));
        let circle = scene.add_circle(group);
        scene.jump(circle, Geometry::Radius(20.0));
        scene.add_text(group, "Foo<T>");
        let hidden = scene.add_line(root);
        scene.set_visible(hidden, false);

        let svg = render_scene(&scene, &GraphColors::default(), "Inter", false);
        assert!(svg.contains(r#"<g class="class" data-name="my.Foo" transform="translate(10,-5.5)">"#));
        assert!(svg.contains(r#"r="20""#));
        assert!(svg.contains("Foo&lt;T&gt;"));
        assert!(!svg.contains("<line"));
        assert!(svg.ends_with("</svg>"));
    }
}
