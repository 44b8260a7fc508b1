//! Theme system - CSS custom property-based theming for the graph SVG.
//!
//! Architecture:
//!   - Two required variables: --bg (background) and --fg (foreground)
//!   - Optional enrichment variables: --line, --accent, --muted, --surface, --border, --violation
//!   - Unset optionals fall back to color-mix() derivations from bg + fg

use serde::{Deserialize, Serialize};

/// Built-in color themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Graph color configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphColors {
    /// Background color → CSS variable --bg
    pub bg: String,
    /// Foreground / label color → CSS variable --fg
    pub fg: String,
    /// Dependency line color → CSS variable --line (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    /// Arrow heads → CSS variable --accent (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    /// Secondary text → CSS variable --muted (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<String>,
    /// Class fill tint → CSS variable --surface (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    /// Circle stroke color → CSS variable --border (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    /// Violations → CSS variable --violation (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

impl Default for GraphColors {
    fn default() -> Self {
        Self::from_theme(Theme::Light)
    }
}

impl GraphColors {
    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                bg: "#FFFFFF".to_string(),
                fg: "#333333".to_string(),
                line: Some("#555555".to_string()),
                accent: Some("#333333".to_string()),
                muted: Some("#666666".to_string()),
                surface: Some("#E8EEF6".to_string()),
                border: Some("#7A8CA5".to_string()),
                violation: Some("#D62728".to_string()),
            },
            Theme::Dark => Self {
                bg: "#333333".to_string(),
                fg: "#CCCCCC".to_string(),
                line: Some("#AAAAAA".to_string()),
                accent: Some("#CCCCCC".to_string()),
                muted: Some("#888888".to_string()),
                surface: Some("#1F2020".to_string()),
                border: Some("#CCCCCC".to_string()),
                violation: Some("#FF6B6B".to_string()),
            },
        }
    }
}

/// color-mix() weights for derived CSS variables
pub struct Mix;

impl Mix {
    pub const TEXT_SEC: u8 = 60;
    pub const LINE: u8 = 45;
    pub const ARROW: u8 = 60;
    pub const PACKAGE_FILL: u8 = 4;
    pub const CLASS_FILL: u8 = 10;
    pub const NODE_STROKE: u8 = 35;
}

/// Build the <style> block with the derived CSS variables and the classes
/// the graph tags its elements with.
pub fn build_style_block(font: &str) -> String {
    let derived_vars = format!(
        r#"
    /* Derived from --bg and --fg (overridable via --line, --accent, etc.) */
    --_text:          var(--fg);
    --_text-sec:      var(--muted, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_line:          var(--line, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_arrow:         var(--accent, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_package-fill:  color-mix(in srgb, var(--fg) {}%, var(--bg));
    --_class-fill:    var(--surface, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_node-stroke:   var(--border, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_violation:     var(--violation, red);"#,
        Mix::TEXT_SEC,
        Mix::LINE,
        Mix::ARROW,
        Mix::PACKAGE_FILL,
        Mix::CLASS_FILL,
        Mix::NODE_STROKE,
    );

    format!(
        r#"<style>
  text {{ font-family: '{}', system-ui, sans-serif; fill: var(--_text); }}
  svg {{{}
  }}
  circle {{ stroke: var(--_node-stroke); }}
  .package > circle {{ fill: var(--_package-fill); }}
  .class > circle, .interface > circle {{ fill: var(--_class-fill); }}
  .interface > circle {{ stroke-dasharray: 3 2; }}
  .folded > circle {{ stroke-width: 2; }}
  line.dependency {{ stroke: var(--_line); }}
  line.dependency.violation {{ stroke: var(--_violation); }}
  .violation > circle {{ stroke: var(--_violation); }}
</style>"#,
        font, derived_vars
    )
}

/// Build the SVG opening tag with CSS variables set as inline styles. The
/// view box is centred on the origin.
pub fn svg_open_tag(half_width: f64, half_height: f64, colors: &GraphColors, transparent: bool) -> String {
    let mut vars = vec![format!("--bg:{}", colors.bg), format!("--fg:{}", colors.fg)];

    let optional = [
        ("line", &colors.line),
        ("accent", &colors.accent),
        ("muted", &colors.muted),
        ("surface", &colors.surface),
        ("border", &colors.border),
        ("violation", &colors.violation),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            vars.push(format!("--{}:{}", name, value));
        }
    }

    let vars_str = vars.join(";");
    let bg_style = if transparent {
        ""
    } else {
        ";background:var(--bg)"
    };

    let format_dim = |d: f64| -> String {
        if d.fract() == 0.0 {
            format!("{}", d as i64)
        } else {
            let s = format!("{:.3}", d);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    };

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}" style="{}{}">"#,
        format_dim(-half_width),
        format_dim(-half_height),
        format_dim(2.0 * half_width),
        format_dim(2.0 * half_height),
        format_dim(2.0 * half_width),
        format_dim(2.0 * half_height),
        vars_str,
        bg_style
    )
}
