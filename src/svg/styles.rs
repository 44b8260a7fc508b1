//! Font metrics and styling constants.

/// Average character width in px at the given font size and weight
pub fn estimate_text_width(text: &str, font_size: f64, font_weight: u32) -> f64 {
    // Average character widths as fraction of fontSize, per weight.
    // Heavier weights are slightly wider.
    let width_ratio = if font_weight >= 600 {
        0.58
    } else if font_weight >= 500 {
        0.55
    } else {
        0.52
    };
    text.chars().count() as f64 * font_size * width_ratio
}

/// Stroke widths per element type (in px)
pub struct StrokeWidths;

impl StrokeWidths {
    pub const NODE: f64 = 1.0;
    pub const DEPENDENCY: f64 = 1.0;
}

/// Arrow head dimensions
pub struct ArrowHead;

impl ArrowHead {
    pub const WIDTH: f64 = 8.0;
    pub const HEIGHT: f64 = 4.8;
}

/// Vertical shift applied to all text elements for font-agnostic centering.
pub const TEXT_BASELINE_SHIFT: &str = "0.35em";
