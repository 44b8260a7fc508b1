//! Runtime configuration: visualization styles and graph settings.
//!
//! Both structs deserialize from partial JSON; every field that is missing
//! falls back to its default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sizes the layout depends on. Mutable at runtime; changing them forces a
/// relayout (see `Graph::set_styles`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizationStyles {
    /// Minimum distance between a node's circle and its parent's rim
    pub circle_padding: f64,
    /// Font size of node labels (px)
    pub node_font_size: f64,
    /// Font size of the detailed dependency popup title (px)
    pub dependency_title_font_size: f64,
    /// Smallest radius a leaf node is drawn with
    pub min_leaf_radius: f64,
    /// Duration of animated node / dependency transitions (ms)
    pub transition_duration_ms: u64,
}

impl Default for VisualizationStyles {
    fn default() -> Self {
        Self {
            circle_padding: 5.0,
            node_font_size: 10.0,
            dependency_title_font_size: 12.0,
            min_leaf_radius: 20.0,
            transition_duration_ms: 300,
        }
    }
}

impl VisualizationStyles {
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }
}

/// Everything configurable about a graph besides its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphSettings {
    pub styles: VisualizationStyles,
    /// Dependency types drawn in their own color (none by default)
    pub colored_dependency_types: Vec<String>,
    /// Dependency types drawn dashed (none by default)
    pub dashed_dependency_types: Vec<String>,
    /// Nodes folded right after loading
    pub initially_folded: Vec<String>,
    /// Fold every inner node right after loading
    pub fold_all_initially: bool,
    /// Whether dependencies between a class and its inner classes are drawn
    pub show_dependencies_between_class_and_its_inner_classes: bool,
    /// Delay before the detailed dependency popup shows up (ms)
    pub popup_show_delay_ms: u64,
    /// Delay before the detailed dependency popup disappears (ms)
    pub popup_hide_delay_ms: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            styles: VisualizationStyles::default(),
            colored_dependency_types: Vec::new(),
            dashed_dependency_types: Vec::new(),
            initially_folded: Vec::new(),
            fold_all_initially: false,
            show_dependencies_between_class_and_its_inner_classes: true,
            popup_show_delay_ms: 300,
            popup_hide_delay_ms: 200,
        }
    }
}

impl GraphSettings {
    /// Parse settings from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid settings: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = GraphSettings::from_json(r#"{"styles": {"circlePadding": 8}}"#).unwrap();
        assert_eq!(settings.styles.circle_padding, 8.0);
        assert_eq!(settings.styles.node_font_size, 10.0);
        assert!(settings.colored_dependency_types.is_empty());
        assert_eq!(settings.popup_show_delay_ms, 300);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(GraphSettings::from_json("{\"styles\": 3}").is_err());
    }
}
