//! Type definitions for the report data the graph is built from.
//!
//! These mirror the JSON written by the report generator field by field, so
//! that reports round-trip through serde without loss.

use serde::{Deserialize, Serialize};

/// One node of the class tree as found in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonNode {
    pub name: String,
    pub full_name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub children: Vec<JsonNode>,
}

/// One elementary dependency as found in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDependency {
    pub origin_class: String,
    pub target_class: String,
    #[serde(rename = "type")]
    pub dependency_type: String,
    #[serde(default)]
    pub description: String,
}

/// Violations of one architecture rule. Each violation is the description of
/// the elementary dependency that violates the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationGroup {
    pub rule: String,
    #[serde(default)]
    pub violations: Vec<String>,
}

/// Kind of a node in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Package,
    Class,
    Interface,
}

impl NodeKind {
    /// Map the report's `type` attribute; every non-package type is class-like.
    pub fn from_json_type(node_type: &str) -> Self {
        match node_type.to_lowercase().as_str() {
            "package" => NodeKind::Package,
            "interface" => NodeKind::Interface,
            _ => NodeKind::Class,
        }
    }

    pub fn is_package(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Package)
    }

    pub fn css_class(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Package => "package",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
        }
    }
}

/// Full report: class tree, elementary dependencies and rule violations
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub root: JsonNode,
    pub dependencies: Vec<JsonDependency>,
    pub violations: Vec<ViolationGroup>,
}

/// Whether `name` denotes `ancestor` itself or something nested inside it
/// (`my.company` contains `my.company.Foo` and `my.company.Foo$Bar`).
pub fn is_self_or_descendant_name(name: &str, ancestor: &str) -> bool {
    match name.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('$'),
        None => false,
    }
}
