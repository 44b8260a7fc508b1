//! Parser for the JSON files of a report.

use crate::types::{JsonDependency, JsonNode, Report, ViolationGroup};
use log::debug;
use std::collections::HashSet;

/// Parse the class tree (`{name, fullName, type, children[]}`)
pub fn parse_nodes(json: &str) -> Result<JsonNode, String> {
    let root: JsonNode =
        serde_json::from_str(json).map_err(|e| format!("invalid node tree: {}", e))?;

    let mut seen = HashSet::new();
    check_unique_names(&root, &mut seen)?;
    debug!("parsed node tree with {} nodes", seen.len());
    Ok(root)
}

fn check_unique_names<'a>(node: &'a JsonNode, seen: &mut HashSet<&'a str>) -> Result<(), String> {
    if !seen.insert(node.full_name.as_str()) {
        return Err(format!("duplicate node full name '{}'", node.full_name));
    }
    for child in &node.children {
        check_unique_names(child, seen)?;
    }
    Ok(())
}

/// Parse the elementary dependencies (`[{originClass, targetClass, type, description}]`)
pub fn parse_dependencies(json: &str) -> Result<Vec<JsonDependency>, String> {
    let dependencies: Vec<JsonDependency> =
        serde_json::from_str(json).map_err(|e| format!("invalid dependencies: {}", e))?;
    debug!("parsed {} elementary dependencies", dependencies.len());
    Ok(dependencies)
}

/// Parse the rule violations (`[{rule, violations[]}]`)
pub fn parse_violations(json: &str) -> Result<Vec<ViolationGroup>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid violations: {}", e))
}

/// Parse a whole report; the violations file is optional.
pub fn parse_report(
    nodes_json: &str,
    dependencies_json: &str,
    violations_json: Option<&str>,
) -> Result<Report, String> {
    let root = parse_nodes(nodes_json)?;
    let dependencies = parse_dependencies(dependencies_json)?;
    let violations = match violations_json {
        Some(json) => parse_violations(json)?,
        None => Vec::new(),
    };
    Ok(Report {
        root,
        dependencies,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nodes() {
        let json = r#"{"name": "default", "fullName": "default", "type": "package", "children": [
            {"name": "my", "fullName": "my", "type": "package", "children": [
                {"name": "Foo", "fullName": "my.Foo", "type": "class", "children": []}
            ]}
        ]}"#;
        let root = parse_nodes(json).unwrap();
        assert_eq!(root.children[0].children[0].full_name, "my.Foo");
    }

    #[test]
    fn test_duplicate_full_names_are_rejected() {
        let json = r#"{"name": "default", "fullName": "default", "type": "package", "children": [
            {"name": "Foo", "fullName": "Foo", "type": "class"},
            {"name": "Foo", "fullName": "Foo", "type": "class"}
        ]}"#;
        let err = parse_nodes(json).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_parse_dependencies() {
        let json = r#"[{"originClass": "a.A", "targetClass": "b.B", "type": "FIELD_ACCESS", "description": "A.x accesses B.y"}]"#;
        let deps = parse_dependencies(json).unwrap();
        assert_eq!(deps[0].origin_class, "a.A");
        assert_eq!(deps[0].dependency_type, "FIELD_ACCESS");
    }

    #[test]
    fn test_parse_report_without_violations() {
        let report = parse_report(
            r#"{"name": "default", "fullName": "default", "type": "package"}"#,
            "[]",
            None,
        )
        .unwrap();
        assert!(report.violations.is_empty());
        assert!(report.root.children.is_empty());
    }
}
