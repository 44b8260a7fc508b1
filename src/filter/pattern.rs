//! The name filter pattern language.
//!
//! A pattern is a `|` separated list of options, each trimmed:
//!
//! - `*` matches any sequence of characters,
//! - an option starting with `~` excludes the names it matches,
//! - an option without a trailing `*` also matches everything nested inside
//!   it (`my.company` matches `my.company.Foo$Bar`).
//!
//! A name matches if it matches at least one including option (or there is
//! none) and no excluding option. The empty pattern matches everything.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPTION_SEPARATOR: Regex = Regex::new(r"\s*\|\s*").unwrap();
    static ref WILDCARD_RUN: Regex = Regex::new(r"\*+").unwrap();
}

/// A compiled filter pattern
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for option in OPTION_SEPARATOR.split(pattern.trim()) {
            let (target, option) = match option.strip_prefix('~') {
                Some(rest) => (&mut excludes, rest.trim()),
                None => (&mut includes, option),
            };
            if option.is_empty() {
                continue;
            }
            target.push(compile_option(option)?);
        }
        Ok(Self {
            source: pattern.to_string(),
            includes,
            excludes,
        })
    }

    /// The pattern that matches every name
    pub fn match_all() -> Self {
        Self {
            source: String::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches_everything(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn matches(&self, full_name: &str) -> bool {
        let included = self.includes.is_empty() || self.includes.iter().any(|r| r.is_match(full_name));
        included && !self.excludes.iter().any(|r| r.is_match(full_name))
    }

    /// Turn the pattern into a boxed predicate over full names
    pub fn into_predicate(self) -> Box<dyn Fn(&str) -> bool> {
        Box::new(move |name| self.matches(name))
    }
}

fn compile_option(option: &str) -> Result<Regex, String> {
    let ends_with_wildcard = option.ends_with('*');
    let escaped = WILDCARD_RUN
        .split(option)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let nested = if ends_with_wildcard { "" } else { r"(?:[.$].*)?" };
    Regex::new(&format!("^{}{}$", escaped, nested))
        .map_err(|e| format!("invalid filter option '{}': {}", option, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        NamePattern::parse(pattern).unwrap().matches(name)
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(matches("", "my.company.Foo"));
        assert!(matches("   ", "anything"));
        assert!(NamePattern::parse("").unwrap().matches_everything());
    }

    #[test]
    fn test_plain_option_matches_nested_names() {
        assert!(matches("my.company", "my.company"));
        assert!(matches("my.company", "my.company.Foo"));
        assert!(matches("my.company.Foo", "my.company.Foo$Inner"));
        assert!(!matches("my.company", "my.companyX.Foo"));
        assert!(!matches("my.company", "other.my.company"));
    }

    #[test]
    fn test_wildcards() {
        assert!(matches("*Foo", "my.company.Foo"));
        assert!(matches("my.*.Foo", "my.company.Foo"));
        assert!(matches("my.comp*", "my.companyX"));
        assert!(!matches("*Foo", "my.company.Bar"));
        // dots are literal
        assert!(!matches("my.company", "myXcompany"));
    }

    #[test]
    fn test_alternation_and_trimming() {
        let pattern = NamePattern::parse(" my.a |  my.b ").unwrap();
        assert!(pattern.matches("my.a.Foo"));
        assert!(pattern.matches("my.b"));
        assert!(!pattern.matches("my.c"));
    }

    #[test]
    fn test_exclusion() {
        assert!(!matches("~*Test", "my.FooTest"));
        assert!(matches("~*Test", "my.Foo"));
        assert!(matches("my.* | ~my.internal", "my.api.Foo"));
        assert!(!matches("my.* | ~my.internal", "my.internal.Foo"));
        assert!(matches("~ my.internal", "my.api"));
    }

    #[test]
    fn test_into_predicate() {
        let predicate = NamePattern::parse("*.Foo").unwrap().into_predicate();
        assert!(predicate("my.Foo"));
        assert!(!predicate("my.Bar"));
    }
}
