//! Declarative suppression of uninteresting calls.
//!
//! Rules are literal, one per line:
//!
//! ```text
//! # any call named `debug`
//! debug
//! # `isEmpty` on any type whose simple name is StringUtils
//! StringUtils.isEmpty
//! # only this exact owner
//! org.apache.commons.lang3.StringUtils.isBlank
//! # every method of a type
//! Objects.*
//! ```

use crate::error::ConfigError;
use chainscope_api::models::naming::{simple_name, strip_generics};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ANY_METHOD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreRule {
    Method(String),
    TypeMethod { type_name: String, method: String },
    Qualified { type_name: String, method: String },
}

impl IgnoreRule {
    pub fn matches(&self, method: &str, owner: &str) -> bool {
        match self {
            IgnoreRule::Method(name) => name == method,
            IgnoreRule::TypeMethod {
                type_name,
                method: rule_method,
            } => !owner.is_empty() && simple_name(owner) == type_name && method_matches(rule_method, method),
            IgnoreRule::Qualified {
                type_name,
                method: rule_method,
            } => strip_generics(owner) == type_name && method_matches(rule_method, method),
        }
    }
}

fn method_matches(rule: &str, method: &str) -> bool {
    rule == ANY_METHOD || rule == method
}

impl FromStr for IgnoreRule {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rule = text.trim();
        let invalid = |reason: &str| ConfigError::InvalidIgnoreRule {
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        if rule.is_empty() {
            return Err(invalid("empty rule"));
        }
        if rule.chars().any(char::is_whitespace) {
            return Err(invalid("rules may not contain whitespace"));
        }

        let segments: Vec<&str> = rule.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }

        match segments.as_slice() {
            [method] if *method == ANY_METHOD => Err(invalid("a bare '*' would ignore every call")),
            [method] => Ok(IgnoreRule::Method(method.to_string())),
            [type_name, method] => Ok(IgnoreRule::TypeMethod {
                type_name: type_name.to_string(),
                method: method.to_string(),
            }),
            [package @ .., method] => Ok(IgnoreRule::Qualified {
                type_name: package.join("."),
                method: method.to_string(),
            }),
            [] => Err(invalid("empty rule")),
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Method(method) => f.write_str(method),
            IgnoreRule::TypeMethod { type_name, method }
            | IgnoreRule::Qualified { type_name, method } => write!(f, "{}.{}", type_name, method),
        }
    }
}

/// Immutable set of ignore rules. Any matching rule suppresses the call.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    rules: Vec<IgnoreRule>,
}

impl IgnoreFilter {
    pub fn new(rules: Vec<IgnoreRule>) -> Self {
        let mut deduped: Vec<IgnoreRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if !deduped.contains(&rule) {
                deduped.push(rule);
            }
        }
        Self { rules: deduped }
    }

    /// Parse rule text: one rule per line, blank lines and `#` comments skipped.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let rules = parse_rule_lines(text)?;
        Ok(Self::new(rules))
    }

    /// `owner` is the owning type name (simple or qualified), or empty when unknown.
    pub fn is_ignored(&self, method: &str, owner: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(method, owner))
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub(crate) fn parse_rule_lines(text: &str) -> Result<Vec<IgnoreRule>, ConfigError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(IgnoreRule::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(text: &str) -> IgnoreFilter {
        IgnoreFilter::parse(text).unwrap()
    }

    #[test]
    fn bare_method_rule_ignores_any_owner() {
        let f = filter("debug");
        assert!(f.is_ignored("debug", "org.slf4j.Logger"));
        assert!(f.is_ignored("debug", ""));
        assert!(!f.is_ignored("info", "org.slf4j.Logger"));
    }

    #[test]
    fn type_rule_matches_simple_name_only() {
        let f = filter("StringUtils.isEmpty");
        assert!(f.is_ignored("isEmpty", "StringUtils"));
        assert!(f.is_ignored("isEmpty", "org.apache.commons.lang3.StringUtils"));
        assert!(!f.is_ignored("isEmpty", "MyStringUtilsHelper"));
        assert!(!f.is_ignored("isEmpty", ""));
        assert!(!f.is_ignored("isBlank", "StringUtils"));
    }

    #[test]
    fn qualified_rule_requires_exact_owner() {
        let f = filter("org.apache.commons.lang3.StringUtils.isBlank");
        assert!(f.is_ignored("isBlank", "org.apache.commons.lang3.StringUtils"));
        assert!(!f.is_ignored("isBlank", "StringUtils"));
        assert!(!f.is_ignored("isBlank", "com.shop.StringUtils"));
    }

    #[test]
    fn wildcard_method_covers_whole_type() {
        let f = filter("Objects.*");
        assert!(f.is_ignored("requireNonNull", "java.util.Objects"));
        assert!(f.is_ignored("equals", "Objects"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let f = filter("# utilities\n\n  StringUtils.isEmpty  \n# logging\ndebug\n");
        assert_eq!(f.rules().len(), 2);
    }

    #[test]
    fn answers_are_stable() {
        let f = filter("StringUtils.isEmpty\ndebug");
        for _ in 0..3 {
            assert!(f.is_ignored("isEmpty", "StringUtils"));
            assert!(!f.is_ignored("trim", "StringUtils"));
        }
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(IgnoreFilter::parse("StringUtils..isEmpty").is_err());
        assert!(IgnoreFilter::parse(".isEmpty").is_err());
        assert!(IgnoreFilter::parse("StringUtils.").is_err());
        assert!(IgnoreFilter::parse("*").is_err());
        assert!(IgnoreFilter::parse("String Utils.isEmpty").is_err());
    }
}
