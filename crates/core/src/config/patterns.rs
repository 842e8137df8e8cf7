//! Named generic patterns for well-known base types.
//!
//! An entry declares the generic shape of an ancestor the project extends but
//! does not contain (for example `ServiceImpl<M, T>` with a member
//! `baseMapper: M`), and how to synthesize a concrete type for each parameter
//! position when a subclass uses the ancestor raw.

use crate::error::ConfigError;
use chainscope_api::TypeRef;
use chainscope_api::models::naming::simple_name;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct PatternSlot {
    /// Role name of the parameter position, e.g. `mapper`
    pub role: String,
    /// Appended to the subclass stem when synthesizing a name
    #[serde(default)]
    pub suffix: String,
    /// Catalog type to consult when the synthesized type is not indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct PatternMember {
    pub name: String,
    /// Declared type in terms of the entry's parameters
    pub type_expr: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct PatternEntry {
    /// Simple or qualified ancestor name
    pub ancestor: String,
    pub parameters: Vec<String>,
    /// One slot per parameter position, in order; may be shorter than `parameters`
    #[serde(default)]
    pub slots: Vec<PatternSlot>,
    #[serde(default)]
    pub members: Vec<PatternMember>,
    /// Suffixes stripped from the subclass name, first match wins
    #[serde(default)]
    pub strip_suffixes: Vec<String>,
}

/// A validated pattern entry with member types parsed.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub entry: PatternEntry,
    pub members: Vec<(String, TypeRef)>,
}

impl Pattern {
    pub fn ancestor(&self) -> &str {
        &self.entry.ancestor
    }

    pub fn parameters(&self) -> &[String] {
        &self.entry.parameters
    }

    pub fn slot(&self, position: usize) -> Option<&PatternSlot> {
        self.entry.slots.get(position)
    }

    pub fn member(&self, name: &str) -> Option<&TypeRef> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, ty)| ty)
    }

    /// Synthesize the concrete type name for `position` given the subclass simple name.
    ///
    /// `OrderServiceImpl` with suffixes `["ServiceImpl"]` and slot suffix `Mapper`
    /// yields `OrderMapper`.
    pub fn synthesize(&self, subclass: &str, position: usize) -> Option<String> {
        let slot = self.slot(position)?;
        let subclass = simple_name(subclass);
        let stem = self
            .entry
            .strip_suffixes
            .iter()
            .find(|suffix| !suffix.is_empty() && subclass.ends_with(suffix.as_str()))
            .map(|suffix| &subclass[..subclass.len() - suffix.len()])
            .unwrap_or(subclass);
        if stem.is_empty() {
            return None;
        }
        Some(format!("{}{}", stem, slot.suffix))
    }
}

/// Ordered pattern table. Earlier entries win when two match the same ancestor.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<Pattern>,
}

impl PatternTable {
    pub fn new(entries: Vec<PatternEntry>) -> Result<Self, ConfigError> {
        let patterns = entries
            .into_iter()
            .map(validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Match by simple name; a qualified entry also requires the qualified name when one is known.
    pub fn find(&self, ancestor: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| {
            let wanted = p.ancestor();
            if wanted.contains('.') && ancestor.contains('.') {
                wanted == ancestor
            } else {
                simple_name(wanted) == simple_name(ancestor)
            }
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &PatternEntry> {
        self.patterns.iter().map(|p| &p.entry)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn validate(entry: PatternEntry) -> Result<Pattern, ConfigError> {
    let ancestor = entry.ancestor.trim();
    if ancestor.is_empty() {
        return Err(ConfigError::EmptyPatternAncestor);
    }

    let mut seen = HashSet::new();
    for parameter in &entry.parameters {
        if !seen.insert(parameter.as_str()) {
            return Err(ConfigError::DuplicateParameter {
                ancestor: ancestor.to_string(),
                parameter: parameter.clone(),
            });
        }
    }

    if entry.slots.len() > entry.parameters.len() {
        return Err(ConfigError::TooManySlots {
            ancestor: ancestor.to_string(),
            slots: entry.slots.len(),
            parameters: entry.parameters.len(),
        });
    }

    let mut members = Vec::with_capacity(entry.members.len());
    for member in &entry.members {
        let ty = TypeRef::parse(&member.type_expr).map_err(|source| ConfigError::InvalidMemberType {
            ancestor: ancestor.to_string(),
            member: member.name.clone(),
            source,
        })?;
        let base = ty.base_name().unwrap_or_default();
        if !entry.parameters.iter().any(|p| p == base) {
            return Err(ConfigError::UndeclaredParameter {
                ancestor: ancestor.to_string(),
                member: member.name.clone(),
                parameter: base.to_string(),
            });
        }
        members.push((member.name.clone(), ty));
    }

    Ok(Pattern { entry, members })
}
