//! Fallback catalog for calls that leave the project.
//!
//! The catalog is data supplied through configuration: library tag → type
//! name → method descriptors, a child → parent table so uncataloged subtypes
//! inherit their parent's entries, and regex inference rules that synthesize
//! low-confidence descriptors from naming conventions.

use crate::error::ConfigError;
use chainscope_api::Confidence;
use chainscope_api::models::naming::{simple_name, strip_generics};
use indexmap::IndexMap;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Method name used for constructor descriptors.
pub const CONSTRUCTOR: &str = "<init>";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct MethodDescriptor {
    pub name: String,
    /// Parameter role names, in order
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns: None,
        }
    }

    pub fn with_parameters(mut self, parameters: &[&str]) -> Self {
        self.parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn returning(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }

    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(","))
    }
}

/// Library tag → type name → descriptors.
pub type CatalogDocument = IndexMap<String, IndexMap<String, Vec<MethodDescriptor>>>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct InferenceRule {
    pub library: String,
    /// Matched against the simple type name
    pub type_pattern: String,
    pub method_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub library: String,
    /// Catalog type that holds the descriptor (the queried type for inferred entries)
    pub type_name: String,
    pub method: MethodDescriptor,
    /// Set when the descriptor was found on a catalog ancestor of the queried type
    pub inherited_from: Option<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: InferenceRule,
    type_re: Regex,
    method_re: Regex,
}

#[derive(Debug, Clone, Default)]
struct TypeCatalog {
    /// (library, descriptor) in configuration order
    methods: Vec<(String, MethodDescriptor)>,
}

impl TypeCatalog {
    fn find(&self, method: &str) -> Option<&(String, MethodDescriptor)> {
        self.methods.iter().find(|(_, d)| d.name == method)
    }
}

/// Immutable catalog of known external methods.
#[derive(Debug, Clone, Default)]
pub struct FrameworkRegistry {
    types: HashMap<String, TypeCatalog>,
    /// Simple name → catalog keys, for qualified keys queried by simple name
    simple_index: HashMap<String, Vec<String>>,
    parents: HashMap<String, String>,
    rules: Vec<CompiledRule>,
}

impl FrameworkRegistry {
    pub fn new(
        catalog: &CatalogDocument,
        inheritance: &IndexMap<String, String>,
        inference: &[InferenceRule],
    ) -> Result<Self, ConfigError> {
        let mut registry = FrameworkRegistry::default();

        for (library, types) in catalog {
            for (type_name, methods) in types {
                let key = strip_generics(type_name).to_string();
                let entry = registry.types.entry(key.clone()).or_default();
                for method in methods {
                    entry.methods.push((library.clone(), method.clone()));
                }
                let keys = registry
                    .simple_index
                    .entry(simple_name(&key).to_string())
                    .or_default();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        for (child, parent) in inheritance {
            let child = strip_generics(child).to_string();
            let parent = strip_generics(parent).to_string();
            if child == parent || simple_name(&child) == simple_name(&parent) {
                return Err(ConfigError::InheritanceSelfLoop(child));
            }
            registry.parents.insert(child, parent);
        }

        for rule in inference {
            let compile = |pattern: &str| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
                    pattern: pattern.to_string(),
                    source,
                })
            };
            registry.rules.push(CompiledRule {
                type_re: compile(&rule.type_pattern)?,
                method_re: compile(&rule.method_pattern)?,
                rule: rule.clone(),
            });
        }

        Ok(registry)
    }

    /// Find the catalog entry for `method` on `type_name`.
    ///
    /// Tries the exact type, then its catalog ancestors, then inference rules.
    /// `None` means "unknown external call", which is a normal outcome.
    pub fn lookup(&self, type_name: &str, method: &str) -> Option<CatalogEntry> {
        self.cataloged(type_name, method)
            .or_else(|| self.infer(type_name, method))
    }

    /// Descriptors written in the catalog, on the type or a catalog ancestor.
    pub fn cataloged(&self, type_name: &str, method: &str) -> Option<CatalogEntry> {
        let normalized = strip_generics(type_name);
        if normalized.is_empty() {
            return None;
        }

        for name in &self.catalog_chain(normalized) {
            if let Some(catalog) = self.catalog_for(name)
                && let Some((library, descriptor)) = catalog.find(method)
            {
                let inherited_from = (simple_name(name) != simple_name(normalized)).then(|| name.clone());
                debug!(type_name = normalized, method, found_on = %name, "catalog hit");
                return Some(CatalogEntry {
                    library: library.clone(),
                    type_name: name.clone(),
                    method: descriptor.clone(),
                    inherited_from,
                    confidence: Confidence::High,
                });
            }
        }
        None
    }

    /// Low-confidence descriptor synthesized from the first matching inference rule.
    pub fn infer(&self, type_name: &str, method: &str) -> Option<CatalogEntry> {
        let normalized = strip_generics(type_name);
        if normalized.is_empty() || self.rules.is_empty() {
            return None;
        }

        for name in &self.catalog_chain(normalized) {
            let simple = simple_name(name);
            if let Some(compiled) = self
                .rules
                .iter()
                .find(|c| c.type_re.is_match(simple) && c.method_re.is_match(method))
            {
                debug!(type_name = normalized, method, rule = %compiled.rule.method_pattern, "inferred catalog entry");
                return Some(CatalogEntry {
                    library: compiled.rule.library.clone(),
                    type_name: name.clone(),
                    method: MethodDescriptor {
                        name: method.to_string(),
                        parameters: compiled.rule.parameters.clone(),
                        returns: compiled.rule.returns.clone(),
                    },
                    inherited_from: (simple != simple_name(normalized)).then(|| name.clone()),
                    confidence: Confidence::Low,
                });
            }
        }

        None
    }

    /// Try several type names in order. A cataloged descriptor on any name
    /// beats an inferred one on an earlier name.
    pub fn lookup_any<S: AsRef<str>>(&self, type_names: &[S], method: &str) -> Option<(usize, CatalogEntry)> {
        let mut seen = HashSet::new();
        let names: Vec<(usize, &str)> = type_names
            .iter()
            .enumerate()
            .map(|(i, name)| (i, strip_generics(name.as_ref())))
            .filter(|(_, name)| !name.is_empty() && seen.insert(name.to_string()))
            .collect();
        names
            .iter()
            .find_map(|&(i, name)| self.cataloged(name, method).map(|e| (i, e)))
            .or_else(|| {
                names
                    .iter()
                    .find_map(|&(i, name)| self.infer(name, method).map(|e| (i, e)))
            })
    }

    /// Whether the catalog has any entry for this type, directly or through inheritance.
    pub fn knows_type(&self, type_name: &str) -> bool {
        let normalized = strip_generics(type_name);
        self.catalog_chain(normalized)
            .iter()
            .any(|name| self.catalog_for(name).is_some())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn catalog_for(&self, name: &str) -> Option<&TypeCatalog> {
        if let Some(catalog) = self.types.get(name) {
            return Some(catalog);
        }
        // A simple-name query matches a qualified key only when unambiguous
        match self.simple_index.get(simple_name(name)).map(Vec::as_slice) {
            Some([only]) if !name.contains('.') || simple_name(only) == only.as_str() => self.types.get(only),
            _ => None,
        }
    }

    fn parent_of(&self, name: &str) -> Option<&String> {
        self.parents
            .get(name)
            .or_else(|| self.parents.get(simple_name(name)))
    }

    /// The queried name followed by its catalog ancestors, cycle-guarded.
    fn catalog_chain(&self, start: &str) -> Vec<String> {
        let mut chain = vec![start.to_string()];
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(simple_name(start).to_string());

        let mut current = start.to_string();
        while let Some(parent) = self.parent_of(&current) {
            if !visited.insert(simple_name(parent).to_string()) {
                break;
            }
            chain.push(parent.clone());
            current = parent.clone();
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FrameworkRegistry {
        let mut catalog = CatalogDocument::new();
        catalog.entry("mybatis-plus".into()).or_default().insert(
            "ServiceImpl".into(),
            vec![
                MethodDescriptor::new("selectById")
                    .with_parameters(&["id"])
                    .returning("T"),
                MethodDescriptor::new("insertOrUpdate").with_parameters(&["entity"]),
            ],
        );
        catalog.entry("java".into()).or_default().insert(
            "java.util.List".into(),
            vec![MethodDescriptor::new("add").with_parameters(&["element"])],
        );
        let mut inheritance = IndexMap::new();
        inheritance.insert("BaseServiceImpl".to_string(), "ServiceImpl".to_string());
        inheritance.insert("ArrayList".to_string(), "java.util.List".to_string());
        let inference = vec![InferenceRule {
            library: "mybatis-plus".into(),
            type_pattern: "Mapper$".into(),
            method_pattern: "^select".into(),
            returns: None,
            parameters: vec!["wrapper".into()],
        }];
        FrameworkRegistry::new(&catalog, &inheritance, &inference).unwrap()
    }

    #[test]
    fn exact_match_strips_generics() {
        let entry = registry().lookup("ServiceImpl<OrderMapper, Order>", "selectById").unwrap();
        assert_eq!(entry.library, "mybatis-plus");
        assert_eq!(entry.type_name, "ServiceImpl");
        assert_eq!(entry.inherited_from, None);
        assert_eq!(entry.confidence, Confidence::High);
    }

    #[test]
    fn qualified_key_found_by_simple_name_and_back() {
        let registry = registry();
        assert!(registry.lookup("List", "add").is_some());
        assert!(registry.lookup("java.util.List", "add").is_some());
    }

    #[test]
    fn inherits_through_catalog_parents() {
        let entry = registry().lookup("BaseServiceImpl", "insertOrUpdate").unwrap();
        assert_eq!(entry.inherited_from.as_deref(), Some("ServiceImpl"));

        let entry = registry().lookup("java.util.ArrayList", "add").unwrap();
        assert_eq!(entry.inherited_from.as_deref(), Some("java.util.List"));
    }

    #[test]
    fn inference_yields_low_confidence() {
        let entry = registry().lookup("OrderMapper", "selectPage").unwrap();
        assert_eq!(entry.confidence, Confidence::Low);
        assert_eq!(entry.type_name, "OrderMapper");
        assert_eq!(entry.method.parameters, vec!["wrapper".to_string()]);
        assert!(registry().lookup("OrderMapper", "deleteAll").is_none());
    }

    #[test]
    fn unknown_calls_are_none() {
        let registry = registry();
        assert!(registry.lookup("Foo", "bar").is_none());
        assert!(registry.lookup("", "bar").is_none());
        assert!(!registry.knows_type("Foo"));
        assert!(registry.knows_type("BaseServiceImpl"));
    }

    #[test]
    fn lookup_any_takes_first_hit() {
        let registry = registry();
        let (position, entry) = registry
            .lookup_any(&["OrderMapperX", "ServiceImpl"], "insertOrUpdate")
            .unwrap();
        assert_eq!(position, 1);
        assert_eq!(entry.type_name, "ServiceImpl");
    }

    #[test]
    fn cataloged_entry_beats_earlier_inference() {
        let mut catalog = CatalogDocument::new();
        catalog.entry("mybatis-plus".into()).or_default().insert(
            "BaseMapper".into(),
            vec![MethodDescriptor::new("selectById").returning("T")],
        );
        let rule = InferenceRule {
            library: "mybatis-plus".into(),
            type_pattern: "Mapper$".into(),
            method_pattern: "^select".into(),
            returns: None,
            parameters: vec![],
        };
        let registry = FrameworkRegistry::new(&catalog, &IndexMap::new(), &[rule]).unwrap();

        let (position, entry) = registry
            .lookup_any(&["OrderMapper", "BaseMapper"], "selectById")
            .unwrap();
        assert_eq!(position, 1);
        assert_eq!(entry.confidence, Confidence::High);

        let (position, entry) = registry.lookup_any(&["OrderMapper", "BaseMapper"], "selectPage").unwrap();
        assert_eq!(position, 0);
        assert_eq!(entry.confidence, Confidence::Low);
    }

    #[test]
    fn parent_cycles_terminate() {
        let mut inheritance = IndexMap::new();
        inheritance.insert("A".to_string(), "B".to_string());
        inheritance.insert("B".to_string(), "A".to_string());
        let registry = FrameworkRegistry::new(&CatalogDocument::new(), &inheritance, &[]).unwrap();
        assert!(registry.lookup("A", "run").is_none());
    }

    #[test]
    fn rejects_bad_configuration() {
        let mut inheritance = IndexMap::new();
        inheritance.insert("A".to_string(), "A".to_string());
        assert!(matches!(
            FrameworkRegistry::new(&CatalogDocument::new(), &inheritance, &[]),
            Err(ConfigError::InheritanceSelfLoop(_))
        ));

        let rule = InferenceRule {
            library: "x".into(),
            type_pattern: "(".into(),
            method_pattern: ".*".into(),
            returns: None,
            parameters: vec![],
        };
        assert!(matches!(
            FrameworkRegistry::new(&CatalogDocument::new(), &IndexMap::new(), &[rule]),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }
}
