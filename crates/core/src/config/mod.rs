//! Analysis configuration.
//!
//! [`ConfigFile`] is the on-disk JSON document. [`AnalysisConfig`] is the
//! validated, immutable form every component reads; it is built once per run
//! and shared through `Arc`.

pub mod patterns;

use crate::error::{ConfigError, Result};
use crate::filter::{IgnoreFilter, IgnoreRule, parse_rule_lines};
use crate::registry::{CatalogDocument, FrameworkRegistry, InferenceRule, MethodDescriptor};
use indexmap::IndexMap;
use patterns::{PatternEntry, PatternTable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_MAX_DEPTH: usize = 6;

/// What to do when a subclass extends a generic ancestor without type arguments.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RawGenericPolicy {
    /// Consult the pattern table and synthesize a name from the subclass
    #[default]
    NamingHeuristic,
    /// Leave the parameter unbound
    Unresolved,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_generic_policy: Option<RawGenericPolicy>,
    /// Inline ignore rules
    #[serde(default)]
    pub ignore: Vec<String>,
    /// One-rule-per-line file, relative to the configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_file: Option<PathBuf>,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
    #[serde(default)]
    pub catalog: CatalogDocument,
    /// Child type → parent type
    #[serde(default)]
    pub catalog_inheritance: IndexMap<String, String>,
    #[serde(default)]
    pub inference: Vec<InferenceRule>,
}

impl ConfigFile {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Layer `overlay` over `self`. Overlay scalars, patterns and catalog
    /// descriptors take precedence; ignore rules are unioned.
    pub fn merge(mut self, overlay: ConfigFile) -> ConfigFile {
        self.max_depth = overlay.max_depth.or(self.max_depth);
        self.deadline_ms = overlay.deadline_ms.or(self.deadline_ms);
        self.raw_generic_policy = overlay.raw_generic_policy.or(self.raw_generic_policy);
        self.ignore_file = overlay.ignore_file.or(self.ignore_file);

        for rule in overlay.ignore {
            if !self.ignore.contains(&rule) {
                self.ignore.push(rule);
            }
        }

        let mut patterns = overlay.patterns;
        let overridden: Vec<String> = patterns.iter().map(|p| p.ancestor.clone()).collect();
        patterns.extend(
            self.patterns
                .into_iter()
                .filter(|p| !overridden.contains(&p.ancestor)),
        );
        self.patterns = patterns;

        for (library, types) in overlay.catalog {
            let base_types = self.catalog.entry(library).or_default();
            for (type_name, methods) in types {
                let base_methods = base_types.entry(type_name).or_default();
                let mut merged = methods;
                merged.append(base_methods);
                *base_methods = dedup_by_name(merged);
            }
        }

        for (child, parent) in overlay.catalog_inheritance {
            self.catalog_inheritance.insert(child, parent);
        }

        let mut inference = overlay.inference;
        inference.extend(self.inference);
        self.inference = inference;

        self
    }
}

/// Keeps the first descriptor for each method name.
fn dedup_by_name(methods: Vec<MethodDescriptor>) -> Vec<MethodDescriptor> {
    let mut out: Vec<MethodDescriptor> = Vec::with_capacity(methods.len());
    for method in methods {
        if !out.iter().any(|m| m.name == method.name) {
            out.push(method);
        }
    }
    out
}

/// Validated configuration shared by every component of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub max_depth: usize,
    pub deadline: Option<Duration>,
    pub raw_generic_policy: RawGenericPolicy,
    pub ignore: IgnoreFilter,
    pub patterns: PatternTable,
    pub registry: FrameworkRegistry,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            deadline: None,
            raw_generic_policy: RawGenericPolicy::default(),
            ignore: IgnoreFilter::default(),
            patterns: PatternTable::default(),
            registry: FrameworkRegistry::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Load a JSON configuration document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let doc = load_document(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_document(doc, base_dir)
    }

    /// Validate a document. `base_dir` anchors a relative `ignore_file`.
    pub fn from_document(doc: ConfigFile, base_dir: &Path) -> Result<Self> {
        let mut rules = doc
            .ignore
            .iter()
            .map(|r| IgnoreRule::from_str(r))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if let Some(ignore_file) = &doc.ignore_file {
            let path = if ignore_file.is_absolute() {
                ignore_file.clone()
            } else {
                base_dir.join(ignore_file)
            };
            let text = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
            rules.extend(parse_rule_lines(&text)?);
        }

        let max_depth = doc.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth.into());
        }

        let config = Self {
            max_depth,
            deadline: doc.deadline_ms.map(Duration::from_millis),
            raw_generic_policy: doc.raw_generic_policy.unwrap_or_default(),
            ignore: IgnoreFilter::new(rules),
            patterns: PatternTable::new(doc.patterns)?,
            registry: FrameworkRegistry::new(&doc.catalog, &doc.catalog_inheritance, &doc.inference)?,
        };

        info!(
            max_depth = config.max_depth,
            ignore_rules = config.ignore.rules().len(),
            patterns = config.patterns.len(),
            catalog_types = config.registry.type_count(),
            "configuration loaded"
        );
        Ok(config)
    }
}

pub fn load_document(path: &Path) -> Result<ConfigFile> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = ConfigFile::from_json(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(doc)
}

/// Fluent construction for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfigBuilder {
    doc: ConfigFile,
}

impl AnalysisConfigBuilder {
    /// Start from an existing document, e.g. a preset.
    pub fn document(mut self, doc: ConfigFile) -> Self {
        self.doc = self.doc.merge(doc);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.doc.max_depth = Some(depth);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.doc.deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    pub fn raw_generic_policy(mut self, policy: RawGenericPolicy) -> Self {
        self.doc.raw_generic_policy = Some(policy);
        self
    }

    pub fn ignore(mut self, rule: impl Into<String>) -> Self {
        self.doc.ignore.push(rule.into());
        self
    }

    pub fn pattern(mut self, entry: PatternEntry) -> Self {
        self.doc.patterns.push(entry);
        self
    }

    pub fn catalog_method(
        mut self,
        library: impl Into<String>,
        type_name: impl Into<String>,
        method: MethodDescriptor,
    ) -> Self {
        self.doc
            .catalog
            .entry(library.into())
            .or_default()
            .entry(type_name.into())
            .or_default()
            .push(method);
        self
    }

    pub fn catalog_parent(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.doc.catalog_inheritance.insert(child.into(), parent.into());
        self
    }

    pub fn inference_rule(mut self, rule: InferenceRule) -> Self {
        self.doc.inference.push(rule);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig> {
        AnalysisConfig::from_document(self.doc, Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainscopeError;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_empty_document() {
        let config = AnalysisConfig::from_document(ConfigFile::default(), Path::new(".")).unwrap();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.raw_generic_policy, RawGenericPolicy::NamingHeuristic);
        assert!(config.deadline.is_none());
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn zero_depth_is_fatal() {
        let err = AnalysisConfig::builder().max_depth(0).build().unwrap_err();
        assert!(matches!(err, ChainscopeError::Config(ConfigError::InvalidMaxDepth)));
    }

    #[test]
    fn malformed_ignore_rule_is_fatal() {
        let err = AnalysisConfig::builder().ignore("Foo..bar").build().unwrap_err();
        assert!(matches!(
            err,
            ChainscopeError::Config(ConfigError::InvalidIgnoreRule { .. })
        ));
    }

    #[test]
    fn loads_file_with_relative_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut rules = std::fs::File::create(dir.path().join("ignore.txt")).unwrap();
        writeln!(rules, "# utilities\nStringUtils.isEmpty\n\ndebug").unwrap();

        let config_path = dir.path().join("chainscope.json");
        std::fs::write(
            &config_path,
            r#"{
                "max_depth": 3,
                "deadline_ms": 250,
                "raw_generic_policy": "unresolved",
                "ignore": ["Objects.*"],
                "ignore_file": "ignore.txt"
            }"#,
        )
        .unwrap();

        let config = AnalysisConfig::from_file(&config_path).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.deadline, Some(Duration::from_millis(250)));
        assert_eq!(config.raw_generic_policy, RawGenericPolicy::Unresolved);
        assert!(config.ignore.is_ignored("isEmpty", "StringUtils"));
        assert!(config.ignore.is_ignored("debug", "Logger"));
        assert!(config.ignore.is_ignored("equals", "java.util.Objects"));
    }

    #[test]
    fn missing_ignore_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ConfigFile {
            ignore_file: Some(PathBuf::from("nope.txt")),
            ..Default::default()
        };
        let err = AnalysisConfig::from_document(doc, dir.path()).unwrap_err();
        assert!(matches!(err, ChainscopeError::Config(ConfigError::Read { .. })));
    }

    #[test]
    fn merge_prefers_overlay() {
        let base = ConfigFile {
            max_depth: Some(6),
            ignore: vec!["debug".into()],
            catalog: {
                let mut catalog = CatalogDocument::new();
                catalog.entry("java".into()).or_default().insert(
                    "List".into(),
                    vec![
                        MethodDescriptor::new("add").returning("boolean"),
                        MethodDescriptor::new("size"),
                    ],
                );
                catalog
            },
            ..Default::default()
        };
        let overlay = ConfigFile {
            max_depth: Some(2),
            ignore: vec!["debug".into(), "info".into()],
            catalog: {
                let mut catalog = CatalogDocument::new();
                catalog
                    .entry("java".into())
                    .or_default()
                    .insert("List".into(), vec![MethodDescriptor::new("add")]);
                catalog
            },
            ..Default::default()
        };

        let merged = base.merge(overlay);
        assert_eq!(merged.max_depth, Some(2));
        assert_eq!(merged.ignore, vec!["debug".to_string(), "info".to_string()]);
        let list = &merged.catalog["java"]["List"];
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], MethodDescriptor::new("add"));
        assert_eq!(list[1].name, "size");
    }
}
