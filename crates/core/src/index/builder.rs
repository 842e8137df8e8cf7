//! Index construction.
//!
//! Files are summarized in parallel, then merged single-threaded in path
//! order, so the resulting index does not depend on thread scheduling.

use super::model::{SupertypeKind, TypeDeclaration, declare_type};
use super::{Diagnostic, DiagnosticKind, HierarchyEdge, SymbolIndex, SymbolIndexInner};
use chainscope_api::models::naming::{qualify, simple_name};
use chainscope_api::models::source::{NormalizedFile, SourceUnit, UnitContent};
use petgraph::stable_graph::StableDiGraph;
use rayon::prelude::*;
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

enum FileSummary {
    Types(Vec<TypeDeclaration>),
    Failed(Diagnostic),
}

/// Mutable index under construction. Convert with [`IndexBuilder::build`].
#[derive(Default)]
pub struct IndexBuilder {
    files: BTreeMap<PathBuf, FileSummary>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add units. A path seen before replaces everything it contributed earlier.
    pub fn add_units<I>(&mut self, units: I) -> &mut Self
    where
        I: IntoIterator<Item = SourceUnit>,
    {
        let units: Vec<SourceUnit> = units.into_iter().collect();
        let summaries: Vec<(PathBuf, FileSummary)> = units.par_iter().map(summarize).collect();
        for (path, summary) in summaries {
            self.files.insert(path, summary);
        }
        self
    }

    pub fn add_files<I>(&mut self, files: I) -> &mut Self
    where
        I: IntoIterator<Item = NormalizedFile>,
    {
        self.add_units(files.into_iter().map(SourceUnit::normalized))
    }

    /// Remove everything a path contributed
    pub fn remove_path(&mut self, path: &std::path::Path) -> &mut Self {
        self.files.remove(path);
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Build the immutable index
    pub fn build(self) -> SymbolIndex {
        let file_count = self.files.len();
        let mut types: BTreeMap<String, TypeDeclaration> = BTreeMap::new();
        let mut diagnostics = Vec::new();

        for (path, summary) in self.files {
            match summary {
                FileSummary::Failed(diagnostic) => {
                    warn!(path = %diagnostic.path.display(), "{}", diagnostic.message);
                    diagnostics.push(diagnostic);
                }
                FileSummary::Types(declared) => {
                    for decl in declared {
                        if let Some(existing) = types.get(&decl.fqn) {
                            let diagnostic = Diagnostic {
                                path: path.clone(),
                                kind: DiagnosticKind::DuplicateType,
                                message: format!(
                                    "type {} already declared in {}",
                                    decl.fqn,
                                    existing.file.display()
                                ),
                            };
                            warn!(path = %path.display(), "{}", diagnostic.message);
                            diagnostics.push(diagnostic);
                            continue;
                        }
                        types.insert(decl.fqn.clone(), decl);
                    }
                }
            }
        }

        let mut simple_names: HashMap<SmolStr, Vec<String>> = HashMap::new();
        for fqn in types.keys() {
            simple_names
                .entry(SmolStr::new(simple_name(fqn)))
                .or_default()
                .push(fqn.clone());
        }

        let mut inner = SymbolIndexInner {
            types,
            simple_names,
            hierarchy: StableDiGraph::new(),
            nodes: HashMap::new(),
            diagnostics,
            file_count,
        };

        // Link supertypes against the full index
        let links: Vec<(String, Vec<Option<String>>)> = inner
            .types
            .values()
            .map(|decl| {
                let resolved = decl
                    .supertypes
                    .iter()
                    .map(|s| {
                        s.type_ref
                            .base_name()
                            .and_then(|name| inner.resolve_name(name, decl))
                    })
                    .collect();
                (decl.fqn.clone(), resolved)
            })
            .collect();

        for fqn in inner.types.keys() {
            let idx = inner.hierarchy.add_node(fqn.clone());
            inner.nodes.insert(fqn.clone(), idx);
        }

        for (fqn, resolved) in links {
            let Some(&from) = inner.nodes.get(&fqn) else {
                continue;
            };
            let Some(decl) = inner.types.get_mut(&fqn) else {
                continue;
            };
            for (supertype, target) in decl.supertypes.iter_mut().zip(resolved) {
                if let Some(target) = &target
                    && let Some(&to) = inner.nodes.get(target)
                {
                    let edge = match supertype.kind {
                        SupertypeKind::Extends => HierarchyEdge::InheritsFrom,
                        SupertypeKind::Implements => HierarchyEdge::Implements,
                    };
                    inner.hierarchy.add_edge(from, to, edge);
                }
                supertype.resolved = target;
            }
        }

        info!(
            files = inner.file_count,
            types = inner.types.len(),
            edges = inner.hierarchy.edge_count(),
            diagnostics = inner.diagnostics.len(),
            "symbol index built"
        );

        SymbolIndex {
            inner: Arc::new(inner),
        }
    }
}

fn summarize(unit: &SourceUnit) -> (PathBuf, FileSummary) {
    let path = unit.path.clone();
    let file = match &unit.content {
        UnitContent::Failed(reason) => {
            return (
                path.clone(),
                FileSummary::Failed(Diagnostic {
                    path,
                    kind: DiagnosticKind::NormalizeFailed,
                    message: reason.clone(),
                }),
            );
        }
        UnitContent::Normalized(file) => file,
    };

    let fail = |kind: DiagnosticKind, message: String| {
        (
            path.clone(),
            FileSummary::Failed(Diagnostic {
                path: path.clone(),
                kind,
                message,
            }),
        )
    };

    let package = file.package.as_deref().filter(|p| !p.is_empty());
    let imports: Arc<[String]> = file.imports.iter().map(|i| i.trim().to_string()).collect();
    let mut declared = Vec::with_capacity(file.types.len());

    for ty in &file.types {
        if ty.name.trim().is_empty() {
            return fail(DiagnosticKind::EmptyName, "type with an empty name".to_string());
        }
        if let Some(method) = ty.methods.iter().find(|m| m.name.trim().is_empty()) {
            return fail(
                DiagnosticKind::EmptyName,
                format!("method with an empty name in {} (line {})", ty.name, method.line),
            );
        }
        let fqn = qualify(package, &ty.name);
        match declare_type(ty, fqn, &path, package, &imports) {
            Ok(decl) => declared.push(decl),
            Err(err) => {
                return fail(
                    DiagnosticKind::MalformedType,
                    format!("malformed type expression in {}: {}", ty.name, err),
                );
            }
        }
    }

    (path, FileSummary::Types(declared))
}
