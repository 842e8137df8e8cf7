//! Project-wide symbol index.
//!
//! The `SymbolIndex` is an Arc-wrapped immutable view: cloning only bumps a
//! reference count, so every resolver and worker thread can hold its own
//! handle. The inheritance hierarchy is kept as a petgraph topology with one
//! node per indexed type and `child -> parent` edges.

pub mod builder;
pub mod model;

pub use builder::IndexBuilder;
pub use model::{
    FieldDeclaration, LocalDeclaration, MethodDeclaration, MethodRef, Parameter, Supertype,
    SupertypeKind, TypeDeclaration, TypeParameter,
};

use chainscope_api::models::naming::{qualify, simple_name, strip_generics};
use chainscope_api::models::source::{NormalizedFile, TypeKind};
use chainscope_api::TypeRef;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use schemars::JsonSchema;
use serde::Serialize;
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HierarchyEdge {
    InheritsFrom,
    Implements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The front end could not normalize the file
    NormalizeFailed,
    MalformedType,
    EmptyName,
    /// A second file declares an already-indexed qualified name
    DuplicateType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct IndexStats {
    pub files: usize,
    pub types: usize,
    pub classes: usize,
    pub interfaces: usize,
    pub enums: usize,
    pub methods: usize,
    pub calls: usize,
    pub hierarchy_edges: usize,
    pub diagnostics: usize,
}

/// Methods matching one name and arity along a type hierarchy.
#[derive(Debug, Clone)]
pub struct MethodLookup<'a> {
    /// Closest type declaring a match
    pub declaring: &'a TypeDeclaration,
    pub methods: Vec<(MethodRef, &'a MethodDeclaration)>,
}

/// A supertype the index does not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAncestor {
    /// Best-known name: the import text when imported, the name as written otherwise
    pub name: String,
    pub type_ref: TypeRef,
    pub declared_on: String,
}

pub(crate) struct SymbolIndexInner {
    pub(crate) types: BTreeMap<String, TypeDeclaration>,
    pub(crate) simple_names: HashMap<SmolStr, Vec<String>>,
    pub(crate) hierarchy: StableDiGraph<String, HierarchyEdge>,
    pub(crate) nodes: HashMap<String, NodeIndex>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) file_count: usize,
}

impl SymbolIndexInner {
    /// Resolve a type name as written inside `from`.
    ///
    /// Order: qualified name, explicit import, same package, wildcard import,
    /// unique simple name. An explicit import of an unindexed type shadows
    /// project types with the same simple name.
    pub(crate) fn resolve_name(&self, name: &str, from: &TypeDeclaration) -> Option<String> {
        let name = strip_generics(name);
        if name.is_empty() {
            return None;
        }
        if name.contains('.') && self.types.contains_key(name) {
            return Some(name.to_string());
        }

        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };

        if let Some(import) = explicit_import(from, head) {
            let candidate = match rest {
                Some(rest) => format!("{}.{}", import, rest),
                None => import.to_string(),
            };
            return self.types.contains_key(&candidate).then_some(candidate);
        }

        let candidate = qualify(from.package.as_deref(), name);
        if self.types.contains_key(&candidate) {
            return Some(candidate);
        }

        for import in from.imports.iter() {
            if let Some(prefix) = import.strip_suffix(".*") {
                let candidate = format!("{}.{}", prefix, name);
                if self.types.contains_key(&candidate) {
                    return Some(candidate);
                }
            }
        }

        if rest.is_none()
            && let Some([only]) = self.simple_names.get(name).map(Vec::as_slice)
        {
            return Some(only.clone());
        }

        None
    }
}

fn explicit_import<'a>(from: &'a TypeDeclaration, simple: &str) -> Option<&'a str> {
    from.imports
        .iter()
        .map(String::as_str)
        .filter(|i| !i.ends_with(".*"))
        .find(|i| simple_name(i) == simple)
}

/// Immutable symbol index (cheap to clone via Arc)
#[derive(Clone)]
pub struct SymbolIndex {
    pub(crate) inner: Arc<SymbolIndexInner>,
}

impl std::fmt::Debug for SymbolIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolIndex")
            .field("types", &self.inner.types.len())
            .field("diagnostics", &self.inner.diagnostics.len())
            .finish()
    }
}

impl SymbolIndex {
    /// Index a set of normalized files in one go.
    pub fn index<I>(files: I) -> Self
    where
        I: IntoIterator<Item = NormalizedFile>,
    {
        let mut builder = IndexBuilder::new();
        builder.add_files(files);
        builder.build()
    }

    pub fn get(&self, fqn: &str) -> Option<&TypeDeclaration> {
        self.inner.types.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.inner.types.contains_key(fqn)
    }

    /// All indexed types in qualified-name order
    pub fn types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.inner.types.values()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.inner.diagnostics
    }

    /// Types matching a qualified name exactly, otherwise every type with that simple name.
    pub fn lookup_types(&self, name: &str) -> Vec<&TypeDeclaration> {
        if let Some(decl) = self.get(name) {
            return vec![decl];
        }
        if name.contains('.') {
            return Vec::new();
        }
        self.inner
            .simple_names
            .get(name)
            .map(|fqns| fqns.iter().filter_map(|f| self.get(f)).collect())
            .unwrap_or_default()
    }

    pub fn resolve_type_name(&self, name: &str, from: &TypeDeclaration) -> Option<String> {
        self.inner.resolve_name(name, from)
    }

    /// Best-known name of a type reference that may not be indexed.
    pub fn external_name(&self, name: &str, from: &TypeDeclaration) -> String {
        let name = strip_generics(name);
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        match (explicit_import(from, head), rest) {
            (Some(import), Some(rest)) => format!("{}.{}", import, rest),
            (Some(import), None) => import.to_string(),
            (None, _) => name.to_string(),
        }
    }

    pub fn supertypes(&self, fqn: &str) -> &[Supertype] {
        self.get(fqn).map(|d| d.supertypes.as_slice()).unwrap_or(&[])
    }

    /// Indexed ancestors in breadth-first order, superclass before interfaces.
    pub fn ancestors(&self, fqn: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        visited.insert(fqn.to_string());
        let mut queue = VecDeque::from([fqn.to_string()]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for supertype in self.supertypes(&current) {
                if let Some(parent) = &supertype.resolved
                    && visited.insert(parent.clone())
                {
                    out.push(parent.clone());
                    queue.push_back(parent.clone());
                }
            }
        }
        out
    }

    /// `fqn` followed by its indexed ancestors.
    pub fn hierarchy_of(&self, fqn: &str) -> Vec<String> {
        let mut chain = vec![fqn.to_string()];
        chain.extend(self.ancestors(fqn));
        chain
    }

    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.ancestors(sub).iter().any(|a| a == sup)
    }

    /// Transitive subtypes that are concrete, sorted by qualified name.
    pub fn implementors(&self, fqn: &str) -> Vec<String> {
        let Some(&start) = self.inner.nodes.get(fqn) else {
            return Vec::new();
        };
        let graph = &self.inner.hierarchy;
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in graph.neighbors_directed(current, Direction::Incoming) {
                if !visited.insert(child) {
                    continue;
                }
                queue.push_back(child);
                if let Some(name) = graph.node_weight(child)
                    && self.get(name).is_some_and(TypeDeclaration::is_concrete)
                {
                    out.push(name.clone());
                }
            }
        }
        out.sort();
        out
    }

    /// Arity-compatible methods named `name` along the hierarchy, closest first.
    ///
    /// Overloads declared further up are kept; a declaration is skipped only
    /// when a closer type already overrides it.
    pub fn find_methods(&self, fqn: &str, name: &str, arity: usize) -> Option<MethodLookup<'_>> {
        let mut declaring = None;
        let mut methods: Vec<(MethodRef, &MethodDeclaration)> = Vec::new();
        for owner in self.hierarchy_of(fqn) {
            let Some(decl) = self.get(&owner) else {
                continue;
            };
            for (index, m) in decl.methods.iter().enumerate() {
                if m.constructor || m.name != name || !m.accepts_arity(arity) {
                    continue;
                }
                if methods.iter().any(|(_, closer)| overrides(closer, m, decl)) {
                    continue;
                }
                declaring.get_or_insert(decl);
                methods.push((
                    MethodRef {
                        owner: decl.fqn.clone(),
                        index,
                    },
                    m,
                ));
            }
        }
        declaring.map(|declaring| MethodLookup { declaring, methods })
    }

    /// The closest declaration of a field along the indexed hierarchy.
    pub fn find_field(&self, fqn: &str, name: &str) -> Option<(&TypeDeclaration, &FieldDeclaration)> {
        self.hierarchy_of(fqn).into_iter().find_map(|owner| {
            let decl = self.get(&owner)?;
            decl.field(name).map(|field| (decl, field))
        })
    }

    /// Opaque supertypes along the chain, closest first.
    pub fn external_ancestors(&self, fqn: &str) -> Vec<ExternalAncestor> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for owner in self.hierarchy_of(fqn) {
            let Some(decl) = self.get(&owner) else {
                continue;
            };
            for supertype in decl.supertypes.iter().filter(|s| s.resolved.is_none()) {
                let Some(base) = supertype.type_ref.base_name() else {
                    continue;
                };
                let name = self.external_name(base, decl);
                if seen.insert(name.clone()) {
                    out.push(ExternalAncestor {
                        name,
                        type_ref: supertype.type_ref.clone(),
                        declared_on: decl.fqn.clone(),
                    });
                }
            }
        }
        out
    }

    pub fn method(&self, method: &MethodRef) -> Option<&MethodDeclaration> {
        self.get(&method.owner)?.methods.get(method.index)
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            files: self.inner.file_count,
            types: self.inner.types.len(),
            hierarchy_edges: self.inner.hierarchy.edge_count(),
            diagnostics: self.inner.diagnostics.len(),
            ..Default::default()
        };
        for decl in self.types() {
            match decl.kind {
                TypeKind::Class => stats.classes += 1,
                TypeKind::Interface => stats.interfaces += 1,
                TypeKind::Enum => stats.enums += 1,
            }
            stats.methods += decl.methods.len();
            stats.calls += decl.methods.iter().map(|m| m.calls.len()).sum::<usize>();
        }
        stats
    }
}

/// Whether `closer` overrides `inherited`, declared on `owner`. A parameter
/// typed by one of `owner`'s type variables matches any type.
fn overrides(closer: &MethodDeclaration, inherited: &MethodDeclaration, owner: &TypeDeclaration) -> bool {
    closer.parameters.len() == inherited.parameters.len()
        && closer
            .parameters
            .iter()
            .zip(&inherited.parameters)
            .all(|(a, b)| {
                a.type_ref == b.type_ref
                    || b.type_ref
                        .base_name()
                        .is_some_and(|name| owner.type_parameter(name).is_some())
            })
}
