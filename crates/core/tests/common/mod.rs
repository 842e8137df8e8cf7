//! Fluent fixture builder for behavior tests.
//!
//! ```ignore
//! let project = Project::new().file(
//!     "com.shop",
//!     &[],
//!     vec![class("OrderService").method(method("create").call("repo", "save", 1))],
//! );
//! ```

#![allow(dead_code)]

use chainscope_api::models::source::{
    Annotation, CallExpression, CallShape, LocalVariable, NormalizedField, NormalizedFile,
    NormalizedMethod, NormalizedParameter, NormalizedType, TypeKind, TypeParameterDecl,
};
use chainscope_api::{CallNode, CallTree, EntryRef};
use chainscope_core::{AnalysisConfig, Analyzer, SymbolIndex};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Default)]
pub struct Project {
    files: Vec<NormalizedFile>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// One file per call; the path is derived from the package and first type.
    pub fn file(mut self, package: &str, imports: &[&str], types: Vec<TypeBuilder>) -> Self {
        let first = types.first().map(|t| t.0.name.clone()).unwrap_or_default();
        let path = PathBuf::from(format!("src/{}/{}.java", package.replace('.', "/"), first));
        self.files.push(NormalizedFile {
            path,
            package: (!package.is_empty()).then(|| package.to_string()),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            types: types.into_iter().map(|t| t.0).collect(),
        });
        self
    }

    pub fn files(&self) -> Vec<NormalizedFile> {
        self.files.clone()
    }

    pub fn index(&self) -> SymbolIndex {
        SymbolIndex::index(self.files.clone())
    }

    pub fn analyzer(&self, config: AnalysisConfig) -> Analyzer {
        Analyzer::new(self.index(), Arc::new(config))
    }

    pub fn analyze(&self, config: AnalysisConfig, entry: &str) -> CallTree {
        let entry = EntryRef::parse(entry).expect("valid entry");
        self.analyzer(config).analyze(&entry).expect("entry exists")
    }
}

pub struct TypeBuilder(pub NormalizedType);

pub fn class(name: &str) -> TypeBuilder {
    TypeBuilder(NormalizedType {
        name: name.to_string(),
        kind: TypeKind::Class,
        ..Default::default()
    })
}

pub fn interface(name: &str) -> TypeBuilder {
    TypeBuilder(NormalizedType {
        name: name.to_string(),
        kind: TypeKind::Interface,
        ..Default::default()
    })
}

impl TypeBuilder {
    pub fn params(mut self, names: &[&str]) -> Self {
        self.0.type_parameters = names
            .iter()
            .map(|n| TypeParameterDecl {
                name: n.to_string(),
                bounds: vec![],
            })
            .collect();
        self
    }

    pub fn bounded(mut self, name: &str, bound: &str) -> Self {
        self.0.type_parameters.push(TypeParameterDecl {
            name: name.to_string(),
            bounds: vec![bound.to_string()],
        });
        self
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.0.extends.push(parent.to_string());
        self
    }

    pub fn implements(mut self, iface: &str) -> Self {
        self.0.implements.push(iface.to_string());
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.0.modifiers.push("abstract".to_string());
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.0.annotations.push(annotation);
        self
    }

    pub fn field(mut self, name: &str, type_expr: &str) -> Self {
        self.0.fields.push(NormalizedField {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
            modifiers: vec!["private".to_string()],
        });
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.0.methods.push(method.0);
        self
    }
}

pub struct MethodBuilder(pub NormalizedMethod);

pub fn method(name: &str) -> MethodBuilder {
    MethodBuilder(NormalizedMethod {
        name: name.to_string(),
        modifiers: vec!["public".to_string()],
        ..Default::default()
    })
}

pub fn constructor(name: &str) -> MethodBuilder {
    MethodBuilder(NormalizedMethod {
        name: name.to_string(),
        constructor: true,
        ..Default::default()
    })
}

impl MethodBuilder {
    pub fn param(mut self, name: &str, type_expr: &str) -> Self {
        self.0.parameters.push(NormalizedParameter {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
            varargs: false,
        });
        self
    }

    pub fn returns(mut self, type_expr: &str) -> Self {
        self.0.return_type = Some(type_expr.to_string());
        self
    }

    pub fn local(mut self, name: &str, type_expr: &str) -> Self {
        self.0.locals.push(LocalVariable {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
        });
        self
    }

    pub fn modifier(mut self, modifier: &str) -> Self {
        self.0.modifiers.push(modifier.to_string());
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.0.annotations.push(annotation);
        self
    }

    /// Instance call on the next line
    pub fn call(self, qualifier: &str, member: &str, args: usize) -> Self {
        let call = CallExpression::new(qualifier, member, args);
        self.push(call)
    }

    pub fn static_call(self, type_name: &str, member: &str, args: usize) -> Self {
        let call = CallExpression::new(type_name, member, args).with_shape(CallShape::Static);
        self.push(call)
    }

    pub fn new_call(self, type_name: &str, args: usize) -> Self {
        let call = CallExpression::new("", type_name, args).with_shape(CallShape::Constructor);
        self.push(call)
    }

    pub fn chain(self, call: CallExpression) -> Self {
        self.push(call)
    }

    fn push(mut self, call: CallExpression) -> Self {
        let line = self.0.calls.len() as u32 + 1;
        self.0.calls.push(call.at_line(line));
        self
    }
}

/// Direct children of the tree, member names in order.
pub fn members(nodes: &[CallNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.member.as_str()).collect()
}
