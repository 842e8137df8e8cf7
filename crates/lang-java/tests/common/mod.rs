//! Small fixture builder for Java/Spring shaped projects.

#![allow(dead_code)]

use chainscope_api::models::source::{
    Annotation, CallExpression, LocalVariable, NormalizedField, NormalizedFile, NormalizedMethod,
    NormalizedParameter, NormalizedType, TypeKind,
};
use chainscope_core::SymbolIndex;
use std::path::PathBuf;

#[derive(Default)]
pub struct Project {
    files: Vec<NormalizedFile>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, package: &str, imports: &[&str], types: Vec<TypeBuilder>) -> Self {
        let first = types.first().map(|t| t.0.name.clone()).unwrap_or_default();
        self.files.push(NormalizedFile {
            path: PathBuf::from(format!("src/{}/{}.java", package.replace('.', "/"), first)),
            package: Some(package.to_string()),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            types: types.into_iter().map(|t| t.0).collect(),
        });
        self
    }

    pub fn index(&self) -> SymbolIndex {
        SymbolIndex::index(self.files.clone())
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
    pub fn extends(mut self, parent: &str) -> Self {
        self.0.extends.push(parent.to_string());
        self
    }

    pub fn implements(mut self, iface: &str) -> Self {
        self.0.implements.push(iface.to_string());
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

impl MethodBuilder {
    pub fn param(mut self, name: &str, type_expr: &str) -> Self {
        self.0.parameters.push(NormalizedParameter {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
            varargs: false,
        });
        self
    }

    pub fn local(mut self, name: &str, type_expr: &str) -> Self {
        self.0.locals.push(LocalVariable {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
        });
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.0.annotations.push(annotation);
        self
    }

    pub fn call(mut self, qualifier: &str, member: &str, args: usize) -> Self {
        let line = self.0.calls.len() as u32 + 1;
        self.0
            .calls
            .push(CallExpression::new(qualifier, member, args).at_line(line));
        self
    }

    pub fn chain(mut self, call: CallExpression) -> Self {
        let line = self.0.calls.len() as u32 + 1;
        self.0.calls.push(call.at_line(line));
        self
    }
}
