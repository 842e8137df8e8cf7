//! Indexed declarations. Built once from normalized files, immutable afterwards.

use chainscope_api::models::naming::member_fqn;
use chainscope_api::models::source::{
    Annotation, CallExpression, NormalizedField, NormalizedMethod, NormalizedType, TypeKind,
};
use chainscope_api::{TypeParseError, TypeRef};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupertypeKind {
    Extends,
    Implements,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supertype {
    pub type_ref: TypeRef,
    pub kind: SupertypeKind,
    /// Qualified name of the indexed target; `None` for opaque external names
    pub resolved: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub name: String,
    pub type_ref: TypeRef,
    pub type_text: String,
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub varargs: bool,
}

#[derive(Debug, Clone)]
pub struct LocalDeclaration {
    pub name: String,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeRef>,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub constructor: bool,
    pub locals: Vec<LocalDeclaration>,
    pub calls: Vec<CallExpression>,
    pub line: u32,
    /// `name(T1,T2)`
    pub signature: String,
}

impl MethodDeclaration {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier("static")
    }

    /// Abstract when marked so, or when declared on an interface without a body.
    pub fn is_abstract(&self, owner_kind: TypeKind) -> bool {
        self.has_modifier("abstract")
            || (owner_kind == TypeKind::Interface
                && !self.has_modifier("default")
                && !self.has_modifier("static")
                && !self.has_modifier("private"))
    }

    /// Varargs methods accept `params - 1` arguments or more.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        match self.parameters.last() {
            Some(last) if last.varargs => arity + 1 >= self.parameters.len(),
            _ => self.parameters.len() == arity,
        }
    }

    pub fn local(&self, name: &str) -> Option<&LocalDeclaration> {
        self.locals.iter().rev().find(|l| l.name == name)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub fqn: String,
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub type_parameters: Vec<TypeParameter>,
    pub supertypes: Vec<Supertype>,
    pub fields: Vec<FieldDeclaration>,
    pub methods: Vec<MethodDeclaration>,
    pub file: PathBuf,
    pub package: Option<String>,
    /// Shared by every type of the owning file
    pub imports: Arc<[String]>,
    pub line: u32,
}

impl TypeDeclaration {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.iter().any(|m| m == "abstract")
    }

    /// Instantiable: a class that is not abstract, or an enum.
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract()
    }

    pub fn type_parameter(&self, name: &str) -> Option<(usize, &TypeParameter)> {
        self.type_parameters
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn superclass(&self) -> Option<&Supertype> {
        if self.is_interface() {
            return None;
        }
        self.supertypes
            .iter()
            .find(|s| s.kind == SupertypeKind::Extends)
    }

    pub fn constructors(&self) -> impl Iterator<Item = (usize, &MethodDeclaration)> {
        self.methods.iter().enumerate().filter(|(_, m)| m.constructor)
    }

    pub fn member_fqn(&self, member: &str) -> String {
        member_fqn(&self.fqn, member)
    }
}

/// Stable handle of a method: declaring type plus position in its method list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef {
    pub owner: String,
    pub index: usize,
}

pub(crate) fn render_signature(name: &str, parameters: &[Parameter]) -> String {
    let params: Vec<String> = parameters
        .iter()
        .map(|p| match (&p.type_ref, p.varargs) {
            (TypeRef::Array { element, dimensions }, true) if *dimensions == 1 => format!("{}...", element),
            (ty, _) => ty.to_string(),
        })
        .collect();
    format!("{}({})", name, params.join(","))
}

fn parse_method(method: &NormalizedMethod) -> Result<MethodDeclaration, TypeParseError> {
    let mut parameters = Vec::with_capacity(method.parameters.len());
    for param in &method.parameters {
        let mut type_ref = TypeRef::parse(&param.type_expr)?;
        // `String... args` may arrive as `String` with the varargs flag
        if param.varargs && !param.type_expr.trim_end().ends_with("...") && !type_ref.is_array() {
            type_ref = TypeRef::Array {
                element: Box::new(type_ref),
                dimensions: 1,
            };
        }
        parameters.push(Parameter {
            name: param.name.clone(),
            type_ref,
            varargs: param.varargs || param.type_expr.trim_end().ends_with("..."),
        });
    }

    let return_type = method
        .return_type
        .as_deref()
        .map(TypeRef::parse)
        .transpose()?;

    let locals = method
        .locals
        .iter()
        .map(|l| {
            Ok(LocalDeclaration {
                name: l.name.clone(),
                type_ref: TypeRef::parse(&l.type_expr)?,
            })
        })
        .collect::<Result<Vec<_>, TypeParseError>>()?;

    let signature = render_signature(&method.name, &parameters);
    Ok(MethodDeclaration {
        name: method.name.clone(),
        parameters,
        return_type,
        modifiers: method.modifiers.clone(),
        annotations: method.annotations.clone(),
        constructor: method.constructor,
        locals,
        calls: method.calls.clone(),
        line: method.line,
        signature,
    })
}

fn parse_field(field: &NormalizedField) -> Result<FieldDeclaration, TypeParseError> {
    Ok(FieldDeclaration {
        name: field.name.clone(),
        type_ref: TypeRef::parse(&field.type_expr)?,
        type_text: field.type_expr.clone(),
        modifiers: field.modifiers.clone(),
    })
}

/// Convert one normalized type; supertypes are left unlinked.
pub(crate) fn declare_type(
    ty: &NormalizedType,
    fqn: String,
    file: &Path,
    package: Option<&str>,
    imports: &Arc<[String]>,
) -> Result<TypeDeclaration, TypeParseError> {
    let mut supertypes = Vec::with_capacity(ty.extends.len() + ty.implements.len());
    for text in &ty.extends {
        supertypes.push(Supertype {
            type_ref: TypeRef::parse(text)?,
            kind: SupertypeKind::Extends,
            resolved: None,
        });
    }
    for text in &ty.implements {
        supertypes.push(Supertype {
            type_ref: TypeRef::parse(text)?,
            kind: SupertypeKind::Implements,
            resolved: None,
        });
    }

    let type_parameters = ty
        .type_parameters
        .iter()
        .map(|p| {
            Ok(TypeParameter {
                name: p.name.clone(),
                bounds: p
                    .bounds
                    .iter()
                    .map(|b| TypeRef::parse(b))
                    .collect::<Result<Vec<_>, _>>()?,
            })
        })
        .collect::<Result<Vec<_>, TypeParseError>>()?;

    Ok(TypeDeclaration {
        fqn,
        name: ty.name.clone(),
        kind: ty.kind,
        modifiers: ty.modifiers.clone(),
        annotations: ty.annotations.clone(),
        type_parameters,
        supertypes,
        fields: ty.fields.iter().map(parse_field).collect::<Result<_, _>>()?,
        methods: ty.methods.iter().map(parse_method).collect::<Result<_, _>>()?,
        file: file.to_path_buf(),
        package: package.map(str::to_string),
        imports: imports.clone(),
        line: ty.line,
    })
}
