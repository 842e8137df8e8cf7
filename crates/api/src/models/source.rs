//! Normalized AST handed over by the parsing front end.
//!
//! Everything here is plain data: names and type expressions exactly as
//! written, calls already classified into shapes. The front end may be a
//! full compiler, a grammar-based parser or pattern extraction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One file as delivered by the front end.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub content: UnitContent,
}

impl SourceUnit {
    pub fn normalized(file: NormalizedFile) -> Self {
        Self {
            path: file.path.clone(),
            content: UnitContent::Normalized(file),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: UnitContent::Failed(reason.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitContent {
    Normalized(NormalizedFile),
    /// The front end could not produce a normalized form
    Failed(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct NormalizedFile {
    pub path: PathBuf,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub types: Vec<NormalizedType>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct Annotation {
    /// Simple or qualified name without the `@`
    pub name: String,
    /// The `value` (or first positional) argument, unquoted
    #[serde(default)]
    pub value: Option<String>,
    /// Remaining `key = value` arguments, unquoted, in source order
    #[serde(default)]
    pub arguments: Vec<(String, String)>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push((key.into(), value.into()));
        self
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn simple_name(&self) -> &str {
        super::naming::simple_name(&self.name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct TypeParameterDecl {
    pub name: String,
    /// Upper bounds in declaration order (`T extends A & B`)
    #[serde(default)]
    pub bounds: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct NormalizedType {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParameterDecl>,
    /// Super types as written, generic arguments included
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub fields: Vec<NormalizedField>,
    #[serde(default)]
    pub methods: Vec<NormalizedMethod>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct NormalizedField {
    pub name: String,
    pub type_expr: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct NormalizedParameter {
    pub name: String,
    pub type_expr: String,
    #[serde(default)]
    pub varargs: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct LocalVariable {
    pub name: String,
    pub type_expr: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct NormalizedMethod {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<NormalizedParameter>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub constructor: bool,
    #[serde(default)]
    pub locals: Vec<LocalVariable>,
    #[serde(default)]
    pub calls: Vec<CallExpression>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallShape {
    #[default]
    Instance,
    Static,
    Constructor,
    Chained,
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallShape::Instance => "instance",
            CallShape::Static => "static",
            CallShape::Constructor => "constructor",
            CallShape::Chained => "chained",
        })
    }
}

/// A link following the first call of a chain: `.c()` in `a.b().c()`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct ChainLink {
    pub member: String,
    #[serde(default)]
    pub arg_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct CallExpression {
    /// `this`, `super`, `this.field`, a variable or field name, a type name, or empty
    #[serde(default)]
    pub qualifier: String,
    /// Method name; for constructor calls the instantiated type as written
    pub member: String,
    #[serde(default)]
    pub arg_count: usize,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub shape: CallShape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<ChainLink>,
}

impl CallExpression {
    pub fn new(qualifier: impl Into<String>, member: impl Into<String>, arg_count: usize) -> Self {
        Self {
            qualifier: qualifier.into(),
            member: member.into(),
            arg_count,
            ..Default::default()
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn with_shape(mut self, shape: CallShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn then(mut self, member: impl Into<String>, arg_count: usize) -> Self {
        self.shape = CallShape::Chained;
        self.chain.push(ChainLink {
            member: member.into(),
            arg_count,
        });
        self
    }

    /// The call as written, arguments elided: `orderService.create()`.
    pub fn as_written(&self) -> String {
        let mut out = String::new();
        match self.shape {
            CallShape::Constructor => {
                out.push_str("new ");
                out.push_str(&self.member);
                out.push_str("()");
            }
            _ => {
                if !self.qualifier.is_empty() {
                    out.push_str(&self.qualifier);
                    out.push('.');
                }
                out.push_str(&self.member);
                out.push_str("()");
            }
        }
        for link in &self.chain {
            out.push('.');
            out.push_str(&link.member);
            out.push_str("()");
        }
        out
    }
}
