//! Type expressions as written in declarations.
//!
//! The normalized input carries types as source text (`ServiceImpl<OrderMapper, Order>`,
//! `List<? extends Number>[]`, `String...`). [`TypeRef::parse`] turns that text into a
//! structural form the resolvers can substitute into.

use crate::error::TypeParseError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

const PRIMITIVES: &[&str] = &[
    "int", "long", "short", "byte", "float", "double", "boolean", "char", "void",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// Primitive type or `void`
    Raw(String),

    /// Class, interface or type-variable name (simple or qualified)
    Id(String),

    /// Generic instantiation (e.g., List<String>)
    Generic {
        base: Box<TypeRef>,
        args: Vec<TypeRef>,
    },

    /// Array type (e.g., String[]), varargs included
    Array {
        element: Box<TypeRef>,
        dimensions: usize,
    },

    /// Wildcard type (e.g., ? extends Number)
    Wildcard {
        bound: Option<Box<TypeRef>>,
        is_upper_bound: bool, // true: extends, false: super
    },

    #[default]
    Unknown,
}

impl TypeRef {
    pub fn id(s: impl Into<String>) -> Self {
        TypeRef::Id(s.into())
    }

    pub fn generic(base: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Generic {
            base: Box::new(TypeRef::Id(base.into())),
            args,
        }
    }

    /// Parse a type expression as written in source.
    pub fn parse(text: &str) -> Result<TypeRef, TypeParseError> {
        let mut cursor = Cursor::new(text);
        cursor.skip_ws();
        if cursor.at_end() {
            return Err(TypeParseError::Empty);
        }
        let ty = cursor.parse_type()?;
        cursor.skip_ws();
        if !cursor.at_end() {
            return Err(TypeParseError::Trailing {
                text: text.to_string(),
                offset: cursor.pos,
            });
        }
        Ok(ty)
    }

    /// Outermost concrete name: `Map<K, V>` → `Map`, `Foo[]` → `Foo`.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeRef::Id(name) | TypeRef::Raw(name) => Some(name),
            TypeRef::Generic { base, .. } => base.base_name(),
            TypeRef::Array { element, .. } => element.base_name(),
            TypeRef::Wildcard {
                bound: Some(bound),
                is_upper_bound: true,
            } => bound.base_name(),
            _ => None,
        }
    }

    /// Generic arguments of the outermost type, empty for non-generic types.
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Generic { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Raw(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array { .. })
    }

    /// Replace the outermost name, keeping arguments and array dimensions.
    pub fn with_base_name(&self, name: &str) -> TypeRef {
        match self {
            TypeRef::Id(_) => TypeRef::Id(name.to_string()),
            TypeRef::Generic { args, .. } => TypeRef::Generic {
                base: Box::new(TypeRef::Id(name.to_string())),
                args: args.clone(),
            },
            TypeRef::Array {
                element,
                dimensions,
            } => TypeRef::Array {
                element: Box::new(element.with_base_name(name)),
                dimensions: *dimensions,
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Raw(name) | TypeRef::Id(name) => f.write_str(name),
            TypeRef::Generic { base, args } => {
                write!(f, "{}<", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            TypeRef::Array {
                element,
                dimensions,
            } => {
                write!(f, "{}", element)?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            TypeRef::Wildcard {
                bound: None, ..
            } => f.write_str("?"),
            TypeRef::Wildcard {
                bound: Some(bound),
                is_upper_bound,
            } => {
                let keyword = if *is_upper_bound { "extends" } else { "super" };
                write!(f, "? {} {}", keyword, bound)
            }
            TypeRef::Unknown => f.write_str("<unknown>"),
        }
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if !rest.starts_with(keyword) {
            return false;
        }
        let boundary = rest[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_ident_char(c));
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_char(c) || (c == '.' && !self.rest().starts_with("...")) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let ident = &self.text[start..self.pos];
        if ident.is_empty() || ident.starts_with('.') || ident.ends_with('.') {
            self.pos = start;
            None
        } else {
            Some(ident)
        }
    }

    fn skip_annotations(&mut self) -> Result<(), TypeParseError> {
        while self.eat("@") {
            if self.ident().is_none() {
                return Err(self.unexpected());
            }
            // Annotation arguments are dropped wholesale
            if self.eat("(") {
                let mut depth = 1usize;
                while depth > 0 {
                    let Some(c) = self.peek() else {
                        return Err(TypeParseError::Unbalanced(self.text.to_string()));
                    };
                    self.pos += c.len_utf8();
                    match c {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeParseError> {
        self.skip_annotations()?;
        let base = if self.eat("?") {
            if self.eat_keyword("extends") {
                TypeRef::Wildcard {
                    bound: Some(Box::new(self.parse_type()?)),
                    is_upper_bound: true,
                }
            } else if self.eat_keyword("super") {
                TypeRef::Wildcard {
                    bound: Some(Box::new(self.parse_type()?)),
                    is_upper_bound: false,
                }
            } else {
                TypeRef::Wildcard {
                    bound: None,
                    is_upper_bound: true,
                }
            }
        } else {
            self.parse_named()?
        };
        self.parse_array_suffix(base)
    }

    fn parse_named(&mut self) -> Result<TypeRef, TypeParseError> {
        let name = self.ident().ok_or_else(|| self.unexpected())?;
        if PRIMITIVES.contains(&name) {
            return Ok(TypeRef::Raw(name.to_string()));
        }
        if !self.eat("<") {
            return Ok(TypeRef::Id(name.to_string()));
        }
        // Diamond `<>` carries no information
        if self.eat(">") {
            return Ok(TypeRef::Id(name.to_string()));
        }
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type()?);
            if self.eat(",") {
                continue;
            }
            if self.eat(">") {
                break;
            }
            if self.at_end() {
                return Err(TypeParseError::Unbalanced(self.text.to_string()));
            }
            return Err(self.unexpected());
        }
        Ok(TypeRef::Generic {
            base: Box::new(TypeRef::Id(name.to_string())),
            args,
        })
    }

    fn parse_array_suffix(&mut self, element: TypeRef) -> Result<TypeRef, TypeParseError> {
        let mut dimensions = 0;
        loop {
            if self.eat("...") {
                dimensions += 1;
            } else if self.eat("[") {
                if !self.eat("]") {
                    return Err(TypeParseError::Unbalanced(self.text.to_string()));
                }
                dimensions += 1;
            } else {
                break;
            }
        }
        if dimensions == 0 {
            return Ok(element);
        }
        Ok(TypeRef::Array {
            element: Box::new(element),
            dimensions,
        })
    }

    fn unexpected(&self) -> TypeParseError {
        TypeParseError::Unexpected {
            text: self.text.to_string(),
            offset: self.pos,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
