//! Typing of call qualifiers: `this`, `super`, variables, fields, type names.

use super::{CallContext, CallResolver};
use crate::generics::{FieldResolution, Receiver, ResolvedType, SlotInfo, TypeResolution};
use chainscope_api::models::naming::strip_generics;
use chainscope_api::TypeRef;
use tracing::debug;

/// What a call is made on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Qualifier {
    /// `this`, `super` or no qualifier
    Context { super_call: bool },
    /// A type name, for static calls
    Type { fqn: Option<String>, name: String },
    Value(ValueType),
    Unknown {
        hint: Option<String>,
        /// Catalog names still worth trying
        fallback: Vec<String>,
        reason: String,
    },
}

/// Static type of a value expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValueType {
    /// Qualified name if indexed, best-known name otherwise
    pub name: String,
    /// Generic context when the type is indexed
    pub receiver: Option<Receiver>,
    pub slot: Option<SlotInfo>,
}

impl ValueType {
    pub(crate) fn from_resolved(ty: &ResolvedType) -> Self {
        Self {
            name: ty.name.clone(),
            receiver: ty.receiver(),
            slot: ty.slot.clone(),
        }
    }
}

impl CallResolver {
    pub(crate) fn classify(&self, qualifier: &str, ctx: &CallContext<'_>) -> Qualifier {
        let qualifier = qualifier.trim();
        match qualifier {
            "" | "this" => return Qualifier::Context { super_call: false },
            "super" => return Qualifier::Context { super_call: true },
            _ => {}
        }

        let (path, fields_only) = match qualifier.strip_prefix("this.") {
            Some(rest) => (rest, true),
            None => (qualifier, false),
        };
        let mut segments = path.split('.');
        let Some(head) = segments.next() else {
            return unknown(qualifier);
        };

        let mut current = match self.variable_type(head, fields_only, ctx) {
            Some(value) => value,
            None if fields_only => return unknown(qualifier),
            None => return self.type_qualifier(path, ctx),
        };

        for segment in segments {
            current = match current {
                Qualifier::Value(ValueType {
                    receiver: Some(receiver),
                    ..
                }) => from_field(self.generics.resolve_field(segment, &receiver)),
                Qualifier::Value(value) => Qualifier::Unknown {
                    hint: Some(value.name),
                    fallback: Vec::new(),
                    reason: format!("field `{}` of an external type", segment),
                },
                other => return other,
            };
        }
        current
    }

    /// Locals shadow parameters, which shadow fields.
    fn variable_type(&self, name: &str, fields_only: bool, ctx: &CallContext<'_>) -> Option<Qualifier> {
        if !fields_only {
            if let Some(local) = ctx.method.local(name) {
                return Some(self.declared_value(&local.type_ref, ctx));
            }
            if let Some(param) = ctx.method.parameter(name) {
                return Some(self.declared_value(&param.type_ref, ctx));
            }
        }

        if let Some((declaring, field)) = self.index.find_field(&ctx.class.fqn, name) {
            let declaring = declaring.fqn.clone();
            let resolved = self
                .generics
                .resolve_in_context(&field.type_ref, &declaring, ctx.receiver);
            return Some(from_field(resolved.into()));
        }

        match self.generics.resolve_field(name, ctx.receiver) {
            FieldResolution::NoSuchField => None,
            other => Some(from_field(other)),
        }
    }

    fn declared_value(&self, declared: &TypeRef, ctx: &CallContext<'_>) -> Qualifier {
        // `var` locals carry no declared type
        if declared.base_name() == Some("var") {
            return Qualifier::Unknown {
                hint: None,
                fallback: Vec::new(),
                reason: "untyped local".to_string(),
            };
        }
        let resolved = self
            .generics
            .resolve_in_context(declared, &ctx.class.fqn, ctx.receiver);
        match resolved {
            TypeResolution::Resolved(ty) => Qualifier::Value(ValueType::from_resolved(&ty)),
            TypeResolution::UnresolvedGeneric {
                parameter,
                declared_on,
            } => unresolved_generic(parameter, declared_on),
        }
    }

    fn type_qualifier(&self, path: &str, ctx: &CallContext<'_>) -> Qualifier {
        if let Some(fqn) = self.index.resolve_type_name(path, ctx.class) {
            return Qualifier::Type {
                name: fqn.clone(),
                fqn: Some(fqn),
            };
        }
        let looks_like_type = path
            .rsplit('.')
            .next()
            .and_then(|last| last.chars().next())
            .is_some_and(char::is_uppercase);
        if looks_like_type {
            return Qualifier::Type {
                fqn: None,
                name: self.index.external_name(path, ctx.class),
            };
        }
        debug!(qualifier = path, "unknown qualifier");
        unknown(path)
    }

    /// The owner a call names syntactically: the type of a static or constructor call.
    pub(crate) fn static_owner(&self, qualifier: &str, ctx: &CallContext<'_>) -> Option<String> {
        let qualifier = qualifier.trim();
        if qualifier.is_empty() || qualifier == "this" || qualifier == "super" || qualifier.starts_with("this.") {
            return None;
        }
        let head = qualifier.split('.').next().unwrap_or(qualifier);
        if ctx.method.local(head).is_some()
            || ctx.method.parameter(head).is_some()
            || self.index.find_field(&ctx.class.fqn, head).is_some()
        {
            return None;
        }
        match self.type_qualifier(qualifier, ctx) {
            Qualifier::Type { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Owner of a constructor call: indexed name if known, external name otherwise.
    pub(crate) fn constructed_type(&self, written: &str, ctx: &CallContext<'_>) -> (Option<String>, String) {
        let name = strip_generics(written).trim();
        match self.index.resolve_type_name(name, ctx.class) {
            Some(fqn) => (Some(fqn.clone()), fqn),
            None => (None, self.index.external_name(name, ctx.class)),
        }
    }
}

fn from_field(resolution: FieldResolution) -> Qualifier {
    match resolution {
        FieldResolution::Resolved(ty) => Qualifier::Value(ValueType::from_resolved(&ty)),
        FieldResolution::UnresolvedGeneric {
            parameter,
            declared_on,
        } => unresolved_generic(parameter, declared_on),
        FieldResolution::NoSuchField => Qualifier::Unknown {
            hint: None,
            fallback: Vec::new(),
            reason: "no such field".to_string(),
        },
    }
}

fn unresolved_generic(parameter: String, declared_on: String) -> Qualifier {
    Qualifier::Unknown {
        hint: None,
        reason: format!("unresolved generic `{}` of {}", parameter, declared_on),
        fallback: vec![declared_on],
    }
}

fn unknown(qualifier: &str) -> Qualifier {
    Qualifier::Unknown {
        hint: None,
        fallback: Vec::new(),
        reason: format!("unknown qualifier `{}`", qualifier),
    }
}
