//! Type substitution.

use chainscope_api::TypeRef;
use std::collections::HashMap;

/// A map from type variables to the types bound to them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<String, TypeRef>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(var: impl Into<String>, ty: TypeRef) -> Self {
        let mut subst = Self::new();
        subst.insert(var.into(), ty);
        subst
    }

    pub fn insert(&mut self, var: String, ty: TypeRef) {
        self.map.insert(var, ty);
    }

    pub fn get(&self, var: &str) -> Option<&TypeRef> {
        self.map.get(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Apply this substitution to a type.
    pub fn apply(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Id(name) => self.map.get(name).cloned().unwrap_or_else(|| ty.clone()),
            TypeRef::Array {
                element,
                dimensions,
            } => match self.apply(element) {
                // `T[]` with `T := String[]` flattens to `String[][]`
                TypeRef::Array {
                    element: inner,
                    dimensions: inner_dims,
                } => TypeRef::Array {
                    element: inner,
                    dimensions: dimensions + inner_dims,
                },
                applied => TypeRef::Array {
                    element: Box::new(applied),
                    dimensions: *dimensions,
                },
            },
            TypeRef::Generic { base, args } => TypeRef::Generic {
                base: Box::new(self.apply(base)),
                args: args.iter().map(|arg| self.apply(arg)).collect(),
            },
            TypeRef::Wildcard {
                bound: Some(bound),
                is_upper_bound,
            } => TypeRef::Wildcard {
                bound: Some(Box::new(self.apply(bound))),
                is_upper_bound: *is_upper_bound,
            },
            // Primitives and others remain unchanged
            _ => ty.clone(),
        }
    }
}
