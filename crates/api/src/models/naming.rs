use crate::error::{ApiError, ApiResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between a type and one of its members (`com.shop.OrderService#create`).
pub const MEMBER_SEPARATOR: char = '#';

/// Last segment of a dotted name, generic arguments stripped.
pub fn simple_name(name: &str) -> &str {
    let name = strip_generics(name);
    name.rsplit('.').next().unwrap_or(name)
}

/// Everything before the last dot, if any.
pub fn package_of(name: &str) -> Option<&str> {
    let name = strip_generics(name);
    name.rfind('.').map(|idx| &name[..idx])
}

pub fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(idx) => name[..idx].trim_end(),
        None => name.trim(),
    }
}

pub fn qualify(package: Option<&str>, simple: &str) -> String {
    match package {
        Some(pkg) if !pkg.is_empty() => format!("{}.{}", pkg, simple),
        _ => simple.to_string(),
    }
}

pub fn member_fqn(owner: &str, member: &str) -> String {
    format!("{}{}{}", owner, MEMBER_SEPARATOR, member)
}

/// A reference to an entry method: `OrderController#create` or `com.shop.OrderController.create`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct EntryRef {
    /// Simple or qualified type name
    pub type_name: String,
    pub method: String,
    /// Restricts overloads when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
}

impl EntryRef {
    pub fn new(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method: method.into(),
            arity: None,
        }
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Accepts `Type#method`, `Type.method`, and an optional `/N` arity suffix.
    pub fn parse(text: &str) -> ApiResult<Self> {
        let text = text.trim();
        let invalid = || ApiError::InvalidEntry(text.to_string());

        let (reference, arity) = match text.rsplit_once('/') {
            Some((reference, arity)) => {
                let arity = arity.trim().parse::<usize>().map_err(|_| invalid())?;
                (reference, Some(arity))
            }
            None => (text, None),
        };

        let (type_name, method) = reference
            .rsplit_once(MEMBER_SEPARATOR)
            .or_else(|| reference.rsplit_once('.'))
            .ok_or_else(invalid)?;

        let type_name = type_name.trim();
        let method = method.trim();
        let valid_ident = |s: &str| {
            !s.is_empty()
                && s.split('.').all(|seg| {
                    !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
                })
        };
        if !valid_ident(type_name) || !valid_ident(method) || method.contains('.') {
            return Err(invalid());
        }

        Ok(Self {
            type_name: type_name.to_string(),
            method: method.to_string(),
            arity,
        })
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_name, MEMBER_SEPARATOR, self.method)?;
        if let Some(arity) = self.arity {
            write!(f, "/{}", arity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_names() {
        assert_eq!(simple_name("com.shop.OrderMapper"), "OrderMapper");
        assert_eq!(simple_name("java.util.List<String>"), "List");
        assert_eq!(package_of("com.shop.OrderMapper"), Some("com.shop"));
        assert_eq!(package_of("OrderMapper"), None);
        assert_eq!(qualify(Some("com.shop"), "Order"), "com.shop.Order");
        assert_eq!(qualify(None, "Order"), "Order");
    }

    #[test]
    fn parses_entry_references() {
        let entry = EntryRef::parse("OrderController#create").unwrap();
        assert_eq!(entry, EntryRef::new("OrderController", "create"));

        let entry = EntryRef::parse("com.shop.OrderController.create/2").unwrap();
        assert_eq!(entry.type_name, "com.shop.OrderController");
        assert_eq!(entry.method, "create");
        assert_eq!(entry.arity, Some(2));
        assert_eq!(entry.to_string(), "com.shop.OrderController#create/2");
    }

    #[test]
    fn rejects_bad_entry_references() {
        assert!(EntryRef::parse("create").is_err());
        assert!(EntryRef::parse("Order#").is_err());
        assert!(EntryRef::parse("Order#create/x").is_err());
        assert!(EntryRef::parse("#create").is_err());
    }
}
