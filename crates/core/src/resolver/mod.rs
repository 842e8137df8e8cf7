//! Call resolution: one call expression to its candidate targets.
//!
//! Tiers are tried in a fixed order and the first one that yields anything
//! wins: constructors, static calls, calls on the context instance, calls on
//! typed values. Chains are resolved link by link, each link's qualifier
//! typed by the previous link's return type.

mod qualifier;

use crate::config::AnalysisConfig;
use crate::generics::{GenericResolver, Receiver, Substitution, TypeResolution};
use crate::index::{MethodDeclaration, MethodRef, SymbolIndex, TypeDeclaration};
use crate::registry::{CONSTRUCTOR, CatalogEntry};
use chainscope_api::models::naming::simple_name;
use chainscope_api::models::source::{CallExpression, CallShape};
use chainscope_api::{Dispatch, ResolutionKind, TypeRef};
use qualifier::{Qualifier, ValueType};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Reason recorded on links after a failed link of a chain.
pub const BROKEN_CHAIN: &str = "broken-chain";

/// The method body a call is made from.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Type declaring the method
    pub class: &'a TypeDeclaration,
    pub method: &'a MethodDeclaration,
    /// Runtime instance the body executes on; a subtype of `class`
    pub receiver: &'a Receiver,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Project {
        /// `None` for an implicit default constructor
        method: Option<MethodRef>,
        owner: String,
        signature: String,
        dispatch: Dispatch,
        /// Generic context the target body runs in
        receiver: Receiver,
    },
    Framework {
        entry: CatalogEntry,
        /// Best-known type of what the call is made on
        receiver_type: String,
        /// Type name that produced the catalog hit
        queried_type: String,
    },
    Unresolved {
        owner_hint: Option<String>,
        reason: String,
    },
}

impl Target {
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Target::Project { .. } => ResolutionKind::Project,
            Target::Framework { .. } => ResolutionKind::Framework,
            Target::Unresolved { .. } => ResolutionKind::Unresolved,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Target::Project { owner, .. } => Some(owner),
            Target::Framework { receiver_type, .. } => Some(receiver_type),
            Target::Unresolved { owner_hint, .. } => owner_hint.as_deref(),
        }
    }

    pub fn signature(&self) -> Option<String> {
        match self {
            Target::Project { signature, .. } => Some(signature.clone()),
            Target::Framework { entry, .. } => Some(entry.method.signature()),
            Target::Unresolved { .. } => None,
        }
    }

    fn unresolved(owner_hint: Option<String>, reason: impl Into<String>) -> Self {
        Target::Unresolved {
            owner_hint,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTargets {
    /// Ordered by owner, then signature
    pub targets: Vec<Target>,
    pub ambiguous: bool,
}

impl ResolvedTargets {
    fn from_candidates(mut targets: Vec<Target>) -> Self {
        targets.sort_by(|a, b| {
            (a.owner().unwrap_or(""), a.signature())
                .cmp(&(b.owner().unwrap_or(""), b.signature()))
        });
        let ambiguous = targets.len() > 1;
        Self { targets, ambiguous }
    }

    fn single(target: Target) -> Self {
        Self {
            targets: vec![target],
            ambiguous: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.targets
            .iter()
            .any(|t| !matches!(t, Target::Unresolved { .. }))
    }
}

/// One link of a call; plain calls have exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkResolution {
    /// What the link is called on, as written: `a` or `a.b()`
    pub qualifier: String,
    pub member: String,
    pub arg_count: usize,
    pub shape: CallShape,
    pub targets: ResolvedTargets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallResolution {
    pub links: Vec<LinkResolution>,
}

pub struct CallResolver {
    index: SymbolIndex,
    config: Arc<AnalysisConfig>,
    generics: Arc<GenericResolver>,
}

impl CallResolver {
    pub fn new(index: SymbolIndex, config: Arc<AnalysisConfig>, generics: Arc<GenericResolver>) -> Self {
        Self {
            index,
            config,
            generics,
        }
    }

    pub fn resolve(&self, call: &CallExpression, ctx: &CallContext<'_>) -> CallResolution {
        let first = self.resolve_first(call, ctx);
        let mut links = vec![LinkResolution {
            qualifier: call.qualifier.clone(),
            member: call.member.clone(),
            arg_count: call.arg_count,
            shape: call.shape,
            targets: first,
        }];

        let mut written = if call.qualifier.is_empty() {
            format!("{}()", call.member)
        } else {
            format!("{}.{}()", call.qualifier, call.member)
        };
        for link in &call.chain {
            let previous = links.last().map(|l| &l.targets);
            let qualifier = previous.and_then(|p| self.returned_value(p));
            let targets = match qualifier {
                Some(value) => self.resolve_on_value(&value, &link.member, link.arg_count),
                None => ResolvedTargets::single(Target::unresolved(None, BROKEN_CHAIN)),
            };
            links.push(LinkResolution {
                qualifier: written.clone(),
                member: link.member.clone(),
                arg_count: link.arg_count,
                shape: CallShape::Chained,
                targets,
            });
            written = format!("{}.{}()", written, link.member);
        }

        CallResolution { links }
    }

    /// Owner a call names before resolution, for ignore rules; empty when it names none.
    pub fn syntactic_owner(&self, call: &CallExpression, ctx: &CallContext<'_>) -> String {
        match call.shape {
            CallShape::Constructor => self.constructed_type(&call.member, ctx).1,
            _ => self.static_owner(&call.qualifier, ctx).unwrap_or_default(),
        }
    }

    fn resolve_first(&self, call: &CallExpression, ctx: &CallContext<'_>) -> ResolvedTargets {
        if call.shape == CallShape::Constructor {
            return self.resolve_constructor(&call.member, call.arg_count, ctx);
        }
        let member = call.member.as_str();
        let arity = call.arg_count;
        let resolved = match self.classify(&call.qualifier, ctx) {
            Qualifier::Context { super_call } => self.resolve_on_context(super_call, member, arity, ctx),
            Qualifier::Type { fqn, name } => self.resolve_static(fqn.as_deref(), &name, member, arity),
            Qualifier::Value(value) => self.resolve_on_value(&value, member, arity),
            Qualifier::Unknown {
                hint,
                fallback,
                reason,
            } => self
                .catalog_fallback(&fallback, member)
                .map(ResolvedTargets::single)
                .unwrap_or_else(|| ResolvedTargets::single(Target::unresolved(hint, reason))),
        };
        debug!(
            call = %call.as_written(),
            line = call.line,
            candidates = resolved.targets.len(),
            "resolved call"
        );
        resolved
    }

    fn resolve_constructor(&self, written: &str, arity: usize, ctx: &CallContext<'_>) -> ResolvedTargets {
        let (fqn, name) = self.constructed_type(written, ctx);
        let Some(decl) = fqn.as_deref().and_then(|f| self.index.get(f)) else {
            return self
                .catalog_fallback(std::slice::from_ref(&name), CONSTRUCTOR)
                .map(ResolvedTargets::single)
                .unwrap_or_else(|| {
                    ResolvedTargets::single(Target::unresolved(Some(name), "unknown external constructor"))
                });
        };

        let receiver = Receiver {
            class: decl.fqn.clone(),
            args: TypeRef::parse(written)
                .map(|ty| ty.args().to_vec())
                .unwrap_or_default(),
            scope: ctx.class.fqn.clone(),
        };

        let mut constructors = decl.constructors().peekable();
        if constructors.peek().is_none() {
            if arity == 0 {
                return ResolvedTargets::single(Target::Project {
                    method: None,
                    owner: decl.fqn.clone(),
                    signature: format!("{}()", decl.name),
                    dispatch: Dispatch::Constructor,
                    receiver,
                });
            }
            return ResolvedTargets::single(Target::unresolved(
                Some(decl.fqn.clone()),
                format!("{} has only an implicit no-argument constructor", decl.name),
            ));
        }

        let targets: Vec<Target> = constructors
            .filter(|(_, m)| m.accepts_arity(arity))
            .map(|(index, m)| Target::Project {
                method: Some(MethodRef {
                    owner: decl.fqn.clone(),
                    index,
                }),
                owner: decl.fqn.clone(),
                signature: m.signature.clone(),
                dispatch: Dispatch::Constructor,
                receiver: receiver.clone(),
            })
            .collect();
        if targets.is_empty() {
            return ResolvedTargets::single(Target::unresolved(
                Some(decl.fqn.clone()),
                format!("no constructor of {} accepting {} arguments", decl.name, arity),
            ));
        }
        ResolvedTargets::from_candidates(targets)
    }

    fn resolve_static(&self, fqn: Option<&str>, name: &str, member: &str, arity: usize) -> ResolvedTargets {
        if let Some(fqn) = fqn
            && let Some(lookup) = self.index.find_methods(fqn, member, arity)
        {
            let targets = lookup
                .methods
                .iter()
                .map(|(mref, m)| project_target(mref, m, Dispatch::Static, Receiver::plain(fqn)))
                .collect();
            return ResolvedTargets::from_candidates(targets);
        }

        let mut names = vec![name.to_string()];
        if let Some(fqn) = fqn {
            names.extend(self.index.external_ancestors(fqn).into_iter().map(|a| a.name));
        }
        self.catalog_fallback(&names, member)
            .map(ResolvedTargets::single)
            .unwrap_or_else(|| {
                ResolvedTargets::single(Target::unresolved(Some(name.to_string()), "unknown external call"))
            })
    }

    fn resolve_on_context(
        &self,
        super_call: bool,
        member: &str,
        arity: usize,
        ctx: &CallContext<'_>,
    ) -> ResolvedTargets {
        let (start, receiver) = if super_call {
            match ctx.class.superclass() {
                Some(parent) => match &parent.resolved {
                    Some(fqn) => (fqn.clone(), ctx.receiver.clone()),
                    None => {
                        let base = parent.type_ref.base_name().unwrap_or_default();
                        let mut names = vec![self.index.external_name(base, ctx.class)];
                        names.extend(self.external_names(&ctx.class.fqn));
                        return self
                            .catalog_fallback(&names, member)
                            .map(ResolvedTargets::single)
                            .unwrap_or_else(|| {
                                ResolvedTargets::single(Target::unresolved(
                                    names.into_iter().next(),
                                    "unknown external call",
                                ))
                            });
                    }
                },
                None => {
                    return ResolvedTargets::single(Target::unresolved(
                        Some(ctx.class.fqn.clone()),
                        "super call without a superclass",
                    ));
                }
            }
        } else {
            (ctx.receiver.class.clone(), ctx.receiver.clone())
        };

        if let Some(targets) = self.resolve_on_indexed(&start, receiver, member, arity) {
            return targets;
        }

        let names = self.external_names(&start);
        self.catalog_fallback(&names, member)
            .map(ResolvedTargets::single)
            .unwrap_or_else(|| {
                ResolvedTargets::single(Target::unresolved(
                    Some(start.clone()),
                    format!("no method {}/{} on {}", member, arity, simple_name(&start)),
                ))
            })
    }

    fn resolve_on_value(&self, value: &ValueType, member: &str, arity: usize) -> ResolvedTargets {
        let mut names = vec![value.name.clone()];
        if let Some(receiver) = &value.receiver {
            if let Some(targets) = self.resolve_on_indexed(&receiver.class, receiver.clone(), member, arity) {
                return targets;
            }
            names.extend(self.external_names(&receiver.class));
        }
        if let Some(slot) = &value.slot {
            names.extend(slot.catalog_type.iter().cloned());
            names.push(slot.ancestor.clone());
        }

        self.catalog_fallback(&names, member)
            .map(ResolvedTargets::single)
            .unwrap_or_else(|| {
                ResolvedTargets::single(Target::unresolved(Some(value.name.clone()), "unknown external call"))
            })
    }

    /// Project targets for `member` on an indexed type; `None` when the project declares none.
    fn resolve_on_indexed(
        &self,
        class: &str,
        receiver: Receiver,
        member: &str,
        arity: usize,
    ) -> Option<ResolvedTargets> {
        let lookup = self.index.find_methods(class, member, arity)?;
        let class_decl = self.index.get(class)?;

        let is_abstract = lookup
            .methods
            .iter()
            .any(|(mref, m)| self.is_abstract_method(mref, m));
        if is_abstract || class_decl.is_abstract() {
            let implementations = self.implementations(class, member, arity);
            if !implementations.is_empty() {
                debug!(class, member, count = implementations.len(), "polymorphic fan-out");
                return Some(ResolvedTargets::from_candidates(implementations));
            }
        }

        let targets = lookup
            .methods
            .iter()
            .map(|(mref, m)| {
                let dispatch = if m.is_static() {
                    Dispatch::Static
                } else if mref.owner == class {
                    Dispatch::Direct
                } else {
                    Dispatch::Inherited
                };
                project_target(mref, m, dispatch, receiver.clone())
            })
            .collect();
        Some(ResolvedTargets::from_candidates(targets))
    }

    /// Concrete implementations reachable through indexed subtypes of `class`.
    fn implementations(&self, class: &str, member: &str, arity: usize) -> Vec<Target> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for implementor in self.index.implementors(class) {
            let Some(lookup) = self.index.find_methods(&implementor, member, arity) else {
                continue;
            };
            for (mref, m) in &lookup.methods {
                if self.is_abstract_method(mref, m) || !seen.insert(mref.clone()) {
                    continue;
                }
                out.push(project_target(
                    mref,
                    m,
                    Dispatch::Polymorphic,
                    Receiver::plain(implementor.clone()),
                ));
            }
        }
        out
    }

    fn is_abstract_method(&self, mref: &MethodRef, method: &MethodDeclaration) -> bool {
        self.index
            .get(&mref.owner)
            .is_some_and(|owner| method.is_abstract(owner.kind))
    }

    fn external_names(&self, fqn: &str) -> Vec<String> {
        self.index
            .external_ancestors(fqn)
            .into_iter()
            .map(|a| a.name)
            .collect()
    }

    /// Query the catalog with each name in turn; the first name is the receiver type.
    fn catalog_fallback(&self, names: &[String], member: &str) -> Option<Target> {
        let receiver_type = names.iter().find(|name| !name.is_empty())?;
        let (position, entry) = self.config.registry.lookup_any(names, member)?;
        Some(Target::Framework {
            entry,
            receiver_type: receiver_type.clone(),
            queried_type: names[position].clone(),
        })
    }

    /// Static type of what a resolved link returns, used to type the next link.
    fn returned_value(&self, previous: &ResolvedTargets) -> Option<ValueType> {
        match previous.targets.first()? {
            Target::Project {
                method: Some(mref),
                receiver,
                ..
            } => {
                let method = self.index.method(mref)?;
                let returned = method.return_type.as_ref()?;
                if returned.is_primitive() {
                    return None;
                }
                match self.generics.resolve_in_context(returned, &mref.owner, receiver) {
                    TypeResolution::Resolved(ty) => Some(ValueType::from_resolved(&ty)),
                    TypeResolution::UnresolvedGeneric { .. } => None,
                }
            }
            Target::Project {
                method: None,
                receiver,
                ..
            } => Some(ValueType {
                name: receiver.class.clone(),
                receiver: Some(receiver.clone()),
                slot: None,
            }),
            Target::Framework {
                entry,
                receiver_type,
                queried_type,
            } => {
                let returned = TypeRef::parse(entry.method.returns.as_deref()?).ok()?;
                if returned.is_primitive() {
                    return None;
                }
                let returned = self.bind_catalog_return(&returned, receiver_type, queried_type)?;
                let name = returned.base_name()?;
                let receiver = match self.index.lookup_types(name).as_slice() {
                    [only] => Some(Receiver::plain(only.fqn.clone())),
                    _ => None,
                };
                Some(ValueType {
                    name: receiver
                        .as_ref()
                        .map(|r| r.class.clone())
                        .unwrap_or_else(|| name.to_string()),
                    receiver,
                    slot: None,
                })
            }
            Target::Unresolved { .. } => None,
        }
    }
}

impl CallResolver {
    /// Bind type variables of a catalog return type as seen from the receiver:
    /// through the receiver's generic view of the cataloged ancestor, else the
    /// ancestor's pattern slots. `None` while the outermost type stays a variable.
    fn bind_catalog_return(&self, returned: &TypeRef, receiver_type: &str, queried_type: &str) -> Option<TypeRef> {
        let mut bound = returned.clone();

        if self.index.contains(receiver_type)
            && let Some(binding) = self
                .generics
                .binding(&Receiver::plain(receiver_type), queried_type)
        {
            bound = binding.substitution().apply(&bound);
        }

        if let Some(pattern) = self.config.patterns.find(queried_type) {
            let mut subst = Substitution::new();
            for (position, parameter) in pattern.parameters().iter().enumerate() {
                if let Some(name) = pattern.synthesize(receiver_type, position) {
                    let name = match self.index.lookup_types(&name).as_slice() {
                        [only] => only.fqn.clone(),
                        _ => name,
                    };
                    subst.insert(parameter.clone(), TypeRef::Id(name));
                }
            }
            bound = subst.apply(&bound);
            if bound
                .base_name()
                .is_some_and(|base| pattern.parameters().iter().any(|p| p == base))
            {
                return None;
            }
        }

        match bound.base_name() {
            Some(base) if is_type_variable(base) && self.index.lookup_types(base).is_empty() => {
                debug!(returned = %returned, queried_type, "catalog return left unbound");
                None
            }
            Some(_) => Some(bound),
            None => None,
        }
    }
}

/// Conventional Java type-variable names: `T`, `E`, `K`, `V`, `T2`.
fn is_type_variable(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_digit())
}

fn project_target(mref: &MethodRef, method: &MethodDeclaration, dispatch: Dispatch, receiver: Receiver) -> Target {
    Target::Project {
        method: Some(mref.clone()),
        owner: mref.owner.clone(),
        signature: method.signature.clone(),
        dispatch,
        receiver,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodDescriptor;
    use chainscope_api::models::source::{
        LocalVariable, NormalizedField, NormalizedFile, NormalizedMethod, NormalizedParameter, NormalizedType,
        TypeKind,
    };
    use std::path::PathBuf;

    fn method(name: &str, params: usize, calls: Vec<CallExpression>) -> NormalizedMethod {
        NormalizedMethod {
            name: name.into(),
            parameters: (0..params)
                .map(|i| NormalizedParameter {
                    name: format!("p{}", i),
                    type_expr: "Object".into(),
                    varargs: false,
                })
                .collect(),
            calls,
            ..Default::default()
        }
    }

    fn setup(types: Vec<NormalizedType>, config: AnalysisConfig) -> (SymbolIndex, CallResolver) {
        let index = SymbolIndex::index(vec![NormalizedFile {
            path: PathBuf::from("src/App.java"),
            package: Some("com.app".into()),
            imports: vec!["org.apache.commons.lang3.StringUtils".into()],
            types,
        }]);
        let config = Arc::new(config);
        let generics = Arc::new(GenericResolver::new(index.clone(), config.clone()));
        let resolver = CallResolver::new(index.clone(), config, generics);
        (index, resolver)
    }

    fn resolve_in(
        index: &SymbolIndex,
        resolver: &CallResolver,
        class: &str,
        call: CallExpression,
    ) -> CallResolution {
        let decl = index.get(class).unwrap();
        let receiver = Receiver::plain(class);
        let ctx = CallContext {
            class: decl,
            method: &decl.methods[0],
            receiver: &receiver,
        };
        resolver.resolve(&call, &ctx)
    }

    fn owners(targets: &ResolvedTargets) -> Vec<&str> {
        targets.targets.iter().filter_map(Target::owner).collect()
    }

    #[test]
    fn interface_field_fans_out_to_implementations() {
        let gateway = NormalizedType {
            name: "PaymentGateway".into(),
            kind: TypeKind::Interface,
            methods: vec![method("charge", 1, vec![])],
            ..Default::default()
        };
        let stripe = NormalizedType {
            name: "StripeGateway".into(),
            implements: vec!["PaymentGateway".into()],
            methods: vec![method("charge", 1, vec![])],
            ..Default::default()
        };
        let paypal = NormalizedType {
            name: "PaypalGateway".into(),
            implements: vec!["PaymentGateway".into()],
            methods: vec![method("charge", 1, vec![])],
            ..Default::default()
        };
        let checkout = NormalizedType {
            name: "Checkout".into(),
            fields: vec![NormalizedField {
                name: "gateway".into(),
                type_expr: "PaymentGateway".into(),
                modifiers: vec![],
            }],
            methods: vec![method("pay", 0, vec![])],
            ..Default::default()
        };
        let (index, resolver) = setup(vec![gateway, stripe, paypal, checkout], AnalysisConfig::default());

        let resolution = resolve_in(
            &index,
            &resolver,
            "com.app.Checkout",
            CallExpression::new("this.gateway", "charge", 1),
        );
        let targets = &resolution.links[0].targets;
        assert!(targets.ambiguous);
        assert_eq!(owners(targets), vec!["com.app.PaypalGateway", "com.app.StripeGateway"]);
        assert!(targets.targets.iter().all(|t| matches!(
            t,
            Target::Project {
                dispatch: Dispatch::Polymorphic,
                ..
            }
        )));
    }

    #[test]
    fn locals_shadow_fields() {
        let mut service = NormalizedType {
            name: "Service".into(),
            fields: vec![NormalizedField {
                name: "repo".into(),
                type_expr: "OldRepo".into(),
                modifiers: vec![],
            }],
            methods: vec![method("run", 0, vec![])],
            ..Default::default()
        };
        service.methods[0].locals = vec![LocalVariable {
            name: "repo".into(),
            type_expr: "NewRepo".into(),
        }];
        let new_repo = NormalizedType {
            name: "NewRepo".into(),
            methods: vec![method("save", 0, vec![])],
            ..Default::default()
        };
        let old_repo = NormalizedType {
            name: "OldRepo".into(),
            methods: vec![method("save", 0, vec![])],
            ..Default::default()
        };
        let (index, resolver) = setup(vec![service, new_repo, old_repo], AnalysisConfig::default());

        let resolution = resolve_in(&index, &resolver, "com.app.Service", CallExpression::new("repo", "save", 0));
        assert_eq!(owners(&resolution.links[0].targets), vec!["com.app.NewRepo"]);

        let resolution = resolve_in(
            &index,
            &resolver,
            "com.app.Service",
            CallExpression::new("this.repo", "save", 0),
        );
        assert_eq!(owners(&resolution.links[0].targets), vec!["com.app.OldRepo"]);
    }

    #[test]
    fn constructors_and_static_calls() {
        let order = NormalizedType {
            name: "Order".into(),
            methods: vec![
                NormalizedMethod {
                    constructor: true,
                    ..method("Order", 1, vec![])
                },
                NormalizedMethod {
                    modifiers: vec!["static".into()],
                    ..method("of", 1, vec![])
                },
            ],
            ..Default::default()
        };
        let plain = NormalizedType {
            name: "Plain".into(),
            methods: vec![method("touch", 0, vec![])],
            ..Default::default()
        };
        let (index, resolver) = setup(vec![order, plain], AnalysisConfig::default());

        let ctor = CallExpression::new("", "Order", 1).with_shape(CallShape::Constructor);
        let resolution = resolve_in(&index, &resolver, "com.app.Plain", ctor);
        assert!(matches!(
            &resolution.links[0].targets.targets[0],
            Target::Project { dispatch: Dispatch::Constructor, signature, .. } if signature == "Order(Object)"
        ));

        let implicit = CallExpression::new("", "Plain", 0).with_shape(CallShape::Constructor);
        let resolution = resolve_in(&index, &resolver, "com.app.Plain", implicit);
        assert!(matches!(
            &resolution.links[0].targets.targets[0],
            Target::Project { method: None, .. }
        ));

        let stat = CallExpression::new("Order", "of", 1).with_shape(CallShape::Static);
        let resolution = resolve_in(&index, &resolver, "com.app.Plain", stat);
        assert!(matches!(
            &resolution.links[0].targets.targets[0],
            Target::Project { dispatch: Dispatch::Static, .. }
        ));
    }

    #[test]
    fn unknown_static_call_uses_catalog_then_gives_up() {
        let app = NormalizedType {
            name: "App".into(),
            methods: vec![method("main", 0, vec![])],
            ..Default::default()
        };
        let config = AnalysisConfig::builder()
            .catalog_method(
                "commons",
                "org.apache.commons.lang3.StringUtils",
                MethodDescriptor::new("isBlank").with_parameters(&["cs"]).returning("boolean"),
            )
            .build()
            .unwrap();
        let (index, resolver) = setup(vec![app], config);

        let hit = resolve_in(
            &index,
            &resolver,
            "com.app.App",
            CallExpression::new("StringUtils", "isBlank", 1),
        );
        assert!(matches!(&hit.links[0].targets.targets[0], Target::Framework { entry, .. } if entry.library == "commons"));
        let decl = index.get("com.app.App").unwrap();
        let receiver = Receiver::plain("com.app.App");
        let ctx = CallContext {
            class: decl,
            method: &decl.methods[0],
            receiver: &receiver,
        };
        assert_eq!(
            resolver.syntactic_owner(&CallExpression::new("StringUtils", "isBlank", 1), &ctx),
            "org.apache.commons.lang3.StringUtils"
        );

        let miss = resolve_in(&index, &resolver, "com.app.App", CallExpression::new("Unknown", "thing", 0));
        assert!(matches!(
            &miss.links[0].targets.targets[0],
            Target::Unresolved { owner_hint: Some(hint), .. } if hint == "Unknown"
        ));
    }

    #[test]
    fn chained_links_follow_return_types() {
        let mut factory = NormalizedType {
            name: "Factory".into(),
            methods: vec![method("builder", 0, vec![])],
            ..Default::default()
        };
        factory.methods[0].return_type = Some("Builder".into());
        let builder = NormalizedType {
            name: "Builder".into(),
            methods: vec![method("build", 0, vec![])],
            ..Default::default()
        };
        let app = NormalizedType {
            name: "App".into(),
            fields: vec![NormalizedField {
                name: "factory".into(),
                type_expr: "Factory".into(),
                modifiers: vec![],
            }],
            methods: vec![method("main", 0, vec![])],
            ..Default::default()
        };
        let (index, resolver) = setup(vec![factory, builder, app], AnalysisConfig::default());

        let call = CallExpression::new("factory", "builder", 0).then("build", 0).then("missing", 0);
        let resolution = resolve_in(&index, &resolver, "com.app.App", call);
        assert_eq!(resolution.links.len(), 3);
        assert_eq!(owners(&resolution.links[1].targets), vec!["com.app.Builder"]);
        assert_eq!(resolution.links[1].qualifier, "factory.builder()");
        assert!(!resolution.links[2].targets.is_resolved());

        let broken = CallExpression::new("nothing", "a", 0).then("b", 0);
        let resolution = resolve_in(&index, &resolver, "com.app.App", broken);
        assert!(matches!(
            &resolution.links[1].targets.targets[0],
            Target::Unresolved { reason, .. } if reason == BROKEN_CHAIN
        ));
    }
}
