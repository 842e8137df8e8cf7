//! Generic type resolution through inheritance chains.
//!
//! For a concrete class, the resolver walks the hierarchy breadth-first and
//! records, for every ancestor, what each of the ancestor's type parameters is
//! bound to as seen from the class. Parameters bound by explicit type
//! arguments are substituted; parameters left open by raw usage keep the trail
//! of positions they were forwarded through, which is what the pattern table
//! and declared bounds are consulted with.

pub mod substitution;

pub use substitution::Substitution;

use crate::config::{AnalysisConfig, RawGenericPolicy};
use crate::index::SymbolIndex;
use chainscope_api::TypeRef;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Where a resolved type came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Written as a concrete type
    Declared,
    /// Bound by explicit type arguments somewhere up the chain
    Substituted { ancestor: String },
    /// Synthesized by the pattern table for a raw ancestor
    Pattern { ancestor: String, role: String },
    /// First concrete bound of an open parameter
    Bound { parameter: String },
}

/// The pattern slot a resolved type occupies, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SlotInfo {
    pub ancestor: String,
    pub role: String,
    pub catalog_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    /// The type with every known binding applied
    pub type_ref: TypeRef,
    /// Indexed type whose source the outermost name was written in
    pub scope: String,
    /// Qualified name when the outermost type is indexed
    pub fqn: Option<String>,
    /// `fqn` if indexed, otherwise the best-known external name
    pub name: String,
    pub provenance: Provenance,
    pub slot: Option<SlotInfo>,
}

impl ResolvedType {
    /// The generic context a call on a value of this type runs in.
    pub fn receiver(&self) -> Option<Receiver> {
        self.fqn.as_ref().map(|fqn| Receiver {
            class: fqn.clone(),
            args: self.type_ref.args().to_vec(),
            scope: self.scope.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeResolution {
    Resolved(ResolvedType),
    /// The parameter has no binding, pattern or bound; the type is unknown
    UnresolvedGeneric { parameter: String, declared_on: String },
}

impl TypeResolution {
    pub fn resolved(&self) -> Option<&ResolvedType> {
        match self {
            TypeResolution::Resolved(ty) => Some(ty),
            TypeResolution::UnresolvedGeneric { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResolution {
    Resolved(ResolvedType),
    UnresolvedGeneric { parameter: String, declared_on: String },
    NoSuchField,
}

impl From<TypeResolution> for FieldResolution {
    fn from(resolution: TypeResolution) -> Self {
        match resolution {
            TypeResolution::Resolved(ty) => FieldResolution::Resolved(ty),
            TypeResolution::UnresolvedGeneric {
                parameter,
                declared_on,
            } => FieldResolution::UnresolvedGeneric {
                parameter,
                declared_on,
            },
        }
    }
}

impl FieldResolution {
    pub fn resolved(&self) -> Option<&ResolvedType> {
        match self {
            FieldResolution::Resolved(ty) => Some(ty),
            _ => None,
        }
    }
}

/// The instance a method body executes on: an indexed class, optionally
/// with explicit type arguments written in `scope`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Receiver {
    pub class: String,
    pub args: Vec<TypeRef>,
    pub scope: String,
}

impl Receiver {
    pub fn plain(class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            scope: class.clone(),
            class,
            args: Vec::new(),
        }
    }

    /// `Class` or `Class<A, B>`; distinguishes generic instantiations of one body.
    pub fn binding_signature(&self) -> String {
        if self.args.is_empty() {
            return self.class.clone();
        }
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        format!("{}<{}>", self.class, args.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamSlot {
    owner: String,
    position: usize,
    parameter: String,
    indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamValue {
    /// Bound type and the indexed type it was written in
    bound: Option<(TypeRef, String)>,
    /// Positions this value was forwarded through, the ancestor itself first
    trace: Vec<ParamSlot>,
}

/// Bindings of one ancestor's type parameters as seen from one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericBinding {
    /// Qualified name if indexed, best-known external name otherwise
    pub ancestor: String,
    pub indexed: bool,
    pub parameters: Vec<String>,
    values: Vec<ParamValue>,
}

impl GenericBinding {
    pub fn get(&self, parameter: &str) -> Option<&TypeRef> {
        let pos = self.parameters.iter().position(|p| p == parameter)?;
        self.values[pos].bound.as_ref().map(|(ty, _)| ty)
    }

    pub fn substitution(&self) -> Substitution {
        let mut subst = Substitution::new();
        for (param, value) in self.parameters.iter().zip(&self.values) {
            if let Some((ty, _)) = &value.bound {
                subst.insert(param.clone(), ty.clone());
            }
        }
        subst
    }
}

pub struct GenericResolver {
    index: SymbolIndex,
    config: Arc<AnalysisConfig>,
    /// Concrete class → bindings for every (class, ancestor) pair, walk order
    cache: DashMap<String, Arc<[GenericBinding]>>,
}

impl GenericResolver {
    pub fn new(index: SymbolIndex, config: Arc<AnalysisConfig>) -> Self {
        Self {
            index,
            config,
            cache: DashMap::new(),
        }
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Type of `field_name` as seen from `owning_class`.
    pub fn resolve_field_type(&self, field_name: &str, owning_class: &str) -> FieldResolution {
        self.resolve_field(field_name, &Receiver::plain(owning_class))
    }

    pub fn resolve_field(&self, field_name: &str, receiver: &Receiver) -> FieldResolution {
        if let Some((declaring, field)) = self.index.find_field(&receiver.class, field_name) {
            let declaring = declaring.fqn.clone();
            return self
                .resolve_in_context(&field.type_ref, &declaring, receiver)
                .into();
        }

        // Members that pattern entries declare on unindexed ancestors
        let bindings = self.bindings(receiver);
        for binding in bindings.iter().filter(|b| !b.indexed) {
            if let Some(pattern) = self.config.patterns.find(&binding.ancestor)
                && let Some(member_type) = pattern.member(field_name)
            {
                debug!(field = field_name, ancestor = %binding.ancestor, "field from pattern member");
                return self.resolve_against(member_type, binding, receiver).into();
            }
        }

        FieldResolution::NoSuchField
    }

    /// Resolve `declared` (written in `declaring`) for code running on `receiver`.
    pub fn resolve_in_context(
        &self,
        declared: &TypeRef,
        declaring: &str,
        receiver: &Receiver,
    ) -> TypeResolution {
        let bindings = self.bindings(receiver);
        if let Some(binding) = bindings.iter().find(|b| b.ancestor == declaring) {
            return self.resolve_against(declared, binding, receiver);
        }
        // `declaring` is not above the receiver; view it on its own
        let own = Receiver::plain(declaring);
        let bindings = self.bindings(&own);
        match bindings.first() {
            Some(binding) => self.resolve_against(declared, binding, &own),
            None => self.finish(declared.clone(), declaring, Provenance::Declared, None),
        }
    }

    /// Bindings for `(receiver.class, ancestor)`.
    pub fn binding(&self, receiver: &Receiver, ancestor: &str) -> Option<GenericBinding> {
        self.bindings(receiver)
            .iter()
            .find(|b| b.ancestor == ancestor)
            .cloned()
    }

    fn bindings(&self, receiver: &Receiver) -> Arc<[GenericBinding]> {
        if !receiver.args.is_empty() {
            return self.walk(receiver).into();
        }
        if let Some(cached) = self.cache.get(&receiver.class) {
            return cached.clone();
        }
        let walked: Arc<[GenericBinding]> = self.walk(receiver).into();
        // Concurrent walks of the same class produce identical results
        self.cache
            .entry(receiver.class.clone())
            .or_insert_with(|| walked.clone())
            .clone()
    }

    fn walk(&self, receiver: &Receiver) -> Vec<GenericBinding> {
        let Some(root) = self.index.get(&receiver.class) else {
            return Vec::new();
        };

        let explicit_root = receiver.args.len() == root.type_parameters.len();
        let root_binding = GenericBinding {
            ancestor: root.fqn.clone(),
            indexed: true,
            parameters: root.type_parameters.iter().map(|p| p.name.clone()).collect(),
            values: root
                .type_parameters
                .iter()
                .enumerate()
                .map(|(position, p)| ParamValue {
                    bound: explicit_root
                        .then(|| receiver.args.get(position))
                        .flatten()
                        .map(|ty| (ty.clone(), receiver.scope.clone())),
                    trace: vec![ParamSlot {
                        owner: root.fqn.clone(),
                        position,
                        parameter: p.name.clone(),
                        indexed: true,
                    }],
                })
                .collect(),
        };

        let mut out = vec![root_binding];
        let mut visited = HashSet::from([root.fqn.clone()]);
        let mut queue = VecDeque::from([0usize]);

        while let Some(current_idx) = queue.pop_front() {
            let current = out[current_idx].clone();
            let Some(decl) = self.index.get(&current.ancestor) else {
                continue;
            };
            let current_subst = current.substitution();

            for supertype in &decl.supertypes {
                let Some(base) = supertype.type_ref.base_name() else {
                    continue;
                };
                let (ancestor, indexed, parameters) = match &supertype.resolved {
                    Some(fqn) => {
                        let params = self
                            .index
                            .get(fqn)
                            .map(|d| d.type_parameters.iter().map(|p| p.name.clone()).collect())
                            .unwrap_or_default();
                        (fqn.clone(), true, params)
                    }
                    None => {
                        let name = self.index.external_name(base, decl);
                        let params = self
                            .config
                            .patterns
                            .find(&name)
                            .map(|p| p.parameters().to_vec())
                            .unwrap_or_default();
                        (name, false, params)
                    }
                };
                if !visited.insert(ancestor.clone()) {
                    continue;
                }

                let args = supertype.type_ref.args();
                let explicit = !args.is_empty() && args.len() == parameters.len();
                let values = parameters
                    .iter()
                    .enumerate()
                    .map(|(position, parameter)| {
                        let slot = ParamSlot {
                            owner: ancestor.clone(),
                            position,
                            parameter: parameter.clone(),
                            indexed,
                        };
                        if !explicit {
                            return ParamValue {
                                bound: None,
                                trace: vec![slot],
                            };
                        }
                        let arg = &args[position];
                        // Forwarding one of the current type's own parameters
                        if let TypeRef::Id(name) = arg
                            && let Some(j) = current.parameters.iter().position(|p| p == name)
                        {
                            let forwarded = &current.values[j];
                            let mut trace = vec![slot];
                            trace.extend(forwarded.trace.iter().cloned());
                            return ParamValue {
                                bound: forwarded.bound.clone(),
                                trace,
                            };
                        }
                        ParamValue {
                            bound: Some((current_subst.apply(arg), decl.fqn.clone())),
                            trace: vec![slot],
                        }
                    })
                    .collect();

                out.push(GenericBinding {
                    ancestor,
                    indexed,
                    parameters,
                    values,
                });
                if indexed {
                    queue.push_back(out.len() - 1);
                }
            }
        }

        out
    }

    fn resolve_against(
        &self,
        declared: &TypeRef,
        binding: &GenericBinding,
        receiver: &Receiver,
    ) -> TypeResolution {
        let parameter_position = match declared {
            TypeRef::Id(name) => binding.parameters.iter().position(|p| p == name),
            TypeRef::Array { element, .. } => match element.as_ref() {
                TypeRef::Id(name) => binding.parameters.iter().position(|p| p == name),
                _ => None,
            },
            _ => None,
        };

        let Some(position) = parameter_position else {
            // Already concrete; nested arguments still see known bindings
            let type_ref = binding.substitution().apply(declared);
            return self.finish(type_ref, &binding.ancestor, Provenance::Declared, None);
        };

        let value = &binding.values[position];
        let parameter = &binding.parameters[position];
        if let Some((bound, scope)) = &value.bound {
            let type_ref = Substitution::single(parameter.clone(), bound.clone()).apply(declared);
            let slot = self.slot_for(&value.trace);
            return self.finish(
                type_ref,
                scope,
                Provenance::Substituted {
                    ancestor: binding.ancestor.clone(),
                },
                slot,
            );
        }

        self.resolve_open(declared, parameter, value, receiver)
    }

    fn resolve_open(
        &self,
        declared: &TypeRef,
        parameter: &str,
        value: &ParamValue,
        receiver: &Receiver,
    ) -> TypeResolution {
        if self.config.raw_generic_policy == RawGenericPolicy::NamingHeuristic {
            for slot in &value.trace {
                let Some(pattern) = self.config.patterns.find(&slot.owner) else {
                    continue;
                };
                let (Some(name), Some(pattern_slot)) = (
                    pattern.synthesize(&receiver.class, slot.position),
                    pattern.slot(slot.position),
                ) else {
                    continue;
                };
                debug!(
                    receiver = %receiver.class,
                    ancestor = %slot.owner,
                    role = %pattern_slot.role,
                    synthesized = %name,
                    "raw generic resolved by pattern"
                );
                let type_ref = Substitution::single(parameter, TypeRef::Id(name)).apply(declared);
                let info = SlotInfo {
                    ancestor: slot.owner.clone(),
                    role: pattern_slot.role.clone(),
                    catalog_type: pattern_slot.catalog_type.clone(),
                };
                return self.finish(
                    type_ref,
                    &receiver.class,
                    Provenance::Pattern {
                        ancestor: slot.owner.clone(),
                        role: pattern_slot.role.clone(),
                    },
                    Some(info),
                );
            }
        }

        for slot in value.trace.iter().filter(|s| s.indexed) {
            let Some(decl) = self.index.get(&slot.owner) else {
                continue;
            };
            let Some(param) = decl.type_parameters.get(slot.position) else {
                continue;
            };
            let concrete = param.bounds.iter().find(|bound| {
                bound
                    .base_name()
                    .is_some_and(|base| decl.type_parameter(base).is_none())
            });
            if let Some(bound) = concrete {
                let type_ref = Substitution::single(parameter, bound.clone()).apply(declared);
                return self.finish(
                    type_ref,
                    &decl.fqn,
                    Provenance::Bound {
                        parameter: param.name.clone(),
                    },
                    self.slot_for(&value.trace),
                );
            }
        }

        let origin = value.trace.first();
        TypeResolution::UnresolvedGeneric {
            parameter: origin.map(|s| s.parameter.clone()).unwrap_or_else(|| parameter.to_string()),
            declared_on: origin.map(|s| s.owner.clone()).unwrap_or_default(),
        }
    }

    fn slot_for(&self, trace: &[ParamSlot]) -> Option<SlotInfo> {
        trace.iter().find_map(|slot| {
            let pattern = self.config.patterns.find(&slot.owner)?;
            let pattern_slot = pattern.slot(slot.position)?;
            Some(SlotInfo {
                ancestor: slot.owner.clone(),
                role: pattern_slot.role.clone(),
                catalog_type: pattern_slot.catalog_type.clone(),
            })
        })
    }

    fn finish(
        &self,
        type_ref: TypeRef,
        scope: &str,
        provenance: Provenance,
        slot: Option<SlotInfo>,
    ) -> TypeResolution {
        let base = if type_ref.is_primitive() {
            None
        } else {
            type_ref.base_name()
        };
        let (fqn, name) = match (base, self.index.get(scope)) {
            (Some(base), Some(decl)) => {
                let fqn = self.index.resolve_type_name(base, decl);
                let name = fqn
                    .clone()
                    .unwrap_or_else(|| self.index.external_name(base, decl));
                (fqn, name)
            }
            (Some(base), None) => {
                let matches = self.index.lookup_types(base);
                match matches.as_slice() {
                    [only] => (Some(only.fqn.clone()), only.fqn.clone()),
                    _ => (None, base.to_string()),
                }
            }
            (None, _) => (None, type_ref.to_string()),
        };

        TypeResolution::Resolved(ResolvedType {
            type_ref,
            scope: scope.to_string(),
            fqn,
            name,
            provenance,
            slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::patterns::{PatternEntry, PatternMember, PatternSlot};
    use chainscope_api::models::source::{
        NormalizedField, NormalizedFile, NormalizedType, TypeParameterDecl,
    };
    use std::path::PathBuf;

    fn ty(name: &str, params: &[&str], extends: &[&str]) -> NormalizedType {
        NormalizedType {
            name: name.into(),
            type_parameters: params
                .iter()
                .map(|p| TypeParameterDecl {
                    name: p.to_string(),
                    bounds: vec![],
                })
                .collect(),
            extends: extends.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn field(name: &str, type_expr: &str) -> NormalizedField {
        NormalizedField {
            name: name.into(),
            type_expr: type_expr.into(),
            modifiers: vec![],
        }
    }

    fn index(types: Vec<NormalizedType>) -> SymbolIndex {
        SymbolIndex::index(vec![NormalizedFile {
            path: PathBuf::from("src/Types.java"),
            package: Some("com.x".into()),
            imports: vec![],
            types,
        }])
    }

    fn service_impl_pattern() -> PatternEntry {
        PatternEntry {
            ancestor: "ServiceImpl".into(),
            parameters: vec!["M".into(), "T".into()],
            slots: vec![
                PatternSlot {
                    role: "mapper".into(),
                    suffix: "Mapper".into(),
                    catalog_type: None,
                },
                PatternSlot {
                    role: "entity".into(),
                    suffix: String::new(),
                    catalog_type: None,
                },
            ],
            members: vec![PatternMember {
                name: "baseMapper".into(),
                type_expr: "M".into(),
            }],
            strip_suffixes: vec!["ServiceImpl".into()],
        }
    }

    fn resolver(index: SymbolIndex, config: AnalysisConfig) -> GenericResolver {
        GenericResolver::new(index, Arc::new(config))
    }

    #[test]
    fn substitutes_through_intermediate_class() {
        let mut base = ty("Base", &["M", "T"], &[]);
        base.fields = vec![field("mapper", "M"), field("items", "List<T>")];
        let idx = index(vec![
            base,
            ty("Mid", &["M", "T"], &["Base<M, T>"]),
            ty("Impl", &[], &["Mid<ConcreteM, ConcreteT>"]),
            ty("ConcreteM", &[], &[]),
        ]);
        let r = resolver(idx, AnalysisConfig::default());

        let resolved = r.resolve_field_type("mapper", "com.x.Impl");
        let ty = resolved.resolved().unwrap();
        assert_eq!(ty.fqn.as_deref(), Some("com.x.ConcreteM"));
        assert_eq!(
            ty.provenance,
            Provenance::Substituted {
                ancestor: "com.x.Base".into()
            }
        );

        let items = r.resolve_field_type("items", "com.x.Impl");
        assert_eq!(items.resolved().unwrap().type_ref.to_string(), "List<ConcreteT>");
        assert_eq!(items.resolved().unwrap().provenance, Provenance::Declared);
    }

    #[test]
    fn pattern_member_with_explicit_arguments() {
        let idx = index(vec![
            ty("OrderServiceImpl", &[], &["ServiceImpl<OrderMapper, Order>"]),
            ty("OrderMapper", &[], &[]),
        ]);
        let config = AnalysisConfig::builder()
            .pattern(service_impl_pattern())
            .build()
            .unwrap();
        let r = resolver(idx, config);

        let resolved = r.resolve_field_type("baseMapper", "com.x.OrderServiceImpl");
        let ty = resolved.resolved().unwrap();
        assert_eq!(ty.fqn.as_deref(), Some("com.x.OrderMapper"));
        assert_eq!(ty.slot.as_ref().map(|s| s.role.as_str()), Some("mapper"));
    }

    #[test]
    fn raw_usage_falls_back_to_naming_heuristic() {
        let idx = index(vec![
            ty("BaseServiceImpl", &["M", "T"], &["ServiceImpl<M, T>"]),
            ty("OrderServiceImpl", &[], &["BaseServiceImpl"]),
            ty("OrderMapper", &[], &[]),
        ]);
        let config = AnalysisConfig::builder()
            .pattern(service_impl_pattern())
            .build()
            .unwrap();
        let r = resolver(idx, config);

        let resolved = r.resolve_field_type("baseMapper", "com.x.OrderServiceImpl");
        let ty = resolved.resolved().unwrap();
        assert_eq!(ty.name, "com.x.OrderMapper");
        assert_eq!(
            ty.provenance,
            Provenance::Pattern {
                ancestor: "ServiceImpl".into(),
                role: "mapper".into()
            }
        );
    }

    #[test]
    fn unresolved_policy_skips_heuristic() {
        let idx = index(vec![ty("OrderServiceImpl", &[], &["ServiceImpl"])]);
        let config = AnalysisConfig::builder()
            .pattern(service_impl_pattern())
            .raw_generic_policy(RawGenericPolicy::Unresolved)
            .build()
            .unwrap();
        let r = resolver(idx, config);

        assert_eq!(
            r.resolve_field_type("baseMapper", "com.x.OrderServiceImpl"),
            FieldResolution::UnresolvedGeneric {
                parameter: "M".into(),
                declared_on: "ServiceImpl".into()
            }
        );
    }

    #[test]
    fn open_parameter_uses_first_concrete_bound() {
        let mut repo = ty("Repo", &["E"], &[]);
        repo.type_parameters[0].bounds = vec!["Entity".into()];
        repo.fields = vec![field("sample", "E")];
        let idx = index(vec![repo, ty("Entity", &[], &[])]);
        let r = resolver(idx, AnalysisConfig::default());

        let resolved = r.resolve_field_type("sample", "com.x.Repo");
        let ty = resolved.resolved().unwrap();
        assert_eq!(ty.fqn.as_deref(), Some("com.x.Entity"));
        assert_eq!(ty.provenance, Provenance::Bound { parameter: "E".into() });
    }

    #[test]
    fn exhausted_chain_is_unresolved_not_error() {
        let mut holder = ty("Holder", &["T"], &[]);
        holder.fields = vec![field("value", "T")];
        let idx = index(vec![holder]);
        let r = resolver(idx, AnalysisConfig::default());

        assert!(matches!(
            r.resolve_field_type("value", "com.x.Holder"),
            FieldResolution::UnresolvedGeneric { .. }
        ));
        assert_eq!(r.resolve_field_type("missing", "com.x.Holder"), FieldResolution::NoSuchField);
    }

    #[test]
    fn receiver_arguments_bind_own_parameters() {
        let mut holder = ty("Holder", &["T"], &[]);
        holder.fields = vec![field("value", "T")];
        let idx = index(vec![holder, ty("Order", &[], &[])]);
        let r = resolver(idx, AnalysisConfig::default());

        let receiver = Receiver {
            class: "com.x.Holder".into(),
            args: vec![TypeRef::id("Order")],
            scope: "com.x.Holder".into(),
        };
        let resolved = r.resolve_field("value", &receiver);
        assert_eq!(resolved.resolved().unwrap().fqn.as_deref(), Some("com.x.Order"));
        assert_eq!(receiver.binding_signature(), "com.x.Holder<Order>");
    }

    #[test]
    fn cyclic_generic_hierarchy_terminates() {
        let mut a = ty("A", &["T"], &["B<T>"]);
        a.fields = vec![field("value", "T")];
        let idx = index(vec![a, ty("B", &["U"], &["A<U>"])]);
        let r = resolver(idx, AnalysisConfig::default());
        assert!(matches!(
            r.resolve_field_type("value", "com.x.B"),
            FieldResolution::UnresolvedGeneric { .. }
        ));
    }
}
