//! Depth-bounded, cycle-safe call tree traversal.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. The visited
//! set only covers the path from the root to the node being expanded, so a
//! method reached through two independent branches is expanded twice while
//! recursion along one path stops at the second visit.

use crate::config::AnalysisConfig;
use crate::generics::Receiver;
use crate::index::{MethodDeclaration, SymbolIndex, TypeDeclaration};
use crate::resolver::{CallContext, CallResolver, LinkResolution, Target};
use chainscope_api::models::naming::{member_fqn, package_of};
use chainscope_api::models::source::{CallExpression, CallShape};
use chainscope_api::{CallNode, Confidence, MethodMapping, ResolutionKind, TruncationReason};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Expanding,
    Expanded,
    Leaf(ResolutionKind),
    Truncated(TruncationReason),
}

#[derive(Debug, Clone)]
struct ArenaNode {
    shape: CallShape,
    qualifier: String,
    member: String,
    line: u32,
    target: Target,
    ambiguous: bool,
    depth: usize,
    state: NodeState,
    children: Vec<NodeId>,
}

/// Identity of one method body under one generic instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VisitKey {
    file: PathBuf,
    method: String,
    binding: String,
}

impl VisitKey {
    fn new(class: &TypeDeclaration, method: &MethodDeclaration, receiver: &Receiver) -> Self {
        Self {
            file: class.file.clone(),
            method: member_fqn(&class.fqn, &method.signature),
            binding: receiver.binding_signature(),
        }
    }
}

/// Result of one traversal, before summary statistics.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    pub calls: Vec<CallNode>,
    pub mappings: Vec<MethodMapping>,
    /// Calls and candidates dropped by ignore rules
    pub ignored: usize,
}

pub struct CallTreeBuilder<'a> {
    index: &'a SymbolIndex,
    config: &'a AnalysisConfig,
    resolver: &'a CallResolver,
    arena: Vec<ArenaNode>,
    path: Vec<VisitKey>,
    mappings: Vec<MethodMapping>,
    seen_mappings: HashSet<(String, String, u32, PathBuf)>,
    ignored: usize,
    started: Instant,
}

impl<'a> CallTreeBuilder<'a> {
    pub fn new(index: &'a SymbolIndex, config: &'a AnalysisConfig, resolver: &'a CallResolver) -> Self {
        Self {
            index,
            config,
            resolver,
            arena: Vec::new(),
            path: Vec::new(),
            mappings: Vec::new(),
            seen_mappings: HashSet::new(),
            ignored: 0,
            started: Instant::now(),
        }
    }

    /// Traverse from an entry method; the entry is depth 0, its calls depth 1.
    pub fn build(mut self, class: &'a TypeDeclaration, method: &'a MethodDeclaration) -> Traversal {
        let receiver = Receiver::plain(class.fqn.clone());
        self.path.push(VisitKey::new(class, method, &receiver));
        let roots = self.expand_body(class, method, &receiver, 1);
        self.path.pop();

        let calls = roots.iter().map(|&id| self.materialize(id)).collect();
        Traversal {
            calls,
            mappings: self.mappings,
            ignored: self.ignored,
        }
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.arena.get(id).map(|n| n.state)
    }

    fn expand_body(
        &mut self,
        class: &'a TypeDeclaration,
        method: &'a MethodDeclaration,
        receiver: &Receiver,
        depth: usize,
    ) -> Vec<NodeId> {
        let mut calls: Vec<&CallExpression> = method.calls.iter().collect();
        calls.sort_by_key(|c| c.line);

        let ctx = CallContext {
            class,
            method,
            receiver,
        };
        let mut out = Vec::new();
        for call in calls {
            let owner = self.resolver.syntactic_owner(call, &ctx);
            if self.config.ignore.is_ignored(&call.member, &owner) {
                debug!(call = %call.as_written(), "ignored");
                self.ignored += 1;
                continue;
            }

            let resolution = self.resolver.resolve(call, &ctx);
            for link in resolution.links {
                out.extend(self.add_link(link, call.line, depth, class));
            }
        }
        out
    }

    fn add_link(&mut self, link: LinkResolution, line: u32, depth: usize, caller: &TypeDeclaration) -> Vec<NodeId> {
        let before = link.targets.targets.len();
        let targets: Vec<Target> = link
            .targets
            .targets
            .into_iter()
            .filter(|target| {
                !self
                    .config
                    .ignore
                    .is_ignored(&link.member, target.owner().unwrap_or_default())
            })
            .collect();
        self.ignored += before - targets.len();
        // Only surviving candidates count as alternatives
        let ambiguous = targets.len() > 1;

        let mut ids = Vec::new();
        for target in targets {
            self.record_mapping(&link.qualifier, &link.member, link.shape, &target, line, caller);

            let id = self.arena.len();
            self.arena.push(ArenaNode {
                shape: link.shape,
                qualifier: link.qualifier.clone(),
                member: link.member.clone(),
                line,
                target,
                ambiguous,
                depth,
                state: NodeState::Pending,
                children: Vec::new(),
            });
            self.visit(id);
            ids.push(id);
        }
        ids
    }

    fn visit(&mut self, id: NodeId) {
        let (mref, receiver, depth) = match &self.arena[id].target {
            Target::Project {
                method: Some(mref),
                receiver,
                ..
            } => (mref.clone(), receiver.clone(), self.arena[id].depth),
            other => {
                let kind = other.kind();
                self.arena[id].state = NodeState::Leaf(kind);
                return;
            }
        };

        let index = self.index;
        let (Some(class), Some(method)) = (index.get(&mref.owner), index.method(&mref)) else {
            self.arena[id].state = NodeState::Leaf(ResolutionKind::Project);
            return;
        };

        if let Some(deadline) = self.config.deadline
            && self.started.elapsed() >= deadline
        {
            self.arena[id].state = NodeState::Truncated(TruncationReason::Deadline);
            return;
        }

        let key = VisitKey::new(class, method, &receiver);
        if self.path.contains(&key) {
            debug!(method = %key.method, "cycle on current path");
            self.arena[id].state = NodeState::Truncated(TruncationReason::Cycle);
            return;
        }

        if method.calls.is_empty() {
            self.arena[id].state = NodeState::Leaf(ResolutionKind::Project);
            return;
        }
        if depth >= self.config.max_depth {
            self.arena[id].state = NodeState::Truncated(TruncationReason::MaxDepth);
            return;
        }

        self.arena[id].state = NodeState::Expanding;
        self.path.push(key);
        let children = self.expand_body(class, method, &receiver, depth + 1);
        self.path.pop();
        let node = &mut self.arena[id];
        node.children = children;
        node.state = NodeState::Expanded;
    }

    fn record_mapping(
        &mut self,
        qualifier: &str,
        member: &str,
        shape: CallShape,
        target: &Target,
        line: u32,
        caller: &TypeDeclaration,
    ) {
        let Target::Project { owner, dispatch, .. } = target else {
            return;
        };
        let call = match shape {
            CallShape::Constructor => format!("new {}()", member),
            _ if qualifier.is_empty() => format!("{}()", member),
            _ => format!("{}.{}()", qualifier, member),
        };
        let key = (call.clone(), owner.clone(), line, caller.file.clone());
        if !self.seen_mappings.insert(key) {
            return;
        }
        self.mappings.push(MethodMapping {
            call,
            owner: owner.clone(),
            import_statement: import_statement(owner, caller.package.as_deref()),
            dispatch: *dispatch,
            line,
            file: caller.file.clone(),
        });
    }

    fn materialize(&self, id: NodeId) -> CallNode {
        let node = &self.arena[id];
        let (library, confidence, dispatch, reason) = match &node.target {
            Target::Project { dispatch, .. } => (None, Confidence::High, Some(*dispatch), None),
            Target::Framework { entry, .. } => (Some(entry.library.clone()), entry.confidence, None, None),
            Target::Unresolved { reason, .. } => (None, Confidence::High, None, Some(reason.clone())),
        };
        let truncated = match node.state {
            NodeState::Truncated(reason) => Some(reason),
            _ => None,
        };

        CallNode {
            shape: node.shape,
            qualifier: node.qualifier.clone(),
            member: node.member.clone(),
            resolution: node.target.kind(),
            owner: node.target.owner().map(str::to_string),
            signature: node.target.signature(),
            library,
            confidence,
            dispatch,
            ambiguous: node.ambiguous,
            truncated,
            reason,
            line: node.line,
            depth: node.depth,
            children: node.children.iter().map(|&c| self.materialize(c)).collect(),
        }
    }
}

/// `import pkg.Owner;` unless the owner needs none from `caller_package`.
fn import_statement(owner: &str, caller_package: Option<&str>) -> Option<String> {
    let package = package_of(owner)?;
    if package == "java.lang" || Some(package) == caller_package {
        return None;
    }
    Some(format!("import {};", owner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_skip_same_package_and_java_lang() {
        assert_eq!(import_statement("com.shop.Order", Some("com.shop")), None);
        assert_eq!(import_statement("java.lang.String", Some("com.shop")), None);
        assert_eq!(import_statement("Order", Some("com.shop")), None);
        assert_eq!(
            import_statement("com.shop.dao.OrderMapper", Some("com.shop.service")).as_deref(),
            Some("import com.shop.dao.OrderMapper;")
        );
    }
}
