//! Analysis facade: entry method in, serializable call tree out.

use crate::config::AnalysisConfig;
use crate::error::{ChainscopeError, Result};
use crate::generics::GenericResolver;
use crate::index::{MethodDeclaration, SymbolIndex, TypeDeclaration};
use crate::resolver::CallResolver;
use crate::tree::CallTreeBuilder;
use chainscope_api::{
    CallNode, CallTree, EntryPoint, EntryRef, ResolutionKind, TreeSummary, TruncationReason,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shares one index, configuration and binding cache across analyses.
pub struct Analyzer {
    index: SymbolIndex,
    config: Arc<AnalysisConfig>,
    generics: Arc<GenericResolver>,
    resolver: CallResolver,
}

impl Analyzer {
    pub fn new(index: SymbolIndex, config: Arc<AnalysisConfig>) -> Self {
        let generics = Arc::new(GenericResolver::new(index.clone(), config.clone()));
        let resolver = CallResolver::new(index.clone(), config.clone(), generics.clone());
        Self {
            index,
            config,
            generics,
            resolver,
        }
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn generics(&self) -> &GenericResolver {
        &self.generics
    }

    pub fn resolver(&self) -> &CallResolver {
        &self.resolver
    }

    /// Locate the entry method. Types are tried in qualified-name order, the
    /// first matching overload wins.
    pub fn entry_method(&self, entry: &EntryRef) -> Result<(&TypeDeclaration, &MethodDeclaration)> {
        self.index
            .lookup_types(&entry.type_name)
            .into_iter()
            .find_map(|decl| {
                decl.methods
                    .iter()
                    .find(|m| {
                        !m.constructor
                            && m.name == entry.method
                            && entry.arity.is_none_or(|arity| m.parameters.len() == arity)
                    })
                    .map(|m| (decl, m))
            })
            .ok_or_else(|| ChainscopeError::EntryNotFound(entry.to_string()))
    }

    pub fn analyze(&self, entry: &EntryRef) -> Result<CallTree> {
        let started = Instant::now();
        let (class, method) = self.entry_method(entry)?;

        let traversal = CallTreeBuilder::new(&self.index, &self.config, &self.resolver).build(class, method);
        let summary = summarize(&traversal.calls, traversal.ignored);

        info!(
            entry = %entry,
            nodes = summary.total_nodes,
            depth = summary.max_depth_reached,
            unresolved = summary.unresolved,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "call tree built"
        );

        Ok(CallTree {
            entry: EntryPoint {
                owner: class.fqn.clone(),
                signature: method.signature.clone(),
                file: class.file.clone(),
                line: method.line,
            },
            calls: traversal.calls,
            mappings: traversal.mappings,
            summary,
        })
    }

    /// Independent analyses in parallel; results keep the order of `entries`.
    pub fn analyze_many(&self, entries: &[EntryRef]) -> Vec<Result<CallTree>> {
        entries.par_iter().map(|entry| self.analyze(entry)).collect()
    }
}

pub fn summarize(calls: &[CallNode], ignored: usize) -> TreeSummary {
    let mut summary = TreeSummary {
        ignored,
        ..Default::default()
    };
    let mut owners = HashSet::new();

    for node in calls.iter().flat_map(CallNode::walk) {
        summary.total_nodes += 1;
        summary.max_depth_reached = summary.max_depth_reached.max(node.depth);
        match node.resolution {
            ResolutionKind::Project => summary.project += 1,
            ResolutionKind::Framework => summary.framework += 1,
            ResolutionKind::Unresolved => summary.unresolved += 1,
        }
        if node.ambiguous {
            summary.ambiguous += 1;
        }
        match node.truncated {
            Some(TruncationReason::Cycle) => summary.truncated_cycle += 1,
            Some(TruncationReason::MaxDepth) => summary.truncated_depth += 1,
            Some(TruncationReason::Deadline) => summary.truncated_deadline += 1,
            None => {}
        }
        if node.resolution != ResolutionKind::Unresolved
            && let Some(owner) = &node.owner
        {
            owners.insert(owner.as_str());
        }
    }

    summary.unique_owners = owners.len();
    summary
}
