//! Serializable result of one entry-method analysis.

use super::source::CallShape;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    /// Target declared in the analyzed project
    Project,
    /// Target found in the external method catalog
    Framework,
    Unresolved,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionKind::Project => "project",
            ResolutionKind::Framework => "framework",
            ResolutionKind::Unresolved => "unresolved",
        })
    }
}

/// How a project target was reached from its call site.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Declared on the receiver type itself
    Direct,
    /// Declared on an ancestor of the receiver type
    Inherited,
    /// One implementation of an abstract or interface declaration
    Polymorphic,
    Constructor,
    Static,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    High,
    /// Synthesized from a naming pattern rather than declared
    Low,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TruncationReason {
    MaxDepth,
    Cycle,
    Deadline,
}

impl fmt::Display for TruncationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TruncationReason::MaxDepth => "max-depth",
            TruncationReason::Cycle => "cycle",
            TruncationReason::Deadline => "deadline",
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct CallNode {
    pub shape: CallShape,
    pub qualifier: String,
    pub member: String,
    pub resolution: ResolutionKind,
    /// Qualified name of the resolved owner, or the best-known type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Catalog library tag for framework targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<Dispatch>,
    #[serde(default)]
    pub ambiguous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<TruncationReason>,
    /// Why a call stayed unresolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub line: u32,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CallNode>,
}

impl CallNode {
    /// Pre-order walk over this node and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &CallNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct EntryPoint {
    pub owner: String,
    pub signature: String,
    pub file: PathBuf,
    pub line: u32,
}

/// Call site to concrete owner mapping, used downstream for import generation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct MethodMapping {
    /// The call as written: `orderService.create()`
    pub call: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_statement: Option<String>,
    pub dispatch: Dispatch,
    pub line: u32,
    pub file: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct TreeSummary {
    pub total_nodes: usize,
    pub max_depth_reached: usize,
    pub project: usize,
    pub framework: usize,
    pub unresolved: usize,
    pub ambiguous: usize,
    pub truncated_cycle: usize,
    pub truncated_depth: usize,
    pub truncated_deadline: usize,
    /// Calls dropped by ignore rules
    pub ignored: usize,
    pub unique_owners: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct CallTree {
    pub entry: EntryPoint,
    pub calls: Vec<CallNode>,
    pub mappings: Vec<MethodMapping>,
    pub summary: TreeSummary,
}

impl CallTree {
    /// Pre-order walk over every node of the tree.
    pub fn nodes(&self) -> impl Iterator<Item = &CallNode> {
        self.calls.iter().flat_map(|node| node.walk())
    }

    pub fn find(&self, member: &str) -> Vec<&CallNode> {
        self.nodes().filter(|node| node.member == member).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(member: &str, depth: usize) -> CallNode {
        CallNode {
            shape: CallShape::Instance,
            qualifier: String::new(),
            member: member.to_string(),
            resolution: ResolutionKind::Unresolved,
            owner: None,
            signature: None,
            library: None,
            confidence: Confidence::High,
            dispatch: None,
            ambiguous: false,
            truncated: None,
            reason: None,
            line: 1,
            depth,
            children: Vec::new(),
        }
    }

    #[test]
    fn walks_in_pre_order() {
        let mut a = leaf("a", 1);
        let mut b = leaf("b", 2);
        b.children.push(leaf("c", 3));
        a.children.push(b);
        a.children.push(leaf("d", 2));

        let order: Vec<_> = a.walk().map(|n| n.member.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn serializes_truncation_in_kebab_case() {
        let mut node = leaf("run", 1);
        node.truncated = Some(TruncationReason::MaxDepth);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["truncated"], "max-depth");
        assert!(json.get("children").is_none());
        assert!(json.get("owner").is_none());
    }
}
