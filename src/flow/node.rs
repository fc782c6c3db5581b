//! Node and function declaration types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Position in the interview graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeId {
    Initial,
    CollectHistory,
    Summarize,
    End,
}

impl NodeId {
    pub const ALL: [NodeId; 4] = [
        NodeId::Initial,
        NodeId::CollectHistory,
        NodeId::Summarize,
        NodeId::End,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeId::Initial => "initial",
            NodeId::CollectHistory => "collect-history",
            NodeId::Summarize => "summarize",
            NodeId::End => "end",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown node: {s}"))
    }
}

/// Functions the assistant can call, across all nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionName {
    CollectName,
    CollectStartupHistory,
    EndCall,
}

impl FunctionName {
    pub const ALL: [FunctionName; 3] = [
        FunctionName::CollectName,
        FunctionName::CollectStartupHistory,
        FunctionName::EndCall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionName::CollectName => "collect_name",
            FunctionName::CollectStartupHistory => "collect_startup_history",
            FunctionName::EndCall => "end_call",
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FunctionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown function: {s}"))
    }
}

/// Declaration of a callable function, as handed to the LLM
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: FunctionName,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// Action the runtime performs after a node has been activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostAction {
    /// Stop producing turns and close the session
    EndSession,
}

/// Immutable description of a node, emitted to the transport on activation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    /// Issued once, when the conversation starts
    pub persona_instructions: Vec<String>,
    /// Issued on every activation
    pub task_instructions: Vec<String>,
    pub functions: Vec<FunctionSpec>,
    pub post_actions: Vec<PostAction>,
}

impl NodeDescriptor {
    /// Whether `function` is callable while this node is active
    #[allow(dead_code)] // Graph inspection
    pub fn declares(&self, function: FunctionName) -> bool {
        self.functions.iter().any(|spec| spec.name == function)
    }

    #[allow(dead_code)] // Graph inspection
    pub fn is_terminal(&self) -> bool {
        self.post_actions.contains(&PostAction::EndSession)
    }
}
