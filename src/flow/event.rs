//! Inbound events for a session

use super::error::FlowError;
use super::handlers::FunctionResult;
use super::node::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

/// Reply channel for a function call
pub type FunctionReply = oneshot::Sender<Result<FunctionResult, FlowError>>;

/// Inbound events that drive a session, processed strictly in arrival order
///
/// Post-action completions are not events; the runtime hands them to the
/// controller itself after running the post-action.
#[derive(Debug)]
pub enum Event {
    // Transport events
    ParticipantJoined {
        participant_id: String,
    },
    ParticipantLeft {
        participant_id: String,
        reason: Option<String>,
    },
    TransportError {
        message: String,
    },

    // Pipeline events
    FunctionCalled {
        call: FunctionCall,
        reply: Option<FunctionReply>,
    },
}

/// A function invocation issued by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Node the caller believes is active, if it knows
    #[serde(default)]
    pub node: Option<NodeId>,
    pub function: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(function: impl Into<String>, args: Value) -> Self {
        Self {
            node: None,
            function: function.into(),
            args,
        }
    }

    /// Pin the call to the node it was issued from
    #[allow(dead_code)] // Console input pins calls via serde
    pub fn on_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}
