//! Transition table and dispatcher
//!
//! The interview graph is a static table keyed by `(node, function)`. Looking
//! an edge up has no side effects, so the whole graph can be inspected and
//! tested without running a handler.

use super::catalog;
use super::controller::FlowController;
use super::effect::Effect;
use super::error::FlowError;
use super::handlers::{self, FunctionResult, Handler};
use super::node::{FunctionName, NodeDescriptor, NodeId};
use serde_json::json;

/// One edge of the interview graph
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: NodeId,
    pub function: FunctionName,
    pub handler: Handler,
    pub next: fn() -> NodeDescriptor,
}

/// Every legal edge. Strictly forward, no skips or back edges.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        from: NodeId::Initial,
        function: FunctionName::CollectName,
        handler: Handler::Collect(handlers::collect_name),
        next: catalog::collect_history,
    },
    Transition {
        from: NodeId::CollectHistory,
        function: FunctionName::CollectStartupHistory,
        handler: Handler::Collect(handlers::collect_startup_history),
        next: catalog::summarize,
    },
    Transition {
        from: NodeId::Summarize,
        function: FunctionName::EndCall,
        handler: Handler::Inspect(handlers::end_call),
        next: catalog::end,
    },
];

/// Edge for `function` called on `from`, if the graph has one
pub fn lookup(from: NodeId, function: FunctionName) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.function == function)
}

/// Apply a handler result: mirror collected fields into the controller's state
/// map, then activate the next node. Fails only if the flow has terminated.
pub fn advance(
    result: &FunctionResult,
    transition: &Transition,
    controller: &mut FlowController,
) -> Result<Vec<Effect>, FlowError> {
    match result {
        FunctionResult::NameCollected { name } => {
            controller.mirror_state("name", json!(name));
        }
        FunctionResult::HistoryCollected { startup_history } => {
            controller.mirror_state("startup_history", json!(startup_history));
        }
        FunctionResult::CallEnded { .. } => {}
    }
    controller.activate((transition.next)())
}
