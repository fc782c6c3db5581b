//! Interview conversation flow
//!
//! The graph of dialogue nodes, the handlers behind each node's functions and
//! the controller that walks the graph one function call at a time.

pub mod catalog;
pub mod controller;
mod effect;
pub mod error;
pub mod event;
pub mod handlers;
mod lifecycle;
pub mod node;
pub mod transition;

#[cfg(test)]
mod proptests;

pub use controller::{CallOutcome, FlowController, FlowState, TerminationReason};
pub use effect::Effect;
pub use error::FlowError;
pub use event::{Event, FunctionCall};
pub use handlers::FunctionResult;
pub use node::{FunctionName, FunctionSpec, NodeDescriptor, NodeId, PostAction};
