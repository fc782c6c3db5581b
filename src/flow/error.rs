//! Flow error types

use super::node::FunctionName;
use thiserror::Error;

/// Errors surfaced to the caller of a flow operation
///
/// None of these end the session; the active node stays put.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Required argument missing or empty; the call can be retried
    #[error("Invalid arguments for {function}: {message}")]
    Argument {
        function: FunctionName,
        message: String,
    },
    /// Function not declared on the active node
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Flow already initialized")]
    AlreadyInitialized,
    #[error("Session closed, no further function calls are accepted")]
    SessionClosed,
}

impl FlowError {
    pub fn argument(function: FunctionName, message: impl Into<String>) -> Self {
        Self::Argument {
            function,
            message: message.into(),
        }
    }

    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition(message.into())
    }
}
