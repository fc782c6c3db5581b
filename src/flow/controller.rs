//! Flow controller
//!
//! Owns the session's data and the active node. Every operation returns the
//! effects the runtime must execute; the controller itself does no I/O.

use super::catalog;
use super::effect::Effect;
use super::error::FlowError;
use super::event::FunctionCall;
use super::handlers::FunctionResult;
use super::node::{FunctionName, NodeDescriptor, NodeId, PostAction};
use super::transition::{self, Transition};
use crate::observer::ObserverEvent;
use crate::session::{SessionData, SessionSnapshot};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Lifecycle of a session's flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Uninitialized,
    Active { node: NodeId },
    /// Absorbing: no further calls are accepted
    Terminated { reason: TerminationReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminationReason {
    /// The terminal node's post-action ran
    Completed,
    /// Participant left or the transport failed
    Cancelled { reason: String },
}

/// Result of a successful function call
#[derive(Debug)]
pub struct CallOutcome {
    pub result: FunctionResult,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Default)]
pub struct FlowController {
    state: FlowState,
    current: Option<NodeDescriptor>,
    session: SessionData,
    /// Collected fields mirrored for the surrounding runtime
    state_map: BTreeMap<String, Value>,
}

impl FlowController {
    /// Controller with a fresh, empty `SessionData`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    #[allow(dead_code)] // Inspection API
    pub fn current_node(&self) -> Option<NodeId> {
        match self.state {
            FlowState::Active { node } => Some(node),
            _ => None,
        }
    }

    /// Descriptor of the most recently activated node
    #[allow(dead_code)] // Inspection API
    pub fn current_descriptor(&self) -> Option<&NodeDescriptor> {
        self.current.as_ref()
    }

    #[allow(dead_code)] // Inspection API
    pub fn session(&self) -> &SessionData {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    #[allow(dead_code)] // Inspection API
    pub fn state_map(&self) -> &BTreeMap<String, Value> {
        &self.state_map
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, FlowState::Terminated { .. })
    }

    /// Move out of `Uninitialized` and activate the initial node
    pub fn initialize(&mut self) -> Result<Vec<Effect>, FlowError> {
        if self.state != FlowState::Uninitialized {
            return Err(FlowError::AlreadyInitialized);
        }
        tracing::debug!("Initializing flow");
        self.activate(catalog::initial())
    }

    /// Make `node` the active node
    ///
    /// Emits the activation, followed by the node's post-actions. A terminated
    /// flow stays terminated.
    pub fn activate(&mut self, node: NodeDescriptor) -> Result<Vec<Effect>, FlowError> {
        if self.is_terminated() {
            tracing::warn!(node = %node.id, "Refusing to activate node on a closed session");
            return Err(FlowError::SessionClosed);
        }
        tracing::info!(node = %node.id, "Activating node");
        self.state = FlowState::Active { node: node.id };

        let mut effects = vec![Effect::activate(node.clone())];
        effects.extend(
            node.post_actions
                .iter()
                .map(|&action| Effect::RunPostAction { action }),
        );
        self.current = Some(node);
        Ok(effects)
    }

    /// Route a function call through its handler and on to the next node
    ///
    /// On error nothing changes: the active node stays active and the session
    /// data is untouched.
    pub fn call_function(&mut self, call: &FunctionCall) -> Result<CallOutcome, FlowError> {
        let node = match &self.state {
            FlowState::Uninitialized => {
                return Err(FlowError::invalid_transition(format!(
                    "{} called before the flow was initialized",
                    call.function
                )));
            }
            FlowState::Terminated { .. } => return Err(FlowError::SessionClosed),
            FlowState::Active { node } => *node,
        };

        if let Some(target) = call.node {
            if target != node {
                return Err(FlowError::invalid_transition(format!(
                    "{} called on {target} but {node} is active",
                    call.function
                )));
            }
        }

        let transition = resolve(node, &call.function)?;
        let result = transition.handler.run(&call.args, &mut self.session)?;
        debug_assert_eq!(result.function(), transition.function);

        let mut effects = vec![Effect::PublishObserver {
            event: ObserverEvent::data_collected(
                transition.function,
                node,
                &result,
                call.args.clone(),
                self.session.snapshot(),
            ),
        }];
        effects.extend(transition::advance(&result, transition, self)?);

        Ok(CallOutcome { result, effects })
    }

    /// Record that a post-action of the active node has run
    ///
    /// Only the node that declared `action` can complete it; anything else is
    /// rejected and leaves the state untouched.
    pub fn complete_post_action(&mut self, action: PostAction) -> Result<(), FlowError> {
        let node = match &self.state {
            FlowState::Uninitialized => {
                return Err(FlowError::invalid_transition(format!(
                    "{action:?} completed before the flow was initialized"
                )));
            }
            FlowState::Terminated { .. } => return Err(FlowError::SessionClosed),
            FlowState::Active { node } => *node,
        };

        let declared = self
            .current
            .as_ref()
            .is_some_and(|current| current.id == node && current.post_actions.contains(&action));
        if !declared {
            return Err(FlowError::invalid_transition(format!(
                "{action:?} is not a post-action of node {node}"
            )));
        }

        match action {
            PostAction::EndSession => {
                tracing::info!(complete = self.session.is_complete(), "Session ended");
                self.state = FlowState::Terminated {
                    reason: TerminationReason::Completed,
                };
            }
        }
        Ok(())
    }

    pub(super) fn mirror_state(&mut self, key: &str, value: Value) {
        self.state_map.insert(key.to_string(), value);
    }

    pub(super) fn cancel(&mut self, reason: &str) -> Effect {
        if !self.is_terminated() {
            self.state = FlowState::Terminated {
                reason: TerminationReason::Cancelled {
                    reason: reason.to_string(),
                },
            };
        }
        Effect::cancel(reason, self.session.snapshot())
    }
}

fn resolve(node: NodeId, function: &str) -> Result<&'static Transition, FlowError> {
    let name: FunctionName = function
        .parse()
        .map_err(|e: String| FlowError::invalid_transition(format!("{e} (active node: {node})")))?;
    transition::lookup(node, name).ok_or_else(|| {
        FlowError::invalid_transition(format!("{name} is not declared on node {node}"))
    })
}
