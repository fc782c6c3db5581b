//! Effects produced by the flow controller

use super::node::{NodeDescriptor, PostAction};
use crate::observer::ObserverEvent;
use crate::session::SessionSnapshot;

/// Side effects for the runtime to execute, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start capturing transcription for a participant
    CaptureTranscription { participant_id: String },

    /// Emit a node's instructions and functions to the pipeline
    ActivateNode { node: NodeDescriptor },

    /// Best-effort notification to the observer channel
    PublishObserver { event: ObserverEvent },

    /// Run a node's post-activation action
    RunPostAction { action: PostAction },

    /// Tell the pipeline to stop; carries the last known session data
    CancelSession {
        reason: String,
        snapshot: SessionSnapshot,
    },
}

impl Effect {
    pub fn activate(node: NodeDescriptor) -> Self {
        Effect::ActivateNode { node }
    }

    pub fn cancel(reason: impl Into<String>, snapshot: SessionSnapshot) -> Self {
        Effect::CancelSession {
            reason: reason.into(),
            snapshot,
        }
    }
}
