//! Trait abstractions for runtime I/O
//!
//! The transport is everything outside the flow engine: media session,
//! transcription, the LLM pipeline. These traits enable testing the executor
//! with mock implementations.

use crate::flow::NodeDescriptor;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a transport call
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    #[allow(dead_code)] // Constructor for transports that can fail
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound side of the session
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start transcribing a participant's audio
    async fn capture_transcription(&self, participant_id: &str) -> Result<(), TransportError>;

    /// Emit a node's instructions and functions to the pipeline
    async fn activate_node(&self, node: &NodeDescriptor) -> Result<(), TransportError>;

    /// Stop producing turns once the terminal node has been spoken
    async fn end_session(&self) -> Result<(), TransportError>;

    /// Cancel the pipeline immediately
    async fn cancel_session(&self) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn capture_transcription(&self, participant_id: &str) -> Result<(), TransportError> {
        (**self).capture_transcription(participant_id).await
    }

    async fn activate_node(&self, node: &NodeDescriptor) -> Result<(), TransportError> {
        (**self).activate_node(node).await
    }

    async fn end_session(&self) -> Result<(), TransportError> {
        (**self).end_session().await
    }

    async fn cancel_session(&self) -> Result<(), TransportError> {
        (**self).cancel_session().await
    }
}
