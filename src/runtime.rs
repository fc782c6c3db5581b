//! Runtime for executing interview sessions
//!
//! One runtime task per session. Events reach it through an mpsc queue, so a
//! session's events are handled one at a time in arrival order.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::flow::{Event, FlowError, FunctionCall, FunctionResult, NodeId};
use crate::observer::ObserverSink;
use crate::session::SessionSnapshot;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the per-session update broadcast
const UPDATE_BUFFER: usize = 64;

/// Progress notifications published by a session runtime
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    NodeActivated {
        node: NodeId,
    },
    FunctionRejected {
        function: String,
        error: String,
    },
    JoinRejected {
        participant_id: String,
        error: String,
    },
    /// The terminal node's post-action ran
    Completed {
        snapshot: SessionSnapshot,
    },
    /// Leave, transport error or host cancellation
    Cancelled {
        reason: String,
        snapshot: SessionSnapshot,
    },
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    event_tx: mpsc::Sender<Event>,
    updates_tx: broadcast::Sender<SessionUpdate>,
    cancel: CancellationToken,
}

impl SessionHandle {
    #[allow(dead_code)] // API completeness
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Queue an event for the session
    pub async fn send(&self, event: Event) -> Result<(), FlowError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| FlowError::SessionClosed)
    }

    pub async fn participant_joined(&self, participant_id: impl Into<String>) -> Result<(), FlowError> {
        self.send(Event::ParticipantJoined {
            participant_id: participant_id.into(),
        })
        .await
    }

    pub async fn participant_left(
        &self,
        participant_id: impl Into<String>,
        reason: Option<String>,
    ) -> Result<(), FlowError> {
        self.send(Event::ParticipantLeft {
            participant_id: participant_id.into(),
            reason,
        })
        .await
    }

    pub async fn transport_error(&self, message: impl Into<String>) -> Result<(), FlowError> {
        self.send(Event::TransportError {
            message: message.into(),
        })
        .await
    }

    /// Invoke a function and wait for its result
    ///
    /// Resolves after the resulting node activation has been emitted. Fails
    /// with `SessionClosed` once the runtime has stopped.
    pub async fn call_function(&self, call: FunctionCall) -> Result<FunctionResult, FlowError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Event::FunctionCalled {
            call,
            reply: Some(reply_tx),
        })
        .await?;
        reply_rx.await.unwrap_or(Err(FlowError::SessionClosed))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates_tx.subscribe()
    }

    /// Ask the runtime to stop after the event in flight
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }

    /// Wait until the runtime has stopped
    pub async fn closed(&self) {
        self.event_tx.closed().await;
    }
}

/// Start a runtime for one session on the current tokio runtime
pub fn spawn_session<T, O>(
    session_id: impl Into<String>,
    transport: T,
    observer: O,
    event_buffer: usize,
) -> (SessionHandle, JoinHandle<SessionSnapshot>)
where
    T: Transport + 'static,
    O: ObserverSink + 'static,
{
    let session_id = session_id.into();
    let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
    let (updates_tx, _) = broadcast::channel(UPDATE_BUFFER);
    let cancel = CancellationToken::new();

    let runtime = SessionRuntime::new(
        session_id.clone(),
        transport,
        observer,
        event_rx,
        updates_tx.clone(),
        cancel.clone(),
    );
    let join = tokio::spawn(runtime.run());

    let handle = SessionHandle {
        session_id,
        event_tx,
        updates_tx,
        cancel,
    };
    (handle, join)
}

/// Manager for all session runtimes
///
/// Each session gets its own controller and `SessionData`; nothing is shared
/// between sessions except the observer sink.
pub struct SessionManager {
    observer: Arc<dyn ObserverSink>,
    event_buffer: usize,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(observer: Arc<dyn ObserverSink>, event_buffer: usize) -> Self {
        Self {
            observer,
            event_buffer,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the live runtime for a session or start a new one
    pub async fn start(&self, session_id: &str, transport: Arc<dyn Transport>) -> SessionHandle {
        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(session_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let (handle, _join) =
            spawn_session(session_id, transport, self.observer.clone(), self.event_buffer);
        tracing::info!(session_id = %session_id, "Session started");
        sessions.insert(session_id.to_string(), handle.clone());
        handle
    }

    /// Handle of a session whose runtime is still running
    #[allow(dead_code)] // API completeness
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Forget sessions whose runtime has stopped; returns how many were removed
    #[allow(dead_code)] // Housekeeping for long-lived hosts
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.is_closed());
        before - sessions.len()
    }

    /// Cancel every running session
    pub async fn cancel_all(&self) {
        for handle in self.sessions.read().await.values() {
            handle.cancel();
        }
    }
}
