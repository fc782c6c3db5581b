//! Session runtime executor

use super::traits::Transport;
use super::SessionUpdate;

use crate::flow::event::FunctionReply;
use crate::flow::{CallOutcome, Effect, Event, FlowController, FlowError, FunctionResult, PostAction};
use crate::observer::ObserverSink;
use crate::session::SessionSnapshot;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Reply owed to a function caller, sent once the call's effects have run
type PendingReply = (FunctionReply, Result<FunctionResult, FlowError>);

/// Drives one session: consumes its events in order, runs them through the
/// flow controller and executes the resulting effects
pub struct SessionRuntime<T, O>
where
    T: Transport + 'static,
    O: ObserverSink + 'static,
{
    session_id: String,
    controller: FlowController,
    transport: T,
    observer: O,
    event_rx: mpsc::Receiver<Event>,
    updates_tx: broadcast::Sender<SessionUpdate>,
    /// Cooperative cancellation from the host, checked between events
    cancel: CancellationToken,
}

impl<T, O> SessionRuntime<T, O>
where
    T: Transport + 'static,
    O: ObserverSink + 'static,
{
    pub fn new(
        session_id: impl Into<String>,
        transport: T,
        observer: O,
        event_rx: mpsc::Receiver<Event>,
        updates_tx: broadcast::Sender<SessionUpdate>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            controller: FlowController::new(),
            transport,
            observer,
            event_rx,
            updates_tx,
            cancel,
        }
    }

    /// Run until the session terminates, returning the final session data
    pub async fn run(mut self) -> SessionSnapshot {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    let effects = self.controller.on_host_cancel();
                    self.execute_all(effects).await;
                    break;
                }
                event = self.event_rx.recv() => {
                    if let Some(event) = event {
                        self.process_event(event).await;
                    } else {
                        tracing::debug!(session_id = %self.session_id, "Event channel closed");
                        let effects = self.controller.on_host_cancel();
                        self.execute_all(effects).await;
                        break;
                    }
                }
            }

            if self.controller.is_terminated() {
                break;
            }
        }

        let snapshot = self.controller.snapshot();
        tracing::info!(
            session_id = %self.session_id,
            state = ?self.controller.state(),
            complete = snapshot.is_complete(),
            "Session runtime stopped"
        );
        snapshot
    }

    async fn process_event(&mut self, event: Event) {
        let (effects, reply) = self.apply(event);

        // Post-actions that ran while executing this event's effects
        let mut completed = Vec::new();
        for effect in effects {
            if let Some(action) = self.execute_effect(effect).await {
                completed.push(action);
            }
        }
        for action in completed {
            self.complete_post_action(action);
        }

        if let Some((reply, outcome)) = reply {
            // Caller may have given up waiting
            let _ = reply.send(outcome);
        }
    }

    fn complete_post_action(&mut self, action: PostAction) {
        match self.controller.complete_post_action(action) {
            Ok(()) => self.notify(SessionUpdate::Completed {
                snapshot: self.controller.snapshot(),
            }),
            Err(e) => tracing::warn!(
                session_id = %self.session_id,
                action = ?action,
                error = %e,
                "Ignoring post-action completion"
            ),
        }
    }

    /// Feed one event to the controller
    fn apply(&mut self, event: Event) -> (Vec<Effect>, Option<PendingReply>) {
        match event {
            Event::ParticipantJoined { participant_id } => {
                match self.controller.on_first_participant_joined(&participant_id) {
                    Ok(effects) => (effects, None),
                    Err(e) => {
                        tracing::warn!(
                            session_id = %self.session_id,
                            participant_id = %participant_id,
                            error = %e,
                            "Ignoring join"
                        );
                        self.notify(SessionUpdate::JoinRejected {
                            participant_id,
                            error: e.to_string(),
                        });
                        (vec![], None)
                    }
                }
            }

            Event::ParticipantLeft {
                participant_id,
                reason,
            } => (
                self.controller
                    .on_participant_left(&participant_id, reason.as_deref()),
                None,
            ),

            Event::TransportError { message } => (self.controller.on_error(&message), None),

            Event::FunctionCalled { call, reply } => {
                let (effects, outcome) = match self.controller.call_function(&call) {
                    Ok(CallOutcome { result, effects }) => {
                        tracing::info!(
                            session_id = %self.session_id,
                            function = %call.function,
                            "Function call handled"
                        );
                        (effects, Ok(result))
                    }
                    Err(e) => {
                        tracing::warn!(
                            session_id = %self.session_id,
                            function = %call.function,
                            error = %e,
                            "Function call rejected"
                        );
                        self.notify(SessionUpdate::FunctionRejected {
                            function: call.function.clone(),
                            error: e.to_string(),
                        });
                        (vec![], Err(e))
                    }
                };
                (effects, reply.map(|reply| (reply, outcome)))
            }
        }
    }

    async fn execute_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            if let Some(action) = self.execute_effect(effect).await {
                tracing::debug!(?action, "Skipping post-action completion during shutdown");
            }
        }
    }

    /// Execute one effect, returning the post-action it ran, if any. Transport
    /// and observer failures are logged, never propagated: the flow's state
    /// has already moved on.
    async fn execute_effect(&self, effect: Effect) -> Option<PostAction> {
        match effect {
            Effect::CaptureTranscription { participant_id } => {
                if let Err(e) = self.transport.capture_transcription(&participant_id).await {
                    tracing::warn!(
                        session_id = %self.session_id,
                        participant_id = %participant_id,
                        error = %e,
                        "Failed to capture transcription"
                    );
                }
                None
            }

            Effect::ActivateNode { node } => {
                if let Err(e) = self.transport.activate_node(&node).await {
                    tracing::error!(
                        session_id = %self.session_id,
                        node = %node.id,
                        error = %e,
                        "Failed to activate node"
                    );
                }
                self.notify(SessionUpdate::NodeActivated { node: node.id });
                None
            }

            Effect::PublishObserver { event } => {
                let function = event.function;
                if let Err(e) = self.observer.publish(event) {
                    tracing::warn!(
                        session_id = %self.session_id,
                        function = %function,
                        error = %e,
                        "Observer delivery failed"
                    );
                } else {
                    tracing::debug!(function = %function, "Pushed observer event");
                }
                None
            }

            Effect::RunPostAction { action } => {
                match action {
                    PostAction::EndSession => {
                        if let Err(e) = self.transport.end_session().await {
                            tracing::error!(
                                session_id = %self.session_id,
                                error = %e,
                                "Failed to end session"
                            );
                        }
                    }
                }
                Some(action)
            }

            Effect::CancelSession { reason, snapshot } => {
                if let Err(e) = self.transport.cancel_session().await {
                    tracing::error!(
                        session_id = %self.session_id,
                        error = %e,
                        "Failed to cancel session"
                    );
                }
                self.notify(SessionUpdate::Cancelled { reason, snapshot });
                None
            }
        }
    }

    fn notify(&self, update: SessionUpdate) {
        // No subscribers is fine
        let _ = self.updates_tx.send(update);
    }
}
