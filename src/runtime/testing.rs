//! Mock implementations for testing
//!
//! These mocks enable integration testing without a real transport.

use super::traits::{Transport, TransportError};
use super::{spawn_session, SessionHandle, SessionUpdate};
use crate::flow::{NodeDescriptor, NodeId};
use crate::observer::{ObserverDeliveryError, ObserverEvent, ObserverSink};
use crate::session::SessionSnapshot;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

// ============================================================================
// Mock Transport
// ============================================================================

/// Outbound calls recorded by `MockTransport`
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    CaptureTranscription(String),
    ActivateNode(NodeId),
    EndSession,
    CancelSession,
}

/// Transport that records every call
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    activated: Mutex<Vec<NodeDescriptor>>,
    /// When set, every call fails after being recorded
    fail: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose calls all fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn activated_nodes(&self) -> Vec<NodeDescriptor> {
        self.activated.lock().unwrap().clone()
    }

    fn record(&self, call: TransportCall) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(TransportError::new("mock transport failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn capture_transcription(&self, participant_id: &str) -> Result<(), TransportError> {
        self.record(TransportCall::CaptureTranscription(participant_id.to_string()))
    }

    async fn activate_node(&self, node: &NodeDescriptor) -> Result<(), TransportError> {
        self.activated.lock().unwrap().push(node.clone());
        self.record(TransportCall::ActivateNode(node.id))
    }

    async fn end_session(&self) -> Result<(), TransportError> {
        self.record(TransportCall::EndSession)
    }

    async fn cancel_session(&self) -> Result<(), TransportError> {
        self.record(TransportCall::CancelSession)
    }
}

// ============================================================================
// Recording Observer
// ============================================================================

/// Observer that keeps every event, or rejects them all
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
    reject: bool,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer whose channel is always closed
    pub fn closed() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ObserverSink for RecordingObserver {
    fn publish(&self, event: ObserverEvent) -> Result<(), ObserverDeliveryError> {
        if self.reject {
            return Err(ObserverDeliveryError::Closed);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ============================================================================
// Test Session Harness
// ============================================================================

/// A spawned session wired to mocks
pub struct TestSession {
    pub handle: SessionHandle,
    pub transport: Arc<MockTransport>,
    pub observer: Arc<RecordingObserver>,
    pub updates: broadcast::Receiver<SessionUpdate>,
    join: JoinHandle<SessionSnapshot>,
}

impl TestSession {
    pub fn start() -> Self {
        Self::with(MockTransport::new(), RecordingObserver::new())
    }

    pub fn with(transport: MockTransport, observer: RecordingObserver) -> Self {
        let transport = Arc::new(transport);
        let observer = Arc::new(observer);
        let (handle, join) = spawn_session("test-session", transport.clone(), observer.clone(), 8);
        let updates = handle.subscribe();
        Self {
            handle,
            transport,
            observer,
            updates,
            join,
        }
    }

    /// Wait for the next update matching `pred`
    pub async fn wait_for<F>(&mut self, timeout: Duration, pred: F) -> Option<SessionUpdate>
    where
        F: Fn(&SessionUpdate) -> bool,
    {
        tokio::time::timeout(timeout, async {
            loop {
                match self.updates.recv().await {
                    Ok(update) if pred(&update) => return Some(update),
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .await
        .ok()
        .flatten()
    }

    /// Wait for the runtime to stop and return its final snapshot
    pub async fn finish(self, timeout: Duration) -> SessionSnapshot {
        tokio::time::timeout(timeout, self.join)
            .await
            .expect("session runtime did not stop in time")
            .expect("session runtime panicked")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FlowError, FunctionCall, FunctionResult};
    use crate::observer::ChannelObserver;
    use crate::runtime::SessionManager;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn call(function: &str, args: serde_json::Value) -> FunctionCall {
        FunctionCall::new(function, args)
    }

    #[tokio::test]
    async fn test_mock_transport_records_calls() {
        let transport = MockTransport::new();
        transport.capture_transcription("p-1").await.unwrap();
        transport.end_session().await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::CaptureTranscription("p-1".to_string()),
                TransportCall::EndSession
            ]
        );
        assert!(MockTransport::failing().cancel_session().await.is_err());
    }

    /// Integration test: complete interview through the runtime
    #[tokio::test]
    async fn test_full_interview() {
        let rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();

        let result = rt
            .handle
            .call_function(call("collect_name", json!({ "name": "Grace" })))
            .await
            .unwrap();
        assert_eq!(
            result,
            FunctionResult::NameCollected {
                name: "Grace".to_string()
            }
        );
        rt.handle
            .call_function(call(
                "collect_startup_history",
                json!({ "startup_history": "Founded X, acquired by Y" }),
            ))
            .await
            .unwrap();
        rt.handle
            .call_function(call("end_call", json!({})))
            .await
            .unwrap();

        let transport = rt.transport.clone();
        let observer = rt.observer.clone();
        let snapshot = rt.finish(TIMEOUT).await;

        assert_eq!(snapshot.name, "Grace");
        assert_eq!(snapshot.startup_history, "Founded X, acquired by Y");
        assert!(snapshot.is_complete());

        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::CaptureTranscription("p-1".to_string()),
                TransportCall::ActivateNode(NodeId::Initial),
                TransportCall::ActivateNode(NodeId::CollectHistory),
                TransportCall::ActivateNode(NodeId::Summarize),
                TransportCall::ActivateNode(NodeId::End),
                TransportCall::EndSession,
            ]
        );

        let events = observer.events();
        let nodes: Vec<NodeId> = events.iter().map(|e| e.node).collect();
        assert_eq!(
            nodes,
            vec![NodeId::Initial, NodeId::CollectHistory, NodeId::Summarize]
        );
        assert_eq!(events[2].data.interview_data, snapshot);
    }

    #[tokio::test]
    async fn test_completed_only_after_end_node() {
        let mut rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();
        rt.handle
            .call_function(call("collect_name", json!({ "name": "Grace" })))
            .await
            .unwrap();
        rt.handle
            .participant_left("p-1", None)
            .await
            .unwrap();

        tokio::time::timeout(TIMEOUT, rt.handle.closed()).await.unwrap();
        let mut updates = Vec::new();
        while let Ok(update) = rt.updates.try_recv() {
            updates.push(update);
        }
        assert!(
            !updates
                .iter()
                .any(|u| matches!(u, SessionUpdate::Completed { .. })),
            "session completed without reaching the end node: {updates:?}"
        );
        assert!(matches!(
            updates.last(),
            Some(SessionUpdate::Cancelled { snapshot, .. }) if snapshot.name == "Grace"
        ));
        assert!(!rt
            .transport
            .calls()
            .contains(&TransportCall::EndSession));
    }

    #[tokio::test]
    async fn test_calls_after_end_fail_with_session_closed() {
        let mut rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();
        for (function, args) in [
            ("collect_name", json!({ "name": "Grace" })),
            ("collect_startup_history", json!({ "startup_history": "X" })),
            ("end_call", json!({})),
        ] {
            rt.handle.call_function(call(function, args)).await.unwrap();
        }

        let completed = rt
            .wait_for(TIMEOUT, |u| matches!(u, SessionUpdate::Completed { .. }))
            .await;
        assert!(completed.is_some());

        rt.handle.closed().await;
        let err = rt
            .handle
            .call_function(call("end_call", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, FlowError::SessionClosed);
    }

    #[tokio::test]
    async fn test_rejected_call_leaves_session_usable() {
        let mut rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();

        let err = rt
            .handle
            .call_function(call("collect_name", json!({ "name": "" })))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Argument { .. }));
        assert!(rt
            .wait_for(TIMEOUT, |u| matches!(u, SessionUpdate::FunctionRejected { .. }))
            .await
            .is_some());

        let err = rt
            .handle
            .call_function(call("end_call", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition(_)));

        rt.handle
            .call_function(call("collect_name", json!({ "name": "Ada Lovelace" })))
            .await
            .unwrap();
        assert_eq!(
            rt.transport.activated_nodes().last().map(|n| n.id),
            Some(NodeId::CollectHistory)
        );
        assert_eq!(rt.observer.events().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_join_is_ignored() {
        let mut rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();
        rt.handle.participant_joined("p-1").await.unwrap();

        let rejected = rt
            .wait_for(TIMEOUT, |u| matches!(u, SessionUpdate::JoinRejected { .. }))
            .await;
        assert!(rejected.is_some());
        assert_eq!(
            rt.transport
                .calls()
                .iter()
                .filter(|c| matches!(c, TransportCall::ActivateNode(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_leave_before_any_data() {
        let mut rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();
        rt.handle
            .participant_left("p-1", Some("hung up".to_string()))
            .await
            .unwrap();

        let update = rt
            .wait_for(TIMEOUT, |u| matches!(u, SessionUpdate::Cancelled { .. }))
            .await;
        let Some(SessionUpdate::Cancelled { reason, snapshot }) = update else {
            panic!("expected cancellation, got {update:?}");
        };
        assert!(reason.contains("hung up"));
        assert_eq!(snapshot, SessionSnapshot::default());

        let transport = rt.transport.clone();
        rt.finish(TIMEOUT).await;
        assert_eq!(transport.calls().last(), Some(&TransportCall::CancelSession));
    }

    #[tokio::test]
    async fn test_transport_error_cancels_mid_interview() {
        let rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();
        rt.handle
            .call_function(call("collect_name", json!({ "name": "Grace" })))
            .await
            .unwrap();
        rt.handle
            .transport_error("AlreadyInCall: another bot is connected")
            .await
            .unwrap();

        let transport = rt.transport.clone();
        let snapshot = rt.finish(TIMEOUT).await;
        assert_eq!(snapshot.name, "Grace");
        assert!(!snapshot.is_complete());
        assert_eq!(transport.calls().last(), Some(&TransportCall::CancelSession));
    }

    #[tokio::test]
    async fn test_host_cancel_stops_runtime() {
        let rt = TestSession::start();
        rt.handle.participant_joined("p-1").await.unwrap();
        rt.handle.cancel();

        let transport = rt.transport.clone();
        let handle = rt.handle.clone();
        rt.finish(TIMEOUT).await;

        assert_eq!(transport.calls().last(), Some(&TransportCall::CancelSession));
        assert!(handle.is_closed());
        assert_eq!(
            handle.participant_joined("p-2").await.unwrap_err(),
            FlowError::SessionClosed
        );
    }

    #[tokio::test]
    async fn test_failing_collaborators_do_not_break_flow() {
        let rt = TestSession::with(MockTransport::failing(), RecordingObserver::closed());
        rt.handle.participant_joined("p-1").await.unwrap();
        for (function, args) in [
            ("collect_name", json!({ "name": "Grace" })),
            ("collect_startup_history", json!({ "startup_history": "X" })),
            ("end_call", json!({})),
        ] {
            rt.handle.call_function(call(function, args)).await.unwrap();
        }

        let observer = rt.observer.clone();
        let snapshot = rt.finish(TIMEOUT).await;
        assert!(snapshot.is_complete());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_full_observer_channel_drops_without_blocking() {
        let (sink, mut rx) = ChannelObserver::new(1);
        let sink = Arc::new(sink);
        let (handle, join) = spawn_session("overflow", MockTransport::new(), sink.clone(), 8);

        handle.participant_joined("p-1").await.unwrap();
        for (function, args) in [
            ("collect_name", json!({ "name": "Grace" })),
            ("collect_startup_history", json!({ "startup_history": "X" })),
            ("end_call", json!({})),
        ] {
            handle.call_function(call(function, args)).await.unwrap();
        }
        let snapshot = tokio::time::timeout(TIMEOUT, join).await.unwrap().unwrap();

        assert!(snapshot.is_complete());
        assert_eq!(sink.dropped(), 2);
        assert_eq!(
            rx.recv().await.unwrap().function,
            crate::flow::FunctionName::CollectName
        );
    }

    #[tokio::test]
    async fn test_manager_isolates_sessions() {
        let observer = Arc::new(RecordingObserver::new());
        let manager = SessionManager::new(observer.clone(), 8);

        let first = manager.start("s-1", Arc::new(MockTransport::new())).await;
        let second = manager.start("s-2", Arc::new(MockTransport::new())).await;
        let again = manager.start("s-1", Arc::new(MockTransport::new())).await;
        assert_eq!(again.session_id(), "s-1");

        first.participant_joined("p-1").await.unwrap();
        second.participant_joined("p-2").await.unwrap();
        first
            .call_function(call("collect_name", json!({ "name": "Ada" })))
            .await
            .unwrap();

        // the second session starts from empty data
        second
            .call_function(call("collect_name", json!({ "name": "Grace" })))
            .await
            .unwrap();
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data.interview_data.name, "Ada");
        assert_eq!(events[1].data.interview_data.name, "Grace");

        // "again" reused the first runtime, so it is past the initial node
        let err = again
            .call_function(call("collect_name", json!({ "name": "Ada" })))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition(_)));

        manager.cancel_all().await;
        first.closed().await;
        second.closed().await;
        assert!(manager.get("s-1").await.is_none());
        assert_eq!(manager.prune().await, 2);
    }
}
