//! Observer side channel
//!
//! Collection events are pushed to an optional observer (e.g. a live
//! dashboard) over a bounded channel. Delivery is best-effort: when the
//! channel is full the new event is dropped and counted, and the flow carries
//! on regardless.

use crate::flow::{FunctionName, FunctionResult, NodeId};
use crate::session::SessionSnapshot;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// A `data_collected` notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionName,
    pub node: NodeId,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub data: ObserverData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverData {
    pub result: FunctionResult,
    pub args: Value,
    pub interview_data: SessionSnapshot,
}

impl ObserverEvent {
    pub const DATA_COLLECTED: &'static str = "data_collected";

    pub fn data_collected(
        function: FunctionName,
        node: NodeId,
        result: &FunctionResult,
        args: Value,
        snapshot: SessionSnapshot,
    ) -> Self {
        Self {
            kind: Self::DATA_COLLECTED,
            function,
            node,
            timestamp: unix_seconds(),
            data: ObserverData {
                result: result.clone(),
                args,
                interview_data: snapshot,
            },
        }
    }
}

#[allow(clippy::cast_precision_loss)] // Microsecond precision is plenty for a display timestamp
fn unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Why an observer event was not delivered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverDeliveryError {
    #[error("observer channel full (capacity {capacity}), event dropped")]
    Full { capacity: usize },
    #[error("observer channel closed")]
    Closed,
}

/// Destination for observer events. Must never block.
pub trait ObserverSink: Send + Sync {
    fn publish(&self, event: ObserverEvent) -> Result<(), ObserverDeliveryError>;
}

impl<T: ObserverSink + ?Sized> ObserverSink for Arc<T> {
    fn publish(&self, event: ObserverEvent) -> Result<(), ObserverDeliveryError> {
        (**self).publish(event)
    }
}

/// Sink used when nobody is observing
#[derive(Debug, Clone, Copy, Default)]
#[allow(dead_code)] // Used when the observer channel is disabled
pub struct NoopObserver;

impl ObserverSink for NoopObserver {
    fn publish(&self, _event: ObserverEvent) -> Result<(), ObserverDeliveryError> {
        Ok(())
    }
}

/// Bounded channel sink with a drop-new overflow policy
#[derive(Debug)]
pub struct ChannelObserver {
    tx: mpsc::Sender<ObserverEvent>,
    dropped: AtomicU64,
}

impl ChannelObserver {
    /// Create the sink and the receiving end for the consumer
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ObserverEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Number of events dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ObserverSink for ChannelObserver {
    fn publish(&self, event: ObserverEvent) -> Result<(), ObserverDeliveryError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(ObserverDeliveryError::Full {
                    capacity: self.tx.max_capacity(),
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(ObserverDeliveryError::Closed)
            }
        }
    }
}
