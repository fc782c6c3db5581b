//! Line-oriented JSON transport over stdin/stdout
//!
//! Stand-in for a real media pipeline: inbound transport and pipeline events
//! arrive as one JSON object per line, outbound calls are written the same way.

use crate::flow::{FlowError, FunctionCall, FunctionResult, NodeDescriptor};
use crate::runtime::{SessionHandle, Transport, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One inbound line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundMessage {
    ParticipantJoined {
        participant_id: String,
    },
    ParticipantLeft {
        participant_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    TransportError {
        error: String,
    },
    FunctionCalled(FunctionCall),
}

impl InboundMessage {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Forward to the session. Function calls wait for their result.
    pub async fn dispatch(self, handle: &SessionHandle) -> Result<Option<Value>, FlowError> {
        match self {
            InboundMessage::ParticipantJoined { participant_id } => {
                handle.participant_joined(participant_id).await?;
                Ok(None)
            }
            InboundMessage::ParticipantLeft {
                participant_id,
                reason,
            } => {
                handle.participant_left(participant_id, reason).await?;
                Ok(None)
            }
            InboundMessage::TransportError { error } => {
                handle.transport_error(error).await?;
                Ok(None)
            }
            InboundMessage::FunctionCalled(call) => {
                let function = call.function.clone();
                let reply = handle.call_function(call).await;
                Ok(Some(reply_line(&function, &reply)))
            }
        }
    }
}

fn reply_line(function: &str, reply: &Result<FunctionResult, FlowError>) -> Value {
    match reply {
        Ok(result) => json!({ "channel": "reply", "function": function, "result": result }),
        Err(e) => json!({ "channel": "reply", "function": function, "error": e.to_string() }),
    }
}

/// Feed inbound lines to the session until input ends or fails, or the
/// session stops. Read errors end the input like EOF does.
pub async fn read_input<R>(reader: R, handle: &SessionHandle)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            () = handle.closed() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read input");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match InboundMessage::parse(line) {
                    Ok(message) => match message.dispatch(handle).await {
                        Ok(Some(reply)) => emit(&reply),
                        Ok(None) => {}
                        Err(e) => {
                            tracing::info!(error = %e, "Session no longer accepts events");
                            break;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, line = %line, "Ignoring malformed input line");
                        emit(&json!({ "channel": "error", "error": e.to_string() }));
                    }
                }
            }
        }
    }
}

/// Write a JSON line to stdout
pub fn emit(value: &impl Serialize) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize output line"),
    }
}

/// Transport that prints every outbound call as a JSON line
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn capture_transcription(&self, participant_id: &str) -> Result<(), TransportError> {
        emit(&json!({
            "channel": "transport",
            "call": "capture_transcription",
            "participant_id": participant_id,
        }));
        Ok(())
    }

    async fn activate_node(&self, node: &NodeDescriptor) -> Result<(), TransportError> {
        emit(&json!({ "channel": "transport", "call": "activate_node", "node": node }));
        Ok(())
    }

    async fn end_session(&self) -> Result<(), TransportError> {
        emit(&json!({ "channel": "transport", "call": "end_session" }));
        Ok(())
    }

    async fn cancel_session(&self) -> Result<(), TransportError> {
        emit(&json!({ "channel": "transport", "call": "cancel_session" }));
        Ok(())
    }
}
