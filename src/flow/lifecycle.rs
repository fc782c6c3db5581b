//! Reactions to participant presence and transport errors

use super::controller::FlowController;
use super::effect::Effect;
use super::error::FlowError;

/// Marker the transport puts in its error when the room already has a bot
const ALREADY_IN_CALL: &str = "AlreadyInCall";

impl FlowController {
    /// First participant joined: capture their transcription and start the flow
    ///
    /// A duplicate join fails with `AlreadyInitialized` and produces no effects.
    pub fn on_first_participant_joined(
        &mut self,
        participant_id: &str,
    ) -> Result<Vec<Effect>, FlowError> {
        tracing::info!(participant_id = %participant_id, "Participant joined");
        let activation = self.initialize()?;

        let mut effects = vec![Effect::CaptureTranscription {
            participant_id: participant_id.to_string(),
        }];
        effects.extend(activation);
        Ok(effects)
    }

    /// Participant left: report whatever was collected and cancel the session
    pub fn on_participant_left(&mut self, participant_id: &str, reason: Option<&str>) -> Vec<Effect> {
        tracing::info!(
            participant_id = %participant_id,
            reason = reason.unwrap_or("unspecified"),
            "Participant left"
        );
        self.snapshot().log("PARTICIPANT LEFT - FINAL SUMMARY");

        let reason = match reason {
            Some(reason) => format!("participant {participant_id} left: {reason}"),
            None => format!("participant {participant_id} left"),
        };
        vec![self.cancel(&reason)]
    }

    /// Transport error: log it and cancel the session
    pub fn on_error(&mut self, error: &str) -> Vec<Effect> {
        tracing::error!(error = %error, "Transport error");
        if error.contains(ALREADY_IN_CALL) {
            tracing::warn!("Room already has a connection");
        }
        vec![self.cancel(&format!("transport error: {error}"))]
    }

    /// Host asked the session to stop (shutdown, or every handle dropped)
    pub fn on_host_cancel(&mut self) -> Vec<Effect> {
        if self.is_terminated() {
            return vec![];
        }
        tracing::info!("Session cancelled by host");
        self.snapshot().log("SESSION CANCELLED - FINAL SUMMARY");
        vec![self.cancel("cancelled by host")]
    }
}
