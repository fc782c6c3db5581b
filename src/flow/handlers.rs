//! Function handlers
//!
//! A handler validates its arguments, writes into the session's data and
//! returns a typed result. Handlers never choose the next node; that is the
//! dispatcher's job.

use super::error::FlowError;
use super::node::FunctionName;
use crate::session::SessionData;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Handler that records a collected field
pub type CollectFn = fn(&Value, &mut SessionData) -> Result<FunctionResult, FlowError>;

/// Handler that only reads the session
pub type InspectFn = fn(&Value, &SessionData) -> Result<FunctionResult, FlowError>;

/// Entry in the transition table. Whether a handler may write to the
/// session is part of its type.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Collect(CollectFn),
    Inspect(InspectFn),
}

impl Handler {
    pub fn run(self, args: &Value, session: &mut SessionData) -> Result<FunctionResult, FlowError> {
        match self {
            Handler::Collect(handler) => handler(args, session),
            Handler::Inspect(handler) => handler(args, session),
        }
    }
}

/// Arguments of `collect_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectNameInput {
    pub name: String,
}

/// Arguments of `collect_startup_history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectStartupHistoryInput {
    #[serde(alias = "startupHistory")]
    pub startup_history: String,
}

/// Typed outcome of a handler, one variant per function
///
/// Serializes to the bare payload (`{"name": ..}`, `{"status": ..}`), the
/// shape observers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FunctionResult {
    NameCollected { name: String },
    HistoryCollected { startup_history: String },
    CallEnded { status: String },
}

impl FunctionResult {
    /// The function that produced this result
    pub fn function(&self) -> FunctionName {
        match self {
            FunctionResult::NameCollected { .. } => FunctionName::CollectName,
            FunctionResult::HistoryCollected { .. } => FunctionName::CollectStartupHistory,
            FunctionResult::CallEnded { .. } => FunctionName::EndCall,
        }
    }
}

pub fn collect_name(args: &Value, session: &mut SessionData) -> Result<FunctionResult, FlowError> {
    let input: CollectNameInput = parse_args(FunctionName::CollectName, args)?;
    require_non_empty(FunctionName::CollectName, "name", &input.name)?;
    tracing::debug!(name = %input.name, "collect_name handler executing");

    session.name.clone_from(&input.name);
    Ok(FunctionResult::NameCollected { name: input.name })
}

pub fn collect_startup_history(
    args: &Value,
    session: &mut SessionData,
) -> Result<FunctionResult, FlowError> {
    let input: CollectStartupHistoryInput =
        parse_args(FunctionName::CollectStartupHistory, args)?;
    require_non_empty(
        FunctionName::CollectStartupHistory,
        "startup_history",
        &input.startup_history,
    )?;
    tracing::debug!(
        history_len = input.startup_history.len(),
        "collect_startup_history handler executing"
    );

    session.startup_history.clone_from(&input.startup_history);
    Ok(FunctionResult::HistoryCollected {
        startup_history: input.startup_history,
    })
}

/// Ends the interview. Reads the session data for the audit log, never writes it.
#[allow(clippy::unnecessary_wraps)] // Must match `InspectFn`
pub fn end_call(_args: &Value, session: &SessionData) -> Result<FunctionResult, FlowError> {
    session.snapshot().log("INTERVIEW SUMMARY");
    Ok(FunctionResult::CallEnded {
        status: "completed".to_string(),
    })
}

fn parse_args<T: DeserializeOwned>(
    function: FunctionName,
    args: &Value,
) -> Result<T, FlowError> {
    serde_json::from_value(args.clone()).map_err(|e| FlowError::argument(function, e.to_string()))
}

fn require_non_empty(function: FunctionName, field: &str, value: &str) -> Result<(), FlowError> {
    if value.trim().is_empty() {
        return Err(FlowError::argument(function, format!("`{field}` must not be empty")));
    }
    Ok(())
}
