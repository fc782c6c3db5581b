//! Per-session interview data
//!
//! Every session owns exactly one `SessionData`, created fresh when the
//! session starts and dropped when it ends. Nothing here is process-global.

use serde::{Deserialize, Serialize};

const NOT_PROVIDED: &str = "Not provided";
const RULE: &str = "==================================================";

/// Fields collected during a single interview. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub name: String,
    pub startup_history: String,
}

impl SessionData {
    #[allow(dead_code)] // Controllers start from `Default`
    pub fn new() -> Self {
        Self::default()
    }

    /// True once both fields have been collected
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.startup_history.is_empty()
    }

    /// Copy of the current fields, suitable for logging or the observer channel
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            name: self.name.clone(),
            startup_history: self.startup_history.clone(),
        }
    }

    /// Clear both fields
    #[allow(dead_code)] // Sessions normally get a fresh instance instead
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Immutable view of `SessionData` at a point in time
///
/// Serializes as `{"name": ..., "startup_history": ...}` with empty strings
/// for unset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub name: String,
    pub startup_history: String,
}

impl SessionSnapshot {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.startup_history.is_empty()
    }

    /// Human readable summary block, "Not provided" for unset fields
    pub fn summary_lines(&self, title: &str) -> Vec<String> {
        vec![
            RULE.to_string(),
            title.to_string(),
            RULE.to_string(),
            format!("Name: {}", or_not_provided(&self.name)),
            format!("Startup History: {}", or_not_provided(&self.startup_history)),
            RULE.to_string(),
        ]
    }

    /// Emit the snapshot through `tracing`
    pub fn log(&self, title: &str) {
        tracing::info!(
            name = %or_not_provided(&self.name),
            startup_history = %or_not_provided(&self.startup_history),
            complete = self.is_complete(),
            "{title}"
        );
        for line in self.summary_lines(title) {
            tracing::debug!("{line}");
        }
    }
}

fn or_not_provided(value: &str) -> &str {
    if value.is_empty() {
        NOT_PROVIDED
    } else {
        value
    }
}
