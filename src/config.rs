//! Process configuration loaded from the environment

use thiserror::Error;

const DEFAULT_BOT_NAME: &str = "Startup Interview Bot";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_VOICE_ID: &str = "a0e99841-438c-4a64-b679-ae501e7d6091";
const DEFAULT_OBSERVER_CAPACITY: usize = 64;
const DEFAULT_EVENT_BUFFER: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Configuration for the interview bot
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    pub bot_name: String,
    pub openai_model: String,
    pub cartesia_voice_id: String,
    pub daily_api_key: Option<String>,
    pub cartesia_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Observer channel capacity; further events are dropped
    pub observer_capacity: usize,
    /// Queue depth of inbound events per session
    pub event_buffer: usize,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            cartesia_voice_id: DEFAULT_VOICE_ID.to_string(),
            daily_api_key: None,
            cartesia_api_key: None,
            openai_api_key: None,
            observer_capacity: DEFAULT_OBSERVER_CAPACITY,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl InterviewConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            bot_name: get("BOT_NAME").unwrap_or(defaults.bot_name),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            cartesia_voice_id: get("CARTESIA_VOICE_ID").unwrap_or(defaults.cartesia_voice_id),
            daily_api_key: get("DAILY_API_KEY"),
            cartesia_api_key: get("CARTESIA_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            observer_capacity: parse_positive(
                "INTERVIEW_OBSERVER_CAPACITY",
                get("INTERVIEW_OBSERVER_CAPACITY"),
                defaults.observer_capacity,
            )?,
            event_buffer: parse_positive(
                "INTERVIEW_EVENT_BUFFER",
                get("INTERVIEW_EVENT_BUFFER"),
                defaults.event_buffer,
            )?,
        })
    }

    /// Names of credential variables that are not set
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("DAILY_API_KEY", &self.daily_api_key),
            ("CARTESIA_API_KEY", &self.cartesia_api_key),
            ("OPENAI_API_KEY", &self.openai_api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(var, _)| var)
        .collect()
    }

    /// Fail on the first missing credential
    #[allow(dead_code)] // For hosts wiring a real media pipeline
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        match self.missing_credentials().first() {
            Some(&var) => Err(ConfigError::MissingVar(var)),
            None => Ok(()),
        }
    }
}

fn parse_positive(
    var: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            message: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
    }
}
