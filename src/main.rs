//! Startup interview bot
//!
//! Runs the interview flow engine for a single session over a line-oriented
//! JSON console transport. Inbound events are read from stdin; transport
//! calls, observer events, function replies and session updates are written
//! to stdout. Logs go to stderr.

mod config;
mod console;
mod flow;
mod observer;
mod runtime;
mod session;

use config::InterviewConfig;
use console::{emit, ConsoleTransport};
use observer::ChannelObserver;
use runtime::SessionManager;
use serde_json::json;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = InterviewConfig::from_env()?;
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(
            missing = ?missing,
            "Media pipeline credentials not configured; running with the console transport only"
        );
    }
    tracing::info!(
        bot_name = %config.bot_name,
        model = %config.openai_model,
        observer_capacity = config.observer_capacity,
        "Configuration loaded"
    );

    // Observer channel: print every collection event
    let (observer, mut observer_rx) = ChannelObserver::new(config.observer_capacity);
    let observer = Arc::new(observer);
    let observer_task = tokio::spawn(async move {
        while let Some(event) = observer_rx.recv().await {
            emit(&json!({ "channel": "observer", "event": event }));
        }
    });

    let manager = SessionManager::new(observer.clone(), config.event_buffer);
    let session_id = uuid::Uuid::new_v4().to_string();
    let handle = manager
        .start(&session_id, Arc::new(ConsoleTransport))
        .await;

    let mut updates = handle.subscribe();
    let updates_task = tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            emit(&json!({ "channel": "session", "update": update }));
        }
    });

    // Feed stdin into the session until it ends or input runs out
    console::read_input(BufReader::new(tokio::io::stdin()), &handle).await;

    // Input ended or failed before the interview did: cancel so the snapshot is reported
    manager.cancel_all().await;
    handle.closed().await;
    drop(handle);
    drop(manager);

    if let Err(e) = updates_task.await {
        tracing::warn!(error = %e, "Update printer failed");
    }
    if observer.dropped() > 0 {
        tracing::warn!(dropped = observer.dropped(), "Observer events were dropped");
    }
    drop(observer);
    if let Err(e) = observer_task.await {
        tracing::warn!(error = %e, "Observer printer failed");
    }

    tracing::info!(session_id = %session_id, "Interview bot exiting");
    Ok(())
}
