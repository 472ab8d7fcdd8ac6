//! `steward email` — the inbox assistant. Asks for credentials before it
//! will touch the inbox, and holds outgoing mail for approval.

use super::chat;
use std::sync::Arc;
use steward_agent::email_agent;
use steward_core::event::EventBus;
use steward_security::AuditLogger;

pub async fn run(
    message: Option<String>,
    thread: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = chat::load_config()?;
    let provider = chat::provider(&config)?;

    let event_bus = Arc::new(EventBus::default());
    chat::log_events(&event_bus);
    let audit = Arc::new(AuditLogger::tracing());

    let agent = email_agent(provider, &config, event_bus, audit);
    chat::run(agent, &config, "Steward Email Assistant", thread, message).await
}
