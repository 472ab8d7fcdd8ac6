//! Audit logging — structured record of authentication attempts and
//! approval decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
    /// Who acted (the identity supplied, or "user" for approvals)
    pub actor: String,
    /// What was acted on (thread id, capability name)
    pub target: String,
    pub outcome: AuditOutcome,
    pub details: Option<String>,
}

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Credentials were checked
    AuthenticationAttempt,
    /// A human decided on a parked capability call
    ApprovalDecision { tool_name: String, decision: String },
    /// A capability call was refused because it was not exposed this turn
    CapabilityRefused { tool_name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

/// Trait for audit log sinks (where entries are forwarded).
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// In-memory audit logger that keeps entries and forwards them to sinks.
pub struct AuditLogger {
    entries: Mutex<Vec<AuditEntry>>,
    sinks: Vec<Box<dyn AuditSink>>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("entry_count", &self.count())
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    pub fn with_sinks(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sinks,
        }
    }

    /// A logger that forwards every entry to `tracing`.
    pub fn tracing() -> Self {
        Self::with_sinks(vec![Box::new(TracingSink)])
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        // A panicked writer cannot leave a half-pushed entry behind.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn log(
        &self,
        event: AuditEvent,
        actor: &str,
        target: &str,
        outcome: AuditOutcome,
        details: Option<String>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            event,
            actor: actor.into(),
            target: target.into(),
            outcome,
            details,
        };

        for sink in &self.sinks {
            sink.record(&entry);
        }
        self.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    pub fn entries_by_outcome(&self, outcome: &AuditOutcome) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| &e.outcome == outcome)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

/// Logs entries via `tracing::info!`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: &AuditEntry) {
        tracing::info!(
            event = ?entry.event,
            actor = %entry.actor,
            target = %entry.target,
            outcome = ?entry.outcome,
            details = ?entry.details,
            "AUDIT"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn log_and_retrieve_entries() {
        let logger = AuditLogger::new();
        logger.log(
            AuditEvent::AuthenticationAttempt,
            "julie@example.com",
            "thread-1",
            AuditOutcome::Success,
            None,
        );
        logger.log(
            AuditEvent::AuthenticationAttempt,
            "wrong@x.com",
            "thread-1",
            AuditOutcome::Failure,
            None,
        );

        assert_eq!(logger.count(), 2);
        let entries = logger.entries();
        assert_eq!(entries[0].actor, "julie@example.com");
        assert_eq!(entries[1].actor, "wrong@x.com");
    }

    #[test]
    fn filter_by_outcome() {
        let logger = AuditLogger::new();
        logger.log(
            AuditEvent::AuthenticationAttempt,
            "a",
            "t",
            AuditOutcome::Failure,
            None,
        );
        logger.log(
            AuditEvent::ApprovalDecision {
                tool_name: "send_email".into(),
                decision: "reject".into(),
            },
            "user",
            "t",
            AuditOutcome::Denied,
            Some("not now".into()),
        );

        let denied = logger.entries_by_outcome(&AuditOutcome::Denied);
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].details.as_deref(), Some("not now"));
    }

    #[test]
    fn audit_event_tagging() {
        let json = serde_json::to_string(&AuditEvent::CapabilityRefused {
            tool_name: "send_email".into(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"capability_refused""#));
    }

    #[test]
    fn custom_sink_receives_events() {
        struct TestSink {
            received: Arc<Mutex<Vec<String>>>,
        }

        impl AuditSink for TestSink {
            fn record(&self, entry: &AuditEntry) {
                self.received.lock().unwrap().push(entry.actor.clone());
            }
        }

        let received = Arc::new(Mutex::new(Vec::new()));
        let logger = AuditLogger::with_sinks(vec![Box::new(TestSink {
            received: received.clone(),
        })]);

        logger.log(
            AuditEvent::AuthenticationAttempt,
            "julie@example.com",
            "thread-1",
            AuditOutcome::Success,
            None,
        );

        let sink_entries = received.lock().unwrap();
        assert_eq!(sink_entries.as_slice(), ["julie@example.com"]);
    }

    #[test]
    fn debug_format() {
        let logger = AuditLogger::default();
        let debug_str = format!("{logger:?}");
        assert!(debug_str.contains("entry_count"));
    }
}
