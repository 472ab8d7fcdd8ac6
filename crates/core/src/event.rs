//! Domain event system — decoupled observation of the agent loop.
//!
//! The loop publishes events; the CLI, audit, and tests subscribe and filter
//! for what they care about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::session::SessionPhase;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model produced a message
    ResponseGenerated {
        conversation_id: String,
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A capability call finished (successfully or not)
    ToolExecuted {
        conversation_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A capability call was parked at the approval gate
    ApprovalRequested {
        conversation_id: String,
        tool_name: String,
        timestamp: DateTime<Utc>,
    },

    /// A parked call received a decision
    ApprovalResolved {
        conversation_id: String,
        tool_name: String,
        decision: String,
        timestamp: DateTime<Utc>,
    },

    /// The session moved to a new phase
    SessionStateChanged {
        conversation_id: String,
        phase: SessionPhase,
        timestamp: DateTime<Utc>,
    },

    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
