//! Checkpointer trait — persistence of session records between turns.
//!
//! The CLI saves the session after every turn (including turns that stop at
//! an approval gate) so a thread can be resumed later by id.

use crate::error::CheckpointError;
use crate::message::ConversationId;
use crate::session::{Session, SessionPhase};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short listing entry for a saved thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: ConversationId,
    pub messages: usize,
    pub phase: SessionPhase,
    pub awaiting_approval: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            messages: session.conversation.messages.len(),
            phase: session.state.phase(),
            awaiting_approval: session.is_interrupted(),
            updated_at: session.updated_at,
        }
    }
}

/// Storage for session records, keyed by thread id.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Insert or replace the record for `session.id`.
    async fn save(&self, session: &Session) -> Result<(), CheckpointError>;

    async fn load(&self, id: &ConversationId) -> Result<Option<Session>, CheckpointError>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: &ConversationId) -> Result<bool, CheckpointError>;

    /// All saved threads, most recently updated first.
    async fn list(&self) -> Result<Vec<SessionSummary>, CheckpointError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn summary_reflects_session() {
        let mut session = Session::new();
        session.conversation.push(Message::user("hello"));
        session.state.authenticated = true;

        let summary = SessionSummary::from(&session);
        assert_eq!(summary.id, session.id);
        assert_eq!(summary.messages, 1);
        assert_eq!(summary.phase, SessionPhase::Authenticated);
        assert!(!summary.awaiting_approval);
    }
}
