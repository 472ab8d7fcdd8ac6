//! Session record and authentication state.
//!
//! A [`Session`] is everything the agent loop needs to resume a conversation:
//! the transcript, the authentication state, and any tool call that is parked
//! waiting for a human decision. Tools never mutate the state directly; they
//! return a [`SessionUpdate`] which the loop applies with
//! [`SessionState::apply`].

use crate::approval::PendingApproval;
use crate::message::{Conversation, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication state of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub authenticated: bool,
}

/// The two states of the session-level state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    /// Terminal: there is no logout or expiry.
    Authenticated,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        if self.authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }

    /// Produce the state that follows `update`.
    ///
    /// `Unauthenticated -> Authenticated` fires only on `authenticated: true`.
    /// Once authenticated the session stays authenticated.
    pub fn apply(&self, update: &SessionUpdate) -> SessionState {
        SessionState {
            authenticated: self.authenticated || update.authenticated,
        }
    }
}

/// A state change requested by a capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub authenticated: bool,
}

/// Result of comparing supplied credentials against the stored ones.
///
/// A rejection is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationOutcome {
    Authenticated,
    Rejected,
}

impl AuthenticationOutcome {
    /// The state update that accompanies this outcome.
    pub fn update(&self) -> SessionUpdate {
        SessionUpdate {
            authenticated: matches!(self, AuthenticationOutcome::Authenticated),
        }
    }
}

/// Everything persisted for one conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: ConversationId,
    pub conversation: Conversation,
    #[serde(default)]
    pub state: SessionState,

    /// A tool call waiting for an approval decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingApproval>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(ConversationId::new())
    }

    pub fn with_id(id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            conversation: Conversation::with_id(id.clone()),
            id,
            state: SessionState::default(),
            pending: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the last turn stopped at an approval gate.
    pub fn is_interrupted(&self) -> bool {
        self.pending.is_some()
    }

    /// Advance the session state with a tool-provided update.
    ///
    /// Returns `true` if the phase changed.
    pub fn apply_update(&mut self, update: &SessionUpdate) -> bool {
        let before = self.state.phase();
        self.state = self.state.apply(update);
        self.touch();
        before != self.state.phase()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
