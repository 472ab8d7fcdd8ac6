//! In-memory checkpointer — sessions live as long as the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use steward_core::checkpoint::{Checkpointer, SessionSummary};
use steward_core::error::CheckpointError;
use steward_core::message::ConversationId;
use steward_core::session::Session;
use tokio::sync::RwLock;

pub struct InMemoryCheckpointer {
    sessions: Arc<RwLock<HashMap<ConversationId, Session>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryCheckpointer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, session: &Session) -> Result<(), CheckpointError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, id: &ConversationId) -> Result<Option<Session>, CheckpointError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, CheckpointError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, CheckpointError> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions.values().map(SessionSummary::from).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use steward_core::message::Message;

    #[tokio::test]
    async fn save_and_load() {
        let store = InMemoryCheckpointer::new();
        let mut session = Session::with_id(ConversationId::from("thread-1"));
        session.conversation.push(Message::user("hi"));
        session.state.authenticated = true;

        store.save(&session).await.unwrap();
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.conversation.messages.len(), 1);
        assert!(loaded.state.authenticated);
    }

    #[tokio::test]
    async fn save_replaces_existing() {
        let store = InMemoryCheckpointer::new();
        let mut session = Session::with_id(ConversationId::from("t"));
        store.save(&session).await.unwrap();
        session.conversation.push(Message::user("again"));
        store.save(&session).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 1);
        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.conversation.messages.len(), 1);
    }

    #[tokio::test]
    async fn missing_thread_is_none() {
        let store = InMemoryCheckpointer::new();
        assert!(store.load(&ConversationId::from("nope")).await.unwrap().is_none());
        assert!(!store.delete(&ConversationId::from("nope")).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_most_recent_first() {
        let store = InMemoryCheckpointer::new();
        let mut older = Session::with_id(ConversationId::from("older"));
        older.updated_at = older.updated_at - Duration::minutes(5);
        let newer = Session::with_id(ConversationId::from("newer"));
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }
}
