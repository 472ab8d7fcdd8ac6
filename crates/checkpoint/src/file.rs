//! File-based checkpointer — one pretty-printed JSON document per thread.
//!
//! Storage location: `~/.steward/threads/<thread-id>.json` by default.
//! Writes go to a temporary file first and are renamed into place.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use steward_core::checkpoint::{Checkpointer, SessionSummary};
use steward_core::error::CheckpointError;
use steward_core::message::ConversationId;
use steward_core::session::Session;
use tracing::{debug, warn};

pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Thread ids become file names, so anything that could escape the
    /// directory is refused.
    fn path_for(&self, id: &ConversationId) -> Result<PathBuf, CheckpointError> {
        let name = id.as_str();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !name.starts_with('.');
        if !valid {
            return Err(CheckpointError::Storage(format!("Invalid thread id: {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    fn decode(thread_id: &str, raw: &str) -> Result<Session, CheckpointError> {
        serde_json::from_str(raw).map_err(|e| CheckpointError::Corrupted {
            thread_id: thread_id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, session: &Session) -> Result<(), CheckpointError> {
        let path = self.path_for(&session.id)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CheckpointError::Storage(format!("Failed to create checkpoint directory: {e}"))
        })?;

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| CheckpointError::Storage(format!("Failed to serialize session: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CheckpointError::Storage(format!("Failed to write checkpoint: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CheckpointError::Storage(format!("Failed to write checkpoint: {e}")))?;

        debug!(thread = %session.id, path = %path.display(), "Checkpoint saved");
        Ok(())
    }

    async fn load(&self, id: &ConversationId) -> Result<Option<Session>, CheckpointError> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Self::decode(id.as_str(), &raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CheckpointError::Storage(format!(
                "Failed to read checkpoint: {e}"
            ))),
        }
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, CheckpointError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CheckpointError::Storage(format!(
                "Failed to delete checkpoint: {e}"
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, CheckpointError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CheckpointError::Storage(format!(
                    "Failed to read checkpoint directory: {e}"
                )));
            }
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let thread_id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable checkpoint");
                    continue;
                }
            };
            match Self::decode(&thread_id, &raw) {
                Ok(session) => summaries.push(SessionSummary::from(&session)),
                Err(e) => warn!(error = %e, "Skipping corrupted checkpoint"),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}
