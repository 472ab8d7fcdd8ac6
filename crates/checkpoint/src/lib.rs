//! Checkpointing backends for Steward sessions.
//!
//! - `memory` keeps sessions for the lifetime of the process
//! - `file` writes one JSON document per thread

pub mod file;
pub mod in_memory;

pub use file::FileCheckpointer;
pub use in_memory::InMemoryCheckpointer;

use std::path::PathBuf;
use std::sync::Arc;
use steward_core::checkpoint::Checkpointer;
use steward_core::error::CheckpointError;

/// Build a checkpointer by backend name.
pub fn from_backend(backend: &str, dir: PathBuf) -> Result<Arc<dyn Checkpointer>, CheckpointError> {
    match backend {
        "memory" => Ok(Arc::new(InMemoryCheckpointer::new())),
        "file" => Ok(Arc::new(FileCheckpointer::new(dir))),
        other => Err(CheckpointError::Storage(format!(
            "Unknown checkpoint backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends_by_name() {
        let dir = std::env::temp_dir();
        assert_eq!(from_backend("memory", dir.clone()).unwrap().name(), "memory");
        assert_eq!(from_backend("file", dir.clone()).unwrap().name(), "file");
        assert!(from_backend("sqlite", dir).is_err());
    }
}
