//! Error types for the Steward domain.
//!
//! Each bounded context has its own `thiserror` enum; [`Error`] wraps them
//! all so the agent loop can propagate any of them with `?`.

use thiserror::Error;

/// The top-level error type for all Steward operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool not available in this turn: {0}")]
    NotAvailable(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupted checkpoint for thread {thread_id}: {reason}")]
    Corrupted { thread_id: String, reason: String },
}

/// Misuse of the turn/approval protocol by the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} is waiting for an approval decision")]
    ApprovalPending(String),

    #[error("Session {0} has no pending approval to resume")]
    NoPendingApproval(String),
}
