//! # Steward Core
//!
//! Domain types, traits, and error definitions for the Steward agent runtime.
//! This crate has no framework dependencies: it defines the domain model that
//! every other crate implements against.
//!
//! ## Layout
//!
//! - [`message`]: transcript types (messages, conversations)
//! - [`provider`]: the LLM backend abstraction
//! - [`tool`]: capabilities the model may call, and their registry
//! - [`session`]: the per-conversation record and its authentication state
//! - [`approval`]: which capabilities pause for a human decision
//! - [`checkpoint`]: persistence of session records between turns
//! - [`event`]: domain events broadcast to observers

pub mod approval;
pub mod checkpoint;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use approval::{ApprovalDecision, ApprovalPolicy, PendingApproval};
pub use checkpoint::{Checkpointer, SessionSummary};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use session::{AuthenticationOutcome, Session, SessionPhase, SessionState, SessionUpdate};
pub use tool::{CapabilityDescriptor, Tool, ToolCall, ToolRegistry, ToolResult};
