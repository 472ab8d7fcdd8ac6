//! Security module for Steward — credentials, authentication, and audit logging.
//!
//! Provides:
//! - **Credentials**: the single expected (identity, secret) pair and the
//!   Authenticator that checks attempts against it
//! - **Audit logging**: structured record of authentication attempts and
//!   approval decisions

pub mod audit;
pub mod credential;

pub use audit::{AuditEntry, AuditEvent, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use credential::{
    AUTH_FAILURE_MESSAGE, AUTH_SUCCESS_MESSAGE, Authentication, Authenticator, Credential,
    CredentialStore,
};
