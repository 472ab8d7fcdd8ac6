//! Credential store and Authenticator.
//!
//! The store holds exactly one expected (identity, secret) pair, fixed at
//! startup. The secret is kept only as a SHA-256 digest.

use crate::audit::{AuditEvent, AuditLogger, AuditOutcome};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use steward_core::session::{AuthenticationOutcome, SessionUpdate};

pub const AUTH_SUCCESS_MESSAGE: &str = "Successfully authenticated";
pub const AUTH_FAILURE_MESSAGE: &str = "Authentication failed";

/// An (identity, secret) pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

impl Credential {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Holds the single expected credential.
#[derive(Clone)]
pub struct CredentialStore {
    identity: String,
    secret_digest: [u8; 32],
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(credential: &Credential) -> Self {
        Self {
            identity: credential.identity.clone(),
            secret_digest: digest(&credential.secret),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Exact match on both fields; partial matches fail.
    pub fn matches(&self, identity: &str, secret: &str) -> bool {
        let identity_ok = identity == self.identity;
        let secret_ok = digest(secret) == self.secret_digest;
        identity_ok && secret_ok
    }
}

fn digest(s: &str) -> [u8; 32] {
    Sha256::digest(s.as_bytes()).into()
}

/// The verdict of one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authentication {
    pub outcome: AuthenticationOutcome,
    /// Text appended to the transcript
    pub message: &'static str,
    /// Update for the caller to apply to the session state
    pub update: SessionUpdate,
}

/// Compares supplied credentials against the store.
///
/// It never mutates session state itself; the returned update is applied by
/// the agent loop. There is no retry limit or lockout.
#[derive(Debug, Clone)]
pub struct Authenticator {
    store: CredentialStore,
    audit: Option<Arc<AuditLogger>>,
}

impl Authenticator {
    pub fn new(credential: &Credential) -> Self {
        Self {
            store: CredentialStore::new(credential),
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn authenticate(&self, identity: &str, secret: &str) -> Authentication {
        let outcome = if self.store.matches(identity, secret) {
            AuthenticationOutcome::Authenticated
        } else {
            AuthenticationOutcome::Rejected
        };

        let message = match outcome {
            AuthenticationOutcome::Authenticated => AUTH_SUCCESS_MESSAGE,
            AuthenticationOutcome::Rejected => AUTH_FAILURE_MESSAGE,
        };

        if let Some(audit) = &self.audit {
            audit.log(
                AuditEvent::AuthenticationAttempt,
                identity,
                self.store.identity(),
                match outcome {
                    AuthenticationOutcome::Authenticated => AuditOutcome::Success,
                    AuthenticationOutcome::Rejected => AuditOutcome::Failure,
                },
                None,
            );
        }

        Authentication {
            outcome,
            message,
            update: outcome.update(),
        }
    }
}
