//! Human-in-the-loop approval: which capabilities pause for a decision,
//! the decisions a human can make, and the parked call awaiting one.

use crate::message::MessageToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Capability name → whether a call must be approved before it runs.
///
/// Capabilities missing from the table run without approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalPolicy {
    interrupt_on: BTreeMap<String, bool>,
}

impl ApprovalPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: set the approval requirement for one capability.
    pub fn with(mut self, capability: impl Into<String>, requires_approval: bool) -> Self {
        self.set(capability, requires_approval);
        self
    }

    pub fn set(&mut self, capability: impl Into<String>, requires_approval: bool) {
        self.interrupt_on.insert(capability.into(), requires_approval);
    }

    pub fn requires_approval(&self, capability: &str) -> bool {
        self.interrupt_on.get(capability).copied().unwrap_or(false)
    }

    /// Merge `overrides` on top of this policy.
    pub fn merged(mut self, overrides: &BTreeMap<String, bool>) -> Self {
        for (name, flag) in overrides {
            self.interrupt_on.insert(name.clone(), *flag);
        }
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.interrupt_on.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl From<BTreeMap<String, bool>> for ApprovalPolicy {
    fn from(interrupt_on: BTreeMap<String, bool>) -> Self {
        Self { interrupt_on }
    }
}

/// A human's answer to a pending approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Run the call exactly as the model requested it.
    Approve,
    /// Run the call with replacement arguments.
    Edit { arguments: serde_json::Value },
    /// Do not run the call.
    Reject {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ApprovalDecision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Edit { .. } => "edit",
            Self::Reject { .. } => "reject",
        }
    }
}

/// A tool call parked at the approval gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    /// The call that needs a decision
    pub call: MessageToolCall,

    /// Calls from the same assistant message that have not run yet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queued: Vec<MessageToolCall>,

    /// Capabilities that were exposed when the model made the request
    pub exposed: BTreeSet<String>,

    pub requested_at: DateTime<Utc>,
}

impl PendingApproval {
    pub fn new(
        call: MessageToolCall,
        queued: Vec<MessageToolCall>,
        exposed: BTreeSet<String>,
    ) -> Self {
        Self {
            call,
            queued,
            exposed,
            requested_at: Utc::now(),
        }
    }

    /// Parsed arguments of the parked call (empty object if unparseable).
    pub fn arguments(&self) -> serde_json::Value {
        serde_json::from_str(&self.call.arguments)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }

    /// One-line description for an approval prompt.
    pub fn describe(&self) -> String {
        format!("{}({})", self.call.name, self.call.arguments)
    }
}
