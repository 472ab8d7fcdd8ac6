//! The agent reasoning loop implementation.

use crate::gate::TurnPolicy;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use steward_core::approval::{ApprovalDecision, ApprovalPolicy, PendingApproval};
use steward_core::error::{SessionError, ToolError};
use steward_core::event::{DomainEvent, EventBus};
use steward_core::message::{Message, MessageToolCall};
use steward_core::provider::{Provider, ProviderRequest};
use steward_core::session::Session;
use steward_core::tool::{CapabilityDescriptor, ToolCall, ToolRegistry};
use steward_security::audit::{AuditEvent, AuditLogger, AuditOutcome};
use tracing::{debug, info, warn};

pub const MAX_ITERATIONS_MESSAGE: &str =
    "I've reached the maximum number of tool call iterations. Please provide further guidance.";

/// How a turn ended.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The model answered in plain text.
    Completed { response: String },

    /// A call needs a human decision; continue with [`AgentLoop::resume`].
    Interrupted(PendingApproval),
}

impl TurnOutcome {
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Completed { response } => Some(response),
            Self::Interrupted(_) => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingApproval> {
        match self {
            Self::Interrupted(pending) => Some(pending),
            Self::Completed { .. } => None,
        }
    }
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    model: String,

    /// Omitted from requests when unset
    temperature: Option<f32>,
    max_tokens: Option<u32>,

    tools: Arc<ToolRegistry>,

    /// Decides the exposed capabilities and system prompt before each model call
    policy: Arc<dyn TurnPolicy>,

    approvals: ApprovalPolicy,

    /// Maximum model calls per turn
    max_iterations: u32,

    event_bus: Arc<EventBus>,
    audit: Option<Arc<AuditLogger>>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        policy: Arc<dyn TurnPolicy>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            tools,
            policy,
            approvals: ApprovalPolicy::new(),
            max_iterations: 25,
            event_bus,
            audit: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_approvals(mut self, approvals: ApprovalPolicy) -> Self {
        self.approvals = approvals;
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Capabilities the model would be offered on the next step of `session`.
    pub fn capabilities(&self, session: &Session) -> Vec<CapabilityDescriptor> {
        let plan = self.policy.plan(&session.state);
        self.tools
            .descriptors(&self.approvals)
            .into_iter()
            .filter(|d| plan.exposes(d.name()))
            .collect()
    }

    /// Append `input` as a user message and run a turn.
    pub async fn send(
        &self,
        session: &mut Session,
        input: &str,
    ) -> Result<TurnOutcome, steward_core::Error> {
        self.ensure_not_pending(session)?;
        session.conversation.push(Message::user(input));
        session.touch();
        self.process(session).await
    }

    /// Run a turn over the session's transcript as it stands.
    ///
    /// Calls the model until it answers in text, a call stops at the approval
    /// gate, or the iteration limit is hit. The turn policy is consulted
    /// before every model call, so a state change made by one tool call is
    /// visible on the very next step.
    pub async fn process(&self, session: &mut Session) -> Result<TurnOutcome, steward_core::Error> {
        self.ensure_not_pending(session)?;
        info!(
            conversation_id = %session.id,
            messages = session.conversation.messages.len(),
            "Processing conversation"
        );
        self.run(session).await
    }

    /// Continue a turn that stopped at the approval gate.
    pub async fn resume(
        &self,
        session: &mut Session,
        decision: ApprovalDecision,
    ) -> Result<TurnOutcome, steward_core::Error> {
        let pending = session
            .pending
            .take()
            .ok_or_else(|| SessionError::NoPendingApproval(session.id.to_string()))?;
        session.touch();

        let tool_name = pending.call.name.clone();
        info!(
            conversation_id = %session.id,
            tool = %tool_name,
            decision = decision.label(),
            "Approval decision received"
        );
        self.record_decision(session, &tool_name, &decision);

        match decision {
            ApprovalDecision::Approve => {
                self.invoke(session, &pending.call, &pending.exposed, None)
                    .await;
            }
            ApprovalDecision::Edit { arguments } => {
                rewrite_call_arguments(session, &pending.call.id, &arguments);
                self.invoke(session, &pending.call, &pending.exposed, Some(arguments))
                    .await;
            }
            ApprovalDecision::Reject { reason } => {
                session.conversation.push(Message::tool_result(
                    &pending.call.id,
                    rejection_message(&tool_name, reason.as_deref()),
                ));
            }
        }

        if let Some(next) = self
            .dispatch(session, pending.queued, &pending.exposed)
            .await
        {
            return Ok(TurnOutcome::Interrupted(next));
        }
        self.run(session).await
    }

    /// Drop the parked call without running it or asking the model again.
    ///
    /// Tool messages are appended for the parked and queued calls so the
    /// transcript stays well-formed; session state is untouched.
    pub fn cancel(&self, session: &mut Session) -> Result<PendingApproval, steward_core::Error> {
        let pending = session
            .pending
            .take()
            .ok_or_else(|| SessionError::NoPendingApproval(session.id.to_string()))?;

        for call in std::iter::once(&pending.call).chain(pending.queued.iter()) {
            session.conversation.push(Message::tool_result(
                &call.id,
                format!("Tool call `{}` was cancelled.", call.name),
            ));
        }
        session.touch();

        self.event_bus.publish(DomainEvent::ApprovalResolved {
            conversation_id: session.id.to_string(),
            tool_name: pending.call.name.clone(),
            decision: "cancel".into(),
            timestamp: Utc::now(),
        });
        Ok(pending)
    }

    fn ensure_not_pending(&self, session: &Session) -> Result<(), SessionError> {
        if session.is_interrupted() {
            return Err(SessionError::ApprovalPending(session.id.to_string()));
        }
        Ok(())
    }

    async fn run(&self, session: &mut Session) -> Result<TurnOutcome, steward_core::Error> {
        let mut iteration = 0;

        loop {
            iteration += 1;

            if iteration > self.max_iterations {
                warn!(
                    conversation_id = %session.id,
                    iterations = iteration,
                    "Max tool iterations reached, forcing text response"
                );
                session
                    .conversation
                    .push(Message::assistant(MAX_ITERATIONS_MESSAGE));
                return Ok(TurnOutcome::Completed {
                    response: MAX_ITERATIONS_MESSAGE.into(),
                });
            }

            let plan = self.policy.plan(&session.state);
            session.conversation.set_system_prompt(&plan.system_prompt);

            debug!(
                conversation_id = %session.id,
                iteration,
                tools = ?plan.tools,
                "Agent loop iteration"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: session.conversation.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: self.tools.definitions_for(&plan.tools),
            };

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    self.event_bus.publish(DomainEvent::ErrorOccurred {
                        context: format!("provider:{}", self.provider.name()),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(e.into());
                }
            };

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    conversation_id: session.id.to_string(),
                    model: response.model.clone(),
                    tokens_used: usage.total_tokens,
                    timestamp: Utc::now(),
                });
            }

            if response.message.tool_calls.is_empty() {
                let text = response.message.content.clone();
                session.conversation.push(response.message);
                session.touch();
                return Ok(TurnOutcome::Completed { response: text });
            }

            debug!(
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );
            let calls = response.message.tool_calls.clone();
            session.conversation.push(response.message);

            if let Some(pending) = self.dispatch(session, calls, &plan.tools).await {
                return Ok(TurnOutcome::Interrupted(pending));
            }
        }
    }

    /// Run `calls` in order until one needs approval; that one and the rest
    /// are parked on the session.
    async fn dispatch(
        &self,
        session: &mut Session,
        calls: Vec<MessageToolCall>,
        exposed: &BTreeSet<String>,
    ) -> Option<PendingApproval> {
        let mut calls = calls.into_iter();
        while let Some(call) = calls.next() {
            if exposed.contains(&call.name) && self.approvals.requires_approval(&call.name) {
                let pending = PendingApproval::new(call, calls.by_ref().collect(), exposed.clone());
                info!(
                    conversation_id = %session.id,
                    tool = %pending.call.name,
                    queued = pending.queued.len(),
                    "Tool call awaiting approval"
                );
                self.event_bus.publish(DomainEvent::ApprovalRequested {
                    conversation_id: session.id.to_string(),
                    tool_name: pending.call.name.clone(),
                    timestamp: Utc::now(),
                });
                session.pending = Some(pending.clone());
                session.touch();
                return Some(pending);
            }
            self.invoke(session, &call, exposed, None).await;
        }
        None
    }

    /// Execute one call and append its result. Failures go back to the model
    /// as `Error: ...` tool messages.
    async fn invoke(
        &self,
        session: &mut Session,
        call: &MessageToolCall,
        exposed: &BTreeSet<String>,
        arguments: Option<serde_json::Value>,
    ) {
        if !exposed.contains(&call.name) {
            let err = ToolError::NotAvailable(call.name.clone());
            warn!(conversation_id = %session.id, tool = %call.name, "Refusing unexposed tool call");
            if let Some(audit) = &self.audit {
                audit.log(
                    AuditEvent::CapabilityRefused {
                        tool_name: call.name.clone(),
                    },
                    "model",
                    session.id.as_str(),
                    AuditOutcome::Denied,
                    None,
                );
            }
            session
                .conversation
                .push(Message::tool_result(&call.id, format!("Error: {err}")));
            return;
        }

        let arguments = arguments.unwrap_or_else(|| parse_arguments(&call.arguments));
        let tool_call = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
        };

        let start = std::time::Instant::now();
        let result = self.tools.execute(&tool_call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, output) = match result {
            Ok(result) => {
                if let Some(update) = &result.session_update {
                    if session.apply_update(update) {
                        let phase = session.state.phase();
                        info!(conversation_id = %session.id, ?phase, "Session state changed");
                        self.event_bus.publish(DomainEvent::SessionStateChanged {
                            conversation_id: session.id.to_string(),
                            phase,
                            timestamp: Utc::now(),
                        });
                    }
                }
                (result.success, result.output)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                (false, format!("Error: {e}"))
            }
        };

        self.event_bus.publish(DomainEvent::ToolExecuted {
            conversation_id: session.id.to_string(),
            tool_name: call.name.clone(),
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
        session.conversation.push(Message::tool_result(&call.id, output));
    }

    fn record_decision(&self, session: &Session, tool_name: &str, decision: &ApprovalDecision) {
        self.event_bus.publish(DomainEvent::ApprovalResolved {
            conversation_id: session.id.to_string(),
            tool_name: tool_name.to_string(),
            decision: decision.label().into(),
            timestamp: Utc::now(),
        });

        if let Some(audit) = &self.audit {
            let (outcome, details) = match decision {
                ApprovalDecision::Approve => (AuditOutcome::Success, None),
                ApprovalDecision::Edit { arguments } => {
                    (AuditOutcome::Success, Some(arguments.to_string()))
                }
                ApprovalDecision::Reject { reason } => (AuditOutcome::Denied, reason.clone()),
            };
            audit.log(
                AuditEvent::ApprovalDecision {
                    tool_name: tool_name.to_string(),
                    decision: decision.label().into(),
                },
                "user",
                session.id.as_str(),
                outcome,
                details,
            );
        }
    }
}

fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_default()
}

/// Make the transcript show the arguments that actually ran.
fn rewrite_call_arguments(session: &mut Session, call_id: &str, arguments: &serde_json::Value) {
    let call = session
        .conversation
        .messages
        .iter_mut()
        .rev()
        .flat_map(|m| m.tool_calls.iter_mut())
        .find(|c| c.id == call_id);
    if let Some(call) = call {
        call.arguments = arguments.to_string();
    }
}

fn rejection_message(tool_name: &str, reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("Tool call `{tool_name}` was rejected by the user. Reason: {reason}"),
        None => format!("Tool call `{tool_name}` was rejected by the user."),
    }
}
