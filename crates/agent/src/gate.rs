//! Per-turn capability selection.
//!
//! Before every model call the agent loop asks its [`TurnPolicy`] which
//! capabilities to expose and which system prompt to use. The email agent's
//! policy is [`AccessGate`]: a pure function of the session's authentication
//! state, evaluated fresh each time.

use std::collections::BTreeSet;
use steward_core::session::SessionState;
use steward_tools::{AUTHENTICATE, CHECK_INBOX, SEND_EMAIL};

pub const UNAUTHENTICATED_PROMPT: &str = "You are a helpful assistant that can authenticate users.";
pub const AUTHENTICATED_PROMPT: &str =
    "You are a helpful assistant that can check the inbox and send emails.";

pub const CHEF_PROMPT: &str = "
You are a personal chef. The user will give you a list of ingredients they have left over in their house.

Using the web search tool, search the web for recipes that can be made with the ingredients they have.

Return recipe suggestions and eventually the recipe instructions to the user, if requested.
";

/// What the model sees on one step: exposed capability names and the
/// instruction text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPlan {
    pub tools: BTreeSet<String>,
    pub system_prompt: String,
}

impl TurnPlan {
    pub fn new<I, S>(tools: I, system_prompt: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: tools.into_iter().map(Into::into).collect(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn exposes(&self, capability: &str) -> bool {
        self.tools.contains(capability)
    }
}

pub trait TurnPolicy: Send + Sync {
    fn plan(&self, state: &SessionState) -> TurnPlan;
}

/// Select the capability set and prompt for the next step.
///
/// Unauthenticated sessions see only `authenticate`; authenticated ones see
/// only `check_inbox` and `send_email`.
pub fn select_capabilities(state: &SessionState) -> TurnPlan {
    if state.authenticated {
        TurnPlan::new([CHECK_INBOX, SEND_EMAIL], AUTHENTICATED_PROMPT)
    } else {
        TurnPlan::new([AUTHENTICATE], UNAUTHENTICATED_PROMPT)
    }
}

/// The authentication gate used by the email agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl TurnPolicy for AccessGate {
    fn plan(&self, state: &SessionState) -> TurnPlan {
        select_capabilities(state)
    }
}

/// A fixed plan regardless of session state.
#[derive(Debug, Clone)]
pub struct StaticPolicy {
    plan: TurnPlan,
}

impl StaticPolicy {
    pub fn new(plan: TurnPlan) -> Self {
        Self { plan }
    }
}

impl TurnPolicy for StaticPolicy {
    fn plan(&self, _state: &SessionState) -> TurnPlan {
        self.plan.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(plan: &TurnPlan) -> Vec<&str> {
        plan.tools.iter().map(String::as_str).collect()
    }

    #[test]
    fn unauthenticated_sees_only_authenticate() {
        let plan = select_capabilities(&SessionState { authenticated: false });
        assert_eq!(names(&plan), vec!["authenticate"]);
        assert_eq!(
            plan.system_prompt,
            "You are a helpful assistant that can authenticate users."
        );
    }

    #[test]
    fn authenticated_sees_inbox_and_send() {
        let plan = select_capabilities(&SessionState { authenticated: true });
        assert_eq!(names(&plan), vec!["check_inbox", "send_email"]);
        assert!(!plan.exposes("authenticate"));
        assert_eq!(
            plan.system_prompt,
            "You are a helpful assistant that can check the inbox and send emails."
        );
    }

    #[test]
    fn gate_follows_state_each_call() {
        let gate = AccessGate;
        let mut state = SessionState::default();
        assert!(gate.plan(&state).exposes("authenticate"));
        state.authenticated = true;
        assert!(gate.plan(&state).exposes("check_inbox"));
    }

    #[test]
    fn static_policy_ignores_state() {
        let policy = StaticPolicy::new(TurnPlan::new(["web_search"], CHEF_PROMPT));
        let a = policy.plan(&SessionState { authenticated: false });
        let b = policy.plan(&SessionState { authenticated: true });
        assert_eq!(a, b);
        assert!(a.system_prompt.starts_with("\nYou are a personal chef."));
        assert!(a.system_prompt.ends_with("if requested.\n"));
    }
}
