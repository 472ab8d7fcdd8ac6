//! The agent loop for Steward.
//!
//! Each turn follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Plan**: ask the turn policy which capabilities and system prompt apply
//!    to the session's current state
//! 2. **Call** the model with exactly those capabilities
//! 3. **Act**: run the requested tool calls, applying any session update they
//!    return, or stop at the approval gate
//! 4. **Observe**: append the results and loop back to step 1
//!
//! The turn ends when the model answers in text, a call needs a human
//! decision, or the iteration limit is reached.

pub mod gate;
pub mod loop_runner;
pub mod presets;

#[cfg(test)]
mod test_helpers;

pub use gate::{
    AUTHENTICATED_PROMPT, AccessGate, CHEF_PROMPT, StaticPolicy, TurnPlan, TurnPolicy,
    UNAUTHENTICATED_PROMPT, select_capabilities,
};
pub use loop_runner::{AgentLoop, MAX_ITERATIONS_MESSAGE, TurnOutcome};
pub use presets::{chef_agent, email_agent};
