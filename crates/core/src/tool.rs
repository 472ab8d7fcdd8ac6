//! Tool trait — the abstraction over agent capabilities.
//!
//! A capability is a named, schema-described action the model may request:
//! searching the web, reading the inbox, sending an email, authenticating.

use crate::approval::ApprovalPolicy;
use crate::error::ToolError;
use crate::provider::ToolDefinition;
use crate::session::SessionUpdate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    pub name: String,

    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    pub success: bool,

    /// Text appended to the transcript as the tool message
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Session state change requested by this call; applied by the agent loop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_update: Option<SessionUpdate>,
}

impl ToolResult {
    /// A successful result carrying only text.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
            data: None,
            session_update: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_session_update(mut self, update: SessionUpdate) -> Self {
        self.session_update = Some(update);
        self
    }
}

/// The core Tool trait.
///
/// Tools are registered in the [`ToolRegistry`]; the agent loop decides per
/// turn which of them the model may see.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "check_inbox").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A capability as seen by the approval layer: its definition plus whether
/// calls must be approved first.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
    pub definition: ToolDefinition,
    pub requires_approval: bool,
}

impl CapabilityDescriptor {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// A registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Definitions for the named subset, sorted by name. Unknown names are skipped.
    pub fn definitions_for(&self, names: &BTreeSet<String>) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Capability descriptors for every registered tool under `policy`.
    pub fn descriptors(&self, policy: &ApprovalPolicy) -> Vec<CapabilityDescriptor> {
        self.definitions()
            .into_iter()
            .map(|definition| CapabilityDescriptor {
                requires_approval: policy.requires_approval(&definition.name),
                definition,
            })
            .collect()
    }

    /// Execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let mut result = tool.execute(call.arguments.clone()).await?;
        result.call_id = call.id.clone();
        Ok(result)
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
