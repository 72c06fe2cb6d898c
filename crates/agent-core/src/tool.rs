//! Tool System
//!
//! Tools are registered once at startup and invoked by the reasoning loop.
//! The registry doubles as the executor: every call, whatever happens to it,
//! comes back as a tool-role observation message.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque call ID, echoed back on the observation
    pub id: String,

    /// Tool identifier
    pub function_name: String,

    /// Text-encoded JSON arguments
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        function_name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            function_name: function_name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the arguments into a typed record.
    ///
    /// Blank arguments decode as `{}`. Some providers double-encode the
    /// arguments as a JSON string holding JSON; that inner layer is unwrapped.
    pub fn parse_arguments<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.arguments.trim();
        let raw = if raw.is_empty() { "{}" } else { raw };

        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AgentError::ToolArguments(e.to_string()))?;

        let value = match value {
            serde_json::Value::String(inner) => serde_json::from_str(&inner)
                .map_err(|e| AgentError::ToolArguments(e.to_string()))?,
            other => other,
        };

        serde_json::from_value(value).map_err(|e| AgentError::ToolArguments(e.to_string()))
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: error.into(),
        }
    }

    /// Text placed in the observation message
    pub fn observation(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            format!("Error: {}", self.output)
        }
    }
}

/// Tool definition advertised to the model (OpenAI function-calling shape)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// JSON Schema of the arguments object
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Wire form: `{"type": "function", "function": {...}}`
    pub fn to_openai(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's definition for LLM function calling
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool.
    ///
    /// Implementations decode arguments through [`ToolCall::parse_arguments`];
    /// returned errors are turned into observations by the registry.
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// Registry and executor for available tools
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a tool call and wrap the outcome as an observation.
    ///
    /// Never fails: unknown tools, undecodable arguments and tool errors all
    /// produce a well-formed tool message so the loop can continue.
    pub async fn execute(&self, call: &ToolCall) -> Message {
        let Some(tool) = self.get(&call.function_name) else {
            tracing::warn!(tool = %call.function_name, "Model requested unknown tool");
            return Message::tool(call, format!("Tool '{}' not implemented", call.function_name));
        };

        tracing::info!(tool = %call.function_name, call_id = %call.id, "Executing tool");

        let content = match tool.execute(call).await {
            Ok(result) => {
                if !result.success {
                    tracing::warn!(tool = %result.name, output = %result.output, "Tool reported failure");
                }
                result.observation()
            }
            Err(e) => {
                tracing::warn!(tool = %call.function_name, error = %e, "Tool execution failed");
                format!("Tool execution failed: {e}")
            }
        };

        Message::tool(call, content)
    }

    /// Definitions of all tools, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
