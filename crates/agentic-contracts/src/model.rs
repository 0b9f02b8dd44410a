//! Wire types for the model completion service.
//!
//! The scheduler sends a `CompletionRequest` at every decision step and gets
//! back either final text or a batch of tool calls. What the model does in
//! between is opaque to the runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{event::Event, ids::AgentId};

/// What the model sees of a tool: its name, purpose and argument schema.
///
/// The schema is passed through untouched; the runtime never validates
/// arguments against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub argument_schema: Value,
}

/// One decision request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub agent_id: AgentId,
    pub instructions: String,
    /// Conversation so far, in order. Only conversational kinds are included.
    pub history: Vec<Event>,
    /// Tools currently enabled on the agent, sorted by name.
    pub tool_schemas: Vec<ToolSchema>,
}

impl CompletionRequest {
    /// The most recent successful tool result in the history, if any.
    pub fn last_tool_result(&self) -> Option<&Value> {
        self.history.iter().rev().find_map(Event::tool_result)
    }

    /// Whether a tool named `name` is offered in this request.
    pub fn offers_tool(&self, name: &str) -> bool {
        self.tool_schemas.iter().any(|s| s.name == name)
    }
}

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// The model's decision for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionResponse {
    /// Final text; the turn ends.
    Text { content: String },
    /// One or more tool calls, dispatched as an unordered batch.
    ToolCalls { calls: Vec<ToolCall> },
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        CompletionResponse::Text {
            content: content.into(),
        }
    }

    pub fn call(tool_name: impl Into<String>, arguments: Value) -> Self {
        CompletionResponse::ToolCalls {
            calls: vec![ToolCall::new(tool_name, arguments)],
        }
    }
}

/// What one completion cost, as reported by the client.
///
/// Clients that know nothing about usage leave it at the default; the
/// scheduler fills in `model` and `elapsed_ms` when they are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub elapsed_ms: u64,
}

/// A decision together with its usage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub response: CompletionResponse,
    #[serde(default)]
    pub usage: CompletionUsage,
}

impl From<CompletionResponse> for Completion {
    fn from(response: CompletionResponse) -> Self {
        Self {
            response,
            usage: CompletionUsage::default(),
        }
    }
}

/// Usage summed over the decision steps of one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnUsage {
    pub completions: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub elapsed_ms: u64,
}

impl TurnUsage {
    pub fn record(&mut self, usage: &CompletionUsage) {
        self.completions += 1;
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.cost += usage.cost;
        self.elapsed_ms += usage.elapsed_ms;
    }
}
