//! Events exchanged between the scheduler and its caller.
//!
//! An `Event` is immutable once emitted. Within one turn, events are totally
//! ordered by `sequence_no`, which starts at 1 and has no gaps. The `payload`
//! is plain JSON whose shape is fixed per `EventKind`; the builders in
//! [`payload`] are the only place those shapes are spelled out.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AgentId, CallId, TurnId};

/// Discriminant of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Input supplied by the caller through `start`.
    UserInput,
    /// Text produced by the model.
    ModelOutputChunk,
    /// The model asked for a tool to be called.
    ToolCallRequest,
    /// Intermediate output surfaced by a tool before its final value.
    ToolOutput,
    /// The observation fed back to the model for one tool call.
    ToolResult,
    /// The turn is parked until the caller supplies input.
    InterruptRequest,
    /// The caller's answer to an `InterruptRequest`.
    InterruptResponse,
    /// A structural change requested by a tool and applied by the scheduler.
    ConfigChange,
    /// Run variables written by a tool or by an answered interrupt.
    StateChange,
    /// The turn finished; the payload holds the final text.
    TurnComplete,
    /// The turn failed.
    Error,
}

impl EventKind {
    /// Events that originate from the caller rather than from the agent.
    ///
    /// They are recorded in the turn log but never yielded back by `next()`.
    pub fn is_caller_originated(&self) -> bool {
        matches!(self, EventKind::UserInput | EventKind::InterruptResponse)
    }

    /// Events that belong in the conversation history shown to the model.
    pub fn is_conversational(&self) -> bool {
        matches!(
            self,
            EventKind::UserInput
                | EventKind::ModelOutputChunk
                | EventKind::ToolCallRequest
                | EventKind::ToolResult
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::UserInput => "user_input",
            EventKind::ModelOutputChunk => "model_output_chunk",
            EventKind::ToolCallRequest => "tool_call_request",
            EventKind::ToolOutput => "tool_output",
            EventKind::ToolResult => "tool_result",
            EventKind::InterruptRequest => "interrupt_request",
            EventKind::InterruptResponse => "interrupt_response",
            EventKind::ConfigChange => "config_change",
            EventKind::StateChange => "state_change",
            EventKind::TurnComplete => "turn_complete",
            EventKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// One immutable entry of a turn's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub payload: Value,
    /// Nesting level of the agent that raised the event (top level = 0).
    pub depth: u32,
    pub source_agent_id: AgentId,
    pub turn_id: TurnId,
    /// Position within the turn, starting at 1.
    pub sequence_no: u64,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// True when the caller must answer with `continue_with` before the turn
    /// can make progress.
    pub fn requires_input(&self) -> bool {
        self.kind == EventKind::InterruptRequest
    }

    /// The prompt to show the human, for events that require input.
    pub fn prompt(&self) -> Option<&str> {
        if self.requires_input() {
            self.payload.get("prompt").and_then(Value::as_str)
        } else {
            None
        }
    }

    /// The `text` field, present on input, model output and completion events.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }

    /// True for an `InterruptRequest` copy re-emitted by an ancestor agent.
    pub fn is_relayed(&self) -> bool {
        self.payload.get("relayed").and_then(Value::as_bool) == Some(true)
    }

    /// The tool name for tool-related events.
    pub fn tool(&self) -> Option<&str> {
        self.payload.get("tool").and_then(Value::as_str)
    }

    pub fn call_id(&self) -> Option<&str> {
        self.payload.get("call_id").and_then(Value::as_str)
    }

    /// The successful result of a `ToolResult` event.
    pub fn tool_result(&self) -> Option<&Value> {
        match self.kind {
            EventKind::ToolResult => self.payload.get("result"),
            _ => None,
        }
    }

    /// The error message of a failed `ToolResult` or of an `Error` event.
    pub fn error_message(&self) -> Option<&str> {
        match self.kind {
            EventKind::ToolResult => self.payload.get("error").and_then(Value::as_str),
            EventKind::Error => self.payload.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "..".repeat(self.depth as usize);
        write!(
            f,
            "{}[{} #{}] {}: {}",
            indent, self.source_agent_id, self.sequence_no, self.kind, self.payload
        )
    }
}

/// Payload builders, one per event kind.
pub mod payload {
    use serde_json::{json, Map, Value};

    use crate::model::TurnUsage;

    use super::{AgentId, CallId};

    pub fn text(text: &str) -> Value {
        json!({ "text": text })
    }

    /// Final text plus the usage of every decision step of the turn.
    pub fn turn_complete(text: &str, usage: &TurnUsage) -> Value {
        json!({ "text": text, "usage": usage })
    }

    pub fn tool_call(call_id: &CallId, tool: &str, arguments: &Value) -> Value {
        json!({ "call_id": call_id.to_string(), "tool": tool, "arguments": arguments })
    }

    pub fn tool_output(call_id: &CallId, tool: &str, output: &Value) -> Value {
        json!({ "call_id": call_id.to_string(), "tool": tool, "output": output })
    }

    pub fn tool_result(call_id: &CallId, tool: &str, result: &Value) -> Value {
        json!({ "call_id": call_id.to_string(), "tool": tool, "result": result })
    }

    pub fn tool_error(call_id: &CallId, tool: &str, message: &str) -> Value {
        json!({ "call_id": call_id.to_string(), "tool": tool, "error": message })
    }

    /// `path` lists the call ids from the surfacing runner down to the call
    /// that actually suspended.
    pub fn interrupt_request(
        call_id: &CallId,
        tool: &str,
        prompt: &str,
        origin_agent: &AgentId,
        origin_depth: u32,
        path: &[String],
    ) -> Value {
        json!({
            "call_id": call_id.to_string(),
            "tool": tool,
            "prompt": prompt,
            "origin_agent": origin_agent.as_str(),
            "origin_depth": origin_depth,
            "path": path,
        })
    }

    /// Marks an `InterruptRequest` re-emitted by an ancestor of the agent
    /// that suspended. The copy keeps the origin's depth and agent.
    pub fn relayed(mut body: Value, relayed_by: &AgentId) -> Value {
        body["relayed"] = Value::Bool(true);
        body["relayed_by"] = Value::String(relayed_by.as_str().to_string());
        body
    }

    pub fn interrupt_response(call_id: &CallId, response: &str) -> Value {
        json!({ "call_id": call_id.to_string(), "response": response })
    }

    pub fn config_change(
        call_id: &CallId,
        command: &Value,
        applied: bool,
        reason: Option<&str>,
    ) -> Value {
        let mut body = json!({
            "call_id": call_id.to_string(),
            "command": command,
            "applied": applied,
        });
        if let Some(reason) = reason {
            body["reason"] = Value::String(reason.to_string());
        }
        body
    }

    /// `values` are the entries written, merged over the run's variables.
    pub fn state_change(call_id: &CallId, values: &Map<String, Value>) -> Value {
        json!({ "call_id": call_id.to_string(), "values": values })
    }

    pub fn error(category: &str, message: &str) -> Value {
        json!({ "category": category, "message": message })
    }
}
